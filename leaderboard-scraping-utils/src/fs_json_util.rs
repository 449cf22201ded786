use std::{
    ffi::OsString,
    fmt::Debug,
    io::{BufReader, BufWriter, Write},
    path::{Path, PathBuf},
};

use anyhow::{anyhow, Context};
use fs_err::File;
use serde::{Deserialize, Serialize};

pub fn read_json<P: Into<PathBuf> + Debug, T: for<'de> Deserialize<'de>>(
    path: P,
) -> anyhow::Result<T> {
    let path = path.into();
    (|| serde_json::from_reader(BufReader::new(File::open(&path)?)).map_err(anyhow::Error::new))()
        .with_context(|| {
            format!(
                "While trying to parse {path:?} as {}",
                std::any::type_name::<T>()
            )
        })
}

/// Writes `value` as pretty-printed JSON.
///
/// The content goes to a sibling `<name>.tmp` file first and is renamed over `path`
/// only after it has been flushed, so readers see either the old or the new file.
pub fn write_json<P: Into<PathBuf>, T: Serialize>(path: P, value: &T) -> anyhow::Result<()> {
    let path = path.into();
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs_err::create_dir_all(parent)?;
    }
    let tmp = temporary_path(&path)?;
    let res = (|| {
        let mut writer = BufWriter::new(File::create(&tmp)?);
        serde_json::to_writer_pretty(&mut writer, value)?;
        writer.write_all(b"\n")?;
        writer.flush()?;
        writer.into_inner().map_err(|e| e.into_error())?.sync_all()?;
        fs_err::rename(&tmp, &path)?;
        anyhow::Ok(())
    })();
    if res.is_err() {
        let _ = fs_err::remove_file(&tmp);
    }
    res.with_context(|| format!("While trying to write {path:?}"))
}

fn temporary_path(path: &Path) -> anyhow::Result<PathBuf> {
    let mut name: OsString = path
        .file_name()
        .ok_or_else(|| anyhow!("{path:?} does not name a file"))?
        .to_owned();
    name.push(".tmp");
    Ok(path.with_file_name(name))
}

pub fn read_toml<P: Into<PathBuf> + Debug, T: for<'de> Deserialize<'de>>(
    path: P,
) -> anyhow::Result<T> {
    let path = path.into();
    (|| toml::from_str(&fs_err::read_to_string(&path)?).map_err(anyhow::Error::new))().with_context(
        || {
            format!(
                "While trying to parse {path:?} as {}",
                std::any::type_name::<T>()
            )
        },
    )
}
