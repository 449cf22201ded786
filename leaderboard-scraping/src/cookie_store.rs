use std::{
    fmt::Debug,
    io,
    path::{Path, PathBuf},
};

/// Session cookies copied from a logged-in browser, sent verbatim as the `Cookie` header.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials(String);
impl Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("Credentials")
            .field(&format_args!("<{} bytes>", self.0.len()))
            .finish()
    }
}

impl Credentials {
    pub fn load(path: impl AsRef<Path>) -> Result<Self, CredentialsLoadError> {
        let path = path.as_ref();
        let text = fs_err::read_to_string(path).map_err(|e| match e.kind() {
            io::ErrorKind::NotFound => CredentialsLoadError::NotFound(path.to_owned()),
            _ => CredentialsLoadError::IOError(e),
        })?;
        Self::from_cookie_header(text).ok_or_else(|| CredentialsLoadError::Empty(path.to_owned()))
    }

    /// Returns `None` if nothing but whitespace is given.
    pub fn from_cookie_header(text: impl AsRef<str>) -> Option<Self> {
        let text = text.as_ref().trim();
        (!text.is_empty()).then(|| Self(text.to_owned()))
    }

    pub fn cookie_header(&self) -> &str {
        &self.0
    }
}

#[derive(Debug, thiserror::Error)]
pub enum CredentialsLoadError {
    #[error("Cookie file was not found at {0:?}.")]
    NotFound(PathBuf),
    #[error("Cookie file {0:?} is empty.")]
    Empty(PathBuf),
    #[error("An I/O error occurred when loading the cookie file: {0}")]
    IOError(io::Error),
}
impl CredentialsLoadError {
    /// What the operator should do about it.
    pub fn guidance(&self) -> &'static str {
        match self {
            Self::NotFound(_) | Self::Empty(_) => {
                "Log in to the forum in a browser, copy the value of the `Cookie` request header \
                 (e.g. `xf_user=...; xf_session=...`) from the developer tools, \
                 and save it as a single line in the cookie file."
            }
            Self::IOError(_) => "Make sure that the cookie file is a readable UTF-8 text file.",
        }
    }
}
