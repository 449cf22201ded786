use std::io::Write;

use env_logger::{Builder, Env, Target};
use log::Level;

/// Plain lines on stdout for progress, `[LEVEL]`-prefixed lines for anything else.
/// `RUST_LOG` takes precedence over `verbose`.
pub fn init_logger(verbose: bool) {
    let default_filter = if verbose {
        "info,leaderboard_scraping=debug,leaderboard_watcher=debug"
    } else {
        "info"
    };
    Builder::from_env(Env::default().default_filter_or(default_filter))
        .target(Target::Stdout)
        .format(|buf, record| {
            let timestamp = buf.timestamp_seconds();
            if record.level() == Level::Info {
                writeln!(buf, "{timestamp} {}", record.args())
            } else {
                writeln!(buf, "{timestamp} [{}] {}", record.level(), record.args())
            }
        })
        .init();
}
