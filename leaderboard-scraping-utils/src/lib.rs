#[macro_use]
pub mod macros;

pub mod fs_json_util;

// Re-exported so that `regex!` expands without the caller depending on these crates.
#[doc(hidden)]
pub use once_cell;
#[doc(hidden)]
pub use regex as regex_crate;
