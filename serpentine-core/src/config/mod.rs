//! Match configuration
//!
//! Types plus a small no_std TOML reader so the same file can be validated
//! on the host and embedded in the firmware.

pub mod toml;
pub mod types;

pub use toml::{parse_config, ParseError};
pub use types::*;
