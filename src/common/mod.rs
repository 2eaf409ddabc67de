//! Common utilities and types shared across lsm-bench

pub mod config;
pub mod error;
pub mod utils;

pub use config::Config;
pub use error::{Error, ErrorCategory, Result};
pub use utils::{
    deserialize_duration, elapsed_secs, format_bytes, init_tracing, parse_duration,
    serialize_duration,
};
