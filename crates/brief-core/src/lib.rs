//! Foundational low-level utilities shared across Brief crates.
//!
//! Provides atomic file-write helpers, time utilities used for object keys and
//! history timestamps, and the error taxonomy every service client reports in.

pub mod atomic_io;
pub mod error_kind;
pub mod time_utils;

pub use atomic_io::{read_text_optional, write_text_atomic};
pub use error_kind::{ErrorKind, ServiceError};
pub use time_utils::{
    current_date_string, current_unix_timestamp, current_unix_timestamp_ms, unix_date_string,
};
