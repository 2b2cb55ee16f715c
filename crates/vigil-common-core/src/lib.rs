//! Vigil common core types and utilities.

pub mod digest;
pub mod error;
pub mod fs;

pub use digest::{is_hex_digest, ZERO_DIGEST};
pub use error::{Error, FsErrorKind, Result};
