//! Core library with shared error handling for the profile service.
//!
//! - [`AppError`]: domain error shared by every adapter crate
//! - [`ApiError`]: HTTP error rendered as a JSON `{"message": ...}` body
//! - Extension traits that cut the `map_err` boilerplate at call sites

pub mod error;
pub mod str_ext;

pub use error::{ApiError, AppError, InternalExt, OptionExt};
pub use str_ext::OptionStrExt;
