//! Base types and error handling.
//!
//! Provides foundational types mirroring Chromium's `net/base/`:
//! - [`neterror::NetError`]: Network error codes matching `net_error_list.h`
//! - [`context::IoResultExt`]: context helpers for IO errors

pub mod context;
pub mod neterror;

#[cfg(test)]
mod tests;
