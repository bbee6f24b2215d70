//! Account and delivery workflows on top of the `model` entities.
//!
//! Everything here is independent of HTTP; the root crate maps the
//! results and `ServiceError` onto responses.

pub mod accounts;
pub mod authentication;
pub mod content_store;
pub mod deliveries;
pub mod error;
pub mod password;
pub mod registration;

#[cfg(test)]
mod testing;

pub use error::{Result, ServiceError};
