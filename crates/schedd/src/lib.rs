#![deny(clippy::await_holding_refcell_ref)]

pub mod common;
pub mod queue;
pub mod server;

#[cfg(test)]
pub(crate) mod tests;

pub type Error = crate::common::error::ScheddError;
pub type Result<T> = std::result::Result<T, Error>;

// Reexports
pub use negotiation;

pub const SCHEDD_VERSION: &str = env!("CARGO_PKG_VERSION");
