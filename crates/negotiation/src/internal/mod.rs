#[macro_use]
pub(crate) mod common;
pub mod classad;
pub mod messages;
pub mod negotiation;
pub(crate) mod transfer;

#[cfg(test)]
mod tests;
