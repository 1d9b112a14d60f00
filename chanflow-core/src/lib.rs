#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::panic)]
#![forbid(unsafe_code)]
#![cfg_attr(test, allow(clippy::unwrap_used, clippy::expect_used, clippy::panic))]

pub mod chain;
pub mod config;
pub mod engine;
pub mod events;
pub mod processors;
pub mod utils;

#[cfg(test)]
pub(crate) mod testing;
