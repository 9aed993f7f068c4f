//! rtc-core: session-authenticated client for Jazz / Rational Team Concert
//! work items.
//!
//! # Conventions
//!
//! - **Errors**: every fallible call returns `Result<T, RtcError>`; nothing is
//!   retried or swallowed.
//! - **Logging**: `tracing` macros (`debug!` per exchange, `info!` for login
//!   and state changes, `warn!` before a verification failure).

pub mod attributes;
pub mod client;
pub mod config;
pub mod envelope;
pub mod error;
pub mod lifecycle;
pub mod model;
pub mod query;
pub mod transport;

pub use client::{Client, Identity, ItemIds};
pub use error::{ErrorCode, RtcError};
