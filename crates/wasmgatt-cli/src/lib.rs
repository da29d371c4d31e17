//! wasmgatt CLI library
//!
//! Argument parsing, layered configuration and command handlers behind the
//! `wasmgatt` binary. Handlers are generic over
//! [`GattTransport`](wasmgatt_core::GattTransport) so they run unchanged
//! against a BLE connection or the in-memory device used by `--dry-run`.

pub mod cli;
pub mod commands;
pub mod config;
pub mod dry_run;
pub mod error;
pub mod outcome;

pub use cli::{Cli, Commands};
pub use commands::CommandDispatcher;
pub use config::{AppConfig, ConfigError};
pub use error::{CliError, Result};
pub use outcome::Outcome;
