//! cloudlock - Distributed named locks on Google Cloud Storage
//!
//! Command-line frontend over `cloudlock-core`. Parses verbs, loads the
//! layered configuration, runs one lock operation, and turns its outcome
//! into a process exit code.

#![cfg_attr(not(test), deny(clippy::unwrap_used))]
#![cfg_attr(not(test), deny(clippy::expect_used))]
#![cfg_attr(not(test), deny(clippy::panic))]
#![warn(clippy::pedantic)]
#![forbid(unsafe_code)]

pub mod cli;
pub mod commands;
pub mod error;
pub mod shutdown;

pub use error::{exit_code, Error};
