#![warn(clippy::all, clippy::pedantic)]
#![allow(
    clippy::missing_errors_doc,
    clippy::missing_panics_doc,
    clippy::module_name_repetitions,
    clippy::must_use_candidate
)]

pub mod cli;
pub mod config;
pub mod content;
pub mod error;
pub mod gateway;
pub mod response;
pub mod webhook;

pub use config::Config;
pub use error::{RelayError, Result};
