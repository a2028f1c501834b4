//! Named development environments launched through `nix-shell`.
//!
//! Projects and their package lists live in a local SQLite file. The
//! [`cli::Dispatcher`] maps subcommands onto [`db::Database`] operations and hands
//! the `shell` command to a [`launcher::ProcessLauncher`].

pub mod cli;
pub mod config;
pub mod db;
pub mod error;
pub mod launcher;
pub mod models;

pub use error::{Error, Result};
