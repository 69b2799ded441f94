//! termdeck: the shell core of a multi-window terminal/browser workspace app.
//!
//! This library crate exposes all modules for use by the binaries and integration tests.

pub mod app;
pub mod managers;
pub mod platform;
pub mod rpc_handler;
pub mod services;
pub mod types;
