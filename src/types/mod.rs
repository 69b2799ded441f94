// Shared type definitions
// Each submodule defines types used across the shell core.

pub mod errors;
pub mod event;
pub mod geometry;
pub mod notification;
pub mod session;
pub mod settings;
pub mod window;
pub mod workspace;
