use std::fmt;

// === WorkspaceError ===

/// Errors related to workspace and surface bookkeeping inside one window.
#[derive(Debug, PartialEq)]
pub enum WorkspaceError {
    /// Workspace with the given ID was not found.
    NotFound(String),
    /// Surface with the given ID was not found.
    SurfaceNotFound(String),
    /// The provided workspace index is out of bounds.
    InvalidIndex(usize),
    /// The pane tree refused to host the surface.
    PaneRejected(String),
}

impl fmt::Display for WorkspaceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WorkspaceError::NotFound(id) => write!(f, "Workspace not found: {}", id),
            WorkspaceError::SurfaceNotFound(id) => write!(f, "Surface not found: {}", id),
            WorkspaceError::InvalidIndex(index) => write!(f, "Invalid workspace index: {}", index),
            WorkspaceError::PaneRejected(msg) => write!(f, "Pane rejected surface: {}", msg),
        }
    }
}

impl std::error::Error for WorkspaceError {}

// === RegistryError ===

/// Errors related to the window context registry.
#[derive(Debug, PartialEq)]
pub enum RegistryError {
    /// No context is registered for the given window ID.
    WindowNotFound(String),
    /// No context is registered for the given window handle.
    HandleNotFound(u64),
    /// The handle is already bound to a different window.
    HandleInUse(u64),
}

impl fmt::Display for RegistryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RegistryError::WindowNotFound(id) => write!(f, "Window not found: {}", id),
            RegistryError::HandleNotFound(handle) => {
                write!(f, "No window registered for handle: {}", handle)
            }
            RegistryError::HandleInUse(handle) => {
                write!(f, "Window handle already in use: {}", handle)
            }
        }
    }
}

impl std::error::Error for RegistryError {}

// === TransferError ===

/// Errors related to moving surfaces and workspaces between windows.
///
/// Every variant leaves the in-memory model as it was before the request.
#[derive(Debug, PartialEq)]
pub enum TransferError {
    /// No workspace hosts the surface.
    SurfaceNotFound(String),
    /// The surface is not hosted by the workspace the caller named.
    SourceMismatch(String),
    /// The destination workspace is not registered.
    WorkspaceNotFound(String),
    /// The destination window is not registered.
    WindowNotFound(String),
    /// The destination workspace has no pane to receive the surface.
    NoDestinationPane(String),
    /// The source pane tree refused to detach the surface.
    DetachFailed(String),
    /// The destination pane tree refused the surface; it was rolled back.
    AttachFailed(String),
    /// Splitting the destination pane failed; the surface was rolled back.
    SplitFailed(String),
    /// Source and destination are the same window.
    SameWindow(String),
}

impl fmt::Display for TransferError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TransferError::SurfaceNotFound(id) => write!(f, "Surface not found: {}", id),
            TransferError::SourceMismatch(msg) => write!(f, "Source mismatch: {}", msg),
            TransferError::WorkspaceNotFound(id) => write!(f, "Workspace not found: {}", id),
            TransferError::WindowNotFound(id) => write!(f, "Window not found: {}", id),
            TransferError::NoDestinationPane(id) => {
                write!(f, "No destination pane in workspace: {}", id)
            }
            TransferError::DetachFailed(id) => write!(f, "Detach failed for surface: {}", id),
            TransferError::AttachFailed(id) => write!(f, "Attach failed for surface: {}", id),
            TransferError::SplitFailed(id) => write!(f, "Split failed for surface: {}", id),
            TransferError::SameWindow(id) => write!(f, "Workspace already in window: {}", id),
        }
    }
}

impl std::error::Error for TransferError {}

// === ShortcutError ===

/// Errors related to keyboard shortcut management.
#[derive(Debug, PartialEq)]
pub enum ShortcutError {
    /// Shortcut for the given action was not found.
    NotFound(String),
    /// The shortcut keys conflict with an existing binding.
    Conflict(String),
    /// The provided key combination is invalid.
    InvalidKeys(String),
    /// The action name is not known.
    UnknownAction(String),
}

impl fmt::Display for ShortcutError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ShortcutError::NotFound(action) => {
                write!(f, "Shortcut not found for action: {}", action)
            }
            ShortcutError::Conflict(msg) => write!(f, "Shortcut conflict: {}", msg),
            ShortcutError::InvalidKeys(keys) => write!(f, "Invalid shortcut keys: {}", keys),
            ShortcutError::UnknownAction(action) => write!(f, "Unknown action: {}", action),
        }
    }
}

impl std::error::Error for ShortcutError {}

// === SessionError ===

/// Errors related to snapshot persistence. Never surfaced to the user.
#[derive(Debug, PartialEq)]
pub enum SessionError {
    /// Reading, writing or replacing the snapshot file failed.
    IoError(String),
    /// Failed to serialize or deserialize snapshot data.
    SerializationError(String),
    /// The snapshot was written by an incompatible schema.
    UnsupportedVersion(u32),
}

impl fmt::Display for SessionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SessionError::IoError(msg) => write!(f, "Session I/O error: {}", msg),
            SessionError::SerializationError(msg) => {
                write!(f, "Session serialization error: {}", msg)
            }
            SessionError::UnsupportedVersion(version) => {
                write!(f, "Unsupported session schema version: {}", version)
            }
        }
    }
}

impl std::error::Error for SessionError {}

// === SettingsError ===

/// Errors related to settings management.
#[derive(Debug, PartialEq)]
pub enum SettingsError {
    /// An I/O error occurred while reading or writing settings.
    IoError(String),
    /// Failed to serialize or deserialize settings.
    SerializationError(String),
    /// The provided settings key is invalid.
    InvalidKey(String),
    /// The provided settings value is invalid.
    InvalidValue(String),
}

impl fmt::Display for SettingsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SettingsError::IoError(msg) => write!(f, "Settings I/O error: {}", msg),
            SettingsError::SerializationError(msg) => {
                write!(f, "Settings serialization error: {}", msg)
            }
            SettingsError::InvalidKey(key) => write!(f, "Invalid settings key: {}", key),
            SettingsError::InvalidValue(msg) => {
                write!(f, "Invalid settings value: {}", msg)
            }
        }
    }
}

impl std::error::Error for SettingsError {}

// === LogError ===

/// Errors raised while installing the global log subscriber.
#[derive(Debug)]
pub enum LogError {
    /// The filter directive could not be parsed.
    InvalidLevel(String),
    /// Another subscriber was already installed as the global default.
    SetSubscriber(String),
}

impl fmt::Display for LogError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LogError::InvalidLevel(level) => write!(f, "Invalid log level: {}", level),
            LogError::SetSubscriber(msg) => write!(f, "Failed to set subscriber: {}", msg),
        }
    }
}

impl std::error::Error for LogError {}
