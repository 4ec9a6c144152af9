use thiserror::Error;

/// Library error type for kiosk operations.
#[derive(Debug, Error)]
pub enum Error {
    /// Bad client input: missing field, disallowed extension, or a path
    /// outside the media root.
    #[error("{0}")]
    Validation(String),

    /// The requested media file does not exist.
    #[error("{0}")]
    NotFound(String),

    /// The requested command name is not on the execute allow-list.
    #[error("Command not allowed: {0}")]
    CommandNotAllowed(String),

    /// The command is allow-listed but has no variant for this platform.
    #[error("Command '{command}' not supported on {platform}")]
    UnsupportedPlatform { command: String, platform: String },

    /// No player executable could be resolved.
    #[error("VLC not found. Please install VLC or verify its installation path")]
    PlayerNotFound,

    /// The player executable was found but could not be spawned.
    #[error("Failed to start player: {0}")]
    Launch(#[source] std::io::Error),

    /// Underlying IO error.
    #[error(transparent)]
    Io(#[from] std::io::Error),
}
