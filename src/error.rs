use std::path::PathBuf;

use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    #[error("{0}")]
    Usage(String),

    #[error("Shortlinks server URL not configured. Run \"shorten -s <server url>\" to set your default server.")]
    ServerNotConfigured,

    #[error("Saved server URL in {} is not a valid URL ({source}). Delete the file and run \"shorten -s <server url>\" again.", path.display())]
    ServerCorrupt {
        path: PathBuf,
        source: url::ParseError,
    },

    #[error("Failed to determine home directory for configuration")]
    NoConfigDir,

    #[error("Failed to access {}: {source}", path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Login failed ({status}): {body}")]
    Auth { status: u16, body: String },

    #[error("Server returned a session token that is empty or cannot be sent as a bearer credential")]
    InvalidToken,

    #[error("{failed} of {total} link(s) could not be shortened")]
    SubmissionsFailed { failed: usize, total: usize },

    #[error("Failed to reach server: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Failed to set up HTTP client: {0}")]
    HttpClient(reqwest::Error),

    #[error("Failed to write output: {0}")]
    Output(std::io::Error),

    #[error(transparent)]
    Prompt(anyhow::Error),
}

impl Error {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Process exit status for this failure.
    pub fn exit_code(&self) -> u8 {
        match self {
            Self::SubmissionsFailed { .. } => 1,
            Self::Usage(_) | Self::ServerNotConfigured => 2,
            Self::ServerCorrupt { .. } => 3,
            Self::Auth { .. } | Self::InvalidToken => 4,
            Self::Transport(_) => 5,
            Self::NoConfigDir
            | Self::Io { .. }
            | Self::Prompt(_)
            | Self::HttpClient(_)
            | Self::Output(_) => 6,
        }
    }
}
