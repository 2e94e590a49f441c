//! Error types for asygeo-render

use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

use crate::log::RenderLog;

/// Result type alias using the renderer's error type
pub type Result<T> = std::result::Result<T, RenderError>;

/// Errors that can occur while rendering
///
/// Every variant raised after the request was accepted carries the
/// [`RenderLog`] collected up to the point of failure.
#[derive(Error, Debug)]
pub enum RenderError {
    /// The submitted code was empty or whitespace only
    #[error("asyCode parameter cannot be empty.")]
    EmptyCode,

    /// The renderer binary could not be started
    #[error("Failed to start Asymptote process ({}): {source}", .program.display())]
    Spawn {
        program: PathBuf,
        #[source]
        source: std::io::Error,
        log: RenderLog,
    },

    /// The renderer did not exit within the configured limit
    #[error("Asymptote process timed out after {}s", .limit.as_secs_f32())]
    Timeout { limit: Duration, log: RenderLog },

    /// The renderer exited unsuccessfully and produced no image
    #[error("Asymptote process exited with {status}. Output file not found.")]
    ExitFailure { status: String, log: RenderLog },

    /// The renderer exited cleanly but the expected image is missing
    #[error("Asymptote process completed (exit code 0), but output file {file} was not created.")]
    MissingOutput { file: String, log: RenderLog },

    /// `asy -version` ran but reported failure
    #[error("`{} -version` exited with {status}", .program.display())]
    VersionCheck {
        program: PathBuf,
        status: String,
        log: RenderLog,
    },

    /// Scratch file handling failed
    #[error("IO error: {source}")]
    Io {
        #[source]
        source: std::io::Error,
        log: RenderLog,
    },
}

impl RenderError {
    /// Diagnostic log collected before the failure, if any
    pub fn log(&self) -> Option<&RenderLog> {
        match self {
            Self::EmptyCode => None,
            Self::Spawn { log, .. }
            | Self::Timeout { log, .. }
            | Self::ExitFailure { log, .. }
            | Self::MissingOutput { log, .. }
            | Self::VersionCheck { log, .. }
            | Self::Io { log, .. } => Some(log),
        }
    }

    /// Whether the failure was caused by the caller's input rather than
    /// the renderer or the host
    pub fn is_invalid_input(&self) -> bool {
        matches!(self, Self::EmptyCode)
    }
}
