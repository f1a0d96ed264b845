use std::{error::Error, path::PathBuf};

use thiserror::Error;

/// Result alias for calls made against an external dependency.
pub type DependencyResult<T> = Result<T, DependencyError>;

/// Fault raised by a dependency collaborator regardless of the underlying driver.
#[derive(Debug, Error)]
pub enum DependencyError {
    /// The dependency could not be reached or rejected the operation.
    #[error("{message}")]
    Unavailable {
        message: String,
        #[source]
        source: Box<dyn Error + Send + Sync>,
    },
    /// The dependency answered with a status outside the accepted range.
    #[error("unexpected response status {status} from `{target}`")]
    UnexpectedStatus { target: String, status: u16 },
    /// The connection was closed before any reply arrived.
    #[error("`{target}` closed the connection without replying")]
    NoReply { target: String },
    /// The reply line exceeded the accepted length without a terminator.
    #[error("reply from `{target}` exceeded {limit} bytes without a line terminator")]
    OversizedReply { target: String, limit: u64 },
}

impl DependencyError {
    /// Construct an unavailable error from any driver failure.
    pub fn unavailable(
        message: impl Into<String>,
        source: impl Error + Send + Sync + 'static,
    ) -> Self {
        DependencyError::Unavailable {
            message: message.into(),
            source: Box::new(source),
        }
    }
}

/// Failure while reading local host or runtime resource data.
#[derive(Debug, Error)]
pub enum HostError {
    /// The current process id could not be resolved.
    #[error("unable to resolve the current process: {0}")]
    CurrentProcess(String),
    /// The host inspector did not report the current process.
    #[error("process {pid} is not visible to the host inspector")]
    ProcessNotFound { pid: u32 },
    /// No mounted filesystem contains the inspected path.
    #[error("no mounted filesystem contains `{}`", .path.display())]
    MountNotFound { path: PathBuf },
    /// A capacity used as a divisor was reported as zero.
    #[error("reported {resource} capacity is zero")]
    ZeroCapacity { resource: &'static str },
}

/// Render an error and its whole source chain as a single line.
pub fn describe(err: &(dyn Error + 'static)) -> String {
    let mut message = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        message.push_str(": ");
        message.push_str(&cause.to_string());
        source = cause.source();
    }
    message
}
