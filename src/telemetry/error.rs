use std::time::Duration;

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum TelemetryError {
    #[error("Telemetry service unreachable: {0}")]
    Transport(String),
    #[error("Telemetry service returned {status}: {message}")]
    Upstream { status: u16, message: String },
    #[error("Failed to decode telemetry response: {0}")]
    Decode(String),
    #[error("Telemetry request timed out after {0:?}")]
    Timeout(Duration),
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),
}

impl From<reqwest::Error> for TelemetryError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            TelemetryError::Decode(err.to_string())
        } else {
            TelemetryError::Transport(err.to_string())
        }
    }
}

pub type TelemetryResult<T> = Result<T, TelemetryError>;

/// Runs `fut` under `limit`, mapping an elapsed deadline to [`TelemetryError::Timeout`].
pub async fn with_timeout<T>(
    limit: Duration,
    fut: impl Future<Output = TelemetryResult<T>>,
) -> TelemetryResult<T> {
    tokio::time::timeout(limit, fut)
        .await
        .map_err(|_| TelemetryError::Timeout(limit))?
}
