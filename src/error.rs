/// Errors that can occur in the telemetry relay.
#[derive(Debug, thiserror::Error)]
pub enum RelayError {
    #[error("Mission file line {line}: {reason}")]
    MissionParse { line: usize, reason: String },

    #[error("Unsupported mission file version: {0:?}")]
    UnsupportedMissionVersion(String),

    #[error("Mission not found: {0}")]
    MissionNotFound(String),

    #[error("Mission fetch failed: {0}")]
    MissionFetch(#[from] std::io::Error),

    #[error("Mission upload rejected by vehicle: {0}")]
    MissionUpload(String),

    #[error("Vehicle link error: {0}")]
    Link(String),

    #[error("Telemetry publish failed: {0}")]
    Publish(String),
}
