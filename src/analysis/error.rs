use thiserror::Error;

#[derive(Debug, Error)]
pub enum AnalysisError {
    /// A run is in progress; concurrent starts are rejected, not queued.
    #[error("analysis is already running")]
    Busy,
    /// A non-positive step would stall the scan cursor forever.
    #[error("scan steps must be positive")]
    NonPositiveStep,
}
