use portlab_core::domain::TimezoneError;
use portlab_core::RiskError;
use thiserror::Error;

/// Failures of the synchronous performance and quality analyses.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum AnalysisError {
    #[error(transparent)]
    UnknownTimezone(#[from] TimezoneError),
    #[error(transparent)]
    Risk(#[from] RiskError),
}
