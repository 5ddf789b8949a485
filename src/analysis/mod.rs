mod aggregate;
mod error;
mod job;
mod scanner;
mod scorer;
mod types;

pub use aggregate::{summarize, AnalysisSummary};
pub use error::AnalysisError;
pub use job::{AnalysisController, AnalysisRequest, JobState, JobStatus};
pub use scanner::{scan, scan_pair, PairResult, ScanParams, ScanWindow};
pub use scorer::{RiskModel, RiskScore, ScorerError};
pub use types::{ConjunctionCandidate, PairOutcome, RiskLevel, ScanHit};
