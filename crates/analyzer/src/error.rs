use thiserror::Error;

#[derive(Error, Debug)]
pub enum AnalyzerError {
    #[error("No runs of strategy '{strategy}' carry parameter '{parameter}'")]
    NoMatchingRuns { strategy: String, parameter: String },
}
