use thiserror::Error;

#[derive(Error, Debug)]
pub enum IndicatorError {
    #[error("Not enough usable spread points to fit a distribution, got {0}")]
    InsufficientData(usize),

    #[error("Distribution fit failed: {0}")]
    FitFailed(String),
}
