use thiserror::Error;

#[derive(Error, Debug)]
pub enum BacktesterError {
    #[error("Strategy construction failed: {0}")]
    Strategy(#[from] strategies::StrategyError),

    #[error("Event feed error: {0}")]
    Feed(#[from] datafeed::FeedError),

    #[error("Strategy specification has no 'strategy' name: {0}")]
    MissingStrategyName(String),
}
