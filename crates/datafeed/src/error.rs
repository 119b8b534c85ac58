use thiserror::Error;

#[derive(Error, Debug)]
pub enum FeedError {
    #[error("Database error while loading events: {0}")]
    Database(#[from] sqlx::Error),
}
