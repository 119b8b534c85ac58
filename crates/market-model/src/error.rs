use thiserror::Error;

#[derive(Error, Debug)]
pub enum ModelError {
    #[error("Unknown option type '{0}', expected CALL or PUT")]
    UnknownOptionType(String),
}
