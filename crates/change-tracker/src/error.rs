use thiserror::Error;

pub type Result<T> = std::result::Result<T, ChangeTrackerError>;

#[derive(Error, Debug)]
pub enum ChangeTrackerError {
    #[error("Hash store error: {0}")]
    StoreError(#[from] crate::store::StoreError),
}
