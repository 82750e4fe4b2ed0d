use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum RegistryError {
    #[error("key already holds slot {0}")]
    AlreadyPresent(u64),
}
