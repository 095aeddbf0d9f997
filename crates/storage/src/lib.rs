#![forbid(unsafe_code)]

pub mod repository;
pub mod sqlite;

pub use repository::{
    CandidateRecord, CandidateRepository, CandidateResult, InMemoryRepository,
    SessionRepository, Storage, StorageError,
};
