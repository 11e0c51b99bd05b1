pub mod error;

pub use error::{DomainError, DomainResult, Entity, ErrorKind};
