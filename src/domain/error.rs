use std::fmt;

use serde::Serialize;
use thiserror::Error;

/// Entities that can be reported missing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Entity {
    Company,
    User,
    Position,
    Course,
    Lesson,
    Registration,
    Record,
}

impl fmt::Display for Entity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Entity::Company => "company",
            Entity::User => "user",
            Entity::Position => "position",
            Entity::Course => "course",
            Entity::Lesson => "lesson",
            Entity::Registration => "registration",
            Entity::Record => "record",
        };
        f.write_str(name)
    }
}

/// Coarse classification used by the transport layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    NotFound,
    Conflict,
    Validation,
    Unauthorized,
    Internal,
}

/// Closed set of domain failures.
///
/// Storage errors enter this enum only through
/// [`crate::database::constraint::translate`]; services above that boundary
/// return these values unchanged. `Internal` carries no cause; the cause is
/// logged where the error is produced.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DomainError {
    #[error("{0} not found")]
    NotFound(Entity),

    #[error("email already exists")]
    EmailAlreadyExists,

    #[error("course already assigned to position")]
    PositionCourseUsed,

    #[error("position name already used in this company")]
    PositionNameUsed,

    #[error("referenced company does not exist")]
    CompanyReference,

    #[error("referenced position does not exist in this company")]
    PositionReference,

    #[error("referenced leader does not exist")]
    LeaderReference,

    #[error("referenced course does not exist")]
    CourseReference,

    #[error("referenced creator does not exist")]
    CreatorReference,

    #[error("company name must not be empty")]
    CompanyNameNotEmpty,

    #[error("position name must not be empty")]
    PositionNameNotEmpty,

    #[error("course name must not be empty")]
    CourseNameNotEmpty,

    #[error("lesson name must not be empty")]
    LessonNameNotEmpty,

    #[error("{0} is required")]
    MissingField(&'static str),

    #[error("unauthorized")]
    Unauthorized,

    #[error("internal error")]
    Internal,
}

impl DomainError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            DomainError::NotFound(_)
            | DomainError::CompanyReference
            | DomainError::PositionReference
            | DomainError::LeaderReference
            | DomainError::CourseReference
            | DomainError::CreatorReference => ErrorKind::NotFound,

            DomainError::EmailAlreadyExists
            | DomainError::PositionCourseUsed
            | DomainError::PositionNameUsed => ErrorKind::Conflict,

            DomainError::CompanyNameNotEmpty
            | DomainError::PositionNameNotEmpty
            | DomainError::CourseNameNotEmpty
            | DomainError::LessonNameNotEmpty
            | DomainError::MissingField(_) => ErrorKind::Validation,

            DomainError::Unauthorized => ErrorKind::Unauthorized,

            DomainError::Internal => ErrorKind::Internal,
        }
    }

    /// Stable machine-readable code for clients.
    pub fn code(&self) -> &'static str {
        match self {
            DomainError::NotFound(_) => "NOT_FOUND",
            DomainError::EmailAlreadyExists => "EMAIL_ALREADY_EXISTS",
            DomainError::PositionCourseUsed => "POSITION_COURSE_USED",
            DomainError::PositionNameUsed => "POSITION_NAME_USED",
            DomainError::CompanyReference => "COMPANY_REFERENCE",
            DomainError::PositionReference => "POSITION_REFERENCE",
            DomainError::LeaderReference => "LEADER_REFERENCE",
            DomainError::CourseReference => "COURSE_REFERENCE",
            DomainError::CreatorReference => "CREATOR_REFERENCE",
            DomainError::CompanyNameNotEmpty => "COMPANY_NAME_NOT_EMPTY",
            DomainError::PositionNameNotEmpty => "POSITION_NAME_NOT_EMPTY",
            DomainError::CourseNameNotEmpty => "COURSE_NAME_NOT_EMPTY",
            DomainError::LessonNameNotEmpty => "LESSON_NAME_NOT_EMPTY",
            DomainError::MissingField(_) => "MISSING_FIELD",
            DomainError::Unauthorized => "UNAUTHORIZED",
            DomainError::Internal => "INTERNAL",
        }
    }
}

pub type DomainResult<T> = Result<T, DomainError>;
