// Translation of backend failures into the domain taxonomy.
//
// This is the only place a `sqlx::Error` or `CacheError` becomes a `DomainError`. The table
// below must track the constraint names in migrations/.

use tracing::error;

use crate::cache::CacheError;
use crate::domain::{DomainError, Entity};

/// Named constraints with a known domain meaning.
pub const CONSTRAINT_MAP: &[(&str, DomainError)] = &[
    ("users_email_key", DomainError::EmailAlreadyExists),
    ("users_company_id_fkey", DomainError::CompanyReference),
    ("users_position_company_fkey", DomainError::PositionReference),
    ("users_leader_id_fkey", DomainError::LeaderReference),
    ("companies_name_not_empty", DomainError::CompanyNameNotEmpty),
    ("positions_company_id_fkey", DomainError::CompanyReference),
    ("positions_company_id_name_key", DomainError::PositionNameUsed),
    ("positions_name_not_empty", DomainError::PositionNameNotEmpty),
    ("courses_creator_id_fkey", DomainError::CreatorReference),
    ("courses_name_not_empty", DomainError::CourseNameNotEmpty),
    ("lessons_course_id_fkey", DomainError::CourseReference),
    ("lessons_name_not_empty", DomainError::LessonNameNotEmpty),
    ("position_courses_pkey", DomainError::PositionCourseUsed),
    ("position_courses_position_id_fkey", DomainError::PositionReference),
    ("position_courses_course_id_fkey", DomainError::CourseReference),
];

/// Look up a constraint name in [`CONSTRAINT_MAP`].
pub fn translate_constraint(name: &str) -> Option<DomainError> {
    CONSTRAINT_MAP
        .iter()
        .find(|(constraint, _)| *constraint == name)
        .map(|(_, mapped)| mapped.clone())
}

/// Translate a backend error, treating a missing row as a generic record.
pub fn translate(err: &sqlx::Error) -> DomainError {
    translate_for(err, Entity::Record)
}

/// Translate a backend error raised while reading or writing `entity`.
///
/// Never panics. Anything without a mapping becomes `Internal` and the cause
/// is logged here.
pub fn translate_for(err: &sqlx::Error, entity: Entity) -> DomainError {
    match err {
        sqlx::Error::RowNotFound => DomainError::NotFound(entity),
        sqlx::Error::Database(db_err) => {
            if let Some(mapped) = db_err.constraint().and_then(translate_constraint) {
                return mapped;
            }
            let code = db_err.code();
            error!(
                constraint = db_err.constraint().unwrap_or("<none>"),
                code = code.as_deref().unwrap_or("<none>"),
                message = db_err.message(),
                "unmapped database error"
            );
            DomainError::Internal
        }
        other => {
            error!(error = %other, "storage backend failure");
            DomainError::Internal
        }
    }
}

/// Cache backend failures are never classified further.
pub fn translate_cache(err: &CacheError) -> DomainError {
    error!(error = %err, "cache backend failure");
    DomainError::Internal
}
