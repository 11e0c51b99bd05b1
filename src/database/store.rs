use async_trait::async_trait;
use uuid::Uuid;

use crate::database::models::{Company, Course, Lesson, Position, User};
use crate::domain::DomainResult;

/// Admin account promoted from a pending registration.
#[derive(Debug, Clone)]
pub struct NewAdmin {
    pub company_name: String,
    pub email: String,
    pub password_hash: String,
}

#[derive(Debug, Clone)]
pub struct NewEmployee {
    pub company_id: Uuid,
    pub email: String,
    pub name: Option<String>,
    pub password_hash: String,
    pub position_id: Option<Uuid>,
    pub leader_id: Option<Uuid>,
}

#[derive(Debug, Clone)]
pub struct NewCourse {
    pub creator_id: Uuid,
    pub name: String,
    pub description: String,
}

#[derive(Debug, Clone)]
pub struct NewLesson {
    pub course_id: Uuid,
    pub name: String,
    pub description: String,
    pub content: String,
    pub ordinal: i32,
}

// Patch types: `None` keeps the stored value.

#[derive(Debug, Clone, Default)]
pub struct CoursePatch {
    pub name: Option<String>,
    pub description: Option<String>,
    pub is_active: Option<bool>,
}

#[derive(Debug, Clone, Default)]
pub struct LessonPatch {
    pub name: Option<String>,
    pub description: Option<String>,
    pub content: Option<String>,
    pub ordinal: Option<i32>,
}

#[derive(Debug, Clone, Default)]
pub struct UserPatch {
    pub name: Option<String>,
    pub leader_id: Option<Uuid>,
    pub is_active: Option<bool>,
}

#[derive(Debug, Clone, Default)]
pub struct CompanyPatch {
    pub name: Option<String>,
    pub is_active: Option<bool>,
}

impl CoursePatch {
    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.description.is_none() && self.is_active.is_none()
    }
}

impl LessonPatch {
    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.description.is_none()
            && self.content.is_none()
            && self.ordinal.is_none()
    }
}

/// Durable storage used by the services.
///
/// Every method returns translated domain errors. Methods that write more than
/// one row run as a single unit of work.
#[async_trait]
pub trait Storage: Send + Sync {
    async fn health_check(&self) -> DomainResult<()>;

    async fn find_company(&self, id: Uuid) -> DomainResult<Company>;
    async fn find_user(&self, id: Uuid) -> DomainResult<User>;
    async fn find_user_by_email(&self, email: &str) -> DomainResult<Option<User>>;
    async fn find_position(&self, id: Uuid) -> DomainResult<Position>;
    async fn find_course(&self, id: Uuid) -> DomainResult<Course>;
    async fn find_lesson(&self, id: Uuid) -> DomainResult<Lesson>;

    /// Create the company and its first admin atomically.
    async fn create_company_with_admin(&self, admin: NewAdmin) -> DomainResult<(Company, User)>;
    async fn create_position(&self, company_id: Uuid, name: &str) -> DomainResult<Position>;
    async fn create_employee(&self, employee: NewEmployee) -> DomainResult<User>;
    async fn create_course(&self, course: NewCourse) -> DomainResult<Course>;
    async fn create_lesson(&self, lesson: NewLesson) -> DomainResult<Lesson>;

    async fn update_course(&self, id: Uuid, patch: CoursePatch) -> DomainResult<Course>;
    async fn update_lesson(&self, id: Uuid, patch: LessonPatch) -> DomainResult<Lesson>;
    async fn update_user(&self, id: Uuid, patch: UserPatch) -> DomainResult<User>;
    async fn update_company(&self, id: Uuid, patch: CompanyPatch) -> DomainResult<Company>;

    /// Link every course to the position, or none of them.
    async fn assign_courses(&self, position_id: Uuid, course_ids: &[Uuid]) -> DomainResult<()>;
    async fn assign_position(&self, user_id: Uuid, position_id: Uuid) -> DomainResult<User>;

    async fn list_positions(&self, company_id: Uuid) -> DomainResult<Vec<Position>>;
    async fn list_courses(&self, company_id: Uuid) -> DomainResult<Vec<Course>>;
    async fn list_position_courses(&self, position_id: Uuid) -> DomainResult<Vec<Course>>;
    async fn list_lessons(&self, course_id: Uuid) -> DomainResult<Vec<Lesson>>;
    async fn list_user_lessons(&self, user_id: Uuid) -> DomainResult<Vec<Lesson>>;
}
