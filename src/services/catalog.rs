use std::sync::Arc;

use tracing::{error, info, Span};
use uuid::Uuid;

use crate::auth::password::PasswordHasher;
use crate::database::models::{Company, Course, Lesson, Position, User};
use crate::database::store::{
    CompanyPatch, CoursePatch, LessonPatch, NewCourse, NewEmployee, NewLesson, Storage, UserPatch,
};
use crate::domain::{DomainError, DomainResult};
use crate::services::provisioning::normalize_email;
use crate::services::tenant::TenantGuard;

#[derive(Debug, Clone)]
pub struct EmployeeRequest {
    pub email: String,
    pub password: String,
    pub name: Option<String>,
    pub position_id: Option<Uuid>,
    pub leader_id: Option<Uuid>,
}

#[derive(Debug, Clone)]
pub struct LessonRequest {
    pub name: String,
    pub description: String,
    pub content: String,
    pub ordinal: i32,
}

/// Company-scoped management of positions, staff, courses and lessons.
///
/// Writes require an admin actor. Reads are open to any active member of the
/// company that owns the data.
pub struct CatalogService {
    storage: Arc<dyn Storage>,
    guard: TenantGuard,
    hasher: PasswordHasher,
    span: Span,
}

impl CatalogService {
    pub fn new(
        storage: Arc<dyn Storage>,
        guard: TenantGuard,
        hasher: PasswordHasher,
        span: Span,
    ) -> Self {
        Self {
            storage,
            guard,
            hasher,
            span,
        }
    }

    pub async fn create_position(&self, actor_id: Uuid, name: &str) -> DomainResult<Position> {
        let admin = self.guard.admin(actor_id).await?;
        let position = self.storage.create_position(admin.company_id, name.trim()).await?;
        info!(parent: &self.span, position_id = %position.id, company_id = %admin.company_id, "position created");
        Ok(position)
    }

    pub async fn list_positions(&self, actor_id: Uuid) -> DomainResult<Vec<Position>> {
        let actor = self.guard.actor(actor_id).await?;
        self.storage.list_positions(actor.company_id).await
    }

    pub async fn create_employee(&self, actor_id: Uuid, request: EmployeeRequest) -> DomainResult<User> {
        let email = normalize_email(&request.email);
        if email.is_empty() {
            return Err(DomainError::MissingField("email"));
        }
        if request.password.is_empty() {
            return Err(DomainError::MissingField("password"));
        }

        let admin = self.guard.admin(actor_id).await?;
        if let Some(position_id) = request.position_id {
            self.guard.position_in_company(admin.clone(), position_id).await?;
        }
        if let Some(leader_id) = request.leader_id {
            self.guard.user_in_company(&admin, leader_id).await?;
        }

        let password_hash = self.hasher.hash(&request.password).await.map_err(|e| {
            error!(parent: &self.span, error = %e, "password hashing failed");
            DomainError::Internal
        })?;

        let user = self
            .storage
            .create_employee(NewEmployee {
                company_id: admin.company_id,
                email,
                name: request.name,
                password_hash,
                position_id: request.position_id,
                leader_id: request.leader_id,
            })
            .await?;
        info!(parent: &self.span, user_id = %user.id, company_id = %user.company_id, "employee created");
        Ok(user)
    }

    pub async fn edit_user(&self, actor_id: Uuid, user_id: Uuid, patch: UserPatch) -> DomainResult<User> {
        let admin = self.guard.admin(actor_id).await?;
        self.guard.user_in_company(&admin, user_id).await?;
        if let Some(leader_id) = patch.leader_id {
            if leader_id == user_id {
                return Err(DomainError::LeaderReference);
            }
            self.guard.user_in_company(&admin, leader_id).await?;
        }
        self.storage.update_user(user_id, patch).await
    }

    pub async fn edit_company(&self, actor_id: Uuid, patch: CompanyPatch) -> DomainResult<Company> {
        let admin = self.guard.admin(actor_id).await?;
        let company = self.storage.update_company(admin.company_id, patch).await?;
        info!(parent: &self.span, company_id = %company.id, "company updated");
        Ok(company)
    }

    pub async fn create_course(
        &self,
        actor_id: Uuid,
        name: &str,
        description: &str,
    ) -> DomainResult<Course> {
        let admin = self.guard.admin(actor_id).await?;
        let course = self
            .storage
            .create_course(NewCourse {
                creator_id: admin.id,
                name: name.trim().to_string(),
                description: description.to_string(),
            })
            .await?;
        info!(parent: &self.span, course_id = %course.id, "course created");
        Ok(course)
    }

    /// Fields left `None` in `patch` keep their stored value.
    pub async fn edit_course(
        &self,
        actor_id: Uuid,
        course_id: Uuid,
        patch: CoursePatch,
    ) -> DomainResult<Course> {
        let admin = self.guard.admin(actor_id).await?;
        let course = self.guard.course_in_company(&admin, course_id).await?;
        if patch.is_empty() {
            return Ok(course);
        }
        self.storage.update_course(course_id, patch).await
    }

    pub async fn list_courses(&self, actor_id: Uuid) -> DomainResult<Vec<Course>> {
        let actor = self.guard.actor(actor_id).await?;
        self.storage.list_courses(actor.company_id).await
    }

    pub async fn create_lesson(
        &self,
        actor_id: Uuid,
        course_id: Uuid,
        request: LessonRequest,
    ) -> DomainResult<Lesson> {
        let admin = self.guard.admin(actor_id).await?;
        self.guard.course_in_company(&admin, course_id).await?;
        let lesson = self
            .storage
            .create_lesson(NewLesson {
                course_id,
                name: request.name.trim().to_string(),
                description: request.description,
                content: request.content,
                ordinal: request.ordinal,
            })
            .await?;
        info!(parent: &self.span, lesson_id = %lesson.id, course_id = %course_id, "lesson created");
        Ok(lesson)
    }

    pub async fn edit_lesson(
        &self,
        actor_id: Uuid,
        lesson_id: Uuid,
        patch: LessonPatch,
    ) -> DomainResult<Lesson> {
        let admin = self.guard.admin(actor_id).await?;
        let lesson = self.storage.find_lesson(lesson_id).await?;
        self.guard.course_in_company(&admin, lesson.course_id).await?;
        if patch.is_empty() {
            return Ok(lesson);
        }
        self.storage.update_lesson(lesson_id, patch).await
    }

    pub async fn list_lessons(&self, actor_id: Uuid, course_id: Uuid) -> DomainResult<Vec<Lesson>> {
        self.guard.ensure_course_access(actor_id, course_id).await?;
        self.storage.list_lessons(course_id).await
    }

    /// Lessons reachable through the actor's position.
    pub async fn my_lessons(&self, actor_id: Uuid) -> DomainResult<Vec<Lesson>> {
        let actor = self.guard.actor(actor_id).await?;
        if actor.position_id.is_none() {
            return Ok(Vec::new());
        }
        self.storage.list_user_lessons(actor.id).await
    }
}
