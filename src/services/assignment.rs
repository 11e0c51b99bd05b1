use std::sync::Arc;

use tracing::{info, Span};
use uuid::Uuid;

use crate::database::models::{Course, User};
use crate::database::store::Storage;
use crate::domain::{DomainError, DomainResult};
use crate::services::tenant::TenantGuard;

/// Position↔course and user↔position linkage.
///
/// Tenant checks run first; duplicate links are rejected by the storage
/// uniqueness constraint, never by a read-before-write.
pub struct AssignmentService {
    storage: Arc<dyn Storage>,
    guard: TenantGuard,
    span: Span,
}

impl AssignmentService {
    pub fn new(storage: Arc<dyn Storage>, guard: TenantGuard, span: Span) -> Self {
        Self {
            storage,
            guard,
            span,
        }
    }

    pub async fn assign_course(
        &self,
        actor_id: Uuid,
        position_id: Uuid,
        course_id: Uuid,
    ) -> DomainResult<()> {
        self.assign_courses(actor_id, position_id, &[course_id]).await
    }

    /// Link all `course_ids` to the position in one unit of work.
    pub async fn assign_courses(
        &self,
        actor_id: Uuid,
        position_id: Uuid,
        course_ids: &[Uuid],
    ) -> DomainResult<()> {
        if course_ids.is_empty() {
            return Err(DomainError::MissingField("course_ids"));
        }

        let admin = self.guard.admin(actor_id).await?;
        let scope = self.guard.position_in_company(admin, position_id).await?;
        for course_id in course_ids {
            self.guard.course_in_company(&scope.actor, *course_id).await?;
        }

        self.storage.assign_courses(position_id, course_ids).await?;
        info!(
            parent: &self.span,
            actor_id = %actor_id,
            position_id = %position_id,
            count = course_ids.len(),
            "courses assigned"
        );
        Ok(())
    }

    pub async fn assign_position(
        &self,
        actor_id: Uuid,
        user_id: Uuid,
        position_id: Uuid,
    ) -> DomainResult<User> {
        let admin = self.guard.admin(actor_id).await?;
        self.guard.user_in_company(&admin, user_id).await?;
        self.guard.position_in_company(admin, position_id).await?;

        let user = self.storage.assign_position(user_id, position_id).await?;
        info!(parent: &self.span, user_id = %user_id, position_id = %position_id, "position assigned");
        Ok(user)
    }

    pub async fn position_courses(
        &self,
        actor_id: Uuid,
        position_id: Uuid,
    ) -> DomainResult<Vec<Course>> {
        self.guard.ensure_position_access(actor_id, position_id).await?;
        self.storage.list_position_courses(position_id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::models::Position;
    use crate::database::store::{NewAdmin, NewCourse, NewEmployee};
    use crate::domain::Entity;
    use crate::testing::MemoryStorage;

    struct Tenant {
        admin: User,
        position: Position,
        course: Course,
    }

    async fn tenant(storage: &MemoryStorage, email: &str, company: &str) -> Tenant {
        let (_, admin) = storage
            .create_company_with_admin(NewAdmin {
                company_name: company.into(),
                email: email.into(),
                password_hash: "hash".into(),
            })
            .await
            .unwrap();
        let position = storage.create_position(admin.company_id, "P1").await.unwrap();
        let course = storage
            .create_course(NewCourse {
                creator_id: admin.id,
                name: "X".into(),
                description: "intro".into(),
            })
            .await
            .unwrap();
        Tenant {
            admin,
            position,
            course,
        }
    }

    fn service(storage: &Arc<MemoryStorage>) -> AssignmentService {
        AssignmentService::new(storage.clone(), TenantGuard::new(storage.clone()), Span::none())
    }

    #[tokio::test]
    async fn double_assignment_is_a_conflict() {
        let storage = Arc::new(MemoryStorage::new());
        let t = tenant(&storage, "a@x.com", "C1").await;
        let service = service(&storage);

        service.assign_course(t.admin.id, t.position.id, t.course.id).await.unwrap();
        assert_eq!(
            service.assign_course(t.admin.id, t.position.id, t.course.id).await.unwrap_err(),
            DomainError::PositionCourseUsed
        );

        let courses = service.position_courses(t.admin.id, t.position.id).await.unwrap();
        assert_eq!(courses.len(), 1);
        assert_eq!(courses[0].id, t.course.id);
    }

    #[tokio::test]
    async fn cross_company_assignment_is_unauthorized() {
        let storage = Arc::new(MemoryStorage::new());
        let ours = tenant(&storage, "a@x.com", "C1").await;
        let theirs = tenant(&storage, "b@y.com", "C2").await;
        let service = service(&storage);

        assert_eq!(
            service
                .assign_course(ours.admin.id, theirs.position.id, ours.course.id)
                .await
                .unwrap_err(),
            DomainError::Unauthorized
        );
        assert_eq!(
            service
                .assign_course(ours.admin.id, ours.position.id, theirs.course.id)
                .await
                .unwrap_err(),
            DomainError::Unauthorized
        );
        assert!(storage.list_position_courses(theirs.position.id).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn bulk_assignment_is_all_or_nothing() {
        let storage = Arc::new(MemoryStorage::new());
        let t = tenant(&storage, "a@x.com", "C1").await;
        let second = storage
            .create_course(NewCourse {
                creator_id: t.admin.id,
                name: "Y".into(),
                description: String::new(),
            })
            .await
            .unwrap();
        let service = service(&storage);

        service.assign_course(t.admin.id, t.position.id, t.course.id).await.unwrap();
        assert_eq!(
            service
                .assign_courses(t.admin.id, t.position.id, &[second.id, t.course.id])
                .await
                .unwrap_err(),
            DomainError::PositionCourseUsed
        );

        let courses = storage.list_position_courses(t.position.id).await.unwrap();
        assert_eq!(courses.len(), 1);
        assert_eq!(courses[0].id, t.course.id);
    }

    #[tokio::test]
    async fn employees_cannot_assign() {
        let storage = Arc::new(MemoryStorage::new());
        let t = tenant(&storage, "a@x.com", "C1").await;
        let employee = storage
            .create_employee(NewEmployee {
                company_id: t.admin.company_id,
                email: "e@x.com".into(),
                name: None,
                password_hash: "hash".into(),
                position_id: None,
                leader_id: None,
            })
            .await
            .unwrap();

        assert_eq!(
            service(&storage)
                .assign_course(employee.id, t.position.id, t.course.id)
                .await
                .unwrap_err(),
            DomainError::Unauthorized
        );
    }

    #[tokio::test]
    async fn missing_course_is_not_found() {
        let storage = Arc::new(MemoryStorage::new());
        let t = tenant(&storage, "a@x.com", "C1").await;
        assert_eq!(
            service(&storage)
                .assign_course(t.admin.id, t.position.id, Uuid::new_v4())
                .await
                .unwrap_err(),
            DomainError::NotFound(Entity::Course)
        );
    }

    #[tokio::test]
    async fn position_assignment_stays_in_company() {
        let storage = Arc::new(MemoryStorage::new());
        let ours = tenant(&storage, "a@x.com", "C1").await;
        let theirs = tenant(&storage, "b@y.com", "C2").await;
        let service = service(&storage);

        let user = service
            .assign_position(ours.admin.id, ours.admin.id, ours.position.id)
            .await
            .unwrap();
        assert_eq!(user.position_id, Some(ours.position.id));

        assert_eq!(
            service
                .assign_position(ours.admin.id, ours.admin.id, theirs.position.id)
                .await
                .unwrap_err(),
            DomainError::Unauthorized
        );
        assert_eq!(
            service
                .assign_position(ours.admin.id, theirs.admin.id, ours.position.id)
                .await
                .unwrap_err(),
            DomainError::Unauthorized
        );
    }
}
