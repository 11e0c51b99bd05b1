use std::sync::Arc;

use uuid::Uuid;

use crate::database::models::{Course, Position, User};
use crate::database::store::Storage;
use crate::domain::{DomainError, DomainResult, Entity};

/// Acting user together with a position of the same company.
#[derive(Debug, Clone)]
pub struct TenantScope {
    pub actor: User,
    pub position: Position,
}

/// Confirms that an actor and a target resource belong to the same company.
///
/// Every check here completes before the caller issues a write, so a
/// cross-tenant request never reaches a constraint whose name could leak.
#[derive(Clone)]
pub struct TenantGuard {
    storage: Arc<dyn Storage>,
}

impl TenantGuard {
    pub fn new(storage: Arc<dyn Storage>) -> Self {
        Self { storage }
    }

    /// The acting user, which must exist and be allowed to sign in.
    pub async fn actor(&self, actor_id: Uuid) -> DomainResult<User> {
        let actor = self.storage.find_user(actor_id).await?;
        if !actor.can_sign_in() {
            return Err(DomainError::Unauthorized);
        }
        Ok(actor)
    }

    pub async fn admin(&self, actor_id: Uuid) -> DomainResult<User> {
        let actor = self.actor(actor_id).await?;
        if !actor.is_admin {
            return Err(DomainError::Unauthorized);
        }
        Ok(actor)
    }

    pub async fn ensure_position_access(
        &self,
        actor_id: Uuid,
        position_id: Uuid,
    ) -> DomainResult<TenantScope> {
        let actor = self.actor(actor_id).await?;
        self.position_in_company(actor, position_id).await
    }

    /// Same as [`Self::ensure_position_access`] for an actor already loaded.
    pub async fn position_in_company(
        &self,
        actor: User,
        position_id: Uuid,
    ) -> DomainResult<TenantScope> {
        let position = self.storage.find_position(position_id).await?;
        if position.company_id != actor.company_id {
            return Err(DomainError::Unauthorized);
        }
        Ok(TenantScope { actor, position })
    }

    pub async fn ensure_course_access(&self, actor_id: Uuid, course_id: Uuid) -> DomainResult<Course> {
        let actor = self.actor(actor_id).await?;
        self.course_in_company(&actor, course_id).await
    }

    pub async fn ensure_user_access(&self, actor_id: Uuid, user_id: Uuid) -> DomainResult<User> {
        let actor = self.actor(actor_id).await?;
        self.user_in_company(&actor, user_id).await
    }

    /// A course belongs to the company of its creator.
    pub async fn course_in_company(&self, actor: &User, course_id: Uuid) -> DomainResult<Course> {
        let course = self.storage.find_course(course_id).await?;
        let creator = match self.storage.find_user(course.creator_id).await {
            Ok(creator) => creator,
            Err(DomainError::NotFound(Entity::User)) => {
                return Err(DomainError::NotFound(Entity::Course))
            }
            Err(other) => return Err(other),
        };
        if creator.company_id != actor.company_id {
            return Err(DomainError::Unauthorized);
        }
        Ok(course)
    }

    pub async fn user_in_company(&self, actor: &User, user_id: Uuid) -> DomainResult<User> {
        let user = self.storage.find_user(user_id).await?;
        if user.company_id != actor.company_id {
            return Err(DomainError::Unauthorized);
        }
        Ok(user)
    }
}
