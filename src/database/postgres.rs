use async_trait::async_trait;
use sqlx::PgConnection;
use tracing::debug;
use uuid::Uuid;

use crate::database::constraint::translate_for;
use crate::database::manager::DatabaseManager;
use crate::database::models::{Company, Course, Lesson, Position, User};
use crate::database::store::{
    CompanyPatch, CoursePatch, LessonPatch, NewAdmin, NewCourse, NewEmployee, NewLesson, Storage,
    UserPatch,
};
use crate::domain::{DomainError, DomainResult, Entity};

const COMPANY_COLUMNS: &str = "id, name, is_active, is_deleted, created_at, updated_at";
const USER_COLUMNS: &str = "id, company_id, position_id, leader_id, email, name, password_hash, \
     is_admin, is_active, is_deleted, created_at, updated_at";
const POSITION_COLUMNS: &str = "id, company_id, name, is_active, is_archived, created_at, updated_at";
const COURSE_COLUMNS: &str = "id, creator_id, name, description, is_active, created_at, updated_at";
const LESSON_COLUMNS: &str =
    "id, course_id, name, description, content, ordinal, created_at, updated_at";

/// PostgreSQL implementation of [`Storage`].
#[derive(Clone)]
pub struct PgStorage {
    db: DatabaseManager,
}

impl PgStorage {
    pub fn new(db: DatabaseManager) -> Self {
        Self { db }
    }
}

async fn insert_company(conn: &mut PgConnection, name: &str) -> DomainResult<Company> {
    sqlx::query_as::<_, Company>(&format!(
        "INSERT INTO companies (name) VALUES ($1) RETURNING {COMPANY_COLUMNS}"
    ))
    .bind(name)
    .fetch_one(&mut *conn)
    .await
    .map_err(|e| translate_for(&e, Entity::Company))
}

async fn insert_admin(
    conn: &mut PgConnection,
    company_id: Uuid,
    email: &str,
    password_hash: &str,
) -> DomainResult<User> {
    sqlx::query_as::<_, User>(&format!(
        "INSERT INTO users (company_id, email, password_hash, is_admin) \
         VALUES ($1, $2, $3, TRUE) RETURNING {USER_COLUMNS}"
    ))
    .bind(company_id)
    .bind(email)
    .bind(password_hash)
    .fetch_one(&mut *conn)
    .await
    .map_err(|e| translate_for(&e, Entity::User))
}

async fn lock_lesson(conn: &mut PgConnection, id: Uuid) -> DomainResult<Lesson> {
    sqlx::query_as::<_, Lesson>(&format!(
        "SELECT {LESSON_COLUMNS} FROM lessons WHERE id = $1 FOR UPDATE"
    ))
    .bind(id)
    .fetch_one(&mut *conn)
    .await
    .map_err(|e| translate_for(&e, Entity::Lesson))
}

async fn set_lesson_text(
    conn: &mut PgConnection,
    id: Uuid,
    sql: &str,
    value: &str,
) -> DomainResult<()> {
    sqlx::query(sql)
        .bind(id)
        .bind(value)
        .execute(&mut *conn)
        .await
        .map_err(|e| translate_for(&e, Entity::Lesson))?;
    Ok(())
}

#[async_trait]
impl Storage for PgStorage {
    async fn health_check(&self) -> DomainResult<()> {
        self.db.health_check().await.map_err(|e| {
            tracing::error!(error = %e, "database health check failed");
            DomainError::Internal
        })
    }

    async fn find_company(&self, id: Uuid) -> DomainResult<Company> {
        sqlx::query_as::<_, Company>(&format!(
            "SELECT {COMPANY_COLUMNS} FROM companies WHERE id = $1 AND NOT is_deleted"
        ))
        .bind(id)
        .fetch_one(self.db.pool())
        .await
        .map_err(|e| translate_for(&e, Entity::Company))
    }

    async fn find_user(&self, id: Uuid) -> DomainResult<User> {
        sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE id = $1 AND NOT is_deleted"
        ))
        .bind(id)
        .fetch_one(self.db.pool())
        .await
        .map_err(|e| translate_for(&e, Entity::User))
    }

    async fn find_user_by_email(&self, email: &str) -> DomainResult<Option<User>> {
        sqlx::query_as::<_, User>(&format!("SELECT {USER_COLUMNS} FROM users WHERE email = $1"))
            .bind(email)
            .fetch_optional(self.db.pool())
            .await
            .map_err(|e| translate_for(&e, Entity::User))
    }

    async fn find_position(&self, id: Uuid) -> DomainResult<Position> {
        sqlx::query_as::<_, Position>(&format!(
            "SELECT {POSITION_COLUMNS} FROM positions WHERE id = $1"
        ))
        .bind(id)
        .fetch_one(self.db.pool())
        .await
        .map_err(|e| translate_for(&e, Entity::Position))
    }

    async fn find_course(&self, id: Uuid) -> DomainResult<Course> {
        sqlx::query_as::<_, Course>(&format!("SELECT {COURSE_COLUMNS} FROM courses WHERE id = $1"))
            .bind(id)
            .fetch_one(self.db.pool())
            .await
            .map_err(|e| translate_for(&e, Entity::Course))
    }

    async fn find_lesson(&self, id: Uuid) -> DomainResult<Lesson> {
        sqlx::query_as::<_, Lesson>(&format!("SELECT {LESSON_COLUMNS} FROM lessons WHERE id = $1"))
            .bind(id)
            .fetch_one(self.db.pool())
            .await
            .map_err(|e| translate_for(&e, Entity::Lesson))
    }

    async fn create_company_with_admin(&self, admin: NewAdmin) -> DomainResult<(Company, User)> {
        self.db
            .transaction(move |conn| {
                Box::pin(async move {
                    let company = insert_company(conn, &admin.company_name).await?;
                    let user =
                        insert_admin(conn, company.id, &admin.email, &admin.password_hash).await?;
                    Ok((company, user))
                })
            })
            .await
    }

    async fn create_position(&self, company_id: Uuid, name: &str) -> DomainResult<Position> {
        sqlx::query_as::<_, Position>(&format!(
            "INSERT INTO positions (company_id, name) VALUES ($1, $2) RETURNING {POSITION_COLUMNS}"
        ))
        .bind(company_id)
        .bind(name)
        .fetch_one(self.db.pool())
        .await
        .map_err(|e| translate_for(&e, Entity::Position))
    }

    async fn create_employee(&self, employee: NewEmployee) -> DomainResult<User> {
        sqlx::query_as::<_, User>(&format!(
            "INSERT INTO users (company_id, email, name, password_hash, position_id, leader_id) \
             VALUES ($1, $2, $3, $4, $5, $6) RETURNING {USER_COLUMNS}"
        ))
        .bind(employee.company_id)
        .bind(&employee.email)
        .bind(&employee.name)
        .bind(&employee.password_hash)
        .bind(employee.position_id)
        .bind(employee.leader_id)
        .fetch_one(self.db.pool())
        .await
        .map_err(|e| translate_for(&e, Entity::User))
    }

    async fn create_course(&self, course: NewCourse) -> DomainResult<Course> {
        sqlx::query_as::<_, Course>(&format!(
            "INSERT INTO courses (creator_id, name, description) VALUES ($1, $2, $3) \
             RETURNING {COURSE_COLUMNS}"
        ))
        .bind(course.creator_id)
        .bind(&course.name)
        .bind(&course.description)
        .fetch_one(self.db.pool())
        .await
        .map_err(|e| translate_for(&e, Entity::Course))
    }

    async fn create_lesson(&self, lesson: NewLesson) -> DomainResult<Lesson> {
        sqlx::query_as::<_, Lesson>(&format!(
            "INSERT INTO lessons (course_id, name, description, content, ordinal) \
             VALUES ($1, $2, $3, $4, $5) RETURNING {LESSON_COLUMNS}"
        ))
        .bind(lesson.course_id)
        .bind(&lesson.name)
        .bind(&lesson.description)
        .bind(&lesson.content)
        .bind(lesson.ordinal)
        .fetch_one(self.db.pool())
        .await
        .map_err(|e| translate_for(&e, Entity::Lesson))
    }

    async fn update_course(&self, id: Uuid, patch: CoursePatch) -> DomainResult<Course> {
        self.db
            .transaction(move |conn| {
                Box::pin(async move {
                    sqlx::query("SELECT id FROM courses WHERE id = $1 FOR UPDATE")
                        .bind(id)
                        .fetch_one(&mut *conn)
                        .await
                        .map_err(|e| translate_for(&e, Entity::Course))?;

                    sqlx::query_as::<_, Course>(&format!(
                        "UPDATE courses SET \
                             name = COALESCE($2, name), \
                             description = COALESCE($3, description), \
                             is_active = COALESCE($4, is_active), \
                             updated_at = now() \
                         WHERE id = $1 RETURNING {COURSE_COLUMNS}"
                    ))
                    .bind(id)
                    .bind(&patch.name)
                    .bind(&patch.description)
                    .bind(patch.is_active)
                    .fetch_one(&mut *conn)
                    .await
                    .map_err(|e| translate_for(&e, Entity::Course))
                })
            })
            .await
    }

    async fn update_lesson(&self, id: Uuid, patch: LessonPatch) -> DomainResult<Lesson> {
        self.db
            .transaction(move |conn| {
                Box::pin(async move {
                    let current = lock_lesson(conn, id).await?;
                    if patch.is_empty() {
                        return Ok(current);
                    }

                    if let Some(name) = &patch.name {
                        set_lesson_text(conn, id, "UPDATE lessons SET name = $2 WHERE id = $1", name)
                            .await?;
                    }
                    if let Some(description) = &patch.description {
                        set_lesson_text(
                            conn,
                            id,
                            "UPDATE lessons SET description = $2 WHERE id = $1",
                            description,
                        )
                        .await?;
                    }
                    if let Some(content) = &patch.content {
                        set_lesson_text(
                            conn,
                            id,
                            "UPDATE lessons SET content = $2 WHERE id = $1",
                            content,
                        )
                        .await?;
                    }
                    if let Some(ordinal) = patch.ordinal {
                        sqlx::query("UPDATE lessons SET ordinal = $2 WHERE id = $1")
                            .bind(id)
                            .bind(ordinal)
                            .execute(&mut *conn)
                            .await
                            .map_err(|e| translate_for(&e, Entity::Lesson))?;
                    }

                    sqlx::query_as::<_, Lesson>(&format!(
                        "UPDATE lessons SET updated_at = now() WHERE id = $1 RETURNING {LESSON_COLUMNS}"
                    ))
                    .bind(id)
                    .fetch_one(&mut *conn)
                    .await
                    .map_err(|e| translate_for(&e, Entity::Lesson))
                })
            })
            .await
    }

    async fn update_user(&self, id: Uuid, patch: UserPatch) -> DomainResult<User> {
        sqlx::query_as::<_, User>(&format!(
            "UPDATE users SET \
                 name = COALESCE($2, name), \
                 leader_id = COALESCE($3, leader_id), \
                 is_active = COALESCE($4, is_active), \
                 updated_at = now() \
             WHERE id = $1 AND NOT is_deleted RETURNING {USER_COLUMNS}"
        ))
        .bind(id)
        .bind(&patch.name)
        .bind(patch.leader_id)
        .bind(patch.is_active)
        .fetch_one(self.db.pool())
        .await
        .map_err(|e| translate_for(&e, Entity::User))
    }

    async fn update_company(&self, id: Uuid, patch: CompanyPatch) -> DomainResult<Company> {
        sqlx::query_as::<_, Company>(&format!(
            "UPDATE companies SET \
                 name = COALESCE($2, name), \
                 is_active = COALESCE($3, is_active), \
                 updated_at = now() \
             WHERE id = $1 AND NOT is_deleted RETURNING {COMPANY_COLUMNS}"
        ))
        .bind(id)
        .bind(&patch.name)
        .bind(patch.is_active)
        .fetch_one(self.db.pool())
        .await
        .map_err(|e| translate_for(&e, Entity::Company))
    }

    async fn assign_courses(&self, position_id: Uuid, course_ids: &[Uuid]) -> DomainResult<()> {
        let course_ids = course_ids.to_vec();
        self.db
            .transaction(move |conn| {
                Box::pin(async move {
                    for course_id in &course_ids {
                        sqlx::query(
                            "INSERT INTO position_courses (position_id, course_id) VALUES ($1, $2)",
                        )
                        .bind(position_id)
                        .bind(*course_id)
                        .execute(&mut *conn)
                        .await
                        .map_err(|e| translate_for(&e, Entity::Course))?;
                    }
                    debug!(%position_id, count = course_ids.len(), "assigned courses");
                    Ok(())
                })
            })
            .await
    }

    async fn assign_position(&self, user_id: Uuid, position_id: Uuid) -> DomainResult<User> {
        sqlx::query_as::<_, User>(&format!(
            "UPDATE users SET position_id = $2, updated_at = now() \
             WHERE id = $1 AND NOT is_deleted RETURNING {USER_COLUMNS}"
        ))
        .bind(user_id)
        .bind(position_id)
        .fetch_one(self.db.pool())
        .await
        .map_err(|e| translate_for(&e, Entity::User))
    }

    async fn list_positions(&self, company_id: Uuid) -> DomainResult<Vec<Position>> {
        sqlx::query_as::<_, Position>(&format!(
            "SELECT {POSITION_COLUMNS} FROM positions WHERE company_id = $1 ORDER BY name"
        ))
        .bind(company_id)
        .fetch_all(self.db.pool())
        .await
        .map_err(|e| translate_for(&e, Entity::Position))
    }

    async fn list_courses(&self, company_id: Uuid) -> DomainResult<Vec<Course>> {
        sqlx::query_as::<_, Course>(
            "SELECT c.id, c.creator_id, c.name, c.description, c.is_active, c.created_at, c.updated_at \
             FROM courses c JOIN users u ON u.id = c.creator_id \
             WHERE u.company_id = $1 ORDER BY c.created_at",
        )
        .bind(company_id)
        .fetch_all(self.db.pool())
        .await
        .map_err(|e| translate_for(&e, Entity::Course))
    }

    async fn list_position_courses(&self, position_id: Uuid) -> DomainResult<Vec<Course>> {
        sqlx::query_as::<_, Course>(
            "SELECT c.id, c.creator_id, c.name, c.description, c.is_active, c.created_at, c.updated_at \
             FROM courses c JOIN position_courses pc ON pc.course_id = c.id \
             WHERE pc.position_id = $1 ORDER BY pc.created_at",
        )
        .bind(position_id)
        .fetch_all(self.db.pool())
        .await
        .map_err(|e| translate_for(&e, Entity::Course))
    }

    async fn list_lessons(&self, course_id: Uuid) -> DomainResult<Vec<Lesson>> {
        sqlx::query_as::<_, Lesson>(&format!(
            "SELECT {LESSON_COLUMNS} FROM lessons WHERE course_id = $1 ORDER BY ordinal, created_at"
        ))
        .bind(course_id)
        .fetch_all(self.db.pool())
        .await
        .map_err(|e| translate_for(&e, Entity::Lesson))
    }

    async fn list_user_lessons(&self, user_id: Uuid) -> DomainResult<Vec<Lesson>> {
        sqlx::query_as::<_, Lesson>(
            "SELECT l.id, l.course_id, l.name, l.description, l.content, l.ordinal, \
                    l.created_at, l.updated_at \
             FROM lessons l \
             JOIN position_courses pc ON pc.course_id = l.course_id \
             JOIN users u ON u.position_id = pc.position_id \
             WHERE u.id = $1 \
             ORDER BY pc.created_at, l.ordinal",
        )
        .bind(user_id)
        .fetch_all(self.db.pool())
        .await
        .map_err(|e| translate_for(&e, Entity::Lesson))
    }
}
