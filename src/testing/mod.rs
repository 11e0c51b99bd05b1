//! In-process collaborators for unit and integration tests.
//!
//! `MemoryStorage` enforces the same uniqueness, reference, and non-empty rules
//! as the Postgres schema and reports them with the same domain errors. Writes
//! that touch several rows apply to a copy of the state which is swapped in only
//! when every step succeeds.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use chrono::Utc;
use uuid::Uuid;

use crate::database::models::{Company, Course, Lesson, Position, User};
use crate::database::store::{
    CompanyPatch, CoursePatch, LessonPatch, NewAdmin, NewCourse, NewEmployee, NewLesson, Storage,
    UserPatch,
};
use crate::domain::{DomainError, DomainResult, Entity};
use crate::mail::{MailError, Mailer};

#[derive(Debug, Clone, Default)]
struct State {
    companies: Vec<Company>,
    users: Vec<User>,
    positions: Vec<Position>,
    courses: Vec<Course>,
    lessons: Vec<Lesson>,
    /// (position_id, course_id) in insertion order.
    links: Vec<(Uuid, Uuid)>,
}

/// Mirrors the schema's `btrim(name) <> ''` checks, which strip spaces only.
fn blank(value: &str) -> bool {
    value.trim_matches(' ').is_empty()
}

impl State {
    fn company(&self, id: Uuid) -> DomainResult<&Company> {
        self.companies
            .iter()
            .find(|c| c.id == id && !c.is_deleted)
            .ok_or(DomainError::NotFound(Entity::Company))
    }

    fn user(&self, id: Uuid) -> DomainResult<&User> {
        self.users
            .iter()
            .find(|u| u.id == id && !u.is_deleted)
            .ok_or(DomainError::NotFound(Entity::User))
    }

    fn position(&self, id: Uuid) -> DomainResult<&Position> {
        self.positions
            .iter()
            .find(|p| p.id == id)
            .ok_or(DomainError::NotFound(Entity::Position))
    }

    fn course(&self, id: Uuid) -> DomainResult<&Course> {
        self.courses
            .iter()
            .find(|c| c.id == id)
            .ok_or(DomainError::NotFound(Entity::Course))
    }

    fn insert_company(&mut self, name: &str) -> DomainResult<Company> {
        if blank(name) {
            return Err(DomainError::CompanyNameNotEmpty);
        }
        let now = Utc::now();
        let company = Company {
            id: Uuid::new_v4(),
            name: name.to_string(),
            is_active: true,
            is_deleted: false,
            created_at: now,
            updated_at: now,
        };
        self.companies.push(company.clone());
        Ok(company)
    }

    fn insert_user(&mut self, employee: NewEmployee, is_admin: bool) -> DomainResult<User> {
        if self.users.iter().any(|u| u.email == employee.email) {
            return Err(DomainError::EmailAlreadyExists);
        }
        if !self.companies.iter().any(|c| c.id == employee.company_id) {
            return Err(DomainError::CompanyReference);
        }
        if let Some(position_id) = employee.position_id {
            let matches = self
                .positions
                .iter()
                .any(|p| p.id == position_id && p.company_id == employee.company_id);
            if !matches {
                return Err(DomainError::PositionReference);
            }
        }
        if let Some(leader_id) = employee.leader_id {
            if !self.users.iter().any(|u| u.id == leader_id) {
                return Err(DomainError::LeaderReference);
            }
        }

        let now = Utc::now();
        let user = User {
            id: Uuid::new_v4(),
            company_id: employee.company_id,
            position_id: employee.position_id,
            leader_id: employee.leader_id,
            email: employee.email,
            name: employee.name,
            password_hash: employee.password_hash,
            is_admin,
            is_active: true,
            is_deleted: false,
            created_at: now,
            updated_at: now,
        };
        self.users.push(user.clone());
        Ok(user)
    }
}

/// Storage backed by a mutex-guarded set of vectors.
#[derive(Debug, Default)]
pub struct MemoryStorage {
    state: Mutex<State>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn user_count(&self) -> usize {
        self.lock().users.len()
    }

    pub fn company_count(&self) -> usize {
        self.lock().companies.len()
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        // A panicking test thread must not hide the state from the others.
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Run `work` against a copy of the state and keep the copy only on success.
    fn unit_of_work<T>(&self, work: impl FnOnce(&mut State) -> DomainResult<T>) -> DomainResult<T> {
        let mut guard = self.lock();
        let mut draft = guard.clone();
        let out = work(&mut draft)?;
        *guard = draft;
        Ok(out)
    }
}

#[async_trait]
impl Storage for MemoryStorage {
    async fn health_check(&self) -> DomainResult<()> {
        Ok(())
    }

    async fn find_company(&self, id: Uuid) -> DomainResult<Company> {
        self.lock().company(id).cloned()
    }

    async fn find_user(&self, id: Uuid) -> DomainResult<User> {
        self.lock().user(id).cloned()
    }

    async fn find_user_by_email(&self, email: &str) -> DomainResult<Option<User>> {
        Ok(self.lock().users.iter().find(|u| u.email == email).cloned())
    }

    async fn find_position(&self, id: Uuid) -> DomainResult<Position> {
        self.lock().position(id).cloned()
    }

    async fn find_course(&self, id: Uuid) -> DomainResult<Course> {
        self.lock().course(id).cloned()
    }

    async fn find_lesson(&self, id: Uuid) -> DomainResult<Lesson> {
        self.lock()
            .lessons
            .iter()
            .find(|l| l.id == id)
            .cloned()
            .ok_or(DomainError::NotFound(Entity::Lesson))
    }

    async fn create_company_with_admin(&self, admin: NewAdmin) -> DomainResult<(Company, User)> {
        self.unit_of_work(|state| {
            let company = state.insert_company(&admin.company_name)?;
            let user = state.insert_user(
                NewEmployee {
                    company_id: company.id,
                    email: admin.email,
                    name: None,
                    password_hash: admin.password_hash,
                    position_id: None,
                    leader_id: None,
                },
                true,
            )?;
            Ok((company, user))
        })
    }

    async fn create_position(&self, company_id: Uuid, name: &str) -> DomainResult<Position> {
        self.unit_of_work(|state| {
            if blank(name) {
                return Err(DomainError::PositionNameNotEmpty);
            }
            if !state.companies.iter().any(|c| c.id == company_id) {
                return Err(DomainError::CompanyReference);
            }
            if state
                .positions
                .iter()
                .any(|p| p.company_id == company_id && p.name == name)
            {
                return Err(DomainError::PositionNameUsed);
            }
            let now = Utc::now();
            let position = Position {
                id: Uuid::new_v4(),
                company_id,
                name: name.to_string(),
                is_active: true,
                is_archived: false,
                created_at: now,
                updated_at: now,
            };
            state.positions.push(position.clone());
            Ok(position)
        })
    }

    async fn create_employee(&self, employee: NewEmployee) -> DomainResult<User> {
        self.unit_of_work(|state| state.insert_user(employee, false))
    }

    async fn create_course(&self, course: NewCourse) -> DomainResult<Course> {
        self.unit_of_work(|state| {
            if blank(&course.name) {
                return Err(DomainError::CourseNameNotEmpty);
            }
            if !state.users.iter().any(|u| u.id == course.creator_id) {
                return Err(DomainError::CreatorReference);
            }
            let now = Utc::now();
            let course = Course {
                id: Uuid::new_v4(),
                creator_id: course.creator_id,
                name: course.name,
                description: course.description,
                is_active: true,
                created_at: now,
                updated_at: now,
            };
            state.courses.push(course.clone());
            Ok(course)
        })
    }

    async fn create_lesson(&self, lesson: NewLesson) -> DomainResult<Lesson> {
        self.unit_of_work(|state| {
            if blank(&lesson.name) {
                return Err(DomainError::LessonNameNotEmpty);
            }
            if !state.courses.iter().any(|c| c.id == lesson.course_id) {
                return Err(DomainError::CourseReference);
            }
            let now = Utc::now();
            let lesson = Lesson {
                id: Uuid::new_v4(),
                course_id: lesson.course_id,
                name: lesson.name,
                description: lesson.description,
                content: lesson.content,
                ordinal: lesson.ordinal,
                created_at: now,
                updated_at: now,
            };
            state.lessons.push(lesson.clone());
            Ok(lesson)
        })
    }

    async fn update_course(&self, id: Uuid, patch: CoursePatch) -> DomainResult<Course> {
        self.unit_of_work(|state| {
            let course = state
                .courses
                .iter_mut()
                .find(|c| c.id == id)
                .ok_or(DomainError::NotFound(Entity::Course))?;
            if let Some(name) = patch.name {
                if blank(&name) {
                    return Err(DomainError::CourseNameNotEmpty);
                }
                course.name = name;
            }
            if let Some(description) = patch.description {
                course.description = description;
            }
            if let Some(is_active) = patch.is_active {
                course.is_active = is_active;
            }
            course.updated_at = Utc::now();
            Ok(course.clone())
        })
    }

    async fn update_lesson(&self, id: Uuid, patch: LessonPatch) -> DomainResult<Lesson> {
        self.unit_of_work(|state| {
            let lesson = state
                .lessons
                .iter_mut()
                .find(|l| l.id == id)
                .ok_or(DomainError::NotFound(Entity::Lesson))?;
            if let Some(name) = patch.name {
                if blank(&name) {
                    return Err(DomainError::LessonNameNotEmpty);
                }
                lesson.name = name;
            }
            if let Some(description) = patch.description {
                lesson.description = description;
            }
            if let Some(content) = patch.content {
                lesson.content = content;
            }
            if let Some(ordinal) = patch.ordinal {
                lesson.ordinal = ordinal;
            }
            lesson.updated_at = Utc::now();
            Ok(lesson.clone())
        })
    }

    async fn update_user(&self, id: Uuid, patch: UserPatch) -> DomainResult<User> {
        self.unit_of_work(|state| {
            if let Some(leader_id) = patch.leader_id {
                if !state.users.iter().any(|u| u.id == leader_id) {
                    return Err(DomainError::LeaderReference);
                }
            }
            let user = state
                .users
                .iter_mut()
                .find(|u| u.id == id && !u.is_deleted)
                .ok_or(DomainError::NotFound(Entity::User))?;
            if let Some(name) = patch.name {
                user.name = Some(name);
            }
            if let Some(leader_id) = patch.leader_id {
                user.leader_id = Some(leader_id);
            }
            if let Some(is_active) = patch.is_active {
                user.is_active = is_active;
            }
            user.updated_at = Utc::now();
            Ok(user.clone())
        })
    }

    async fn update_company(&self, id: Uuid, patch: CompanyPatch) -> DomainResult<Company> {
        self.unit_of_work(|state| {
            let company = state
                .companies
                .iter_mut()
                .find(|c| c.id == id && !c.is_deleted)
                .ok_or(DomainError::NotFound(Entity::Company))?;
            if let Some(name) = patch.name {
                if blank(&name) {
                    return Err(DomainError::CompanyNameNotEmpty);
                }
                company.name = name;
            }
            if let Some(is_active) = patch.is_active {
                company.is_active = is_active;
            }
            company.updated_at = Utc::now();
            Ok(company.clone())
        })
    }

    async fn assign_courses(&self, position_id: Uuid, course_ids: &[Uuid]) -> DomainResult<()> {
        self.unit_of_work(|state| {
            for course_id in course_ids {
                if state.links.contains(&(position_id, *course_id)) {
                    return Err(DomainError::PositionCourseUsed);
                }
                if !state.positions.iter().any(|p| p.id == position_id) {
                    return Err(DomainError::PositionReference);
                }
                if !state.courses.iter().any(|c| c.id == *course_id) {
                    return Err(DomainError::CourseReference);
                }
                state.links.push((position_id, *course_id));
            }
            Ok(())
        })
    }

    async fn assign_position(&self, user_id: Uuid, position_id: Uuid) -> DomainResult<User> {
        self.unit_of_work(|state| {
            let company_id = state.position(position_id).map(|p| p.company_id);
            let user = state
                .users
                .iter_mut()
                .find(|u| u.id == user_id && !u.is_deleted)
                .ok_or(DomainError::NotFound(Entity::User))?;
            if company_id.ok() != Some(user.company_id) {
                return Err(DomainError::PositionReference);
            }
            user.position_id = Some(position_id);
            user.updated_at = Utc::now();
            Ok(user.clone())
        })
    }

    async fn list_positions(&self, company_id: Uuid) -> DomainResult<Vec<Position>> {
        let mut positions: Vec<Position> = self
            .lock()
            .positions
            .iter()
            .filter(|p| p.company_id == company_id)
            .cloned()
            .collect();
        positions.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(positions)
    }

    async fn list_courses(&self, company_id: Uuid) -> DomainResult<Vec<Course>> {
        let state = self.lock();
        Ok(state
            .courses
            .iter()
            .filter(|c| {
                state
                    .users
                    .iter()
                    .any(|u| u.id == c.creator_id && u.company_id == company_id)
            })
            .cloned()
            .collect())
    }

    async fn list_position_courses(&self, position_id: Uuid) -> DomainResult<Vec<Course>> {
        let state = self.lock();
        Ok(state
            .links
            .iter()
            .filter(|(p, _)| *p == position_id)
            .filter_map(|(_, course_id)| state.course(*course_id).ok().cloned())
            .collect())
    }

    async fn list_lessons(&self, course_id: Uuid) -> DomainResult<Vec<Lesson>> {
        let mut lessons: Vec<Lesson> = self
            .lock()
            .lessons
            .iter()
            .filter(|l| l.course_id == course_id)
            .cloned()
            .collect();
        // Stable sort keeps creation order among equal ordinals.
        lessons.sort_by_key(|l| l.ordinal);
        Ok(lessons)
    }

    async fn list_user_lessons(&self, user_id: Uuid) -> DomainResult<Vec<Lesson>> {
        let state = self.lock();
        let Some(position_id) = state.user(user_id).ok().and_then(|u| u.position_id) else {
            return Ok(Vec::new());
        };
        let mut out = Vec::new();
        for (_, course_id) in state.links.iter().filter(|(p, _)| *p == position_id) {
            let mut lessons: Vec<Lesson> = state
                .lessons
                .iter()
                .filter(|l| l.course_id == *course_id)
                .cloned()
                .collect();
            lessons.sort_by_key(|l| l.ordinal);
            out.extend(lessons);
        }
        Ok(out)
    }
}

#[derive(Debug, Clone)]
pub struct SentEmail {
    pub address: String,
    pub subject: String,
    pub body: String,
}

/// Mailer that keeps every message it accepts.
#[derive(Debug, Default)]
pub struct RecordingMailer {
    sent: Mutex<Vec<SentEmail>>,
    failing: AtomicBool,
}

impl RecordingMailer {
    pub fn new() -> Self {
        Self::default()
    }

    /// While set, every send fails with a transport error.
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    pub fn sent_count(&self) -> usize {
        self.messages().len()
    }

    pub fn messages(&self) -> Vec<SentEmail> {
        self.sent
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    /// The six-digit code from the latest message sent to `address`.
    pub fn last_code_for(&self, address: &str) -> Option<String> {
        let messages = self.messages();
        let message = messages.iter().rev().find(|m| m.address == address)?;
        message
            .body
            .split(|c: char| !c.is_ascii_digit())
            .filter(|run| run.len() == 6)
            .last()
            .map(str::to_string)
    }
}

#[async_trait]
impl Mailer for RecordingMailer {
    async fn send_email(&self, address: &str, subject: &str, body: &str) -> Result<(), MailError> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(MailError::Transport("connection refused".to_string()));
        }
        self.sent
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push(SentEmail {
                address: address.to_string(),
                subject: subject.to_string(),
                body: body.to_string(),
            });
        Ok(())
    }
}
