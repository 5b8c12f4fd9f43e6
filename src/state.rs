use std::sync::Arc;

use sqlx::SqlitePool;

use crate::answer::AnswerClient;
use crate::services::{CalendarLocks, CalendarService, RegistrationService, SearchService};
use crate::session::SessionStore;

#[derive(Clone)]
pub struct AppState {
    pub db: SqlitePool,
    pub sessions: Arc<dyn SessionStore>,
    pub answers: Arc<dyn AnswerClient>,
    pub locks: CalendarLocks,
    pub cookie_secure: bool,
}

impl AppState {
    pub fn new(
        db: SqlitePool,
        sessions: Arc<dyn SessionStore>,
        answers: Arc<dyn AnswerClient>,
        cookie_secure: bool,
    ) -> Self {
        Self {
            db,
            sessions,
            answers,
            locks: CalendarLocks::new(),
            cookie_secure,
        }
    }

    pub fn registrations(&self) -> RegistrationService {
        RegistrationService::new(self.db.clone(), self.locks.clone())
    }

    pub fn calendars(&self) -> CalendarService {
        CalendarService::new(self.db.clone(), self.locks.clone())
    }

    pub fn search(&self) -> SearchService {
        SearchService::new(self.db.clone(), self.answers.clone())
    }
}
