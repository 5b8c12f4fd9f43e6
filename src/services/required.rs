use tracing::{debug, info, warn};

use crate::db::required;
use crate::error::AppError;
use crate::models::{CalendarId, ErrorEntry, RequiredOutcome, UserId};
use crate::services::guard;
use crate::services::registration::{Placement, RegistrationService};

/// Qualifier tokens removed from a calendar's department before matching.
const DEPARTMENT_QUALIFIERS: [&str; 2] = ["学部", "Department"];

/// Turns a department tag into the fragment matched against required-course
/// rows, e.g. `社会情報学部` → `社会情報`.
pub fn department_search_key(department: &str) -> String {
    let mut key = department.to_string();
    for qualifier in DEPARTMENT_QUALIFIERS {
        key = key.replace(qualifier, "");
    }
    key.trim().to_string()
}

impl RegistrationService {
    /// Registers the mandatory courses of the calendar's primary department
    /// for `grade`. Slot conflicts and duplicates are counted as skipped.
    pub async fn register_required(
        &self,
        caller: UserId,
        calendar_id: CalendarId,
        grade: i64,
    ) -> Result<RequiredOutcome, AppError> {
        let (_lock, calendar) = guard::lock_owned(self.db(), self.locks(), calendar_id, caller).await?;

        let department = calendar
            .primary_department()
            .ok_or_else(|| AppError::Validation("calendar has no department set".to_string()))?;
        let key = department_search_key(department);
        if key.is_empty() {
            return Err(AppError::Validation(format!(
                "department '{department}' has no searchable name"
            )));
        }

        let rows = required::query_required(self.db(), &key, grade).await?;
        let mut outcome = RequiredOutcome::default();
        if rows.is_empty() {
            info!("no required courses for '{}' grade {}", key, grade);
            return Ok(outcome);
        }

        for row in rows {
            match self.place(calendar_id, row.course_id).await {
                Ok(Placement::Inserted) => outcome.registered += 1,
                Ok(Placement::Collided(_)) => {
                    debug!("required course {} skipped in calendar {}", row.course_id, calendar_id);
                    outcome.skipped += 1;
                }
                Err(e) => {
                    warn!("required course {} failed in calendar {}: {}", row.course_id, calendar_id, e);
                    outcome.errors.push(ErrorEntry {
                        course_id: row.course_id,
                        error: e.to_string(),
                    });
                }
            }
        }

        info!(
            "calendar {}: required courses registered={} skipped={} errors={}",
            calendar_id,
            outcome.registered,
            outcome.skipped,
            outcome.errors.len()
        );
        Ok(outcome)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{connect_in_memory, required::insert_required};
    use crate::services::locks::CalendarLocks;
    use crate::test_support::{seed_calendar, seed_courses, seed_user};

    #[test]
    fn test_department_search_key() {
        assert_eq!(department_search_key("社会情報学部"), "社会情報");
        assert_eq!(department_search_key("Social Informatics Department"), "Social Informatics");
        assert_eq!(department_search_key("史学科"), "史学科");
        assert_eq!(department_search_key("学部"), "");
    }

    #[tokio::test]
    async fn test_registers_and_skips_present_courses() {
        let pool = connect_in_memory().await.expect("Failed to create test db");
        seed_courses(&pool, &[(1, "月1"), (2, "火2"), (3, "水3"), (4, "月1")]).await;
        insert_required(&pool, "社会情報学部", 1, 1, None).await.expect("insert");
        insert_required(&pool, "社会情報学部", 1, 2, None).await.expect("insert");
        insert_required(&pool, "社会情報学部", 1, 3, None).await.expect("insert");
        insert_required(&pool, "社会情報学部", 2, 4, None).await.expect("insert");
        insert_required(&pool, "経済学部", 1, 4, None).await.expect("insert");
        let calendar = seed_calendar(&pool, "alice", &["社会情報学部"]).await;
        let service = RegistrationService::new(pool, CalendarLocks::new());

        service.register_batch(calendar.user_id, calendar.id, &[2]).await.expect("batch");

        let outcome = service
            .register_required(calendar.user_id, calendar.id, 1)
            .await
            .expect("register required");
        assert_eq!(outcome.registered, 2);
        assert_eq!(outcome.skipped, 1);
        assert!(outcome.errors.is_empty());

        let view = service.list_registered(calendar.id).await.expect("list");
        let mut ids: Vec<_> = view.registered.iter().map(|r| r.course_id).collect();
        ids.sort();
        assert_eq!(ids, vec![1, 2, 3]);
    }

    #[tokio::test]
    async fn test_english_department_tag() {
        let pool = connect_in_memory().await.expect("Failed to create test db");
        seed_courses(&pool, &[(1, "月1")]).await;
        insert_required(&pool, "Social Informatics", 1, 1, None).await.expect("insert");
        let calendar = seed_calendar(&pool, "alice", &["Social Informatics Department"]).await;
        let service = RegistrationService::new(pool, CalendarLocks::new());

        let outcome = service
            .register_required(calendar.user_id, calendar.id, 1)
            .await
            .expect("register required");
        assert_eq!(outcome.registered, 1);
    }

    #[tokio::test]
    async fn test_missing_department_and_unknown_course() {
        let pool = connect_in_memory().await.expect("Failed to create test db");
        insert_required(&pool, "経済学部", 1, 77, None).await.expect("insert");
        let bare = seed_calendar(&pool, "alice", &[]).await;
        let econ = seed_calendar(&pool, "alice", &["経済学部"]).await;
        let bob = seed_user(&pool, "bob").await;
        let service = RegistrationService::new(pool, CalendarLocks::new());

        assert!(matches!(
            service.register_required(bare.user_id, bare.id, 1).await,
            Err(AppError::Validation(_))
        ));
        assert!(matches!(
            service.register_required(bob.id, econ.id, 1).await,
            Err(AppError::Forbidden(_))
        ));

        let outcome = service
            .register_required(econ.user_id, econ.id, 1)
            .await
            .expect("register required");
        assert_eq!(outcome.registered, 0);
        assert_eq!(outcome.errors.len(), 1);
        assert_eq!(outcome.errors[0].course_id, 77);

        let none = service
            .register_required(econ.user_id, econ.id, 4)
            .await
            .expect("register required");
        assert_eq!((none.registered, none.skipped), (0, 0));
    }
}
