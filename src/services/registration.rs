use sqlx::{Sqlite, SqliteConnection, SqlitePool, Transaction};
use tracing::{debug, info, warn};

use crate::db::{self, courses, registrations};
use crate::error::AppError;
use crate::models::{
    BatchOutcome, CalendarId, ConflictEntry, Course, CourseId, ErrorEntry, RegisteredView,
    Registration, Slot, UserId,
};
use crate::services::guard;
use crate::services::locks::CalendarLocks;

const UNSCHEDULED_LABEL: &str = "不定";

/// Conflict-aware placement of courses into calendars.
pub struct RegistrationService {
    db: SqlitePool,
    locks: CalendarLocks,
}

/// Result of placing a single course.
#[derive(Debug)]
pub(crate) enum Placement {
    Inserted,
    Collided(Vec<Course>),
}

impl RegistrationService {
    pub fn new(db: SqlitePool, locks: CalendarLocks) -> Self {
        Self { db, locks }
    }

    /// Places each course of the batch, in input order, against the
    /// calendar's committed state. Per-ID failures end up in `errored`;
    /// only the ownership check and then empty input fail the whole call.
    pub async fn register_batch(
        &self,
        caller: UserId,
        calendar_id: CalendarId,
        course_ids: &[CourseId],
    ) -> Result<BatchOutcome, AppError> {
        let (_lock, _) = guard::lock_owned(&self.db, &self.locks, calendar_id, caller).await?;
        if course_ids.is_empty() {
            return Err(AppError::Validation("kougi_ids must not be empty".to_string()));
        }

        let mut outcome = BatchOutcome::default();

        for &course_id in course_ids {
            match self.place(calendar_id, course_id).await {
                Ok(Placement::Inserted) => outcome.succeeded.push(course_id),
                Ok(Placement::Collided(colliding_courses)) => {
                    debug!(
                        "course {} collides with {} course(s) in calendar {}",
                        course_id,
                        colliding_courses.len(),
                        calendar_id
                    );
                    outcome.conflicted.push(ConflictEntry {
                        course_id,
                        colliding_courses,
                    });
                }
                Err(e) => {
                    warn!("failed to register course {} in calendar {}: {}", course_id, calendar_id, e);
                    outcome.errored.push(ErrorEntry {
                        course_id,
                        error: e.to_string(),
                    });
                }
            }
        }

        info!(
            "calendar {}: {} registered, {} conflicted, {} errored",
            calendar_id,
            outcome.succeeded.len(),
            outcome.conflicted.len(),
            outcome.errored.len()
        );
        Ok(outcome)
    }

    /// Checks one course against the calendar and inserts it when its slots
    /// are free. The caller must hold the calendar lock.
    pub(crate) async fn place(
        &self,
        calendar_id: CalendarId,
        course_id: CourseId,
    ) -> Result<Placement, AppError> {
        let course = courses::find_course(&self.db, course_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("course {course_id} not found")))?;
        let slots = course.slots();

        let mut tx = db::begin_write(&self.db).await?;

        let existing = occupying(&mut tx, calendar_id, &course, &slots).await?;
        if !existing.is_empty() {
            let colliding = colliding_courses(&mut tx, &existing).await?;
            tx.rollback().await?;
            return Ok(Placement::Collided(colliding));
        }

        self.commit_slots(tx, calendar_id, &course, &slots).await
    }

    /// Inserts the course's slots and commits. A slot taken after the check
    /// is caught by the unique slot index and reported as a collision.
    pub(crate) async fn commit_slots(
        &self,
        mut tx: Transaction<'static, Sqlite>,
        calendar_id: CalendarId,
        course: &Course,
        slots: &[Slot],
    ) -> Result<Placement, AppError> {
        match insert_slots(&mut tx, calendar_id, course, slots).await {
            Ok(()) => {
                tx.commit().await?;
                Ok(Placement::Inserted)
            }
            Err(sqlx::Error::Database(e)) if e.is_unique_violation() => {
                tx.rollback().await?;
                let existing = registrations::find_in_slots(&self.db, calendar_id, slots).await?;
                let colliding =
                    courses::fetch_courses_by_ids(&self.db, &distinct_course_ids(&existing)).await?;
                Ok(Placement::Collided(colliding))
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Removes every registration of the given courses. Absent courses are a no-op.
    pub async fn delete_batch(
        &self,
        caller: UserId,
        calendar_id: CalendarId,
        course_ids: &[CourseId],
    ) -> Result<u64, AppError> {
        let (_lock, _) = guard::lock_owned(&self.db, &self.locks, calendar_id, caller).await?;
        let mut tx = db::begin_write(&self.db).await?;
        let mut removed = 0;
        for &course_id in course_ids {
            removed += registrations::delete_registration(&mut *tx, calendar_id, course_id).await?;
        }
        tx.commit().await?;

        debug!("calendar {}: removed {} registration(s)", calendar_id, removed);
        Ok(removed)
    }

    /// Registrations plus the resolved course of each, for display.
    pub async fn list_registered(&self, calendar_id: CalendarId) -> Result<RegisteredView, AppError> {
        let registered = registrations::list_registrations(&self.db, calendar_id).await?;
        let ids = distinct_course_ids(&registered);
        let courses = courses::fetch_courses_by_ids(&self.db, &ids).await?;
        Ok(RegisteredView {
            registered,
            courses,
        })
    }

    pub(crate) fn db(&self) -> &SqlitePool {
        &self.db
    }

    pub(crate) fn locks(&self) -> &CalendarLocks {
        &self.locks
    }
}

/// Existing registrations that block `course`. A scheduled course is blocked
/// by anything in its slots; an unscheduled one only by itself.
async fn occupying(
    conn: &mut SqliteConnection,
    calendar_id: CalendarId,
    course: &Course,
    slots: &[Slot],
) -> Result<Vec<Registration>, sqlx::Error> {
    if slots.is_empty() {
        registrations::find_by_course(conn, calendar_id, course.id).await
    } else {
        registrations::find_in_slots(conn, calendar_id, slots).await
    }
}

async fn insert_slots(
    conn: &mut SqliteConnection,
    calendar_id: CalendarId,
    course: &Course,
    slots: &[Slot],
) -> Result<(), sqlx::Error> {
    if slots.is_empty() {
        let label = if course.period.trim().is_empty() {
            UNSCHEDULED_LABEL
        } else {
            course.period.trim()
        };
        registrations::insert_registration(&mut *conn, calendar_id, course.id, None, label).await?;
        return Ok(());
    }

    for slot in slots {
        registrations::insert_registration(&mut *conn, calendar_id, course.id, Some(*slot), &slot.label())
            .await?;
    }
    Ok(())
}

async fn colliding_courses(
    conn: &mut SqliteConnection,
    existing: &[Registration],
) -> Result<Vec<Course>, sqlx::Error> {
    let ids = distinct_course_ids(existing);
    courses::fetch_courses_by_ids(conn, &ids).await
}

fn distinct_course_ids(registrations: &[Registration]) -> Vec<CourseId> {
    let mut ids = Vec::with_capacity(registrations.len());
    for r in registrations {
        if !ids.contains(&r.course_id) {
            ids.push(r.course_id);
        }
    }
    ids
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;
    use std::path::PathBuf;
    use std::sync::Arc;
    use std::time::Duration;

    use super::*;
    use crate::db::{calendars, connect, connect_in_memory};
    use crate::test_support::{seed_calendar, seed_courses, seed_user};

    async fn setup(rows: &[(CourseId, &str)]) -> (RegistrationService, crate::models::Calendar) {
        let pool = connect_in_memory().await.expect("Failed to create test db");
        seed_courses(&pool, rows).await;
        let calendar = seed_calendar(&pool, "alice", &["社会情報学部"]).await;
        (RegistrationService::new(pool, CalendarLocks::new()), calendar)
    }

    fn assert_no_double_booking(registered: &[Registration]) {
        let mut seen = HashSet::new();
        for r in registered {
            if let Some(slot) = r.slot() {
                assert!(seen.insert(slot), "slot {slot} booked twice");
            }
        }
    }

    #[tokio::test]
    async fn test_conflicting_course_reports_existing_one() {
        let (service, calendar) = setup(&[(1, "月2"), (2, "月2"), (3, "火1")]).await;
        let owner = calendar.user_id;

        let first = service.register_batch(owner, calendar.id, &[1]).await.expect("batch");
        assert_eq!(first.succeeded, vec![1]);

        let second = service.register_batch(owner, calendar.id, &[2]).await.expect("batch");
        assert!(second.succeeded.is_empty());
        assert_eq!(second.conflicted.len(), 1);
        assert_eq!(second.conflicted[0].course_id, 2);
        let colliding: Vec<_> = second.conflicted[0].colliding_courses.iter().map(|c| c.id).collect();
        assert_eq!(colliding, vec![1]);

        let third = service.register_batch(owner, calendar.id, &[3]).await.expect("batch");
        assert_eq!(third.succeeded, vec![3]);
        assert!(third.conflicted.is_empty());
    }

    #[tokio::test]
    async fn test_conflict_lists_every_colliding_course() {
        let (service, calendar) = setup(&[(1, "月1"), (2, "月2"), (3, "月1・月2")]).await;
        let owner = calendar.user_id;

        service.register_batch(owner, calendar.id, &[1, 2]).await.expect("batch");
        let outcome = service.register_batch(owner, calendar.id, &[3]).await.expect("batch");

        let colliding: Vec<_> = outcome.conflicted[0].colliding_courses.iter().map(|c| c.id).collect();
        assert_eq!(colliding, vec![1, 2]);
    }

    #[tokio::test]
    async fn test_earlier_success_in_batch_is_visible_to_later_ids() {
        let (service, calendar) = setup(&[(1, "水3"), (2, "水３")]).await;

        let outcome = service
            .register_batch(calendar.user_id, calendar.id, &[1, 2, 1])
            .await
            .expect("batch");
        assert_eq!(outcome.succeeded, vec![1]);
        let conflicted: Vec<_> = outcome.conflicted.iter().map(|c| c.course_id).collect();
        assert_eq!(conflicted, vec![2, 1]);

        let view = service.list_registered(calendar.id).await.expect("list");
        assert_eq!(view.registered.len(), 1);
        assert_no_double_booking(&view.registered);
    }

    #[tokio::test]
    async fn test_unknown_course_is_errored_and_batch_continues() {
        let (service, calendar) = setup(&[(1, "金5")]).await;

        let outcome = service
            .register_batch(calendar.user_id, calendar.id, &[404, 1])
            .await
            .expect("batch");
        assert_eq!(outcome.succeeded, vec![1]);
        assert_eq!(outcome.errored.len(), 1);
        assert_eq!(outcome.errored[0].course_id, 404);
        assert!(outcome.errored[0].error.contains("404"));
    }

    #[tokio::test]
    async fn test_empty_batch_is_rejected() {
        let (service, calendar) = setup(&[]).await;
        assert!(matches!(
            service.register_batch(calendar.user_id, calendar.id, &[]).await,
            Err(AppError::Validation(_))
        ));
    }

    #[tokio::test]
    async fn test_stranger_is_forbidden_and_nothing_changes() {
        let (service, calendar) = setup(&[(1, "月1"), (2, "火2")]).await;
        service.register_batch(calendar.user_id, calendar.id, &[1]).await.expect("batch");
        let bob = seed_user(service.db(), "bob").await;

        assert!(matches!(
            service.register_batch(bob.id, calendar.id, &[2]).await,
            Err(AppError::Forbidden(_))
        ));
        assert!(matches!(
            service.delete_batch(bob.id, calendar.id, &[1]).await,
            Err(AppError::Forbidden(_))
        ));
        // ownership is checked before the batch itself
        assert!(matches!(
            service.register_batch(bob.id, calendar.id, &[]).await,
            Err(AppError::Forbidden(_))
        ));

        let view = service.list_registered(calendar.id).await.expect("list");
        assert_eq!(view.registered.len(), 1);
        assert_eq!(view.registered[0].course_id, 1);
    }

    #[tokio::test]
    async fn test_unscheduled_course_only_collides_with_itself() {
        let (service, calendar) = setup(&[(1, "不定"), (2, "集中"), (3, "月1")]).await;
        let owner = calendar.user_id;

        let outcome = service.register_batch(owner, calendar.id, &[1, 2, 3]).await.expect("batch");
        assert_eq!(outcome.succeeded, vec![1, 2, 3]);

        let again = service.register_batch(owner, calendar.id, &[1]).await.expect("batch");
        assert_eq!(again.conflicted[0].colliding_courses[0].id, 1);

        let view = service.list_registered(calendar.id).await.expect("list");
        let labels: Vec<_> = view.registered.iter().map(|r| r.period_label.as_str()).collect();
        assert_eq!(labels, vec!["不定", "集中", "月1"]);
    }

    #[tokio::test]
    async fn test_multi_slot_course_occupies_each_slot() {
        let (service, calendar) = setup(&[(1, "月1・木1"), (2, "木1")]).await;
        let owner = calendar.user_id;

        service.register_batch(owner, calendar.id, &[1]).await.expect("batch");
        let view = service.list_registered(calendar.id).await.expect("list");
        assert_eq!(view.registered.len(), 2);
        assert_eq!(view.courses.len(), 1);

        let outcome = service.register_batch(owner, calendar.id, &[2]).await.expect("batch");
        assert_eq!(outcome.conflicted[0].colliding_courses[0].id, 1);
    }

    #[tokio::test]
    async fn test_delete_batch_is_idempotent() {
        let (service, calendar) = setup(&[(1, "月1"), (2, "火1")]).await;
        let owner = calendar.user_id;
        service.register_batch(owner, calendar.id, &[1, 2]).await.expect("batch");

        assert_eq!(service.delete_batch(owner, calendar.id, &[1, 99]).await.expect("delete"), 1);
        let after_first = service.list_registered(calendar.id).await.expect("list");
        assert_eq!(service.delete_batch(owner, calendar.id, &[1, 99]).await.expect("delete"), 0);
        let after_second = service.list_registered(calendar.id).await.expect("list");

        let ids = |v: &RegisteredView| v.registered.iter().map(|r| r.course_id).collect::<Vec<_>>();
        assert_eq!(ids(&after_first), vec![2]);
        assert_eq!(ids(&after_first), ids(&after_second));
    }

    #[tokio::test]
    async fn test_succeeded_set_independent_of_order() {
        let rows = [(1, "月1"), (2, "火2"), (3, "水3"), (4, "月1")];
        let mut results = Vec::new();
        for order in [[2, 3, 1], [1, 3, 2]] {
            let (service, calendar) = setup(&rows).await;
            service.register_batch(calendar.user_id, calendar.id, &[4]).await.expect("seed");
            let outcome = service
                .register_batch(calendar.user_id, calendar.id, &order)
                .await
                .expect("batch");
            results.push(outcome.succeeded.into_iter().collect::<HashSet<_>>());
        }
        assert_eq!(results[0], results[1]);
        assert_eq!(results[0], HashSet::from([2, 3]));
    }

    #[tokio::test]
    async fn test_concurrent_batches_never_double_book() {
        let (service, calendar) = setup(&[(1, "月2"), (2, "月2"), (3, "火4")]).await;
        let service = Arc::new(service);
        let owner = calendar.user_id;
        let calendar_id = calendar.id;

        let a = {
            let service = Arc::clone(&service);
            tokio::spawn(async move { service.register_batch(owner, calendar_id, &[1, 3]).await })
        };
        let b = {
            let service = Arc::clone(&service);
            tokio::spawn(async move { service.register_batch(owner, calendar_id, &[2]).await })
        };
        let a = a.await.expect("task panicked").expect("batch");
        let b = b.await.expect("task panicked").expect("batch");

        assert_eq!(a.succeeded.len() + b.succeeded.len(), 2);
        assert_eq!(a.conflicted.len() + b.conflicted.len(), 1);

        let view = service.list_registered(calendar_id).await.expect("list");
        assert_no_double_booking(&view.registered);
    }

    #[tokio::test]
    async fn test_slot_index_turns_late_insert_into_collision() {
        let (service, calendar) = setup(&[(1, "月2"), (2, "月2")]).await;
        service.register_batch(calendar.user_id, calendar.id, &[1]).await.expect("batch");

        // insert without the check, as a writer racing past it would
        let course = courses::find_course(service.db(), 2)
            .await
            .expect("query")
            .expect("course");
        let tx = db::begin_write(service.db()).await.expect("begin");
        let placement = service
            .commit_slots(tx, calendar.id, &course, &course.slots())
            .await
            .expect("placement");

        match placement {
            Placement::Collided(colliding) => {
                let ids: Vec<_> = colliding.iter().map(|c| c.id).collect();
                assert_eq!(ids, vec![1]);
            }
            other => panic!("expected a collision, got {other:?}"),
        }
        let view = service.list_registered(calendar.id).await.expect("list");
        assert_eq!(view.registered.len(), 1);
        assert_eq!(view.registered[0].course_id, 1);
    }

    #[tokio::test]
    async fn test_batch_waiting_on_deleted_calendar_is_not_found() {
        let (service, calendar) = setup(&[(1, "月1"), (2, "火1")]).await;
        let service = Arc::new(service);
        let owner = calendar.user_id;
        let calendar_id = calendar.id;

        let held = service.locks().acquire(calendar_id).await;
        let waiting = {
            let service = Arc::clone(&service);
            tokio::spawn(async move { service.register_batch(owner, calendar_id, &[1, 2]).await })
        };
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert!(!waiting.is_finished());

        calendars::delete_calendar(service.db(), calendar_id).await.expect("delete");
        drop(held);

        assert!(matches!(
            waiting.await.expect("task panicked"),
            Err(AppError::NotFound(_))
        ));
        assert!(service.locks().is_empty());
        let left = registrations::list_registrations(service.db(), calendar_id)
            .await
            .expect("list");
        assert!(left.is_empty());
    }

    /// Removes the database file and its WAL side files.
    struct TempDb(PathBuf);

    impl TempDb {
        fn new() -> Self {
            Self(std::env::temp_dir().join(format!("syllabus-{}.db", uuid::Uuid::new_v4())))
        }

        fn url(&self) -> String {
            format!("sqlite://{}", self.0.display())
        }
    }

    impl Drop for TempDb {
        fn drop(&mut self) {
            for suffix in ["", "-wal", "-shm"] {
                let mut path = self.0.clone().into_os_string();
                path.push(suffix);
                let _ = std::fs::remove_file(path);
            }
        }
    }

    /// 30 courses, one per slot from 月1 to 土5, with ids starting at `first_id`.
    fn weekly_grid(first_id: CourseId) -> Vec<(CourseId, String)> {
        let mut rows = Vec::new();
        for (d, day) in ["月", "火", "水", "木", "金", "土"].iter().enumerate() {
            for period in 1..=5 {
                let id = first_id + (d as i64) * 5 + (period - 1);
                rows.push((id, format!("{day}{period}")));
            }
        }
        rows
    }

    async fn seed_grid(pool: &SqlitePool, first_id: CourseId) -> Vec<CourseId> {
        let grid = weekly_grid(first_id);
        let rows: Vec<_> = grid.iter().map(|(id, period)| (*id, period.as_str())).collect();
        seed_courses(pool, &rows).await;
        grid.iter().map(|(id, _)| *id).collect()
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_calendars_on_file_database() {
        let file = TempDb::new();
        let pool = connect(&file.url(), 5).await.expect("Failed to open file db");
        let ids = seed_grid(&pool, 1).await;

        let mut timetables = Vec::new();
        for i in 0..8 {
            timetables.push(seed_calendar(&pool, &format!("user{i}"), &["社会情報学部"]).await);
        }

        let service = Arc::new(RegistrationService::new(pool.clone(), CalendarLocks::new()));
        let mut tasks = Vec::new();
        for calendar in &timetables {
            let service = Arc::clone(&service);
            let ids = ids.clone();
            let (owner, calendar_id) = (calendar.user_id, calendar.id);
            tasks.push(tokio::spawn(async move {
                service.register_batch(owner, calendar_id, &ids).await
            }));
        }

        let mut succeeded = 0;
        for task in tasks {
            let outcome = task.await.expect("task panicked").expect("batch");
            assert!(outcome.errored.is_empty(), "errored: {:?}", outcome.errored);
            assert!(outcome.conflicted.is_empty());
            succeeded += outcome.succeeded.len();
        }
        assert_eq!(succeeded, 8 * 30);

        for calendar in &timetables {
            let view = service.list_registered(calendar.id).await.expect("list");
            assert_eq!(view.registered.len(), 30);
            assert_no_double_booking(&view.registered);
        }
        pool.close().await;
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_unserialized_writers_on_one_calendar_never_double_book() {
        let file = TempDb::new();
        let pool = connect(&file.url(), 5).await.expect("Failed to open file db");
        let first = seed_grid(&pool, 1).await;
        let second = seed_grid(&pool, 101).await;
        let calendar = seed_calendar(&pool, "alice", &["社会情報学部"]).await;

        // separate lock tables, so only the database keeps the two apart
        let mut tasks = Vec::new();
        for ids in [first, second] {
            let service = RegistrationService::new(pool.clone(), CalendarLocks::new());
            let (owner, calendar_id) = (calendar.user_id, calendar.id);
            tasks.push(tokio::spawn(async move {
                service.register_batch(owner, calendar_id, &ids).await
            }));
        }

        let (mut succeeded, mut conflicted) = (0, 0);
        for task in tasks {
            let outcome = task.await.expect("task panicked").expect("batch");
            assert!(outcome.errored.is_empty(), "errored: {:?}", outcome.errored);
            succeeded += outcome.succeeded.len();
            conflicted += outcome.conflicted.len();
        }
        assert_eq!(succeeded, 30);
        assert_eq!(conflicted, 30);

        let view = RegistrationService::new(pool.clone(), CalendarLocks::new())
            .list_registered(calendar.id)
            .await
            .expect("list");
        assert_eq!(view.registered.len(), 30);
        assert_no_double_booking(&view.registered);
        pool.close().await;
    }
}
