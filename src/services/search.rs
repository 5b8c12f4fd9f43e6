use std::collections::HashSet;
use std::sync::Arc;

use sqlx::SqlitePool;
use tracing::{debug, info};

use crate::answer::AnswerClient;
use crate::db::{calendars, chat, courses, registrations};
use crate::error::AppError;
use crate::models::{
    AnswerResponse, CalendarId, Course, CourseHit, CourseId, CourseSummary, SearchRequest, Slot,
    UserId, Weekday,
};
use crate::models::slot::to_half_width;
use crate::reference::UNSPECIFIED;

pub struct SearchService {
    db: SqlitePool,
    answers: Arc<dyn AnswerClient>,
}

/// Drops blanks and the "unspecified" placeholder; an empty result disables the filter.
fn effective(values: &[String]) -> Vec<String> {
    values
        .iter()
        .map(|v| v.trim())
        .filter(|v| !v.is_empty() && *v != UNSPECIFIED)
        .map(str::to_string)
        .collect()
}

fn slot_filter(req: &SearchRequest) -> Result<(Vec<Weekday>, Vec<u8>), AppError> {
    let mut days = Vec::new();
    for day in effective(&req.days) {
        let parsed = Weekday::parse(&day)
            .ok_or_else(|| AppError::Validation(format!("unknown day: {day}")))?;
        days.push(parsed);
    }

    let mut periods = Vec::new();
    for period in effective(&req.periods) {
        let normalized = to_half_width(&period);
        let parsed = normalized
            .trim_end_matches('限')
            .parse::<u8>()
            .map_err(|_| AppError::Validation(format!("unknown period: {period}")))?;
        periods.push(parsed);
    }

    Ok((days, periods))
}

fn matches_slots(slots: &[Slot], days: &[Weekday], periods: &[u8]) -> bool {
    if days.is_empty() && periods.is_empty() {
        return true;
    }
    slots.iter().any(|s| {
        (days.is_empty() || days.contains(&s.day)) && (periods.is_empty() || periods.contains(&s.period))
    })
}

impl SearchService {
    pub fn new(db: SqlitePool, answers: Arc<dyn AnswerClient>) -> Self {
        Self { db, answers }
    }

    async fn filter_courses(&self, req: &SearchRequest) -> Result<Vec<Course>, AppError> {
        let (days, periods) = slot_filter(req)?;
        let departments = effective(&req.departments);
        let semesters = effective(&req.semesters);
        let campus = req
            .campus
            .as_deref()
            .map(str::trim)
            .filter(|c| !c.is_empty() && *c != UNSPECIFIED);
        let keyword = req.keyword.as_deref().map(str::trim).filter(|k| !k.is_empty());

        let found = courses::query_courses(&self.db, &departments, &semesters, campus, keyword).await?;
        Ok(found
            .into_iter()
            .filter(|c| matches_slots(&c.slots(), &days, &periods))
            .collect())
    }

    /// IDs of catalog courses matching the structured filter, ascending.
    pub async fn filter_course_ids(&self, req: &SearchRequest) -> Result<Vec<CourseId>, AppError> {
        let ids: Vec<_> = self.filter_courses(req).await?.into_iter().map(|c| c.id).collect();
        debug!("filter matched {} course(s)", ids.len());
        Ok(ids)
    }

    /// Matching courses, flagged against the caller's calendar when they own it.
    pub async fn search(
        &self,
        req: &SearchRequest,
        caller: Option<UserId>,
        calendar_id: Option<CalendarId>,
    ) -> Result<Vec<CourseHit>, AppError> {
        let found = self.filter_courses(req).await?;
        let registered = self.registered_ids(caller, calendar_id).await?;
        Ok(found
            .into_iter()
            .map(|course| CourseHit {
                registered: registered.contains(&course.id),
                course,
            })
            .collect())
    }

    /// Filters the catalog, asks the answer service to rank the candidates,
    /// and records the exchange.
    pub async fn answer(
        &self,
        text: &str,
        req: &SearchRequest,
        caller: Option<UserId>,
        calendar_id: Option<CalendarId>,
    ) -> Result<AnswerResponse, AppError> {
        let text = text.trim();
        if text.is_empty() {
            return Err(AppError::Validation("question must not be empty".to_string()));
        }

        let candidates = self.filter_course_ids(req).await?;
        let answer = self.answers.answer(text, &candidates).await?;
        chat::insert_chat(&self.db, caller, text, &answer.generated_query, &answer.course_ids).await?;
        info!(
            "answered question over {} candidate(s) with {} match(es)",
            candidates.len(),
            answer.course_ids.len()
        );

        let matched = courses::fetch_courses_by_ids(&self.db, &answer.course_ids).await?;
        let registered = self.registered_ids(caller, calendar_id).await?;
        let kougi_summary = matched.iter().cloned().map(CourseSummary::from).collect();
        let results = matched
            .into_iter()
            .map(|course| CourseHit {
                registered: registered.contains(&course.id),
                course,
            })
            .collect();

        Ok(AnswerResponse {
            generated_input: answer.generated_query,
            matched_ids: answer.course_ids,
            results,
            kougi_summary,
        })
    }

    pub async fn summaries(&self, ids: &[CourseId]) -> Result<Vec<CourseSummary>, AppError> {
        let found = courses::fetch_courses_by_ids(&self.db, ids).await?;
        Ok(found.into_iter().map(CourseSummary::from).collect())
    }

    /// Courses in the calendar, or nothing when the caller does not own it.
    async fn registered_ids(
        &self,
        caller: Option<UserId>,
        calendar_id: Option<CalendarId>,
    ) -> Result<HashSet<CourseId>, AppError> {
        let (Some(caller), Some(calendar_id)) = (caller, calendar_id) else {
            return Ok(HashSet::new());
        };
        match calendars::find_calendar(&self.db, calendar_id).await? {
            Some(calendar) if calendar.user_id == caller => {
                let rows = registrations::list_registrations(&self.db, calendar_id).await?;
                Ok(rows.into_iter().map(|r| r.course_id).collect())
            }
            _ => Ok(HashSet::new()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::answer::{Answer, NoopAnswerClient};
    use crate::db::{connect_in_memory, courses::upsert_course};
    use crate::services::{RegistrationService, locks::CalendarLocks};
    use crate::test_support::{course, seed_calendar, seed_user};
    use async_trait::async_trait;

    struct ReverseClient;

    #[async_trait]
    impl AnswerClient for ReverseClient {
        async fn answer(&self, question: &str, candidates: &[CourseId]) -> Result<Answer, AppError> {
            let mut ids = candidates.to_vec();
            ids.reverse();
            ids.push(9999);
            Ok(crate::answer::scope_to_candidates(format!("query: {question}"), ids, candidates))
        }
    }

    async fn catalog() -> SqlitePool {
        let pool = connect_in_memory().await.expect("Failed to create test db");
        let mut a = course(1, "統計学入門", "月1");
        a.semester = "前期".to_string();
        let mut b = course(2, "情報社会論", "火２");
        b.semester = "後期".to_string();
        let mut c = course(3, "英語演習", "月2・木1");
        c.department = "青山スタンダード科目".to_string();
        let d = course(4, "卒業研究", "不定");
        for row in [&a, &b, &c, &d] {
            upsert_course(&pool, row).await.expect("insert");
        }
        pool
    }

    fn strings(values: &[&str]) -> Vec<String> {
        values.iter().map(|v| v.to_string()).collect()
    }

    #[tokio::test]
    async fn test_filter_by_day_and_period() {
        let service = SearchService::new(catalog().await, Arc::new(NoopAnswerClient));

        let req = SearchRequest { days: strings(&["月"]), ..Default::default() };
        assert_eq!(service.filter_course_ids(&req).await.expect("filter"), vec![1, 3]);

        let req = SearchRequest {
            days: strings(&["月"]),
            periods: strings(&["２"]),
            ..Default::default()
        };
        assert_eq!(service.filter_course_ids(&req).await.expect("filter"), vec![3]);

        let req = SearchRequest { periods: strings(&["2"]), ..Default::default() };
        assert_eq!(service.filter_course_ids(&req).await.expect("filter"), vec![2, 3]);

        let req = SearchRequest { days: strings(&["X"]), ..Default::default() };
        assert!(matches!(service.filter_course_ids(&req).await, Err(AppError::Validation(_))));
    }

    #[tokio::test]
    async fn test_unspecified_placeholder_disables_filter() {
        let service = SearchService::new(catalog().await, Arc::new(NoopAnswerClient));

        let req = SearchRequest {
            departments: strings(&[UNSPECIFIED]),
            semesters: strings(&[UNSPECIFIED, ""]),
            ..Default::default()
        };
        assert_eq!(service.filter_course_ids(&req).await.expect("filter"), vec![1, 2, 3, 4]);

        let req = SearchRequest {
            departments: strings(&["社会情報学部"]),
            semesters: strings(&["後期"]),
            ..Default::default()
        };
        assert_eq!(service.filter_course_ids(&req).await.expect("filter"), vec![2]);
    }

    #[tokio::test]
    async fn test_search_flags_registered_only_for_owner() {
        let pool = catalog().await;
        let calendar = seed_calendar(&pool, "alice", &[]).await;
        let bob = seed_user(&pool, "bob").await;
        RegistrationService::new(pool.clone(), CalendarLocks::new())
            .register_batch(calendar.user_id, calendar.id, &[2])
            .await
            .expect("batch");
        let service = SearchService::new(pool, Arc::new(NoopAnswerClient));
        let req = SearchRequest::default();

        let hits = service
            .search(&req, Some(calendar.user_id), Some(calendar.id))
            .await
            .expect("search");
        let flagged: Vec<_> = hits.iter().filter(|h| h.registered).map(|h| h.course.id).collect();
        assert_eq!(flagged, vec![2]);

        let hits = service.search(&req, Some(bob.id), Some(calendar.id)).await.expect("search");
        assert!(hits.iter().all(|h| !h.registered));
    }

    #[tokio::test]
    async fn test_answer_is_scoped_and_logged() {
        let pool = catalog().await;
        let service = SearchService::new(pool.clone(), Arc::new(ReverseClient));
        let req = SearchRequest { days: strings(&["月"]), ..Default::default() };

        let response = service.answer("統計", &req, None, None).await.expect("answer");
        assert_eq!(response.generated_input, "query: 統計");
        assert_eq!(response.matched_ids, vec![3, 1]);
        let result_ids: Vec<_> = response.results.iter().map(|h| h.course.id).collect();
        assert_eq!(result_ids, vec![3, 1]);
        assert_eq!(response.kougi_summary[1].subject, "統計学入門");

        let logged: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM chat_logs")
            .fetch_one(&pool)
            .await
            .expect("count");
        assert_eq!(logged, 1);

        assert!(matches!(
            service.answer("   ", &req, None, None).await,
            Err(AppError::Validation(_))
        ));
    }
}
