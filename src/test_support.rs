use sqlx::SqlitePool;

use crate::db::{calendars, courses, users};
use crate::models::{Calendar, CalendarRequest, Course, CourseId, User};

pub fn course(id: CourseId, subject: &str, period: &str) -> Course {
    Course {
        id,
        subject: subject.to_string(),
        teacher: format!("教員{id}"),
        department: "社会情報学部".to_string(),
        semester: "前期".to_string(),
        campus: "相模原".to_string(),
        period: period.to_string(),
        summary: String::new(),
        url: format!("https://syllabus.example/{id}"),
    }
}

pub async fn seed_courses(pool: &SqlitePool, rows: &[(CourseId, &str)]) {
    for (id, period) in rows {
        courses::upsert_course(pool, &course(*id, &format!("科目{id}"), period))
            .await
            .expect("Failed to insert course");
    }
}

pub async fn seed_user(pool: &SqlitePool, name: &str) -> User {
    match users::find_user_by_name(pool, name).await.expect("query user") {
        Some(user) => user,
        None => users::insert_user(pool, name, "hash").await.expect("Failed to insert user"),
    }
}

pub async fn seed_calendar(pool: &SqlitePool, owner: &str, departments: &[&str]) -> Calendar {
    let user = seed_user(pool, owner).await;
    let req = CalendarRequest {
        calendar_name: format!("{owner}の時間割"),
        department: departments.iter().map(|d| d.to_string()).collect(),
        semester: vec!["前期".to_string()],
        campus: None,
        sat_flag: false,
        sixth_period_flag: false,
        is_public: false,
    };
    calendars::insert_calendar(pool, user.id, req)
        .await
        .expect("Failed to insert calendar")
}
