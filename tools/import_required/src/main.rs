use std::env;

use dotenvy::dotenv;
use serde::Deserialize;
use syllabus_backend::db::{self, courses, required};

const DEFAULT_CSV_PATH: &str = "required_courses.csv";

fn is_dry_run() -> bool {
    !env::args().any(|a| a == "--apply")
}

fn csv_path() -> String {
    env::args()
        .skip(1)
        .find(|a| !a.starts_with("--"))
        .unwrap_or_else(|| DEFAULT_CSV_PATH.to_string())
}

#[derive(Debug, Deserialize)]
struct Row {
    department: String,
    grade: i64,
    kougi_id: i64,
    #[serde(default)]
    campus: Option<String>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenv().ok();

    let database_url =
        env::var("DATABASE_URL").unwrap_or_else(|_| "sqlite://syllabus.db?mode=rwc".to_string());
    let path = csv_path();
    let dry_run = is_dry_run();

    let mut reader = csv::ReaderBuilder::new().trim(csv::Trim::All).from_path(&path)?;
    let rows = reader.deserialize().collect::<Result<Vec<Row>, _>>()?;
    println!("Read {} rows from {}", rows.len(), path);

    let pool = db::connect(&database_url, 1).await?;

    let mut missing = 0;
    for row in &rows {
        if courses::find_course(&pool, row.kougi_id).await?.is_none() {
            println!(
                "[WARN] kougi_id {} ({} / grade {}) is not in the catalog",
                row.kougi_id, row.department, row.grade
            );
            missing += 1;
        }
    }

    if dry_run {
        for row in &rows {
            println!(
                "[DRY RUN] Would insert {} grade {} -> {}",
                row.department, row.grade, row.kougi_id
            );
        }
        println!("Rows: {} ({} unknown courses). Pass --apply to write.", rows.len(), missing);
        return Ok(());
    }

    let mut tx = db::begin_write(&pool).await?;
    for row in &rows {
        let campus = row.campus.as_deref().filter(|c| !c.is_empty());
        required::insert_required(&mut *tx, &row.department, row.grade, row.kougi_id, campus)
            .await?;
    }
    tx.commit().await?;

    println!("Inserted required courses: {} ({} unknown courses)", rows.len(), missing);
    Ok(())
}
