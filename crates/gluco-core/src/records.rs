//! SQLite record store
//!
//! Prediction records are append-only: the store assigns an id and a
//! timestamp on insert and lists the most recent records. There is no update
//! or delete path.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use sqlx::FromRow;
use std::path::Path;
use std::str::FromStr;
use utoipa::ToSchema;

use crate::schema::PatientInput;
use crate::{GlucoError, Result};

/// A stored prediction record
#[derive(Debug, Clone, PartialEq, Serialize, FromRow, ToSchema)]
pub struct PatientRecord {
    pub id: i64,
    pub pregnancies: i64,
    pub glucose: f64,
    pub blood_pressure: f64,
    pub skin_thickness: f64,
    pub insulin: f64,
    pub bmi: f64,
    pub diabetes_pedigree_function: f64,
    pub age: i64,
    pub outcome: Option<i64>,
    pub predicted: Option<i64>,
    pub created_at: DateTime<Utc>,
}

/// A record about to be stored
#[derive(Debug, Clone)]
pub struct NewPatientRecord {
    pub input: PatientInput,
    pub predicted: Option<u8>,
}

impl NewPatientRecord {
    pub fn new(input: PatientInput, predicted: Option<u8>) -> Self {
        Self { input, predicted }
    }
}

/// Trait for record persistence
#[async_trait]
pub trait RecordRepository: Send + Sync {
    /// Store a record, returning it with its assigned id and timestamp
    async fn create_record(&self, record: &NewPatientRecord) -> Result<PatientRecord>;

    /// Most recent records first
    async fn list_records(&self, limit: i64) -> Result<Vec<PatientRecord>>;

    /// Check the store is reachable
    async fn ping(&self) -> bool;
}

/// SQLite-backed record store
pub struct SqliteRecordStore {
    pool: SqlitePool,
}

impl SqliteRecordStore {
    /// Connect, creating the database file if needed
    pub async fn connect(database_url: &str, pool_size: u32) -> Result<Self> {
        if let Some(parent) = database_url
            .strip_prefix("sqlite://")
            .and_then(|p| p.split('?').next())
            .and_then(|p| Path::new(p).parent())
            .filter(|p| !p.as_os_str().is_empty())
        {
            std::fs::create_dir_all(parent).map_err(|e| {
                GlucoError::DatabaseError(format!(
                    "Failed to create database directory {}: {e}",
                    parent.display()
                ))
            })?;
        }

        let options = SqliteConnectOptions::from_str(database_url)
            .map_err(|e| GlucoError::DatabaseError(format!("Invalid database URL: {e}")))?
            .create_if_missing(true);

        let pool = SqlitePoolOptions::new()
            .max_connections(pool_size.max(1))
            .connect_with(options)
            .await
            .map_err(|e| GlucoError::DatabaseError(format!("SQLite connection failed: {e}")))?;

        let store = Self { pool };
        store.init().await?;
        Ok(store)
    }

    /// Private in-memory store
    ///
    /// Each SQLite memory connection is its own database, so the pool is
    /// pinned to a single connection.
    pub async fn in_memory() -> Result<Self> {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .map_err(|e| GlucoError::DatabaseError(format!("SQLite connection failed: {e}")))?;

        let store = Self { pool };
        store.init().await?;
        Ok(store)
    }

    /// Create from an existing pool
    pub fn from_pool(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Create the records table if absent
    pub async fn init(&self) -> Result<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS patient_records (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                pregnancies INTEGER NOT NULL,
                glucose REAL NOT NULL,
                blood_pressure REAL NOT NULL,
                skin_thickness REAL NOT NULL,
                insulin REAL NOT NULL,
                bmi REAL NOT NULL,
                diabetes_pedigree_function REAL NOT NULL,
                age INTEGER NOT NULL,
                outcome INTEGER,
                predicted INTEGER,
                created_at TEXT NOT NULL
            )
            "#,
        )
        .execute(&self.pool)
        .await
        .map_err(|e| GlucoError::DatabaseError(format!("Failed to create table: {e}")))?;

        Ok(())
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}

#[async_trait]
impl RecordRepository for SqliteRecordStore {
    async fn create_record(&self, record: &NewPatientRecord) -> Result<PatientRecord> {
        let input = &record.input;
        let predicted = record.predicted.map(i64::from);
        let created_at = Utc::now();

        let result = sqlx::query(
            r#"
            INSERT INTO patient_records (
                pregnancies, glucose, blood_pressure, skin_thickness, insulin,
                bmi, diabetes_pedigree_function, age, outcome, predicted, created_at
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(input.pregnancies)
        .bind(input.glucose)
        .bind(input.blood_pressure)
        .bind(input.skin_thickness)
        .bind(input.insulin)
        .bind(input.bmi)
        .bind(input.diabetes_pedigree_function)
        .bind(input.age)
        .bind(input.outcome)
        .bind(predicted)
        .bind(created_at)
        .execute(&self.pool)
        .await
        .map_err(|e| GlucoError::DatabaseError(format!("Failed to create record: {e}")))?;

        let id = result.last_insert_rowid();
        tracing::debug!(record_id = id, ?predicted, "Stored patient record");

        Ok(PatientRecord {
            id,
            pregnancies: input.pregnancies,
            glucose: input.glucose,
            blood_pressure: input.blood_pressure,
            skin_thickness: input.skin_thickness,
            insulin: input.insulin,
            bmi: input.bmi,
            diabetes_pedigree_function: input.diabetes_pedigree_function,
            age: input.age,
            outcome: input.outcome,
            predicted,
            created_at,
        })
    }

    async fn list_records(&self, limit: i64) -> Result<Vec<PatientRecord>> {
        sqlx::query_as::<_, PatientRecord>(
            r#"
            SELECT
                id, pregnancies, glucose, blood_pressure, skin_thickness, insulin,
                bmi, diabetes_pedigree_function, age, outcome, predicted, created_at
            FROM patient_records
            ORDER BY id DESC
            LIMIT ?
            "#,
        )
        .bind(limit)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| GlucoError::DatabaseError(format!("Failed to list records: {e}")))
    }

    async fn ping(&self) -> bool {
        sqlx::query("SELECT 1").execute(&self.pool).await.is_ok()
    }
}
