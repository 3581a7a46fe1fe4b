#![cfg(feature = "db")]

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{postgres::PgPoolOptions, FromRow, PgPool};
use std::time::Duration;
use tracing::{info, warn};

use super::{GridStateRepository, OptimizationResultRepository};
use crate::config::DbConfig;
use crate::domain::{GridSample, OptimizationRecord};
use crate::error::StorageError;

#[derive(Debug, FromRow)]
struct GridStateRow {
    region: String,
    demand: f64,
    supply: f64,
    current_load: f64,
    capacity: f64,
    efficiency: f64,
    observed_at: DateTime<Utc>,
}

impl From<GridStateRow> for GridSample {
    fn from(row: GridStateRow) -> Self {
        Self {
            region: row.region,
            demand: row.demand,
            supply: row.supply,
            observed_at: row.observed_at,
            current_load: row.current_load,
            capacity_mw: row.capacity,
            efficiency_percent: row.efficiency,
        }
    }
}

#[derive(Debug, FromRow)]
struct OptimizationResultRow {
    region: String,
    optimized_supply: f64,
    optimized_demand: f64,
    losses: f64,
    computed_at: DateTime<Utc>,
    iterations: i32,
    algorithm: String,
}

impl From<OptimizationResultRow> for OptimizationRecord {
    fn from(row: OptimizationResultRow) -> Self {
        Self {
            region: row.region,
            optimized_supply: row.optimized_supply,
            optimized_demand: row.optimized_demand,
            losses: row.losses,
            computed_at: row.computed_at,
            iterations: row.iterations.max(0) as u32,
            algorithm: row.algorithm,
        }
    }
}

const GRID_STATE_COLUMNS: &str =
    "region, demand, supply, current_load, capacity, efficiency, observed_at";
const RESULT_COLUMNS: &str =
    "region, optimized_supply, optimized_demand, losses, computed_at, iterations, algorithm";

/// PostgreSQL backend. Every append is a single-row INSERT; "latest" is
/// `ORDER BY timestamp DESC, id DESC` so ties go to the last insert.
pub struct PgRepo {
    pub pool: PgPool,
}

impl PgRepo {
    pub async fn connect(cfg: &DbConfig) -> Result<Self> {
        let pool = connect_with_retry(cfg, 5).await?;
        sqlx::query("SELECT 1")
            .execute(&pool)
            .await
            .context("Database health check failed")?;
        info!("database connection pool initialized");
        Ok(Self { pool })
    }

    pub async fn health_check(&self) -> Result<(), StorageError> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}

async fn connect_with_retry(cfg: &DbConfig, max_attempts: usize) -> Result<PgPool> {
    let mut attempt = 0;
    let mut delay = Duration::from_secs(1);
    loop {
        attempt += 1;
        let result = PgPoolOptions::new()
            .max_connections(cfg.max_connections)
            .acquire_timeout(Duration::from_secs(cfg.acquire_timeout_secs))
            .connect(&cfg.url)
            .await;
        match result {
            Ok(pool) => return Ok(pool),
            Err(e) if attempt >= max_attempts => {
                return Err(e).context(format!(
                    "Failed to connect to database after {} attempts",
                    max_attempts
                ));
            }
            Err(e) => {
                warn!(
                    "Database connection attempt {}/{} failed: {}. Retrying in {:?}",
                    attempt, max_attempts, e, delay
                );
                tokio::time::sleep(delay).await;
                delay *= 2;
            }
        }
    }
}

#[async_trait]
impl GridStateRepository for PgRepo {
    async fn append(&self, sample: GridSample) -> Result<(), StorageError> {
        sqlx::query(
            r#"
            INSERT INTO grid_state (region, demand, supply, current_load, capacity, efficiency, observed_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            "#,
        )
        .bind(&sample.region)
        .bind(sample.demand)
        .bind(sample.supply)
        .bind(sample.current_load)
        .bind(sample.capacity_mw)
        .bind(sample.efficiency_percent)
        .bind(sample.observed_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn latest(&self, region: Option<&str>) -> Result<Option<GridSample>, StorageError> {
        let sql = format!(
            "SELECT {GRID_STATE_COLUMNS} FROM grid_state \
             WHERE ($1::text IS NULL OR region = $1) \
             ORDER BY observed_at DESC, id DESC LIMIT 1"
        );
        let row = sqlx::query_as::<_, GridStateRow>(&sql)
            .bind(region)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(Into::into))
    }

    async fn history(
        &self,
        region: Option<&str>,
        limit: usize,
    ) -> Result<Vec<GridSample>, StorageError> {
        let sql = format!(
            "SELECT {GRID_STATE_COLUMNS} FROM grid_state \
             WHERE ($1::text IS NULL OR region = $1) \
             ORDER BY observed_at DESC, id DESC LIMIT $2"
        );
        let rows = sqlx::query_as::<_, GridStateRow>(&sql)
            .bind(region)
            .bind(limit as i64)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows.into_iter().map(Into::into).collect())
    }

    async fn ping(&self) -> Result<(), StorageError> {
        self.health_check().await
    }
}

#[async_trait]
impl OptimizationResultRepository for PgRepo {
    async fn append(&self, record: OptimizationRecord) -> Result<(), StorageError> {
        sqlx::query(
            r#"
            INSERT INTO optimization_result (region, optimized_supply, optimized_demand, losses, computed_at, iterations, algorithm)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            "#,
        )
        .bind(&record.region)
        .bind(record.optimized_supply)
        .bind(record.optimized_demand)
        .bind(record.losses)
        .bind(record.computed_at)
        .bind(record.iterations as i32)
        .bind(&record.algorithm)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn latest(
        &self,
        region: Option<&str>,
    ) -> Result<Option<OptimizationRecord>, StorageError> {
        let sql = format!(
            "SELECT {RESULT_COLUMNS} FROM optimization_result \
             WHERE ($1::text IS NULL OR region = $1) \
             ORDER BY computed_at DESC, id DESC LIMIT 1"
        );
        let row = sqlx::query_as::<_, OptimizationResultRow>(&sql)
            .bind(region)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(Into::into))
    }

    async fn history(
        &self,
        region: Option<&str>,
        limit: usize,
    ) -> Result<Vec<OptimizationRecord>, StorageError> {
        let sql = format!(
            "SELECT {RESULT_COLUMNS} FROM optimization_result \
             WHERE ($1::text IS NULL OR region = $1) \
             ORDER BY computed_at DESC, id DESC LIMIT $2"
        );
        let rows = sqlx::query_as::<_, OptimizationResultRow>(&sql)
            .bind(region)
            .bind(limit as i64)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows.into_iter().map(Into::into).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    #[ignore = "requires database"]
    async fn test_pg_latest_roundtrip() {
        let cfg = DbConfig {
            url: std::env::var("DATABASE_URL").unwrap_or_default(),
            ..DbConfig::default()
        };
        let repo = PgRepo::connect(&cfg).await.unwrap();
        let sample = GridSample::new("test-region", 10.0, 12.0, Utc::now());
        GridStateRepository::append(&repo, sample.clone()).await.unwrap();
        let latest = GridStateRepository::latest(&repo, Some("test-region"))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(latest.demand, 10.0);
    }
}
