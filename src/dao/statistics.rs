use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{Pool, Postgres};
use tracing::{Instrument, instrument};

use crate::dao::handle_database_error;
use crate::model::{apperror::ApplicationError, models::StatisticAddInputType};

/**
 * SQL query checking for an existing entry with the same time, postcode and vehicle.
 */
const QUERY_STATISTIC_EXISTS: &str = "SELECT EXISTS (SELECT 1 FROM statistics WHERE date_time = $1 AND postcode = $2 AND vehicle = $3)";

/**
 * SQL query to add a new statistic.
 */
const ADD_STATISTIC: &str = "INSERT INTO statistics (date_time, postcode, vehicle, anno_kilometers, premium, ip_address) VALUES ($1, $2, $3, $4, $5, $6)";

/**
 * Data access for the usage ledger.
 */
#[async_trait]
pub trait StatisticsRepository: Send + Sync {
    /**
     * Checks whether an entry for the (time, postcode, vehicle) triple already exists.
     */
    async fn exists(&self, date_time: DateTime<Utc>, postcode: &str, vehicle: &str) -> Result<bool, ApplicationError>;

    /**
     * Adds a new entry. A unique violation is reported as `ErrorType::ConstraintViolation`.
     */
    async fn add(&self, statistic_add_input: StatisticAddInputType) -> Result<(), ApplicationError>;
}

/**
 * DAO for statistics-related database operations.
 */
#[derive(Clone)]
pub struct StatisticsDao {
    connection_pool: Pool<Postgres>,
}

impl StatisticsDao {
    /**
     * Creates a new instance of `StatisticsDao`.
     *
     * # Arguments
     * `connection_pool`: The database connection pool.
     *
     * # Returns
     * A new instance of `StatisticsDao`.
     */
    pub fn new(connection_pool: Pool<Postgres>) -> Self {
        StatisticsDao { connection_pool }
    }
}

#[async_trait]
impl StatisticsRepository for StatisticsDao {
    #[instrument(skip(self))]
    async fn exists(&self, date_time: DateTime<Utc>, postcode: &str, vehicle: &str) -> Result<bool, ApplicationError> {
        let span = tracing::Span::current();
        let result: (bool,) = sqlx::query_as(QUERY_STATISTIC_EXISTS)
            .bind(date_time)
            .bind(postcode)
            .bind(vehicle)
            .fetch_one(&self.connection_pool)
            .instrument(span)
            .await
            .map_err(|err| handle_database_error(&err, "Failed to query statistics"))?;
        Ok(result.0)
    }

    /**
     * Adds a new statistic to the database.
     *
     * # Arguments
     * `statistic_add_input`: The statistic to be added.
     *
     * # Returns
     * A result indicating success or failure of the operation.
     */
    #[instrument(skip(self, statistic_add_input))]
    async fn add(&self, statistic_add_input: StatisticAddInputType) -> Result<(), ApplicationError> {
        let span = tracing::Span::current();
        sqlx::query(ADD_STATISTIC)
            .bind(statistic_add_input.date_time)
            .bind(statistic_add_input.postcode)
            .bind(statistic_add_input.vehicle)
            .bind(statistic_add_input.anno_kilometers)
            .bind(statistic_add_input.premium)
            .bind(statistic_add_input.ip_address)
            .execute(&self.connection_pool)
            .instrument(span)
            .await
            .map_err(|err| handle_database_error(&err, "Failed to add statistic"))?;
        Ok(())
    }
}

#[cfg(feature = "integration-test")]
#[cfg(test)]
pub(crate) mod integration_test {
    use super::*;
    use crate::model::apperror::ErrorType;
    use sqlx::PgPool;

    #[tokio::test]
    async fn test_add_then_exists_then_conflict() {
        let pool = init_db().await;
        let statistics_dao = StatisticsDao::new(pool.clone());
        let now = Utc::now();
        let input = StatisticAddInputType::new(now, "99998".to_string(), "Integration".to_string(), 2000, 843.75, "127.0.0.1".to_string());
        assert!(!statistics_dao.exists(now, "99998", "Integration").await.unwrap());
        statistics_dao.add(input.clone()).await.unwrap();
        assert!(statistics_dao.exists(now, "99998", "Integration").await.unwrap());
        let conflict = statistics_dao.add(input).await.unwrap_err();
        assert_eq!(conflict.error_type, ErrorType::ConstraintViolation);
        sqlx::query("DELETE FROM statistics WHERE postcode = '99998'").execute(&pool).await.unwrap();
    }

    /**
     * Initialize the database connection pool.
     */
    pub(crate) async fn init_db() -> PgPool {
        dotenv::from_filename("./.env-test").ok();
        let pool = PgPool::connect(dotenv::var("DATABASE_URL").unwrap().as_str()).await.unwrap();
        sqlx::migrate!("./migrations").run(&pool).await.unwrap();
        pool
    }
}
