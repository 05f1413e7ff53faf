use async_trait::async_trait;
use sqlx::{Pool, Postgres};
use tracing::{Instrument, instrument};

use crate::dao::handle_database_error;
use crate::model::{
    apperror::ApplicationError,
    models::{AnnoKilometers, Vehicle},
};

/**
 * Database response type for vehicle queries.
 */
pub type QueryVehicleDbResp = (i64, String, f64);

/**
 * Database response type for distance bracket queries.
 */
pub type QueryAnnoKilometersDbResp = (i64, i32, i32, f64);

const QUERY_VEHICLE_BY_ID: &str = "SELECT id, name, factor FROM vehicle WHERE id = $1";

const QUERY_VEHICLE_LIST: &str = "SELECT id, name, factor FROM vehicle ORDER BY id";

/**
 * Brackets are returned in table order so the first match is deterministic.
 */
const QUERY_ANNO_KILOMETERS_ENCLOSING: &str = "SELECT id, min_km, max_km, factor FROM anno_kilometers WHERE min_km <= $1 AND max_km >= $1 ORDER BY id";

const QUERY_ANNO_KILOMETERS_LIST: &str = "SELECT id, min_km, max_km, factor FROM anno_kilometers ORDER BY id";

/**
 * Data access for vehicle types.
 */
#[async_trait]
pub trait VehicleRepository: Send + Sync {
    async fn find_by_id(&self, id: i64) -> Result<Option<Vehicle>, ApplicationError>;

    async fn find_all(&self) -> Result<Vec<Vehicle>, ApplicationError>;
}

/**
 * Data access for annual distance brackets.
 */
#[async_trait]
pub trait AnnoKilometersRepository: Send + Sync {
    /**
     * Lists every bracket with `min <= km <= max` in table order.
     */
    async fn find_enclosing(&self, km: i32) -> Result<Vec<AnnoKilometers>, ApplicationError>;

    async fn find_all(&self) -> Result<Vec<AnnoKilometers>, ApplicationError>;
}

impl From<QueryVehicleDbResp> for Vehicle {
    fn from(row: QueryVehicleDbResp) -> Self {
        Vehicle::new(row.0, row.1, row.2)
    }
}

impl From<QueryAnnoKilometersDbResp> for AnnoKilometers {
    fn from(row: QueryAnnoKilometersDbResp) -> Self {
        AnnoKilometers::new(row.0, row.1, row.2, row.3)
    }
}

/**
 * `PostgreSQL` backed DAO for the rating tables.
 */
#[derive(Clone)]
pub struct RatingDao {
    connection_pool: Pool<Postgres>,
}

impl RatingDao {
    /**
     * Creates a new instance of `RatingDao`.
     *
     * # Arguments
     * `connection_pool`: The database connection pool.
     */
    pub fn new(connection_pool: Pool<Postgres>) -> Self {
        RatingDao { connection_pool }
    }
}

#[async_trait]
impl VehicleRepository for RatingDao {
    #[instrument(skip(self))]
    async fn find_by_id(&self, id: i64) -> Result<Option<Vehicle>, ApplicationError> {
        let span = tracing::Span::current();
        let result: Option<QueryVehicleDbResp> = sqlx::query_as(QUERY_VEHICLE_BY_ID)
            .bind(id)
            .fetch_optional(&self.connection_pool)
            .instrument(span)
            .await
            .map_err(|err| handle_database_error(&err, "Failed to query vehicle"))?;
        Ok(result.map(Vehicle::from))
    }

    #[instrument(skip(self))]
    async fn find_all(&self) -> Result<Vec<Vehicle>, ApplicationError> {
        let span = tracing::Span::current();
        let results: Vec<QueryVehicleDbResp> = sqlx::query_as(QUERY_VEHICLE_LIST)
            .fetch_all(&self.connection_pool)
            .instrument(span)
            .await
            .map_err(|err| handle_database_error(&err, "Failed to query vehicle list"))?;
        Ok(results.into_iter().map(Vehicle::from).collect())
    }
}

#[async_trait]
impl AnnoKilometersRepository for RatingDao {
    #[instrument(skip(self))]
    async fn find_enclosing(&self, km: i32) -> Result<Vec<AnnoKilometers>, ApplicationError> {
        let span = tracing::Span::current();
        let results: Vec<QueryAnnoKilometersDbResp> = sqlx::query_as(QUERY_ANNO_KILOMETERS_ENCLOSING)
            .bind(km)
            .fetch_all(&self.connection_pool)
            .instrument(span)
            .await
            .map_err(|err| handle_database_error(&err, "Failed to query distance brackets"))?;
        Ok(results.into_iter().map(AnnoKilometers::from).collect())
    }

    #[instrument(skip(self))]
    async fn find_all(&self) -> Result<Vec<AnnoKilometers>, ApplicationError> {
        let span = tracing::Span::current();
        let results: Vec<QueryAnnoKilometersDbResp> = sqlx::query_as(QUERY_ANNO_KILOMETERS_LIST)
            .fetch_all(&self.connection_pool)
            .instrument(span)
            .await
            .map_err(|err| handle_database_error(&err, "Failed to query distance bracket list"))?;
        Ok(results.into_iter().map(AnnoKilometers::from).collect())
    }
}
