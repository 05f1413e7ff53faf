pub mod geo;
pub mod rating;
pub mod statistics;

#[cfg(test)]
pub mod memory;

use std::borrow::Cow;
use std::sync::Arc;

use sqlx::{Pool, Postgres};

use crate::dao::geo::{CityRepository, GeoDao, PostcodeRepository, RegionRepository};
use crate::dao::rating::{AnnoKilometersRepository, RatingDao, VehicleRepository};
use crate::dao::statistics::{StatisticsDao, StatisticsRepository};
use crate::model::apperror::{ApplicationError, ErrorType};

/**
 * The data access objects the services depend on. Services only see the traits.
 */
#[derive(Clone)]
pub struct Repositories {
    pub regions: Arc<dyn RegionRepository>,
    pub cities: Arc<dyn CityRepository>,
    pub postcodes: Arc<dyn PostcodeRepository>,
    pub vehicles: Arc<dyn VehicleRepository>,
    pub anno_kilometers: Arc<dyn AnnoKilometersRepository>,
    pub statistics: Arc<dyn StatisticsRepository>,
}

impl Repositories {
    /**
     * Creates repositories backed by `PostgreSQL`.
     *
     * # Arguments
     * `connection_pool`: The database connection pool.
     */
    pub fn postgres(connection_pool: &Pool<Postgres>) -> Self {
        let geo_dao = Arc::new(GeoDao::new(connection_pool.clone()));
        let rating_dao = Arc::new(RatingDao::new(connection_pool.clone()));
        Repositories {
            regions: geo_dao.clone(),
            cities: geo_dao.clone(),
            postcodes: geo_dao,
            vehicles: rating_dao.clone(),
            anno_kilometers: rating_dao,
            statistics: Arc::new(StatisticsDao::new(connection_pool.clone())),
        }
    }

    /**
     * Creates repositories backed by a shared in-memory store.
     */
    #[cfg(test)]
    pub fn memory(store: &memory::MemoryStore) -> Self {
        let store = Arc::new(store.clone());
        Repositories {
            regions: store.clone(),
            cities: store.clone(),
            postcodes: store.clone(),
            vehicles: store.clone(),
            anno_kilometers: store.clone(),
            statistics: store,
        }
    }
}

/**
 * Handles database errors and maps them to application errors.
 *
 * # Arguments
 * `error`: The sqlx error to handle.
 * `context`: Short description of the failed operation.
 *
 * # Returns
 * An `ApplicationError` corresponding to the database error.
 */
pub fn handle_database_error(error: &sqlx::Error, context: &str) -> ApplicationError {
    if let Some(db_error) = error.as_database_error() {
        tracing::debug!("Database error: {}", db_error);
        if db_error.code() == Some(Cow::Borrowed("23505")) {
            // Unique violation
            return ApplicationError::new(ErrorType::ConstraintViolation, format!("{context}: already exists"));
        } else if db_error.code() == Some(Cow::Borrowed("23503")) {
            // Foreign key violation
            return ApplicationError::new(ErrorType::ConstraintViolation, format!("{context}: missing parent value"));
        }
        tracing::error!("Unhandled database error: {}", db_error);
        return ApplicationError::new(ErrorType::DatabaseError, format!("{context}: unhandled database error"));
    }
    ApplicationError::new(ErrorType::DatabaseError, format!("{context}: {error}"))
}
