use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::instrument;

use crate::{
    dao::{Repositories, statistics::StatisticsRepository},
    model::{apperror::ErrorType, models::StatisticAddInputType},
};

/**
 * Outcome of a ledger write. Never an error for the caller.
 */
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordOutcome {
    Recorded,
    SkippedNoClient,
    SkippedDuplicate,
    Failed,
}

/**
 * Represents the service for the usage ledger.
 */
#[derive(Clone)]
pub struct StatisticsService {
    /**
     * The DAO for statistics operations.
     */
    statistics_repository: Arc<dyn StatisticsRepository>,
}

impl StatisticsService {
    /**
     * Creates a new instance of `StatisticsService`.
     *
     * # Arguments
     * `repositories`: The data access objects.
     *
     * # Returns
     * A new instance of `StatisticsService`.
     */
    pub fn new(repositories: &Repositories) -> Self {
        StatisticsService { statistics_repository: repositories.statistics.clone() }
    }

    /**
     * Records one quote computation.
     *
     * Nothing is written for a blank client id or when an entry with the same
     * (time, postcode, vehicle) already exists. Persistence failures are logged and swallowed.
     *
     * # Arguments
     * `date_time`: Time of the computation.
     * `postcode`: Postcode as supplied by the caller.
     * `vehicle_name`: Name of the rated vehicle.
     * `km`: Annual distance.
     * `premium`: Computed premium.
     * `client_id`: Client identifier, usually the client IP address.
     *
     * # Returns
     * What happened to the entry.
     */
    #[instrument(skip(self))]
    pub async fn record(&self, date_time: DateTime<Utc>, postcode: &str, vehicle_name: &str, km: i32, premium: f64, client_id: &str) -> RecordOutcome {
        if client_id.trim().is_empty() {
            tracing::info!("No client id available, statistic not recorded");
            return RecordOutcome::SkippedNoClient;
        }
        match self.statistics_repository.exists(date_time, postcode, vehicle_name).await {
            Ok(true) => {
                tracing::info!("Duplicate entry found for vehicle: {}, postcode: {}, dateTime: {}", vehicle_name, postcode, date_time);
                return RecordOutcome::SkippedDuplicate;
            }
            Ok(false) => {}
            Err(err) => {
                tracing::warn!("Failed to check for existing statistic: {}", err);
                return RecordOutcome::Failed;
            }
        }
        let statistic = StatisticAddInputType::new(date_time, postcode.to_string(), vehicle_name.to_string(), km, premium, client_id.to_string());
        match self.statistics_repository.add(statistic).await {
            Ok(()) => {
                tracing::info!("Statistic recorded for vehicle: {}, postcode: {}", vehicle_name, postcode);
                RecordOutcome::Recorded
            }
            Err(err) if err.error_type == ErrorType::ConstraintViolation => {
                tracing::info!("Concurrent duplicate for vehicle: {}, postcode: {}, dateTime: {}", vehicle_name, postcode, date_time);
                RecordOutcome::SkippedDuplicate
            }
            Err(err) => {
                tracing::warn!("Failed to record statistic: {}", err);
                RecordOutcome::Failed
            }
        }
    }
}
