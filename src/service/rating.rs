use std::sync::Arc;

use chrono::Utc;
use tracing::instrument;

use crate::{
    dao::{
        Repositories,
        geo::{CityRepository, PostcodeRepository, RegionRepository},
        rating::VehicleRepository,
    },
    model::{
        apperror::{ApplicationError, ErrorType, Lookup},
        models::{PremiumRequestInputType, PremiumResult},
    },
    service::{resolver::Resolver, statistics::StatisticsService},
};

/**
 * Computes premiums: `basis * vehicle factor * distance factor * region factor`.
 */
#[derive(Clone)]
pub struct RatingService {
    /**
     * Base rate multiplied by all factors.
     */
    basis: u32,
    resolver: Resolver,
    regions: Arc<dyn RegionRepository>,
    cities: Arc<dyn CityRepository>,
    postcodes: Arc<dyn PostcodeRepository>,
    vehicles: Arc<dyn VehicleRepository>,
    statistics_service: StatisticsService,
}

impl RatingService {
    /**
     * Creates a new instance of `RatingService`.
     *
     * # Arguments
     * `basis`: Base rate of the premium.
     * `repositories`: The data access objects.
     * `statistics_service`: Usage ledger written by `compute_and_record`.
     */
    pub fn new(basis: u32, repositories: &Repositories, statistics_service: StatisticsService) -> Self {
        RatingService {
            basis,
            resolver: Resolver::new(repositories),
            regions: repositories.regions.clone(),
            cities: repositories.cities.clone(),
            postcodes: repositories.postcodes.clone(),
            vehicles: repositories.vehicles.clone(),
            statistics_service,
        }
    }

    /**
     * Computes the premium. The three factor lookups run concurrently; the first
     * failing lookup is returned.
     */
    #[instrument(skip(self))]
    pub async fn compute_premium(&self, vehicle_id: i64, anno_kilometers: i32, postcode: &str) -> Result<f64, ApplicationError> {
        let (bracket_factor, vehicle_factor, region_factor) = tokio::try_join!(
            self.resolver.bracket_factor_for_distance(anno_kilometers),
            self.resolver.vehicle_factor_for_id(vehicle_id),
            self.resolver.region_factor_for_postcode(postcode),
        )
        .inspect_err(|err| tracing::error!("Failed to compute premium: {}", err))?;
        Ok(f64::from(self.basis) * vehicle_factor * bracket_factor * region_factor)
    }

    /**
     * Validates a machine-facing premium request before computation. Every rule runs.
     *
     * # Returns
     * The validation messages. Empty when the request can be computed.
     */
    #[instrument(skip(self))]
    pub async fn validate_premium_request(&self, request: &PremiumRequestInputType) -> Result<Vec<String>, ApplicationError> {
        let mut messages = Vec::new();
        if request.vehicle_id.is_none() {
            messages.push("vehicleId must be provided.".to_string());
        }
        if request.anno_kilometers.is_none() {
            messages.push("annoKilometers must be provided.".to_string());
        }
        if request.postcode.is_none() {
            messages.push("postcode must be provided.".to_string());
        }
        if let Some(vehicle_id) = request.vehicle_id
            && self.vehicles.find_by_id(vehicle_id).await?.is_none()
        {
            messages.push("No vehicle found for the given ID.".to_string());
        }
        if let Some(postcode) = &request.postcode
            && self.postcodes.find_first_by_value(postcode).await?.is_none()
        {
            messages.push("No postcode entry found for the given value.".to_string());
        }
        if let Some(anno_kilometers) = request.anno_kilometers
            && anno_kilometers <= 0
        {
            messages.push("annoKilometers must be greater than 0.".to_string());
        }
        Ok(messages)
    }

    /**
     * Computes a premium for a human-facing form and records the usage statistic.
     *
     * Each lookup fails with its own error. The ledger write never affects the result.
     *
     * # Arguments
     * `anno_kilometers`: Annual distance.
     * `postcode`: Complete postcode.
     * `vehicle_id`: Vehicle type id.
     * `client_id`: Client identifier recorded with the statistic.
     *
     * # Returns
     * The premium and the name of the resolved region.
     */
    #[instrument(skip(self))]
    pub async fn compute_and_record(&self, anno_kilometers: i32, postcode: &str, vehicle_id: i64, client_id: &str) -> Result<PremiumResult, ApplicationError> {
        let postcode_entry = self.postcodes.find_first_by_value(postcode).await?.ok_or_else(|| ApplicationError::new(ErrorType::NotFound(Lookup::Postcode), format!("Invalid postcode '{postcode}'")))?;
        let city = self.cities.find_by_id(postcode_entry.city_id).await?.ok_or_else(|| ApplicationError::new(ErrorType::NotFound(Lookup::City), format!("City not found for postcode '{postcode}'")))?;
        let region = self.regions.find_by_id(city.region_id).await?.ok_or_else(|| ApplicationError::new(ErrorType::NotFound(Lookup::Region), format!("Region not found for postcode '{postcode}'")))?;
        let vehicle = self.vehicles.find_by_id(vehicle_id).await?.ok_or_else(|| ApplicationError::new(ErrorType::NotFound(Lookup::Vehicle), format!("Vehicle not found for id '{vehicle_id}'")))?;

        let premium = self.compute_premium(vehicle_id, anno_kilometers, postcode).await?;
        self.statistics_service.record(Utc::now(), postcode, &vehicle.name, anno_kilometers, premium, client_id).await;
        Ok(PremiumResult::new(premium, region.name))
    }
}
