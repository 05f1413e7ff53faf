use std::sync::Arc;

use tracing::instrument;

use crate::{
    dao::{
        Repositories,
        geo::{CityRepository, PostcodeRepository, RegionRepository},
        rating::{AnnoKilometersRepository, VehicleRepository},
    },
    model::{
        apperror::{ApplicationError, Lookup},
        models::{AnnoKilometers, Postcode, PostcodeAddInputType, Region, Vehicle},
    },
};

/**
 * Read access to the reference tables and registration of geographic data.
 */
#[derive(Clone)]
pub struct CatalogService {
    regions: Arc<dyn RegionRepository>,
    cities: Arc<dyn CityRepository>,
    postcodes: Arc<dyn PostcodeRepository>,
    vehicles: Arc<dyn VehicleRepository>,
    anno_kilometers: Arc<dyn AnnoKilometersRepository>,
}

impl CatalogService {
    pub fn new(repositories: &Repositories) -> Self {
        CatalogService {
            regions: repositories.regions.clone(),
            cities: repositories.cities.clone(),
            postcodes: repositories.postcodes.clone(),
            vehicles: repositories.vehicles.clone(),
            anno_kilometers: repositories.anno_kilometers.clone(),
        }
    }

    /**
     * Lists vehicle types sorted by name.
     */
    pub async fn list_vehicles(&self) -> Result<Vec<Vehicle>, ApplicationError> {
        let mut vehicles = self.vehicles.find_all().await?;
        vehicles.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(vehicles)
    }

    pub async fn list_regions(&self) -> Result<Vec<Region>, ApplicationError> {
        self.regions.find_all().await
    }

    pub async fn list_anno_kilometers(&self) -> Result<Vec<AnnoKilometers>, ApplicationError> {
        self.anno_kilometers.find_all().await
    }

    /**
     * Lists postcode values starting with the input, sorted ascending. Blank input matches nothing.
     */
    #[instrument(skip(self))]
    pub async fn postcodes_with_prefix(&self, input: &str) -> Result<Vec<String>, ApplicationError> {
        let input = input.trim();
        if input.is_empty() {
            return Ok(vec![]);
        }
        let postcodes = self.postcodes.find_by_prefix(input).await?;
        Ok(postcodes.into_iter().map(|postcode| postcode.value).collect())
    }

    /**
     * Registers a postcode under a city of an existing region.
     *
     * An existing postcode with the same value is returned unchanged and nothing is created.
     * Otherwise the city is looked up by name and created if missing.
     *
     * # Arguments
     * `postcode_add_input`: Region name, city name and postcode value.
     *
     * # Returns
     * The stored postcode.
     */
    #[instrument(skip(self))]
    pub async fn register_postcode(&self, postcode_add_input: PostcodeAddInputType) -> Result<Postcode, ApplicationError> {
        let postcode_add_input = postcode_add_input.validate()?;
        let region = self.regions.find_by_name(&postcode_add_input.region_name).await?.ok_or_else(|| {
            tracing::warn!("Region not found: {}", postcode_add_input.region_name);
            ApplicationError::not_found(Lookup::Region, &postcode_add_input.region_name)
        })?;
        if let Some(postcode) = self.postcodes.find_first_by_value(&postcode_add_input.postcode_value).await? {
            tracing::debug!("Postcode {} already registered", postcode.value);
            return Ok(postcode);
        }
        let city = match self.cities.find_first_by_name(&postcode_add_input.city_name).await? {
            Some(city) => city,
            None => self.cities.add(&postcode_add_input.city_name, region.id).await?,
        };
        self.postcodes.add(&postcode_add_input.postcode_value, city.id, Some(region.id)).await
    }
}
