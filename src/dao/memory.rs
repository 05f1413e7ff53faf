//! In-memory implementations of the data access traits, used by unit tests.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;

use crate::dao::geo::{CityRepository, PostcodeRepository, RegionRepository};
use crate::dao::rating::{AnnoKilometersRepository, VehicleRepository};
use crate::dao::statistics::StatisticsRepository;
use crate::model::{
    apperror::{ApplicationError, ErrorType},
    models::{AnnoKilometers, City, Postcode, Region, StatisticAddInputType, Vehicle},
};

#[derive(Debug, Default)]
struct Tables {
    regions: Vec<Region>,
    cities: Vec<City>,
    postcodes: Vec<Postcode>,
    vehicles: Vec<Vehicle>,
    anno_kilometers: Vec<AnnoKilometers>,
    statistics: Vec<StatisticAddInputType>,
}

/**
 * In-memory store implementing every repository trait.
 */
#[derive(Debug, Default, Clone)]
pub struct MemoryStore {
    tables: Arc<RwLock<Tables>>,
    fail_statistics_lookups: Arc<AtomicBool>,
    fail_statistics_writes: Arc<AtomicBool>,
    hide_statistics: Arc<AtomicBool>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /**
     * Store holding the reference brackets plus a small geographic catalog:
     * regions 1 "Bayern" (1.5) and 2 "Mecklenburg-Vorpommern" (0.5),
     * cities 1 "München" and 2 "Rostock", postcodes "80331" and "18055",
     * vehicles 1 "Pkw Kraftstoff" (1.5) and 2 "Traktor" (0.5).
     */
    pub async fn seeded() -> Self {
        let store = Self::new();
        {
            let mut tables = store.tables.write().await;
            tables.regions = vec![Region::new(1, "Bayern".to_string(), 1.5), Region::new(2, "Mecklenburg-Vorpommern".to_string(), 0.5)];
            tables.cities = vec![City::new(1, "München".to_string(), 1), City::new(2, "Rostock".to_string(), 2)];
            tables.postcodes = vec![Postcode::new(1, "80331".to_string(), 1, Some(1)), Postcode::new(2, "18055".to_string(), 2, Some(2))];
            tables.vehicles = vec![Vehicle::new(1, "Pkw Kraftstoff".to_string(), 1.5), Vehicle::new(2, "Traktor".to_string(), 0.5)];
            tables.anno_kilometers = vec![
                AnnoKilometers::new(1, 0, 5000, 0.5),
                AnnoKilometers::new(2, 5001, 10000, 1.0),
                AnnoKilometers::new(3, 10001, 20000, 1.5),
                AnnoKilometers::new(4, 20001, i32::MAX, 2.0),
            ];
        }
        store
    }

    pub async fn insert_city(&self, city: City) {
        self.tables.write().await.cities.push(city);
    }

    pub async fn insert_postcode(&self, postcode: Postcode) {
        self.tables.write().await.postcodes.push(postcode);
    }

    pub async fn replace_anno_kilometers(&self, brackets: Vec<AnnoKilometers>) {
        self.tables.write().await.anno_kilometers = brackets;
    }

    pub async fn statistics(&self) -> Vec<StatisticAddInputType> {
        self.tables.read().await.statistics.clone()
    }

    pub async fn cities(&self) -> Vec<City> {
        self.tables.read().await.cities.clone()
    }

    pub async fn postcodes(&self) -> Vec<Postcode> {
        self.tables.read().await.postcodes.clone()
    }

    pub async fn insert_vehicle(&self, vehicle: Vehicle) {
        self.tables.write().await.vehicles.push(vehicle);
    }

    /**
     * Makes every subsequent statistics existence check fail with a database error.
     */
    pub fn fail_statistics_lookups(&self) {
        self.fail_statistics_lookups.store(true, Ordering::SeqCst);
    }

    /**
     * Makes every subsequent statistics insert fail with a database error.
     */
    pub fn fail_statistics_writes(&self) {
        self.fail_statistics_writes.store(true, Ordering::SeqCst);
    }

    /**
     * Makes the existence check report no entry, as when a concurrent writer inserts
     * between the check and the insert. The insert still enforces uniqueness.
     */
    pub fn hide_statistics(&self) {
        self.hide_statistics.store(true, Ordering::SeqCst);
    }
}

#[async_trait]
impl RegionRepository for MemoryStore {
    async fn find_by_id(&self, id: i64) -> Result<Option<Region>, ApplicationError> {
        Ok(self.tables.read().await.regions.iter().find(|region| region.id == id).cloned())
    }

    async fn find_by_name(&self, name: &str) -> Result<Option<Region>, ApplicationError> {
        Ok(self.tables.read().await.regions.iter().find(|region| region.name == name).cloned())
    }

    async fn find_by_postcode_prefix(&self, prefix: &str) -> Result<Option<Region>, ApplicationError> {
        let tables = self.tables.read().await;
        let mut postcodes: Vec<&Postcode> = tables.postcodes.iter().filter(|postcode| postcode.value.starts_with(prefix)).collect();
        postcodes.sort_by(|a, b| a.value.cmp(&b.value).then(a.id.cmp(&b.id)));
        let region = postcodes
            .into_iter()
            .filter_map(|postcode| tables.cities.iter().find(|city| city.id == postcode.city_id))
            .find_map(|city| tables.regions.iter().find(|region| region.id == city.region_id));
        Ok(region.cloned())
    }

    async fn find_all(&self) -> Result<Vec<Region>, ApplicationError> {
        Ok(self.tables.read().await.regions.clone())
    }
}

#[async_trait]
impl CityRepository for MemoryStore {
    async fn find_by_id(&self, id: i64) -> Result<Option<City>, ApplicationError> {
        Ok(self.tables.read().await.cities.iter().find(|city| city.id == id).cloned())
    }

    async fn find_first_by_name(&self, name: &str) -> Result<Option<City>, ApplicationError> {
        Ok(self.tables.read().await.cities.iter().find(|city| city.name == name).cloned())
    }

    async fn add(&self, name: &str, region_id: i64) -> Result<City, ApplicationError> {
        let mut tables = self.tables.write().await;
        let id = tables.cities.iter().map(|city| city.id).max().unwrap_or(0) + 1;
        let city = City::new(id, name.to_string(), region_id);
        tables.cities.push(city.clone());
        Ok(city)
    }
}

#[async_trait]
impl PostcodeRepository for MemoryStore {
    async fn find_first_by_value(&self, value: &str) -> Result<Option<Postcode>, ApplicationError> {
        Ok(self.tables.read().await.postcodes.iter().find(|postcode| postcode.value == value).cloned())
    }

    async fn find_by_prefix(&self, prefix: &str) -> Result<Vec<Postcode>, ApplicationError> {
        let mut postcodes: Vec<Postcode> = self.tables.read().await.postcodes.iter().filter(|postcode| postcode.value.starts_with(prefix)).cloned().collect();
        postcodes.sort_by(|a, b| a.value.cmp(&b.value).then(a.id.cmp(&b.id)));
        Ok(postcodes)
    }

    async fn add(&self, value: &str, city_id: i64, region_id: Option<i64>) -> Result<Postcode, ApplicationError> {
        let mut tables = self.tables.write().await;
        let id = tables.postcodes.iter().map(|postcode| postcode.id).max().unwrap_or(0) + 1;
        let postcode = Postcode::new(id, value.to_string(), city_id, region_id);
        tables.postcodes.push(postcode.clone());
        Ok(postcode)
    }
}

#[async_trait]
impl VehicleRepository for MemoryStore {
    async fn find_by_id(&self, id: i64) -> Result<Option<Vehicle>, ApplicationError> {
        Ok(self.tables.read().await.vehicles.iter().find(|vehicle| vehicle.id == id).cloned())
    }

    async fn find_all(&self) -> Result<Vec<Vehicle>, ApplicationError> {
        Ok(self.tables.read().await.vehicles.clone())
    }
}

#[async_trait]
impl AnnoKilometersRepository for MemoryStore {
    async fn find_enclosing(&self, km: i32) -> Result<Vec<AnnoKilometers>, ApplicationError> {
        Ok(self.tables.read().await.anno_kilometers.iter().filter(|bracket| bracket.encloses(km)).cloned().collect())
    }

    async fn find_all(&self) -> Result<Vec<AnnoKilometers>, ApplicationError> {
        Ok(self.tables.read().await.anno_kilometers.clone())
    }
}

#[async_trait]
impl StatisticsRepository for MemoryStore {
    async fn exists(&self, date_time: DateTime<Utc>, postcode: &str, vehicle: &str) -> Result<bool, ApplicationError> {
        if self.fail_statistics_lookups.load(Ordering::SeqCst) {
            return Err(ApplicationError::new(ErrorType::DatabaseError, "Statistics table unavailable".to_string()));
        }
        if self.hide_statistics.load(Ordering::SeqCst) {
            return Ok(false);
        }
        Ok(self.tables.read().await.statistics.iter().any(|entry| entry.date_time == date_time && entry.postcode == postcode && entry.vehicle == vehicle))
    }

    async fn add(&self, statistic_add_input: StatisticAddInputType) -> Result<(), ApplicationError> {
        if self.fail_statistics_writes.load(Ordering::SeqCst) {
            return Err(ApplicationError::new(ErrorType::DatabaseError, "Statistics table unavailable".to_string()));
        }
        let mut tables = self.tables.write().await;
        if tables.statistics.iter().any(|entry| entry.date_time == statistic_add_input.date_time && entry.postcode == statistic_add_input.postcode && entry.vehicle == statistic_add_input.vehicle) {
            return Err(ApplicationError::new(ErrorType::ConstraintViolation, "Failed to add statistic: already exists".to_string()));
        }
        tables.statistics.push(statistic_add_input);
        Ok(())
    }
}
