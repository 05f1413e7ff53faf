use chrono::{DateTime, Utc};

use crate::model::apperror::{ApplicationError, ErrorType};

/**
 * Geographic rating zone.
 */
#[derive(Debug, Clone, PartialEq)]
pub struct Region {
    pub id: i64,
    pub name: String,
    pub factor: f64,
}

impl Region {
    pub fn new(id: i64, name: String, factor: f64) -> Self {
        Region { id, name, factor }
    }
}

/**
 * Named locality belonging to exactly one region.
 */
#[derive(Debug, Clone, PartialEq)]
pub struct City {
    pub id: i64,
    pub name: String,
    pub region_id: i64,
}

impl City {
    pub fn new(id: i64, name: String, region_id: i64) -> Self {
        City { id, name, region_id }
    }
}

/**
 * Postcode as supplied by callers. `region_id` is a denormalized copy of the city's region.
 */
#[derive(Debug, Clone, PartialEq)]
pub struct Postcode {
    pub id: i64,
    pub value: String,
    pub city_id: i64,
    pub region_id: Option<i64>,
}

impl Postcode {
    pub fn new(id: i64, value: String, city_id: i64, region_id: Option<i64>) -> Self {
        Postcode { id, value, city_id, region_id }
    }
}

/**
 * Vehicle type with its rating factor.
 */
#[derive(Debug, Clone, PartialEq)]
pub struct Vehicle {
    pub id: i64,
    pub name: String,
    pub factor: f64,
}

impl Vehicle {
    pub fn new(id: i64, name: String, factor: f64) -> Self {
        Vehicle { id, name, factor }
    }
}

/**
 * Annual distance bracket. Both bounds are inclusive.
 */
#[derive(Debug, Clone, PartialEq)]
pub struct AnnoKilometers {
    pub id: i64,
    pub min: i32,
    pub max: i32,
    pub factor: f64,
}

impl AnnoKilometers {
    pub fn new(id: i64, min: i32, max: i32, factor: f64) -> Self {
        AnnoKilometers { id, min, max, factor }
    }

    /**
     * Checks whether the given distance lies within the bracket.
     */
    pub fn encloses(&self, km: i32) -> bool {
        self.min <= km && self.max >= km
    }
}

/**
 * Input for recording a usage statistic.
 */
#[derive(Debug, Clone, PartialEq)]
pub struct StatisticAddInputType {
    pub date_time: DateTime<Utc>,
    pub postcode: String,
    pub vehicle: String,
    pub anno_kilometers: i32,
    pub premium: f64,
    pub ip_address: String,
}

impl StatisticAddInputType {
    pub fn new(date_time: DateTime<Utc>, postcode: String, vehicle: String, anno_kilometers: i32, premium: f64, ip_address: String) -> Self {
        StatisticAddInputType { date_time, postcode, vehicle, anno_kilometers, premium, ip_address }
    }
}

/**
 * Fields of a machine-facing premium request. Every field may be absent.
 */
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PremiumRequestInputType {
    pub vehicle_id: Option<i64>,
    pub anno_kilometers: Option<i32>,
    pub postcode: Option<String>,
}

/**
 * Result of a recorded quote. Created per request.
 */
#[derive(Debug, Clone, PartialEq)]
pub struct PremiumResult {
    pub premium: f64,
    pub region: String,
}

impl PremiumResult {
    pub fn new(premium: f64, region: String) -> Self {
        PremiumResult { premium, region }
    }
}

/**
 * Input for registering a postcode in the geographic catalog.
 */
#[derive(Debug, Clone, PartialEq)]
pub struct PostcodeAddInputType {
    pub region_name: String,
    pub city_name: String,
    pub postcode_value: String,
}

impl PostcodeAddInputType {
    /**
     * Validates the input. Names must not be blank and the postcode must be five digits.
     *
     * # Returns
     * The trimmed input or a validation error.
     */
    pub fn validate(self) -> Result<Self, ApplicationError> {
        let region_name = self.region_name.trim().to_string();
        let city_name = self.city_name.trim().to_string();
        let postcode_value = self.postcode_value.trim().to_string();
        if region_name.is_empty() || city_name.is_empty() {
            return Err(ApplicationError::new(ErrorType::Validation, format!("Missing region or city for postcode {postcode_value}")));
        }
        if !is_valid_postcode(&postcode_value) {
            return Err(ApplicationError::new(ErrorType::Validation, format!("Invalid postcode: {postcode_value}")));
        }
        Ok(PostcodeAddInputType { region_name, city_name, postcode_value })
    }
}

/**
 * A postcode is exactly five ASCII digits.
 */
pub fn is_valid_postcode(value: &str) -> bool {
    value.len() == 5 && value.chars().all(|c| c.is_ascii_digit())
}
