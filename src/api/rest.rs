use std::collections::BTreeMap;

use actix_web::{HttpResponse, ResponseError, http::StatusCode};
use serde::{Deserialize, Serialize};

use crate::model::{
    apperror::{ApplicationError, ErrorType},
    models::{AnnoKilometers, Postcode, PostcodeAddInputType, PremiumRequestInputType, PremiumResult, Region, Vehicle},
};

/***************** Premium models *********************/

/**
 * Request for the machine-facing premium calculation. Every field is optional so
 * missing fields can be reported together.
 */
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PremiumRequest {
    pub vehicle_id: Option<i64>,
    pub anno_kilometers: Option<i32>,
    pub postcode: Option<String>,
}

impl From<PremiumRequest> for PremiumRequestInputType {
    fn from(request: PremiumRequest) -> Self {
        PremiumRequestInputType { vehicle_id: request.vehicle_id, anno_kilometers: request.anno_kilometers, postcode: request.postcode }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct PremiumResponse {
    pub premium: f64,
}

/**
 * Request for a recorded quote.
 */
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuoteRequest {
    pub km: i32,
    pub postcode_value: String,
    pub vehicle_id: i64,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct QuoteResponse {
    pub premium: f64,
    pub region: String,
}

impl From<PremiumResult> for QuoteResponse {
    fn from(result: PremiumResult) -> Self {
        QuoteResponse { premium: result.premium, region: result.region }
    }
}

/***************** Option models *********************/

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VehicleElement {
    pub id: i64,
    pub vehicle_name: String,
    pub factor: f64,
}

/**
 * Vehicle types in the order given, which is by name for the option list.
 */
#[derive(Debug, Serialize, Deserialize)]
pub struct VehicleListResponse {
    pub vehicles: Vec<VehicleElement>,
}

impl From<Vec<Vehicle>> for VehicleListResponse {
    fn from(vehicles: Vec<Vehicle>) -> Self {
        let vehicles = vehicles.into_iter().map(|vehicle| VehicleElement { id: vehicle.id, vehicle_name: vehicle.name, factor: vehicle.factor }).collect();
        VehicleListResponse { vehicles }
    }
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegionElement {
    pub region_name: String,
    pub factor: f64,
}

/**
 * Regions keyed by id.
 */
#[derive(Debug, Serialize, Deserialize)]
pub struct RegionListResponse {
    pub regions: BTreeMap<i64, RegionElement>,
}

impl From<Vec<Region>> for RegionListResponse {
    fn from(regions: Vec<Region>) -> Self {
        let regions = regions.into_iter().map(|region| (region.id, RegionElement { region_name: region.name, factor: region.factor })).collect();
        RegionListResponse { regions }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct AnnoKilometersElement {
    pub min: i32,
    pub max: i32,
    pub factor: f64,
}

/**
 * Distance brackets in table order.
 */
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnnoKilometersListResponse {
    pub anno_kilometers: Vec<AnnoKilometersElement>,
}

impl From<Vec<AnnoKilometers>> for AnnoKilometersListResponse {
    fn from(brackets: Vec<AnnoKilometers>) -> Self {
        let anno_kilometers = brackets.into_iter().map(|bracket| AnnoKilometersElement { min: bracket.min, max: bracket.max, factor: bracket.factor }).collect();
        AnnoKilometersListResponse { anno_kilometers }
    }
}

#[derive(Debug, Deserialize)]
pub struct PostcodeQuery {
    pub input: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct PostcodeListResponse {
    pub postcodes: Vec<String>,
}

/***************** Catalog models *********************/

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PostcodeAddRequest {
    pub region_name: String,
    pub city_name: String,
    pub postcode: String,
}

impl From<PostcodeAddRequest> for PostcodeAddInputType {
    fn from(request: PostcodeAddRequest) -> Self {
        PostcodeAddInputType { region_name: request.region_name, city_name: request.city_name, postcode_value: request.postcode }
    }
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PostcodeResponse {
    pub id: i64,
    pub postcode: String,
    pub city_id: i64,
    pub region_id: Option<i64>,
}

impl From<Postcode> for PostcodeResponse {
    fn from(postcode: Postcode) -> Self {
        PostcodeResponse { id: postcode.id, postcode: postcode.value, city_id: postcode.city_id, region_id: postcode.region_id }
    }
}

/***************** Error models *********************/

/**
 * Custom error response for the application.
 */
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    /**
     * The error code associated with the error type.
     */
    pub code: u16,
    /**
     * Short error category.
     */
    pub error: String,
    /**
     * A human-readable message describing the error.
     */
    pub message: String,
}

impl ResponseError for ApplicationError {
    fn status_code(&self) -> StatusCode {
        get_statuscode(&self.error_type)
    }

    /**
     * Generates an error response for the application error. Internal failures are not detailed.
     */
    fn error_response(&self) -> HttpResponse {
        let status_code = self.status_code();
        let error_response = if status_code.is_server_error() {
            tracing::error!("Request failed: {}", self.message);
            ErrorResponse { code: get_error_code(&self.error_type), error: "Server error".to_string(), message: "An unexpected error occurred".to_string() }
        } else {
            ErrorResponse { code: get_error_code(&self.error_type), error: "Invalid input values".to_string(), message: self.message.clone() }
        };
        HttpResponse::build(status_code).json(&error_response)
    }
}

/**
* Maps application errors to HTTP status codes.
*
* # Arguments
* `error_type`: The type of error that occurred.
*
* # Returns
* The corresponding HTTP status code.
*/
fn get_statuscode(error_type: &ErrorType) -> StatusCode {
    match error_type {
        ErrorType::Validation | ErrorType::NotFound(_) | ErrorType::ConstraintViolation => StatusCode::BAD_REQUEST,
        ErrorType::Initialization | ErrorType::DatabaseError => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

/**
 * Maps application errors to error codes.
 */
fn get_error_code(error_type: &ErrorType) -> u16 {
    match error_type {
        ErrorType::Initialization => 1001,
        ErrorType::Validation => 1002,
        ErrorType::DatabaseError => 1003,
        ErrorType::ConstraintViolation => 1004,
        ErrorType::NotFound(_) => 1005,
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::model::apperror::Lookup;

    #[test]
    fn test_bad_input_maps_to_400() {
        assert_eq!(get_statuscode(&ErrorType::Validation), StatusCode::BAD_REQUEST);
        assert_eq!(get_statuscode(&ErrorType::NotFound(Lookup::Region)), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn test_unexpected_maps_to_500() {
        assert_eq!(get_statuscode(&ErrorType::DatabaseError), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn test_vehicle_list_keeps_order() {
        let response = VehicleListResponse::from(vec![Vehicle::new(14, "Geländewagen (SUV)".to_string(), 1.5), Vehicle::new(3, "Motorrad".to_string(), 2.0)]);
        let json = serde_json::to_value(&response).unwrap();
        assert_eq!(json["vehicles"][0]["id"], 14);
        assert_eq!(json["vehicles"][0]["vehicleName"], "Geländewagen (SUV)");
        assert_eq!(json["vehicles"][0]["factor"], 1.5);
        assert_eq!(json["vehicles"][1]["vehicleName"], "Motorrad");
    }
}
