use actix_web::{HttpRequest, HttpResponse, get, post, web};
use tracing::{Instrument, instrument};

use crate::{
    api::{
        rest::{
            AnnoKilometersListResponse, PostcodeAddRequest, PostcodeListResponse, PostcodeQuery, PostcodeResponse, PremiumRequest, PremiumResponse, QuoteRequest, QuoteResponse,
            RegionListResponse, VehicleListResponse,
        },
        state::AppState,
    },
    model::{
        apperror::{ApplicationError, ErrorType},
        models::{PostcodeAddInputType, PremiumRequestInputType},
    },
};

/**
 * Endpoint to list vehicle types with their factors.
 */
#[instrument(skip(http_request, app_state), fields(service = "listVehicles", trace_id = get_trace_id(&http_request)))]
#[get("/api/options/vehicles")]
pub async fn vehicles_list(http_request: HttpRequest, app_state: web::Data<AppState>) -> Result<HttpResponse, ApplicationError> {
    let span = tracing::Span::current();
    let vehicles = app_state.catalog_service.list_vehicles().instrument(span).await?;
    Ok(HttpResponse::Ok().json(VehicleListResponse::from(vehicles)))
}

/**
 * Endpoint to list regions with their factors.
 */
#[instrument(skip(http_request, app_state), fields(service = "listRegions", trace_id = get_trace_id(&http_request)))]
#[get("/api/options/regions")]
pub async fn regions_list(http_request: HttpRequest, app_state: web::Data<AppState>) -> Result<HttpResponse, ApplicationError> {
    let span = tracing::Span::current();
    let regions = app_state.catalog_service.list_regions().instrument(span).await?;
    Ok(HttpResponse::Ok().json(RegionListResponse::from(regions)))
}

/**
 * Endpoint to list the annual distance brackets.
 */
#[instrument(skip(http_request, app_state), fields(service = "listAnnoKilometers", trace_id = get_trace_id(&http_request)))]
#[get("/api/options/annoKilometers")]
pub async fn anno_kilometers_list(http_request: HttpRequest, app_state: web::Data<AppState>) -> Result<HttpResponse, ApplicationError> {
    let span = tracing::Span::current();
    let brackets = app_state.catalog_service.list_anno_kilometers().instrument(span).await?;
    Ok(HttpResponse::Ok().json(AnnoKilometersListResponse::from(brackets)))
}

/**
 * Endpoint to list postcodes starting with the typed input.
 */
#[instrument(skip(http_request, app_state), fields(service = "listPostcodes", trace_id = get_trace_id(&http_request)))]
#[get("/api/options/postcodes")]
pub async fn postcodes_list(http_request: HttpRequest, query: web::Query<PostcodeQuery>, app_state: web::Data<AppState>) -> Result<HttpResponse, ApplicationError> {
    let span = tracing::Span::current();
    let input = query.into_inner().input.unwrap_or_default();
    let postcodes = app_state.catalog_service.postcodes_with_prefix(&input).instrument(span).await?;
    Ok(HttpResponse::Ok().json(PostcodeListResponse { postcodes }))
}

/**
 * Endpoint to calculate a premium. The request is validated first and nothing is recorded.
 */
#[instrument(level = "info", skip(http_request, app_state), fields(service = "calculatePremium", trace_id = get_trace_id(&http_request)))]
#[post("/api/calculate")]
pub async fn premium_calculate(http_request: HttpRequest, request_body: web::Json<PremiumRequest>, app_state: web::Data<AppState>) -> Result<HttpResponse, ApplicationError> {
    let span = tracing::Span::current();
    let premium_request = PremiumRequestInputType::from(request_body.into_inner());
    let messages = app_state.rating_service.validate_premium_request(&premium_request).instrument(span.clone()).await?;
    if !messages.is_empty() {
        return Err(ApplicationError::new(ErrorType::Validation, messages.join(", ")));
    }
    let PremiumRequestInputType { vehicle_id: Some(vehicle_id), anno_kilometers: Some(anno_kilometers), postcode: Some(postcode) } = premium_request else {
        return Err(ApplicationError::new(ErrorType::Validation, "Incomplete premium request".to_string()));
    };
    let premium = app_state.rating_service.compute_premium(vehicle_id, anno_kilometers, &postcode).instrument(span).await?;
    Ok(HttpResponse::Ok().json(PremiumResponse { premium }))
}

/**
 * Endpoint to calculate a premium and record the usage statistic for the calling client.
 */
#[instrument(level = "info", skip(http_request, app_state), fields(service = "quotePremium", trace_id = get_trace_id(&http_request)))]
#[post("/api/quote")]
pub async fn premium_quote(http_request: HttpRequest, request_body: web::Json<QuoteRequest>, app_state: web::Data<AppState>) -> Result<HttpResponse, ApplicationError> {
    let span = tracing::Span::current();
    let quote_request = request_body.into_inner();
    let client_ip = get_client_ip(&http_request);
    let result = app_state.rating_service.compute_and_record(quote_request.km, &quote_request.postcode_value, quote_request.vehicle_id, &client_ip).instrument(span).await?;
    Ok(HttpResponse::Ok().json(QuoteResponse::from(result)))
}

/**
 * Endpoint to register a postcode in the geographic catalog.
 */
#[instrument(skip(http_request, app_state), fields(service = "addPostcode", trace_id = get_trace_id(&http_request)))]
#[post("/api/catalog/postcodes")]
pub async fn postcode_add(http_request: HttpRequest, request_body: web::Json<PostcodeAddRequest>, app_state: web::Data<AppState>) -> Result<HttpResponse, ApplicationError> {
    let span = tracing::Span::current();
    let postcode_add_input = PostcodeAddInputType::from(request_body.into_inner());
    let postcode = app_state.catalog_service.register_postcode(postcode_add_input).instrument(span).await?;
    Ok(HttpResponse::Created().json(PostcodeResponse::from(postcode)))
}

/**
 * Retrieves the trace ID from the HTTP request headers.
 * If the trace ID is not present, a new UUID is generated.
 */
fn get_trace_id(http_request: &HttpRequest) -> String {
    http_request.headers().get("X-Trace-ID").and_then(|v| v.to_str().ok().map(std::string::ToString::to_string)).unwrap_or_else(|| uuid::Uuid::new_v4().to_string())
}

/**
 * Returns the client address: the first `X-Forwarded-For` entry, otherwise the peer address.
 * Empty when neither is known.
 */
fn get_client_ip(http_request: &HttpRequest) -> String {
    http_request
        .headers()
        .get("X-Forwarded-For")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .or_else(|| http_request.peer_addr().map(|addr| addr.ip().to_string()))
        .unwrap_or_default()
}
