use async_trait::async_trait;
use sqlx::{Pool, Postgres};
use tracing::{Instrument, instrument};

use crate::dao::handle_database_error;
use crate::model::{
    apperror::ApplicationError,
    models::{City, Postcode, Region},
};

/**
 * Database response type for region queries.
 */
pub type QueryRegionDbResp = (i64, String, f64);

/**
 * Database response type for city queries.
 */
pub type QueryCityDbResp = (i64, String, i64);

/**
 * Database response type for postcode queries.
 */
pub type QueryPostcodeDbResp = (i64, String, i64, Option<i64>);

const QUERY_REGION_BY_ID: &str = "SELECT id, name, factor FROM region WHERE id = $1";

const QUERY_REGION_BY_NAME: &str = "SELECT id, name, factor FROM region WHERE name = $1";

/**
 * Joins postcode, city and region on a prefix match of the postcode value.
 */
const QUERY_REGION_BY_POSTCODE_PREFIX: &str = "SELECT r.id, r.name, r.factor
                                               FROM region r
                                               JOIN city c ON c.region_id = r.id
                                               JOIN postcode p ON p.city_id = c.id
                                               WHERE starts_with(p.postcode_value, $1)
                                               ORDER BY p.postcode_value, p.id
                                               LIMIT 1";

const QUERY_REGION_LIST: &str = "SELECT id, name, factor FROM region ORDER BY id";

const QUERY_CITY_BY_ID: &str = "SELECT id, name, region_id FROM city WHERE id = $1";

const QUERY_CITY_BY_NAME: &str = "SELECT id, name, region_id FROM city WHERE name = $1 ORDER BY id LIMIT 1";

const ADD_CITY: &str = "INSERT INTO city (name, region_id) VALUES ($1, $2) RETURNING id";

const QUERY_POSTCODE_BY_VALUE: &str = "SELECT id, postcode_value, city_id, region_id FROM postcode WHERE postcode_value = $1 ORDER BY id LIMIT 1";

const QUERY_POSTCODES_BY_PREFIX: &str = "SELECT id, postcode_value, city_id, region_id FROM postcode WHERE starts_with(postcode_value, $1) ORDER BY postcode_value, id";

const ADD_POSTCODE: &str = "INSERT INTO postcode (postcode_value, city_id, region_id) VALUES ($1, $2, $3) RETURNING id";

/**
 * Data access for regions.
 */
#[async_trait]
pub trait RegionRepository: Send + Sync {
    async fn find_by_id(&self, id: i64) -> Result<Option<Region>, ApplicationError>;

    async fn find_by_name(&self, name: &str) -> Result<Option<Region>, ApplicationError>;

    /**
     * Finds the region reachable from the first postcode starting with `prefix`.
     */
    async fn find_by_postcode_prefix(&self, prefix: &str) -> Result<Option<Region>, ApplicationError>;

    async fn find_all(&self) -> Result<Vec<Region>, ApplicationError>;
}

/**
 * Data access for cities.
 */
#[async_trait]
pub trait CityRepository: Send + Sync {
    async fn find_by_id(&self, id: i64) -> Result<Option<City>, ApplicationError>;

    async fn find_first_by_name(&self, name: &str) -> Result<Option<City>, ApplicationError>;

    async fn add(&self, name: &str, region_id: i64) -> Result<City, ApplicationError>;
}

/**
 * Data access for postcodes.
 */
#[async_trait]
pub trait PostcodeRepository: Send + Sync {
    async fn find_first_by_value(&self, value: &str) -> Result<Option<Postcode>, ApplicationError>;

    /**
     * Lists postcodes whose value starts with `prefix`, ordered by value.
     */
    async fn find_by_prefix(&self, prefix: &str) -> Result<Vec<Postcode>, ApplicationError>;

    async fn add(&self, value: &str, city_id: i64, region_id: Option<i64>) -> Result<Postcode, ApplicationError>;
}

impl From<QueryRegionDbResp> for Region {
    fn from(row: QueryRegionDbResp) -> Self {
        Region::new(row.0, row.1, row.2)
    }
}

impl From<QueryCityDbResp> for City {
    fn from(row: QueryCityDbResp) -> Self {
        City::new(row.0, row.1, row.2)
    }
}

impl From<QueryPostcodeDbResp> for Postcode {
    fn from(row: QueryPostcodeDbResp) -> Self {
        Postcode::new(row.0, row.1, row.2, row.3)
    }
}

/**
 * `PostgreSQL` backed DAO for the geographic catalog.
 */
#[derive(Clone)]
pub struct GeoDao {
    connection_pool: Pool<Postgres>,
}

impl GeoDao {
    /**
     * Creates a new instance of `GeoDao`.
     *
     * # Arguments
     * `connection_pool`: The database connection pool.
     */
    pub fn new(connection_pool: Pool<Postgres>) -> Self {
        GeoDao { connection_pool }
    }

    async fn fetch_region(&self, query: &'static str, key: &str) -> Result<Option<Region>, ApplicationError> {
        let span = tracing::Span::current();
        let result: Option<QueryRegionDbResp> = sqlx::query_as(query)
            .bind(key)
            .fetch_optional(&self.connection_pool)
            .instrument(span)
            .await
            .map_err(|err| handle_database_error(&err, "Failed to query region"))?;
        Ok(result.map(Region::from))
    }
}

#[async_trait]
impl RegionRepository for GeoDao {
    #[instrument(skip(self))]
    async fn find_by_id(&self, id: i64) -> Result<Option<Region>, ApplicationError> {
        let span = tracing::Span::current();
        let result: Option<QueryRegionDbResp> = sqlx::query_as(QUERY_REGION_BY_ID)
            .bind(id)
            .fetch_optional(&self.connection_pool)
            .instrument(span)
            .await
            .map_err(|err| handle_database_error(&err, "Failed to query region by id"))?;
        Ok(result.map(Region::from))
    }

    #[instrument(skip(self))]
    async fn find_by_name(&self, name: &str) -> Result<Option<Region>, ApplicationError> {
        self.fetch_region(QUERY_REGION_BY_NAME, name).await
    }

    #[instrument(skip(self))]
    async fn find_by_postcode_prefix(&self, prefix: &str) -> Result<Option<Region>, ApplicationError> {
        self.fetch_region(QUERY_REGION_BY_POSTCODE_PREFIX, prefix).await
    }

    #[instrument(skip(self))]
    async fn find_all(&self) -> Result<Vec<Region>, ApplicationError> {
        let span = tracing::Span::current();
        let results: Vec<QueryRegionDbResp> = sqlx::query_as(QUERY_REGION_LIST)
            .fetch_all(&self.connection_pool)
            .instrument(span)
            .await
            .map_err(|err| handle_database_error(&err, "Failed to query region list"))?;
        Ok(results.into_iter().map(Region::from).collect())
    }
}

#[async_trait]
impl CityRepository for GeoDao {
    #[instrument(skip(self))]
    async fn find_by_id(&self, id: i64) -> Result<Option<City>, ApplicationError> {
        let span = tracing::Span::current();
        let result: Option<QueryCityDbResp> = sqlx::query_as(QUERY_CITY_BY_ID)
            .bind(id)
            .fetch_optional(&self.connection_pool)
            .instrument(span)
            .await
            .map_err(|err| handle_database_error(&err, "Failed to query city by id"))?;
        Ok(result.map(City::from))
    }

    #[instrument(skip(self))]
    async fn find_first_by_name(&self, name: &str) -> Result<Option<City>, ApplicationError> {
        let span = tracing::Span::current();
        let result: Option<QueryCityDbResp> = sqlx::query_as(QUERY_CITY_BY_NAME)
            .bind(name)
            .fetch_optional(&self.connection_pool)
            .instrument(span)
            .await
            .map_err(|err| handle_database_error(&err, "Failed to query city by name"))?;
        Ok(result.map(City::from))
    }

    #[instrument(skip(self))]
    async fn add(&self, name: &str, region_id: i64) -> Result<City, ApplicationError> {
        let span = tracing::Span::current();
        let id: (i64,) = sqlx::query_as(ADD_CITY)
            .bind(name)
            .bind(region_id)
            .fetch_one(&self.connection_pool)
            .instrument(span)
            .await
            .map_err(|err| handle_database_error(&err, "Failed to add city"))?;
        Ok(City::new(id.0, name.to_string(), region_id))
    }
}

#[async_trait]
impl PostcodeRepository for GeoDao {
    #[instrument(skip(self))]
    async fn find_first_by_value(&self, value: &str) -> Result<Option<Postcode>, ApplicationError> {
        let span = tracing::Span::current();
        let result: Option<QueryPostcodeDbResp> = sqlx::query_as(QUERY_POSTCODE_BY_VALUE)
            .bind(value)
            .fetch_optional(&self.connection_pool)
            .instrument(span)
            .await
            .map_err(|err| handle_database_error(&err, "Failed to query postcode"))?;
        Ok(result.map(Postcode::from))
    }

    #[instrument(skip(self))]
    async fn find_by_prefix(&self, prefix: &str) -> Result<Vec<Postcode>, ApplicationError> {
        let span = tracing::Span::current();
        let results: Vec<QueryPostcodeDbResp> = sqlx::query_as(QUERY_POSTCODES_BY_PREFIX)
            .bind(prefix)
            .fetch_all(&self.connection_pool)
            .instrument(span)
            .await
            .map_err(|err| handle_database_error(&err, "Failed to query postcodes by prefix"))?;
        Ok(results.into_iter().map(Postcode::from).collect())
    }

    #[instrument(skip(self))]
    async fn add(&self, value: &str, city_id: i64, region_id: Option<i64>) -> Result<Postcode, ApplicationError> {
        let span = tracing::Span::current();
        let id: (i64,) = sqlx::query_as(ADD_POSTCODE)
            .bind(value)
            .bind(city_id)
            .bind(region_id)
            .fetch_one(&self.connection_pool)
            .instrument(span)
            .await
            .map_err(|err| handle_database_error(&err, "Failed to add postcode"))?;
        Ok(Postcode::new(id.0, value.to_string(), city_id, region_id))
    }
}
