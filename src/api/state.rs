use crate::service::{catalog::CatalogService, rating::RatingService};

/**
* Represents the application state shared across the Actix web application.
*/
pub struct AppState {
    /**
     * The rating service computing premiums.
     */
    pub rating_service: RatingService,
    /**
     * The catalog service serving reference data.
     */
    pub catalog_service: CatalogService,
}

impl AppState {
    /**
     * Creates a new instance of `AppState`.
     *
     * # Arguments
     * `rating_service`: The rating service computing premiums.
     * `catalog_service`: The catalog service serving reference data.
     */
    pub fn new(rating_service: RatingService, catalog_service: CatalogService) -> Self {
        AppState { rating_service, catalog_service }
    }
}
