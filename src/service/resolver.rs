use std::sync::Arc;

use tracing::instrument;

use crate::dao::{
    Repositories,
    geo::{PostcodeRepository, RegionRepository},
    rating::{AnnoKilometersRepository, VehicleRepository},
};
use crate::model::apperror::{ApplicationError, Lookup};

/**
 * Resolves the three rating factors from their lookup keys.
 *
 * None of the lookups ever default to a factor; every miss is a `NotFound` error
 * naming the failed lookup.
 */
#[derive(Clone)]
pub struct Resolver {
    regions: Arc<dyn RegionRepository>,
    postcodes: Arc<dyn PostcodeRepository>,
    vehicles: Arc<dyn VehicleRepository>,
    anno_kilometers: Arc<dyn AnnoKilometersRepository>,
}

impl Resolver {
    pub fn new(repositories: &Repositories) -> Self {
        Resolver {
            regions: repositories.regions.clone(),
            postcodes: repositories.postcodes.clone(),
            vehicles: repositories.vehicles.clone(),
            anno_kilometers: repositories.anno_kilometers.clone(),
        }
    }

    /**
     * Resolves Postcode -> City -> Region and returns the region's factor.
     *
     * The postcode is matched as a prefix and a blank postcode matches nothing. When no
     * region is reachable the error names the postcode if no postcode matches at all,
     * otherwise the region.
     */
    #[instrument(skip(self))]
    pub async fn region_factor_for_postcode(&self, postcode: &str) -> Result<f64, ApplicationError> {
        if postcode.trim().is_empty() {
            return Err(ApplicationError::not_found(Lookup::Postcode, postcode));
        }
        if let Some(region) = self.regions.find_by_postcode_prefix(postcode).await? {
            return Ok(region.factor);
        }
        if self.postcodes.find_by_prefix(postcode).await?.is_empty() {
            tracing::debug!("No postcode matching {}", postcode);
            return Err(ApplicationError::not_found(Lookup::Postcode, postcode));
        }
        tracing::error!("Postcode {} has no region assigned", postcode);
        Err(ApplicationError::not_found(Lookup::Region, postcode))
    }

    #[instrument(skip(self))]
    pub async fn vehicle_factor_for_id(&self, vehicle_id: i64) -> Result<f64, ApplicationError> {
        match self.vehicles.find_by_id(vehicle_id).await? {
            Some(vehicle) => Ok(vehicle.factor),
            None => {
                tracing::debug!("No vehicle with id {}", vehicle_id);
                Err(ApplicationError::not_found(Lookup::Vehicle, vehicle_id))
            }
        }
    }

    /**
     * Returns the factor of the first bracket, in table order, with `min <= km <= max`.
     */
    #[instrument(skip(self))]
    pub async fn bracket_factor_for_distance(&self, km: i32) -> Result<f64, ApplicationError> {
        let brackets = self.anno_kilometers.find_enclosing(km).await?;
        if brackets.len() > 1 {
            tracing::warn!("{} distance brackets enclose {} km, using the first", brackets.len(), km);
        }
        brackets.first().map(|bracket| bracket.factor).ok_or_else(|| {
            tracing::error!("No distance bracket for {} km", km);
            ApplicationError::not_found(Lookup::DistanceBracket, km)
        })
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::dao::memory::MemoryStore;
    use crate::model::apperror::ErrorType;
    use crate::model::models::{AnnoKilometers, City, Postcode};

    async fn resolver() -> (Resolver, MemoryStore) {
        let store = MemoryStore::seeded().await;
        (Resolver::new(&Repositories::memory(&store)), store)
    }

    #[tokio::test]
    async fn test_region_factor_for_postcode() {
        let (resolver, _) = resolver().await;
        assert_eq!(resolver.region_factor_for_postcode("80331").await.unwrap(), 1.5);
        assert_eq!(resolver.region_factor_for_postcode("18055").await.unwrap(), 0.5);
    }

    #[tokio::test]
    async fn test_region_factor_for_postcode_prefix() {
        let (resolver, _) = resolver().await;
        assert_eq!(resolver.region_factor_for_postcode("180").await.unwrap(), 0.5);
    }

    #[tokio::test]
    async fn test_unknown_postcode_names_postcode() {
        let (resolver, _) = resolver().await;
        let error = resolver.region_factor_for_postcode("99999").await.unwrap_err();
        assert_eq!(error.error_type, ErrorType::NotFound(Lookup::Postcode));
        assert!(error.message.contains("99999"));
    }

    #[tokio::test]
    async fn test_blank_postcode_matches_nothing() {
        let (resolver, _) = resolver().await;
        for postcode in ["", "   "] {
            let error = resolver.region_factor_for_postcode(postcode).await.unwrap_err();
            assert_eq!(error.lookup(), Some(Lookup::Postcode));
        }
    }

    #[tokio::test]
    async fn test_postcode_without_region_names_region() {
        let (resolver, store) = resolver().await;
        store.insert_city(City::new(3, "Nirgendwo".to_string(), 42)).await;
        store.insert_postcode(Postcode::new(3, "01234".to_string(), 3, None)).await;
        let error = resolver.region_factor_for_postcode("01234").await.unwrap_err();
        assert_eq!(error.lookup(), Some(Lookup::Region));
    }

    #[tokio::test]
    async fn test_vehicle_factor() {
        let (resolver, _) = resolver().await;
        assert_eq!(resolver.vehicle_factor_for_id(1).await.unwrap(), 1.5);
        let error = resolver.vehicle_factor_for_id(99).await.unwrap_err();
        assert_eq!(error.lookup(), Some(Lookup::Vehicle));
    }

    #[tokio::test]
    async fn test_bracket_boundaries() {
        let (resolver, _) = resolver().await;
        assert_eq!(resolver.bracket_factor_for_distance(0).await.unwrap(), 0.5);
        assert_eq!(resolver.bracket_factor_for_distance(5000).await.unwrap(), 0.5);
        assert_eq!(resolver.bracket_factor_for_distance(5001).await.unwrap(), 1.0);
        assert_eq!(resolver.bracket_factor_for_distance(20000).await.unwrap(), 1.5);
        assert_eq!(resolver.bracket_factor_for_distance(i32::MAX).await.unwrap(), 2.0);
    }

    #[tokio::test]
    async fn test_bracket_missing() {
        let (resolver, _) = resolver().await;
        let error = resolver.bracket_factor_for_distance(-5).await.unwrap_err();
        assert_eq!(error.lookup(), Some(Lookup::DistanceBracket));
    }

    #[tokio::test]
    async fn test_overlapping_brackets_first_in_table_order_wins() {
        let (resolver, store) = resolver().await;
        store.replace_anno_kilometers(vec![AnnoKilometers::new(1, 0, 5000, 0.5), AnnoKilometers::new(2, 5000, 10000, 1.0)]).await;
        assert_eq!(resolver.bracket_factor_for_distance(5000).await.unwrap(), 0.5);
    }
}
