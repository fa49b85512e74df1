use async_trait::async_trait;
use dashmap::DashMap;
use tracing::instrument;

use crate::error::Result;
use crate::repository::{CityRepository, PoiRepository, ProfileRepository, TagRepository};
use crate::types::{City, Poi, Profile};

/// In-process stand-in for the discovery/profile/tag CRUD surfaces, which
/// are specified only by the contract the core consumes. Backed by
/// `DashMap` so reads never block a single global lock; seeding is a plain
/// insert, not a migration.
#[derive(Default)]
pub struct InMemoryCollaborators {
    cities_by_id: DashMap<String, City>,
    cities_by_name: DashMap<String, String>,
    pois_by_city: DashMap<String, Vec<Poi>>,
    tags_by_city: DashMap<String, Vec<String>>,
    profiles: DashMap<String, Profile>,
}

impl InMemoryCollaborators {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn seed_city(&self, city: City) {
        self.cities_by_name
            .insert(city.name.to_lowercase(), city.id.clone());
        self.cities_by_id.insert(city.id.clone(), city);
    }

    pub fn seed_poi(&self, poi: Poi) {
        self.pois_by_city
            .entry(poi.city_id.clone())
            .or_default()
            .push(poi);
    }

    pub fn seed_tags(&self, city_id: impl Into<String>, tags: Vec<String>) {
        self.tags_by_city.insert(city_id.into(), tags);
    }

    pub fn seed_profile(&self, profile: Profile) {
        self.profiles.insert(profile.user_id.clone(), profile);
    }
}

#[async_trait]
impl CityRepository for InMemoryCollaborators {
    #[instrument(skip(self))]
    async fn get(&self, city_id: &str) -> Result<Option<City>> {
        Ok(self.cities_by_id.get(city_id).map(|r| r.clone()))
    }

    #[instrument(skip(self))]
    async fn find_by_name(&self, name: &str) -> Result<Option<City>> {
        let key = name.to_lowercase();
        let Some(id) = self.cities_by_name.get(&key).map(|r| r.clone()) else {
            return Ok(None);
        };
        Ok(self.cities_by_id.get(&id).map(|r| r.clone()))
    }
}

#[async_trait]
impl PoiRepository for InMemoryCollaborators {
    #[instrument(skip(self))]
    async fn list_by_city(&self, city_id: &str, category: Option<&str>) -> Result<Vec<Poi>> {
        let Some(pois) = self.pois_by_city.get(city_id) else {
            return Ok(Vec::new());
        };
        let filtered = match category {
            Some(cat) => pois.iter().filter(|p| p.category == cat).cloned().collect(),
            None => pois.clone(),
        };
        Ok(filtered)
    }
}

#[async_trait]
impl TagRepository for InMemoryCollaborators {
    #[instrument(skip(self))]
    async fn list_for_city(&self, city_id: &str) -> Result<Vec<String>> {
        Ok(self
            .tags_by_city
            .get(city_id)
            .map(|r| r.clone())
            .unwrap_or_default())
    }
}

#[async_trait]
impl ProfileRepository for InMemoryCollaborators {
    #[instrument(skip(self))]
    async fn get(&self, user_id: &str) -> Result<Option<Profile>> {
        Ok(self.profiles.get(user_id).map(|r| r.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ContentFilter;

    fn lisbon() -> City {
        City {
            id: "city-lisbon".to_string(),
            name: "Lisbon".to_string(),
            country: "Portugal".to_string(),
            timezone: "Europe/Lisbon".to_string(),
        }
    }

    #[tokio::test]
    async fn find_by_name_is_case_insensitive() {
        let repo = InMemoryCollaborators::new();
        repo.seed_city(lisbon());
        let found = repo.find_by_name("lisbon").await.unwrap();
        assert_eq!(found.unwrap().id, "city-lisbon");
    }

    #[tokio::test]
    async fn list_by_city_filters_by_category() {
        let repo = InMemoryCollaborators::new();
        repo.seed_poi(Poi {
            id: "poi-1".to_string(),
            city_id: "city-lisbon".to_string(),
            name: "Time Out Market".to_string(),
            category: "restaurant".to_string(),
            tags: vec!["food".to_string()],
        });
        repo.seed_poi(Poi {
            id: "poi-2".to_string(),
            city_id: "city-lisbon".to_string(),
            name: "Belem Tower".to_string(),
            category: "landmark".to_string(),
            tags: vec!["history".to_string()],
        });

        let restaurants = repo.list_by_city("city-lisbon", Some("restaurant")).await.unwrap();
        assert_eq!(restaurants.len(), 1);
        assert_eq!(restaurants[0].name, "Time Out Market");

        let all = repo.list_by_city("city-lisbon", None).await.unwrap();
        assert_eq!(all.len(), 2);
    }

    #[tokio::test]
    async fn unknown_city_returns_empty_pois_not_an_error() {
        let repo = InMemoryCollaborators::new();
        let pois = repo.list_by_city("nowhere", None).await.unwrap();
        assert!(pois.is_empty());
    }

    #[tokio::test]
    async fn profile_lookup_round_trips() {
        let repo = InMemoryCollaborators::new();
        repo.seed_profile(Profile {
            user_id: "user-1".to_string(),
            language: "en".to_string(),
            content_filter: ContentFilter::Moderate,
            interests: vec!["art".to_string()],
        });
        let profile = repo.get("user-1").await.unwrap();
        assert_eq!(profile.unwrap().language, "en");
    }
}
