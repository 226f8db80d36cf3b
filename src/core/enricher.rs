use crate::models::{MatchRequest, NeighborhoodMatch, RawMatch};
use crate::services::PhotoSearch;
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

/// Fields every element must carry as text
const REQUIRED_FIELDS: [&str; 5] = [
    "neighborhood1",
    "neighborhood1_description",
    "neighborhood2",
    "neighborhood2_description",
    "similarity_reason",
];

/// Errors for a single array element that cannot become a match
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ShapeError {
    #[error("element is not a JSON object")]
    NotAnObject,

    #[error("missing or non-text field `{0}`")]
    MissingField(&'static str),

    #[error("invalid element: {0}")]
    Invalid(String),
}

/// Builds map-search links of the form `{base}/{neighborhood}+{city}+{country}`
#[derive(Debug, Clone)]
pub struct MapsLinkBuilder {
    search_url: String,
}

impl MapsLinkBuilder {
    pub fn new(search_url: impl Into<String>) -> Self {
        Self {
            search_url: search_url.into(),
        }
    }

    pub fn link(&self, neighborhood: &str, city: &str, country: &str) -> String {
        format!(
            "{}/{}+{}+{}",
            self.search_url.trim_end_matches('/'),
            urlencoding::encode(neighborhood),
            urlencoding::encode(city),
            urlencoding::encode(country),
        )
    }
}

/// Validate the shape of a raw array element and decode its text fields
pub fn parse_element(value: &Value) -> Result<RawMatch, ShapeError> {
    let object = value.as_object().ok_or(ShapeError::NotAnObject)?;

    for field in REQUIRED_FIELDS {
        if !object.get(field).is_some_and(Value::is_string) {
            return Err(ShapeError::MissingField(field));
        }
    }

    serde_json::from_value(value.clone()).map_err(|e| ShapeError::Invalid(e.to_string()))
}

/// Attaches photos and map links to raw matches
///
/// Photo lookups never fail the match: errors, empty results and timeouts
/// all leave the image field empty.
#[derive(Clone)]
pub struct MatchEnricher {
    photos: Arc<dyn PhotoSearch>,
    maps: MapsLinkBuilder,
    photo_timeout: Duration,
}

impl MatchEnricher {
    pub fn new(photos: Arc<dyn PhotoSearch>, maps: MapsLinkBuilder, photo_timeout: Duration) -> Self {
        Self {
            photos,
            maps,
            photo_timeout,
        }
    }

    /// Enrich one array element for the given request
    pub async fn enrich(
        &self,
        element: &Value,
        request: &MatchRequest,
    ) -> Result<NeighborhoodMatch, ShapeError> {
        let raw = parse_element(element)?;

        let query1 = format!("{} {}", raw.neighborhood1, request.city1);
        let query2 = format!("{} {}", raw.neighborhood2, request.city2);

        // Both lookups run concurrently; each resolves before the match is built
        let (image1, image2) = tokio::join!(self.lookup_photo(&query1), self.lookup_photo(&query2));

        let maps_link1 = self.maps.link(&raw.neighborhood1, &request.city1, &request.country1);
        let maps_link2 = self.maps.link(&raw.neighborhood2, &request.city2, &request.country2);

        Ok(NeighborhoodMatch {
            neighborhood1: raw.neighborhood1,
            neighborhood1_description: raw.neighborhood1_description,
            neighborhood2: raw.neighborhood2,
            neighborhood2_description: raw.neighborhood2_description,
            similarity_reason: raw.similarity_reason,
            characteristics: raw.characteristics,
            image1,
            image2,
            maps_link1,
            maps_link2,
        })
    }

    async fn lookup_photo(&self, query: &str) -> Option<String> {
        match tokio::time::timeout(self.photo_timeout, self.photos.search(query)).await {
            Ok(url) => {
                if url.is_none() {
                    tracing::debug!("No photo for '{}'", query);
                }
                url
            }
            Err(_) => {
                tracing::warn!("Photo lookup for '{}' timed out after {:?}", query, self.photo_timeout);
                None
            }
        }
    }
}
