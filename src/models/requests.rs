use serde::{Deserialize, Serialize};
use thiserror::Error;
use validator::Validate;

/// Request-level validation failures that are not plain field checks
#[derive(Debug, Error, PartialEq, Eq)]
pub enum RequestError {
    #[error("cities must differ")]
    IdenticalCities,
}

/// Request to match neighborhoods between two cities
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct MatchRequest {
    #[validate(length(min = 1))]
    pub city1: String,
    #[validate(length(min = 1))]
    pub country1: String,
    #[validate(length(min = 1))]
    pub city2: String,
    #[validate(length(min = 1))]
    pub country2: String,
}

impl MatchRequest {
    pub fn new(
        city1: impl Into<String>,
        country1: impl Into<String>,
        city2: impl Into<String>,
        country2: impl Into<String>,
    ) -> Self {
        Self {
            city1: city1.into(),
            country1: country1.into(),
            city2: city2.into(),
            country2: country2.into(),
        }
    }

    /// Reject a request whose two (city, country) pairs are identical
    ///
    /// Values are compared exactly, as submitted.
    pub fn ensure_distinct(&self) -> Result<(), RequestError> {
        if self.city1 == self.city2 && self.country1 == self.country2 {
            return Err(RequestError::IdenticalCities);
        }
        Ok(())
    }
}
