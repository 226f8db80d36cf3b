// Model exports
pub mod domain;
pub mod requests;
pub mod responses;

pub use domain::{NeighborhoodMatch, RawMatch, CityCatalog, Country};
pub use requests::{MatchRequest, RequestError};
pub use responses::{ProgressEvent, HealthResponse, ServiceInfo, ErrorResponse};
