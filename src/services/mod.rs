// Service exports
pub mod cities;
pub mod llm;
pub mod photos;

pub use cities::{CityList, CityError};
pub use llm::{CompletionSource, LlmError, OpenAiClient, TokenStream, SseDecoder, parse_sse_stream};
pub use photos::{PhotoSearch, PhotoError, UnsplashClient, NoPhotos};
