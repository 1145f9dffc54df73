mod endpoint;
mod http_client;
pub mod openfda;

pub use endpoint::Endpoint;
pub use http_client::{HttpApiClient, HttpApiClientConfig};
