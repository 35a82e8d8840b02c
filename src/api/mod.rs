pub mod client;
pub mod routes;
pub mod transport;

pub use client::ApiClient;
pub use transport::{HttpClient, HttpMethod, ReqwestHttpClient, SimpleHttpResponse};
