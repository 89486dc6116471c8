#[cfg(test)]
pub mod mock {
    use crate::api::ApiClient;
    pub use httpmock::prelude::*;

    pub const API_PREFIX: &str = "/api/v1/authenticate";

    pub fn api_path(endpoint: &str) -> String {
        format!("{}/{}", API_PREFIX, endpoint)
    }

    pub fn client_for(server: &MockServer) -> ApiClient {
        ApiClient::new_with_base_url(server.url(API_PREFIX))
    }

    /// A client whose requests never reach a server.
    pub fn unreachable_client() -> ApiClient {
        ApiClient::new_with_base_url("http://127.0.0.1:9/api/v1/authenticate")
    }
}
