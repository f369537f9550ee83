//! API client
//!
//! This module provides HTTP client functionality for interacting with the API server.
//!
//! # Example
//!
//! ```rust,no_run
//! use rowfarm::api::ApiClient;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
//!     let client = ApiClient::new("http://127.0.0.1:8080");
//!
//!     client.start_generation().await?;
//!     println!("rows so far: {}", client.progress().await?.rows);
//!
//!     let response = client.execute_query("select count(*) from items").await?;
//!     println!("{}", response.rendered);
//!
//!     let snapshot = client.export_snapshot().await?;
//!     snapshot.save(snapshot.file_name())?;
//!     Ok(())
//! }
//! ```

use crate::api::server::{ExecuteQueryRequest, ExecuteQueryResponse, ProgressResponse};
use crate::database::Snapshot;

type ClientResult<T> = Result<T, Box<dyn std::error::Error + Send + Sync>>;

/// API client
///
/// Provides methods for interacting with the rowfarm API server.
pub struct ApiClient {
    /// Base URL of the API server
    base_url: String,
    http: reqwest::Client,
}

impl ApiClient {
    /// Create a new API client
    ///
    /// # Arguments
    /// * `base_url` - Base URL of the API server (e.g., "http://127.0.0.1:8080")
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            http: reqwest::Client::new(),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn checked(response: reqwest::Response) -> ClientResult<reqwest::Response> {
        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(format!("API request failed: {} {}", status, body).into());
        }
        Ok(response)
    }

    /// Health check
    ///
    /// # Returns
    /// `Ok(true)` if the server answers and its store is ready
    pub async fn health_check(&self) -> ClientResult<bool> {
        let response = self.http.get(self.url("/health")).send().await?;
        let response = Self::checked(response).await?;
        let body: serde_json::Value = response.json().await?;
        Ok(body["ready"].as_bool().unwrap_or(false))
    }

    /// Start the session's bulk generation run
    ///
    /// Fails with a conflict status if a run was already started.
    pub async fn start_generation(&self) -> ClientResult<()> {
        let response = self.http.post(self.url("/generate")).send().await?;
        Self::checked(response).await?;
        Ok(())
    }

    /// Latest progress of the background run
    pub async fn progress(&self) -> ClientResult<ProgressResponse> {
        let response = self.http.get(self.url("/progress")).send().await?;
        let response = Self::checked(response).await?;
        Ok(response.json().await?)
    }

    /// Execute a query
    ///
    /// # Arguments
    /// * `query` - Raw SQL text; it is normalized server side
    ///
    /// # Returns
    /// `Ok(ExecuteQueryResponse)` carrying either result sets or the engine
    /// failure, `Err` on transport errors or a refused request
    pub async fn execute_query(&self, query: &str) -> ClientResult<ExecuteQueryResponse> {
        let request = ExecuteQueryRequest {
            query: query.to_string(),
        };
        let response = self
            .http
            .post(self.url("/query"))
            .json(&request)
            .send()
            .await?;
        let response = Self::checked(response).await?;
        Ok(response.json().await?)
    }

    /// Download the database image
    pub async fn export_snapshot(&self) -> ClientResult<Snapshot> {
        let response = self.http.get(self.url("/export")).send().await?;
        let response = Self::checked(response).await?;
        let bytes = response.bytes().await?;
        Ok(Snapshot::from_bytes(bytes.to_vec()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::ApiServer;
    use crate::config::HarnessConfig;
    use crate::database::{Store, StoreHandle, StoreSource, Table};
    use std::time::Duration;

    async fn spawn_server(config: HarnessConfig) -> ApiClient {
        let handle = StoreHandle::from_store(Store::open(&StoreSource::Memory).unwrap());
        let router = ApiServer::new("127.0.0.1:0".parse().unwrap(), handle, config).router();
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });

        ApiClient {
            base_url: format!("http://{}", addr),
            http: reqwest::Client::builder().no_proxy().build().unwrap(),
        }
    }

    #[test]
    fn test_url_joining() {
        let client = ApiClient::new("http://127.0.0.1:8080/");
        assert_eq!(client.url("/query"), "http://127.0.0.1:8080/query");
    }

    #[tokio::test]
    async fn test_session_against_live_server() {
        let client = spawn_server(HarnessConfig {
            total_items: 20,
            progress_interval: 5,
            frame_interval_ms: 1,
            ..HarnessConfig::default()
        })
        .await;

        assert!(client.health_check().await.unwrap());

        let response = client.execute_query("select 1").await.unwrap();
        assert!(response.result.is_success());
        assert!(response.rendered.starts_with("executed in "));

        client.start_generation().await.unwrap();
        assert!(client.start_generation().await.is_err());

        let mut progress = client.progress().await.unwrap();
        for _ in 0..200 {
            if progress.finished {
                break;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
            progress = client.progress().await.unwrap();
        }
        assert!(progress.finished);
        assert_eq!(progress.rows, 60);

        let snapshot = client.export_snapshot().await.unwrap();
        assert!(snapshot.has_sqlite_header());

        let copy = StoreHandle::new();
        copy.initialize(snapshot.into_source()).await.unwrap();
        let store = copy.ready().unwrap();
        assert_eq!(store.count(Table::Items).unwrap(), 19);
        assert_eq!(store.count(Table::Subitems).unwrap(), 38);
    }

    #[tokio::test]
    async fn test_failed_query_is_a_response_not_an_error() {
        let client = spawn_server(HarnessConfig::default()).await;
        let response = client.execute_query("selec nonsense").await.unwrap();
        assert!(!response.result.is_success());
    }
}
