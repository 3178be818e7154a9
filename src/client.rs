//! Renter API client
//!
//! The engine talks to the remote node through the [`RenterClient`]
//! capability trait; [`NodeClient`] is the production implementation
//! speaking the node's HTTP API. Tests substitute their own
//! implementations to observe upload/delete traffic.

use std::path::Path;

use async_trait::async_trait;
use serde::Deserialize;

use crate::error::{Result, SyncError};

/// Operations the reconciliation engine requires from the remote node.
///
/// All operations are idempotent from the engine's perspective: a failed
/// upload or delete is safe to issue again on a later event.
#[async_trait]
pub trait RenterClient: Send + Sync {
    /// Number of active storage contracts on the node.
    async fn active_contract_count(&self) -> Result<usize>;

    /// Full listing of relative paths currently known to the node.
    async fn list_files(&self) -> Result<Vec<String>>;

    /// Upload the file at `source` under the given relative path.
    async fn upload(&self, relative_path: &str, source: &Path) -> Result<()>;

    /// Delete the file stored under the given relative path.
    async fn delete(&self, relative_path: &str) -> Result<()>;
}

#[derive(Debug, Deserialize)]
struct ContractsResponse {
    #[serde(default)]
    contracts: Vec<serde_json::Value>,
}

#[derive(Debug, Deserialize)]
struct FileInfo {
    siapath: String,
}

#[derive(Debug, Deserialize)]
struct FilesResponse {
    #[serde(default)]
    files: Vec<FileInfo>,
}

/// HTTP client for a Sia renter node.
pub struct NodeClient {
    http: reqwest::Client,
    base_url: String,
}

impl NodeClient {
    /// Create a client for the node listening at `addr`
    /// (e.g. `localhost:9980`).
    pub fn new(addr: &str) -> Self {
        let base_url = if addr.starts_with("http://") || addr.starts_with("https://") {
            addr.trim_end_matches('/').to_string()
        } else {
            format!("http://{}", addr.trim_end_matches('/'))
        };
        // The node rejects requests without this agent string.
        let http = reqwest::Client::builder()
            .user_agent("Sia-Agent")
            .build()
            .expect("default TLS backend must initialize");
        Self { http, base_url }
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn check(response: reqwest::Response) -> Result<reqwest::Response> {
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(SyncError::Api(format!("{}: {}", status, body.trim())));
        }
        Ok(response)
    }
}

#[async_trait]
impl RenterClient for NodeClient {
    async fn active_contract_count(&self) -> Result<usize> {
        let response = self
            .http
            .get(self.endpoint("/renter/contracts"))
            .send()
            .await?;
        let body: ContractsResponse = Self::check(response).await?.json().await?;
        Ok(body.contracts.len())
    }

    async fn list_files(&self) -> Result<Vec<String>> {
        let response = self.http.get(self.endpoint("/renter/files")).send().await?;
        let body: FilesResponse = Self::check(response).await?.json().await?;
        Ok(body.files.into_iter().map(|f| f.siapath).collect())
    }

    async fn upload(&self, relative_path: &str, source: &Path) -> Result<()> {
        let source = source
            .to_str()
            .ok_or_else(|| SyncError::InvalidPath(source.to_path_buf()))?;
        let url = self.endpoint(&format!("/renter/upload/{}", relative_path));
        let response = self
            .http
            .post(url)
            .form(&[("source", source)])
            .send()
            .await?;
        Self::check(response).await?;
        Ok(())
    }

    async fn delete(&self, relative_path: &str) -> Result<()> {
        let url = self.endpoint(&format!("/renter/delete/{}", relative_path));
        let response = self.http.post(url).send().await?;
        Self::check(response).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_base_url_normalization() {
        let client = NodeClient::new("localhost:9980");
        assert_eq!(
            client.endpoint("/renter/files"),
            "http://localhost:9980/renter/files"
        );

        let client = NodeClient::new("http://node.example:9980/");
        assert_eq!(
            client.endpoint("/renter/contracts"),
            "http://node.example:9980/renter/contracts"
        );
    }

    #[test]
    fn test_files_response_decoding() {
        let body = r#"{"files": [{"siapath": "a.txt"}, {"siapath": "sub/b.txt"}]}"#;
        let parsed: FilesResponse = serde_json::from_str(body).unwrap();
        let paths: Vec<String> = parsed.files.into_iter().map(|f| f.siapath).collect();
        assert_eq!(paths, vec!["a.txt".to_string(), "sub/b.txt".to_string()]);
    }

    #[test]
    fn test_contracts_response_tolerates_missing_field() {
        let parsed: ContractsResponse = serde_json::from_str("{}").unwrap();
        assert!(parsed.contracts.is_empty());
    }
}
