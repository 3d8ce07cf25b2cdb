use super::{CandidateMod, LookupError, LookupProvider, DEFAULT_DESCRIPTION};
use crate::catalog::ModRecord;
use crate::config::{
    get_modrinth_http_timeout_secs, Settings, MODRINTH_USER_AGENT, SEARCH_RESULT_LIMIT,
};
use async_trait::async_trait;
use reqwest::Client as HttpClient;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, warn};

#[derive(Deserialize, Debug)]
struct SearchHit {
    project_id: String,
    title: String,
    description: Option<String>,
    slug: Option<String>,
}

#[derive(Deserialize, Debug)]
struct SearchResponse {
    #[serde(default)]
    hits: Vec<SearchHit>,
}

#[derive(Deserialize, Debug)]
struct Project {
    id: String,
    title: String,
    #[serde(default)]
    slug: String,
}

/// Lookup provider backed by the Modrinth v2 API
pub struct ModrinthClient {
    http: HttpClient,
    api_url: String,
    site_url: String,
}

impl ModrinthClient {
    /// Create a client for the given API and site base URLs
    #[must_use]
    pub fn new(api_url: impl Into<String>, site_url: impl Into<String>) -> Self {
        let timeout = Duration::from_secs(get_modrinth_http_timeout_secs());
        let http = HttpClient::builder()
            .timeout(timeout)
            .user_agent(MODRINTH_USER_AGENT)
            .build()
            .unwrap_or_else(|_| HttpClient::new());
        Self {
            http,
            api_url: api_url.into().trim_end_matches('/').to_string(),
            site_url: site_url.into().trim_end_matches('/').to_string(),
        }
    }

    /// Create a client from the loaded settings
    #[must_use]
    pub fn from_settings(settings: &Settings) -> Self {
        Self::new(&settings.modrinth_api_url, &settings.modrinth_site_url)
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        url: &str,
        query: &[(&str, &str)],
    ) -> Result<T, LookupError> {
        let response = self
            .http
            .get(url)
            .query(query)
            .send()
            .await
            .map_err(|e| LookupError::Network(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            warn!("Modrinth request to {url} failed with status {status}");
            return Err(LookupError::ProviderUnavailable(status.as_u16()));
        }

        response
            .json::<T>()
            .await
            .map_err(|e| LookupError::Decode(e.to_string()))
    }
}

/// Project page link for a slug
#[must_use]
pub fn download_url(site_url: &str, slug: &str) -> String {
    format!("{site_url}/mod/{slug}")
}

fn candidates_from_hits(hits: Vec<SearchHit>, site_url: &str) -> Vec<CandidateMod> {
    hits.into_iter()
        .take(SEARCH_RESULT_LIMIT)
        .map(|hit| CandidateMod {
            download_url: download_url(site_url, hit.slug.as_deref().unwrap_or_default()),
            id: hit.project_id,
            name: hit.title,
            description: hit
                .description
                .unwrap_or_else(|| DEFAULT_DESCRIPTION.to_string()),
        })
        .collect()
}

#[async_trait]
impl LookupProvider for ModrinthClient {
    async fn search(&self, query: &str) -> Result<Vec<CandidateMod>, LookupError> {
        let url = format!("{}/search", self.api_url);
        let response: SearchResponse = self.get_json(&url, &[("query", query)]).await?;
        debug!("Modrinth search '{query}' returned {} hits", response.hits.len());

        if response.hits.is_empty() {
            return Err(LookupError::NoResults);
        }
        Ok(candidates_from_hits(response.hits, &self.site_url))
    }

    async fn fetch_by_id(&self, id: &str) -> Result<ModRecord, LookupError> {
        let url = format!("{}/project/{id}", self.api_url);
        let project: Project = self.get_json(&url, &[]).await?;
        if project.id != id {
            debug!("Modrinth resolved '{id}' to project {}", project.id);
        }
        Ok(ModRecord {
            id: project.id,
            name: project.title,
            download_url: download_url(&self.site_url, &project.slug),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Result;
    use serde_json::json;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;
    use tokio::task::JoinHandle;

    /// Serve one canned HTTP response; the handle yields the request line
    async fn serve_once(
        status: &'static str,
        body: &'static str,
    ) -> Result<(String, JoinHandle<std::io::Result<String>>)> {
        let listener = TcpListener::bind("127.0.0.1:0").await?;
        let addr = listener.local_addr()?;
        let handle = tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await?;
            let mut head = Vec::new();
            let mut chunk = [0_u8; 1024];
            while !head.windows(4).any(|w| w == b"\r\n\r\n") {
                let n = socket.read(&mut chunk).await?;
                if n == 0 {
                    break;
                }
                head.extend_from_slice(&chunk[..n]);
            }
            let response = format!(
                "HTTP/1.1 {status}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
                body.len()
            );
            socket.write_all(response.as_bytes()).await?;
            socket.shutdown().await?;
            let head = String::from_utf8_lossy(&head).into_owned();
            Ok(head.lines().next().unwrap_or_default().to_string())
        });
        Ok((format!("http://{addr}/v2"), handle))
    }

    fn client(api_url: &str) -> ModrinthClient {
        ModrinthClient::new(api_url, "https://modrinth.com")
    }

    #[tokio::test]
    async fn test_search_encodes_query_and_maps_empty_hits() -> Result<()> {
        let (api, server) = serve_once("200 OK", r#"{"hits": [], "total_hits": 0}"#).await?;

        let result = client(&api).search("torch & lamp").await;

        assert!(matches!(result, Err(LookupError::NoResults)));
        assert_eq!(server.await??, "GET /v2/search?query=torch+%26+lamp HTTP/1.1");
        Ok(())
    }

    #[tokio::test]
    async fn test_search_non_success_is_provider_unavailable() -> Result<()> {
        let (api, server) = serve_once("503 Service Unavailable", "{}").await?;

        let result = client(&api).search("torch").await;

        assert!(matches!(result, Err(LookupError::ProviderUnavailable(503))));
        server.await??;
        Ok(())
    }

    #[tokio::test]
    async fn test_search_returns_candidates() -> Result<()> {
        let (api, server) = serve_once(
            "200 OK",
            r#"{"hits": [{"project_id": "AANobbMI", "title": "Sodium", "description": "Fast", "slug": "sodium"}]}"#,
        )
        .await?;

        let found = client(&api).search("sodium").await?;

        assert_eq!(found.len(), 1);
        assert_eq!(found[0].id, "AANobbMI");
        assert_eq!(found[0].download_url, "https://modrinth.com/mod/sodium");
        server.await??;
        Ok(())
    }

    #[tokio::test]
    async fn test_search_garbage_body_is_decode_error() -> Result<()> {
        let (api, server) = serve_once("200 OK", "<html>maintenance</html>").await?;

        let result = client(&api).search("torch").await;

        assert!(matches!(result, Err(LookupError::Decode(_))));
        server.await??;
        Ok(())
    }

    #[tokio::test]
    async fn test_fetch_missing_project_is_provider_unavailable() -> Result<()> {
        let (api, server) = serve_once("404 Not Found", r#"{"error": "not_found"}"#).await?;

        let result = client(&api).fetch_by_id("nope").await;

        assert!(matches!(result, Err(LookupError::ProviderUnavailable(404))));
        assert_eq!(server.await??, "GET /v2/project/nope HTTP/1.1");
        Ok(())
    }

    #[tokio::test]
    async fn test_fetch_by_slug_returns_canonical_id() -> Result<()> {
        let (api, server) = serve_once(
            "200 OK",
            r#"{"id": "AANobbMI", "slug": "sodium", "title": "Sodium"}"#,
        )
        .await?;

        let record = client(&api).fetch_by_id("sodium").await?;

        assert_eq!(record.id, "AANobbMI");
        assert_eq!(record.name, "Sodium");
        assert_eq!(record.download_url, "https://modrinth.com/mod/sodium");
        server.await??;
        Ok(())
    }

    #[tokio::test]
    async fn test_unreachable_provider_is_network_error() -> Result<()> {
        let listener = TcpListener::bind("127.0.0.1:0").await?;
        let addr = listener.local_addr()?;
        drop(listener);

        let result = client(&format!("http://{addr}/v2")).search("torch").await;

        assert!(matches!(result, Err(LookupError::Network(_))));
        Ok(())
    }

    fn hits(value: serde_json::Value) -> Vec<SearchHit> {
        serde_json::from_value::<SearchResponse>(value)
            .map(|r| r.hits)
            .unwrap_or_default()
    }

    #[test]
    fn test_hits_keep_order_and_defaults() {
        let hits = hits(json!({
            "hits": [
                {"project_id": "a1", "title": "Torchmaster", "description": "Big torches", "slug": "torchmaster"},
                {"project_id": "b2", "title": "Torch Slabs"},
                {"project_id": "c3", "title": "Wall Torches", "description": null, "slug": "wall-torches"}
            ],
            "total_hits": 3
        }));

        let candidates = candidates_from_hits(hits, "https://modrinth.com");
        let names: Vec<&str> = candidates.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["Torchmaster", "Torch Slabs", "Wall Torches"]);
        assert_eq!(candidates[0].download_url, "https://modrinth.com/mod/torchmaster");
        assert_eq!(candidates[1].description, DEFAULT_DESCRIPTION);
        assert_eq!(candidates[1].download_url, "https://modrinth.com/mod/");
        assert_eq!(candidates[2].description, DEFAULT_DESCRIPTION);
    }

    #[test]
    fn test_hits_capped_at_limit() {
        let many: Vec<serde_json::Value> = (0..25)
            .map(|i| json!({"project_id": format!("id{i}"), "title": format!("Mod {i}")}))
            .collect();
        let candidates = candidates_from_hits(hits(json!({ "hits": many })), "https://x");
        assert_eq!(candidates.len(), SEARCH_RESULT_LIMIT);
        assert_eq!(candidates[0].id, "id0");
        assert_eq!(candidates[9].id, "id9");
    }

    #[test]
    fn test_trailing_slashes_trimmed() {
        let client = ModrinthClient::new("https://api.modrinth.com/v2/", "https://modrinth.com/");
        assert_eq!(client.api_url, "https://api.modrinth.com/v2");
        assert_eq!(
            download_url(&client.site_url, "sodium"),
            "https://modrinth.com/mod/sodium"
        );
    }
}
