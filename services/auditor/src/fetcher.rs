//! JSON GET client bound to an adapter's base URL

use reqwest::{Client, Url, header::CONTENT_TYPE};
use serde_json::Value;
use services_common::{FetchError, HttpConfig};
use tracing::debug;

/// Parsed JSON body together with the URL it came from
#[derive(Debug, Clone, PartialEq)]
pub struct JsonResponse {
    pub url: String,
    pub body: Value,
}

/// Performs GETs relative to a base URL and parses JSON bodies
#[derive(Debug, Clone)]
pub struct Fetcher {
    client: Client,
    base_url: String,
}

impl Fetcher {
    pub fn new(base_url: impl Into<String>, http: &HttpConfig) -> Result<Self, FetchError> {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        let client = Client::builder()
            .user_agent(http.user_agent.clone())
            .timeout(http.request_timeout())
            .build()
            .map_err(|e| FetchError::new(&base_url, format!("Failed to create HTTP client: {e}")))?;
        Ok(Self { client, base_url })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Resolve `path` plus form-encoded query pairs against the base URL
    pub fn url_for(&self, path: &str, query: &[(&str, &str)]) -> Result<Url, FetchError> {
        let raw = format!("{}{}", self.base_url, path);
        let mut url =
            Url::parse(&raw).map_err(|e| FetchError::new(&raw, format!("Invalid URL: {e}")))?;
        if !query.is_empty() {
            url.query_pairs_mut().extend_pairs(query.iter().copied());
        }
        Ok(url)
    }

    /// GET `path` and parse the body as JSON
    pub async fn get(&self, path: &str) -> Result<JsonResponse, FetchError> {
        self.get_with_query(path, &[]).await
    }

    /// GET `path?query` and parse the body as JSON
    pub async fn get_with_query(
        &self,
        path: &str,
        query: &[(&str, &str)],
    ) -> Result<JsonResponse, FetchError> {
        let url = self.url_for(path, query)?;
        let url_text = url.to_string();
        debug!(url = %url_text, "GET");

        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| FetchError::new(&url_text, e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::with_status(&url_text, status.as_u16()));
        }

        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("")
            .to_string();
        if !is_json_content_type(&content_type) {
            return Err(FetchError {
                url: url_text,
                message: format!(
                    "Invalid content-type. Expected application/json but received {content_type:?}"
                ),
                status: Some(status.as_u16()),
            });
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| FetchError::new(&url_text, e.to_string()))?;
        let body = serde_json::from_slice(&bytes).map_err(|e| FetchError {
            url: url_text.clone(),
            message: format!("Response is not valid JSON: {e}"),
            status: Some(status.as_u16()),
        })?;

        Ok(JsonResponse { url: url_text, body })
    }
}

fn is_json_content_type(content_type: &str) -> bool {
    let mime = content_type
        .split(';')
        .next()
        .unwrap_or("")
        .trim()
        .to_ascii_lowercase();
    mime == "application/json" || mime.ends_with("+json")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fetcher() -> Fetcher {
        Fetcher::new("http://localhost:3000/", &HttpConfig::default()).unwrap()
    }

    #[test]
    fn test_url_building_encodes_query() {
        let url = fetcher()
            .url_for(
                "/trades-by-timestamp",
                &[("market", "btc usd"), ("since", "2024-01-01T00:00:00.000Z")],
            )
            .unwrap();
        assert_eq!(
            url.as_str(),
            "http://localhost:3000/trades-by-timestamp?market=btc+usd&since=2024-01-01T00%3A00%3A00.000Z"
        );
    }

    #[test]
    fn test_url_building_without_query() {
        let url = fetcher().url_for("/info", &[]).unwrap();
        assert_eq!(url.as_str(), "http://localhost:3000/info");
    }

    #[test]
    fn test_json_content_types() {
        assert!(is_json_content_type("application/json"));
        assert!(is_json_content_type("application/json; charset=utf-8"));
        assert!(is_json_content_type("application/vnd.api+json"));
        assert!(!is_json_content_type("text/html"));
        assert!(!is_json_content_type(""));
    }
}
