// src/clients/kakao.rs

//! Kakao local search and mobility directions.

use reqwest::{Client, header};
use serde_json::Value;

use super::{UpstreamError, check_status};
use crate::config::ProviderConfig;

/// Search radius around the given point, in meters.
const SEARCH_RADIUS_M: &str = "2000";

#[derive(Clone)]
pub struct KakaoClient {
    http: Client,
    local_base_url: String,
    navi_base_url: String,
    api_key: Option<String>,
}

impl KakaoClient {
    pub fn new(config: &ProviderConfig) -> Self {
        Self {
            http: Client::new(),
            local_base_url: config.kakao_local_base_url.trim_end_matches('/').to_string(),
            navi_base_url: config.kakao_navi_base_url.trim_end_matches('/').to_string(),
            api_key: config.kakao_api_key.clone(),
        }
    }

    fn authorization(&self) -> Result<String, UpstreamError> {
        self.api_key
            .as_deref()
            .map(|key| format!("KakaoAK {}", key))
            .ok_or(UpstreamError::NotConfigured("KAKAO_MAP_API_KEY"))
    }

    /// Keyword search around a point, nearest first.
    pub async fn search_keyword(&self, keyword: &str, x: &str, y: &str) -> Result<Value, UpstreamError> {
        let url = format!("{}/v2/local/search/keyword.json", self.local_base_url);
        tracing::debug!(keyword, "GET {}", url);

        let response = self
            .http
            .get(&url)
            .header(header::AUTHORIZATION, self.authorization()?)
            .query(&[
                ("query", keyword),
                ("x", x),
                ("y", y),
                ("radius", SEARCH_RADIUS_M),
                ("sort", "distance"),
            ])
            .send()
            .await?;

        Ok(check_status(response).await?.json().await?)
    }

    /// Car directions between two "x,y" points.
    pub async fn directions(&self, origin: &str, destination: &str) -> Result<Value, UpstreamError> {
        let url = format!("{}/v1/directions", self.navi_base_url);
        tracing::debug!("GET {}", url);

        let response = self
            .http
            .get(&url)
            .header(header::AUTHORIZATION, self.authorization()?)
            .header(header::CONTENT_TYPE, "application/json")
            .query(&[
                ("origin", origin),
                ("destination", destination),
                ("priority", "RECOMMEND"),
            ])
            .send()
            .await?;

        Ok(check_status(response).await?.json().await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{header as header_eq, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client(base_url: &str, key: Option<&str>) -> KakaoClient {
        KakaoClient::new(&ProviderConfig {
            kakao_local_base_url: base_url.to_string(),
            kakao_navi_base_url: base_url.to_string(),
            kakao_api_key: key.map(str::to_string),
            ..ProviderConfig::default()
        })
    }

    #[tokio::test]
    async fn test_search_sends_key_and_radius() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/v2/local/search/keyword.json"))
            .and(header_eq("authorization", "KakaoAK secret"))
            .and(query_param("query", "은행"))
            .and(query_param("radius", "2000"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(serde_json::json!({ "documents": [] })),
            )
            .mount(&mock_server)
            .await;

        let body = client(&mock_server.uri(), Some("secret"))
            .search_keyword("은행", "127.0", "37.5")
            .await
            .unwrap();
        assert_eq!(body["documents"], serde_json::json!([]));
    }

    #[tokio::test]
    async fn test_directions_keeps_provider_error() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/v1/directions"))
            .respond_with(ResponseTemplate::new(401).set_body_string("{\"msg\":\"wrong key\"}"))
            .mount(&mock_server)
            .await;

        let err = client(&mock_server.uri(), Some("bad"))
            .directions("127.0,37.5", "127.1,37.6")
            .await
            .unwrap_err();
        match err {
            UpstreamError::Status { status, body } => {
                assert_eq!(status, 401);
                assert!(body.contains("wrong key"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_unconfigured_key() {
        let err = client("http://127.0.0.1:9", None)
            .search_keyword("은행", "0", "0")
            .await
            .unwrap_err();
        assert!(matches!(err, UpstreamError::NotConfigured("KAKAO_MAP_API_KEY")));
    }
}
