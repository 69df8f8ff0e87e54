use crate::api::error::ApiError;
use crate::api::{ApiResponse, RetrievalApi};
use crate::types::command::CommandId;
use crate::types::station::StationId;
use crate::types::window::RetrievalWindow;
use async_trait::async_trait;
use bon::bon;
use log::debug;
use reqwest::header::ACCEPT;
use reqwest::Client;
use std::time::Duration;

const COMMAND_PATH: &str = "/commande-station/horaire";
const FILE_PATH: &str = "/commande/fichier";
const API_KEY_HEADER: &str = "apikey";
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// HTTP implementation of [`RetrievalApi`] for the climatological data service.
///
/// Every response is returned as-is, whatever its status; only failures to get a
/// response at all become errors.
pub struct ClimatologyClient {
    client: Client,
    base_url: String,
    api_key: String,
}

#[bon]
impl ClimatologyClient {
    /// Creates a client for the API rooted at `base_url`.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::ClientBuild`] if the TLS backend cannot be initialised.
    #[builder]
    pub fn new(
        #[builder(into)] base_url: String,
        #[builder(into)] api_key: String,
        timeout: Option<Duration>,
    ) -> Result<Self, ApiError> {
        let client = Client::builder()
            .timeout(timeout.unwrap_or(DEFAULT_TIMEOUT))
            .build()
            .map_err(ApiError::ClientBuild)?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key,
        })
    }

    async fn get(
        &self,
        path: &str,
        accept: &str,
        params: &[(&str, &str)],
    ) -> Result<ApiResponse, ApiError> {
        let url = format!("{}{}", self.base_url, path);
        let response = self
            .client
            .get(&url)
            .header(ACCEPT, accept)
            .header(API_KEY_HEADER, &self.api_key)
            .query(params)
            .send()
            .await
            .map_err(|e| transport_error(&url, e))?;

        let status = response.status().as_u16();
        let body = response.text().await.map_err(|e| transport_error(&url, e))?;
        debug!("GET {} => {} ({} bytes)", url, status, body.len());
        Ok(ApiResponse { status, body })
    }
}

fn transport_error(url: &str, error: reqwest::Error) -> ApiError {
    if error.is_timeout() {
        ApiError::Timeout(url.to_string())
    } else {
        ApiError::NetworkRequest(url.to_string(), error)
    }
}

#[async_trait]
impl RetrievalApi for ClimatologyClient {
    async fn create_command(
        &self,
        station: &StationId,
        window: &RetrievalWindow,
    ) -> Result<ApiResponse, ApiError> {
        let start = window.start_param();
        let end = window.end_param();
        self.get(
            COMMAND_PATH,
            "application/json",
            &[
                ("id-station", station.as_str()),
                ("date-deb-periode", start.as_str()),
                ("date-fin-periode", end.as_str()),
            ],
        )
        .await
    }

    async fn fetch_file(&self, command: &CommandId) -> Result<ApiResponse, ApiError> {
        self.get(FILE_PATH, "*/*", &[("id-cmde", command.as_str())])
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveTime, TimeZone, Utc};
    use wiremock::matchers::{header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn window() -> RetrievalWindow {
        RetrievalWindow::for_cycle(
            Utc.with_ymd_and_hms(2024, 3, 2, 12, 30, 0).unwrap(),
            NaiveTime::from_hms_opt(11, 30, 0).unwrap(),
        )
    }

    fn client(base_url: &str) -> ClimatologyClient {
        ClimatologyClient::builder()
            .base_url(base_url)
            .api_key("secret")
            .timeout(Duration::from_secs(2))
            .build()
            .unwrap()
    }

    #[tokio::test]
    async fn create_command_sends_station_and_window() -> Result<(), ApiError> {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/commande-station/horaire"))
            .and(query_param("id-station", "20004002"))
            .and(query_param("date-deb-periode", "2024-03-01T00:00:00Z"))
            .and(query_param("date-fin-periode", "2024-03-01T23:59:59Z"))
            .and(header("apikey", "secret"))
            .and(header("accept", "application/json"))
            .respond_with(ResponseTemplate::new(202).set_body_string(
                r#"{"elaboreProduitAvecDemandeResponse":{"return":"777"}}"#,
            ))
            .expect(1)
            .mount(&server)
            .await;

        let response = client(&format!("{}/", server.uri()))
            .create_command(&StationId::new("20004002"), &window())
            .await?;
        assert_eq!(response.status, 202);
        assert!(response.body.contains("777"));
        Ok(())
    }

    #[tokio::test]
    async fn fetch_file_returns_any_status_with_body() -> Result<(), ApiError> {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/commande/fichier"))
            .and(query_param("id-cmde", "777"))
            .respond_with(ResponseTemplate::new(201).set_body_string("POSTE;T\n1;2,5\n"))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/commande/fichier"))
            .and(query_param("id-cmde", "778"))
            .respond_with(ResponseTemplate::new(507).set_body_string("storage"))
            .mount(&server)
            .await;

        let client = client(&server.uri());
        let ready = client.fetch_file(&CommandId::new("777")).await?;
        assert_eq!(ready, ApiResponse::new(201, "POSTE;T\n1;2,5\n"));

        let failed = client.fetch_file(&CommandId::new("778")).await?;
        assert_eq!(failed.status, 507);
        Ok(())
    }

    #[tokio::test]
    async fn slow_response_is_a_transient_timeout() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(201).set_delay(Duration::from_secs(5)))
            .mount(&server)
            .await;

        let err = ClimatologyClient::builder()
            .base_url(server.uri())
            .api_key("secret")
            .timeout(Duration::from_millis(200))
            .build()
            .unwrap()
            .fetch_file(&CommandId::new("1"))
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::Timeout(_)));
        assert!(err.is_transient());
    }

    #[tokio::test]
    async fn unreachable_host_is_a_transient_network_error() {
        let err = client("http://127.0.0.1:1")
            .fetch_file(&CommandId::new("1"))
            .await
            .unwrap_err();
        assert!(err.is_transient());
    }
}
