use std::time::Duration;

use m1ssion_geo::GeoReading;
use m1ssion_types::{Coordinates, RedemptionResult, wire::RedeemRequest};
use reqwest::Client;

use crate::gate::RedemptionGate;

const REDEEM_PATH: &str = "/api/v1/markers/redeem";

#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    #[error("failed to build HTTP client: {0}")]
    Build(#[from] reqwest::Error),
    #[error("a redemption is already in flight")]
    InFlight,
}

pub struct RedemptionClient {
    http: Client,
    endpoint: String,
    token: Option<String>,
    gate: RedemptionGate,
}

impl RedemptionClient {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, ClientError> {
        let http = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            http,
            endpoint: format!("{}{}", base_url.trim_end_matches('/'), REDEEM_PATH),
            token: None,
            gate: RedemptionGate::new(),
        })
    }

    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    pub fn gate(&self) -> &RedemptionGate {
        &self.gate
    }

    /// Only refuses when another redemption from this client is still running.
    /// Transport problems and unreadable replies come back as
    /// [`RedemptionResult::UnknownError`].
    pub async fn redeem(
        &self,
        marker_id: &str,
        position: Option<Coordinates>,
    ) -> Result<RedemptionResult, ClientError> {
        self.send(RedeemRequest::new(marker_id, position)).await
    }

    /// Redeems with a watcher reading, forwarding its accuracy.
    pub async fn redeem_at(
        &self,
        marker_id: &str,
        reading: Option<GeoReading>,
    ) -> Result<RedemptionResult, ClientError> {
        let mut request = RedeemRequest::new(marker_id, reading.map(|r| r.coordinates()));
        request.accuracy = reading.map(|r| r.accuracy);
        self.send(request).await
    }

    async fn send(&self, request: RedeemRequest) -> Result<RedemptionResult, ClientError> {
        let Some(_in_flight) = self.gate.try_acquire() else {
            tracing::debug!(marker_id = %request.marker_id, "Redemption already in flight");
            return Err(ClientError::InFlight);
        };
        Ok(self.post(request).await)
    }

    async fn post(&self, request: RedeemRequest) -> RedemptionResult {
        let mut builder = self.http.post(&self.endpoint).json(&request);
        if let Some(token) = &self.token {
            builder = builder.bearer_auth(token);
        }

        let response = match builder.send().await {
            Ok(response) => response,
            Err(e) => {
                tracing::warn!(marker_id = %request.marker_id, "Redemption request failed: {}", e);
                return RedemptionResult::UnknownError;
            }
        };

        let status = response.status().as_u16();
        match response.bytes().await {
            Ok(body) => {
                let result = RedemptionResult::from_response(status, &body);
                tracing::debug!(marker_id = %request.marker_id, status, ?result, "Redemption answered");
                result
            }
            Err(e) => {
                tracing::warn!(marker_id = %request.marker_id, "Failed to read redemption reply: {}", e);
                RedemptionResult::UnknownError
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::net::TcpListener;

    const ROME: Coordinates = Coordinates::new(41.9028, 12.4964);

    #[tokio::test]
    async fn refuses_while_the_gate_is_held() {
        let client = RedemptionClient::new("http://127.0.0.1:9", Duration::from_millis(200))
            .unwrap()
            .with_token("token");

        let held = client.gate().try_acquire().unwrap();
        let result = client.redeem("venezia", Some(ROME)).await;
        assert!(matches!(result, Err(ClientError::InFlight)));

        drop(held);
        assert!(!client.gate().is_busy());
    }

    #[tokio::test]
    async fn second_redeem_is_refused_while_the_first_is_pending() {
        // accepts the connection but never answers
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let server = tokio::spawn(async move {
            let (socket, _) = listener.accept().await.unwrap();
            tokio::time::sleep(Duration::from_secs(5)).await;
            drop(socket);
        });

        let client = RedemptionClient::new(&format!("http://{addr}"), Duration::from_millis(300))
            .unwrap()
            .with_token("token");

        let (first, second) = tokio::join!(
            client.redeem("venezia", Some(ROME)),
            client.redeem("venezia", Some(ROME)),
        );
        assert!(matches!(first, Ok(RedemptionResult::UnknownError)));
        assert!(matches!(second, Err(ClientError::InFlight)));
        assert!(!client.gate().is_busy());

        server.abort();
    }
}
