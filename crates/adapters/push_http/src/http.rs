//! Push gateway client.

use std::future::Future;
use std::time::Duration;

use reqwest::Client;
use serde::{Deserialize, Serialize};

use presence_app::ports::{Notifier, PushNotification};
use presence_domain::error::PresenceError;

use crate::error::PushError;

/// JSON body posted to the gateway.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PushRequest {
    pub tokens: Vec<String>,
    pub title: String,
    pub body: String,
    pub data: serde_json::Value,
}

/// Delivers notifications by POSTing them to a push gateway.
pub struct HttpPushNotifier {
    client: Client,
    endpoint: String,
}

impl HttpPushNotifier {
    /// Create a client for `endpoint` with a per-request timeout.
    ///
    /// # Errors
    ///
    /// Returns [`PushError::Http`] if the HTTP client cannot be built.
    pub fn new(endpoint: impl Into<String>, timeout: Duration) -> Result<Self, PushError> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            endpoint: endpoint.into(),
        })
    }

    async fn deliver(&self, request: PushRequest) -> Result<(), PushError> {
        let response = self
            .client
            .post(&self.endpoint)
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        if status.is_success() {
            tracing::debug!(tokens = request.tokens.len(), "push notification delivered");
            return Ok(());
        }
        let body = response.text().await.unwrap_or_default();
        Err(PushError::Rejected {
            status: status.as_u16(),
            body,
        })
    }
}

impl Notifier for HttpPushNotifier {
    fn send(
        &self,
        tokens: Vec<String>,
        notification: PushNotification,
    ) -> impl Future<Output = Result<(), PresenceError>> + Send {
        let request = PushRequest {
            tokens,
            title: notification.title,
            body: notification.body,
            data: notification.data,
        };
        async move { self.deliver(request).await.map_err(PresenceError::from) }
    }
}
