//! reqwest 기반 transport

use super::{HttpTransport, RequestOptions};
use crate::error::FetchError;
use async_trait::async_trait;
use parking_lot::Mutex;
use refetch_foundation::{FetchConfig, Payload, Timeouts};
use reqwest::{Client, Method};
use std::collections::{BTreeMap, HashMap};
use tracing::debug;

/// Real network transport
///
/// reqwest only accepts a connect timeout per client, so one client is
/// built (and reused) per distinct connect timeout. The total timeout is
/// applied per request.
pub struct ReqwestTransport {
    user_agent: String,
    clients: Mutex<HashMap<u64, Client>>,
}

impl ReqwestTransport {
    pub fn new(user_agent: impl Into<String>) -> Self {
        Self {
            user_agent: user_agent.into(),
            clients: Mutex::new(HashMap::new()),
        }
    }

    pub fn from_config(config: &FetchConfig) -> Self {
        Self::new(config.user_agent.clone())
    }

    fn client_for(&self, timeouts: &Timeouts) -> Result<Client, FetchError> {
        let mut clients = self.clients.lock();
        if let Some(client) = clients.get(&timeouts.connect_ms) {
            return Ok(client.clone());
        }

        let client = Client::builder()
            .connect_timeout(timeouts.connect())
            .user_agent(self.user_agent.clone())
            .build()
            .map_err(|e| FetchError::Request(format!("Failed to build client: {}", e)))?;

        clients.insert(timeouts.connect_ms, client.clone());
        Ok(client)
    }
}

impl Default for ReqwestTransport {
    fn default() -> Self {
        Self::from_config(&FetchConfig::default())
    }
}

#[async_trait]
impl HttpTransport for ReqwestTransport {
    async fn request(
        &self,
        method: Method,
        url: &str,
        options: &RequestOptions,
    ) -> Result<Payload, FetchError> {
        let client = self.client_for(&options.timeouts)?;

        let mut builder = client
            .request(method.clone(), url)
            .timeout(options.timeouts.total());
        for (name, value) in &options.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }

        debug!("{} {} (timeouts {:?})", method, url, options.timeouts);

        let response = builder
            .send()
            .await
            .map_err(|e| with_timeout(FetchError::from(e), options.timeouts.total_ms))?;

        let status = response.status().as_u16();
        let mut headers: BTreeMap<String, Vec<String>> = BTreeMap::new();
        for (name, value) in response.headers() {
            if let Ok(value) = value.to_str() {
                headers
                    .entry(name.as_str().to_string())
                    .or_default()
                    .push(value.to_string());
            }
        }

        let body = response
            .text()
            .await
            .map_err(|e| with_timeout(FetchError::from(e), options.timeouts.total_ms))?;

        let payload = Payload {
            body,
            status,
            headers,
        };

        if payload.is_success() {
            Ok(payload)
        } else {
            Err(FetchError::Status { status, payload })
        }
    }
}

fn with_timeout(err: FetchError, total_ms: u64) -> FetchError {
    match err {
        FetchError::Timeout(_) => FetchError::Timeout(total_ms),
        other => other,
    }
}
