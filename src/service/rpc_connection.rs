// service/rpc_connection.rs
use std::future::Future;
use std::time::Duration;

use serde::Serialize;
use tokio::sync::RwLock;

use crate::service::error::ServiceError;

pub const LAMPORTS_PER_SOL: f64 = 1_000_000_000.0;

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct WalletBalance {
    pub address: String,
    pub lamports: u64,
    pub sol: f64,
    pub endpoint: String,
}

/// JSON-RPC client over an ordered list of endpoints. Every call starts at
/// the primary and walks the fallbacks until one answers in time.
#[derive(Debug)]
pub struct RobustConnection {
    primary: String,
    fallbacks: Vec<String>,
    timeout: Duration,
    client: reqwest::Client,
    active_endpoint: RwLock<Option<String>>,
}

impl RobustConnection {
    pub fn new(primary: String, fallbacks: Vec<String>, timeout: Duration) -> Self {
        Self {
            primary,
            fallbacks,
            timeout,
            client: reqwest::Client::new(),
            active_endpoint: RwLock::new(None),
        }
    }

    fn endpoints(&self) -> impl Iterator<Item = &str> {
        std::iter::once(self.primary.as_str()).chain(self.fallbacks.iter().map(String::as_str))
    }

    pub async fn with_retry<T, F, Fut>(&self, op: F) -> Result<(T, String), ServiceError>
    where
        F: Fn(String) -> Fut,
        Fut: Future<Output = Result<T, String>>,
    {
        let mut last_error = String::from("no RPC endpoints configured");

        for endpoint in self.endpoints() {
            match tokio::time::timeout(self.timeout, op(endpoint.to_string())).await {
                Ok(Ok(value)) => {
                    let mut active = self.active_endpoint.write().await;
                    if active.as_deref() != Some(endpoint) {
                        tracing::info!("RPC now served by {}", endpoint);
                        *active = Some(endpoint.to_string());
                    }
                    return Ok((value, endpoint.to_string()));
                }
                Ok(Err(e)) => {
                    tracing::warn!("RPC endpoint {} failed: {}", endpoint, e);
                    last_error = format!("{}: {}", endpoint, e);
                }
                Err(_) => {
                    tracing::warn!("RPC endpoint {} timed out after {:?}", endpoint, self.timeout);
                    last_error = format!("{}: timed out", endpoint);
                }
            }
        }

        Err(ServiceError::Rpc(format!("all endpoints failed, last: {}", last_error)))
    }

    pub async fn get_balance(&self, address: &str) -> Result<WalletBalance, ServiceError> {
        let payload = serde_json::json!({
            "jsonrpc": "2.0",
            "id": 1,
            "method": "getBalance",
            "params": [address]
        });

        let (lamports, endpoint) = self
            .with_retry(|endpoint| {
                let client = self.client.clone();
                let payload = payload.clone();
                async move { fetch_lamports(&client, &endpoint, &payload).await }
            })
            .await?;

        tracing::debug!("Balance of {} is {} lamports via {}", address, lamports, endpoint);
        Ok(WalletBalance {
            address: address.to_string(),
            lamports,
            sol: lamports as f64 / LAMPORTS_PER_SOL,
            endpoint,
        })
    }
}

async fn fetch_lamports(
    client: &reqwest::Client,
    endpoint: &str,
    payload: &serde_json::Value,
) -> Result<u64, String> {
    let response = client
        .post(endpoint)
        .header("Content-Type", "application/json")
        .json(payload)
        .send()
        .await
        .map_err(|e| e.to_string())?;

    let body: serde_json::Value = response.json().await.map_err(|e| e.to_string())?;
    parse_balance(&body)
}

fn parse_balance(body: &serde_json::Value) -> Result<u64, String> {
    if let Some(message) = body["error"]["message"].as_str() {
        return Err(message.to_string());
    }
    body["result"]["value"]
        .as_u64()
        .ok_or_else(|| "malformed getBalance response".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn connection(timeout_ms: u64) -> RobustConnection {
        RobustConnection::new(
            "http://primary".to_string(),
            vec!["http://fallback-a".to_string(), "http://fallback-b".to_string()],
            Duration::from_millis(timeout_ms),
        )
    }

    #[tokio::test]
    async fn falls_through_to_first_working_endpoint() {
        let rpc = connection(1_000);
        let (value, endpoint) = rpc
            .with_retry(|endpoint| async move {
                if endpoint == "http://fallback-a" {
                    Ok(42u64)
                } else {
                    Err("connection refused".to_string())
                }
            })
            .await
            .unwrap();

        assert_eq!(value, 42);
        assert_eq!(endpoint, "http://fallback-a");
        assert_eq!(rpc.active_endpoint.read().await.as_deref(), Some("http://fallback-a"));
    }

    #[tokio::test]
    async fn every_call_starts_at_the_primary() {
        let rpc = connection(1_000);
        let primary_calls = AtomicUsize::new(0);

        for _ in 0..2 {
            rpc.with_retry(|endpoint| {
                let hit_primary = endpoint == "http://primary";
                if hit_primary {
                    primary_calls.fetch_add(1, Ordering::SeqCst);
                }
                async move {
                    if hit_primary {
                        Err("503".to_string())
                    } else {
                        Ok(())
                    }
                }
            })
            .await
            .unwrap();
        }

        assert_eq!(primary_calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn slow_endpoints_are_skipped() {
        let rpc = connection(20);
        let (_, endpoint) = rpc
            .with_retry(|endpoint| async move {
                if endpoint == "http://primary" {
                    tokio::time::sleep(Duration::from_millis(500)).await;
                }
                Ok::<_, String>(())
            })
            .await
            .unwrap();
        assert_eq!(endpoint, "http://fallback-a");
    }

    #[tokio::test]
    async fn exhausting_all_endpoints_is_an_rpc_error() {
        let rpc = connection(1_000);
        let err = rpc
            .with_retry(|_| async { Err::<(), _>("down".to_string()) })
            .await
            .unwrap_err();

        assert!(matches!(err, ServiceError::Rpc(_)));
        assert!(err.to_string().contains("http://fallback-b: down"));
        assert!(rpc.active_endpoint.read().await.is_none());
    }

    #[test]
    fn balance_response_parsing() {
        let ok = serde_json::json!({"jsonrpc": "2.0", "result": {"context": {"slot": 1}, "value": 2_500_000_000u64}, "id": 1});
        assert_eq!(parse_balance(&ok), Ok(2_500_000_000));

        let rpc_error = serde_json::json!({"jsonrpc": "2.0", "error": {"code": -32602, "message": "Invalid param"}, "id": 1});
        assert_eq!(parse_balance(&rpc_error), Err("Invalid param".to_string()));
    }
}
