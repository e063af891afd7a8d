//! Ethereum JSON-RPC client with primary → fallback failover and circuit breaker.

use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::metrics::METRICS;

const CIRCUIT_BREAKER_THRESHOLD: u64 = 5;
const CIRCUIT_BREAKER_WINDOW_MS: u64 = 30_000;

struct CircuitState {
    failures: u64,
    last_failure_ms: u64,
    open: bool,
}

#[derive(Deserialize)]
struct RpcEnvelope {
    #[serde(default)]
    result: Option<Value>,
    #[serde(default)]
    error: Option<RpcErrorObject>,
}

#[derive(Debug, Deserialize)]
struct RpcErrorObject {
    code: i64,
    message: String,
}

/// One JSON-RPC 2.0 HTTP endpoint.
pub struct Endpoint {
    http: reqwest::Client,
    url: String,
    next_id: AtomicU64,
}

impl Endpoint {
    pub fn new(url: &str, timeout: Duration) -> Result<Self, crate::Error> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| crate::Error::Config(format!("HTTP client init failed: {e}")))?;
        Ok(Self {
            http,
            url: url.to_string(),
            next_id: AtomicU64::new(1),
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// Issue `method` and deserialize its `result`. A `null` result is passed
    /// to `T`, so `Option<_>` targets see `None`.
    pub async fn call<T: DeserializeOwned>(
        &self,
        method: &str,
        params: Value,
    ) -> Result<T, crate::Error> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let body = json!({
            "jsonrpc": "2.0",
            "id": id,
            "method": method,
            "params": params,
        });
        debug!(url = %self.url, method, id, "JSON-RPC request");

        let resp = self
            .http
            .post(&self.url)
            .json(&body)
            .send()
            .await
            .map_err(|e| crate::Error::Rpc(format!("{method}: {e}")))?;
        let status = resp.status();
        if !status.is_success() {
            return Err(crate::Error::Rpc(format!("{method}: HTTP {status}")));
        }
        let envelope: RpcEnvelope = resp
            .json()
            .await
            .map_err(|e| crate::Error::Rpc(format!("{method}: invalid response: {e}")))?;

        if let Some(err) = envelope.error {
            return Err(crate::Error::Rpc(format!(
                "{method}: code {}: {}",
                err.code, err.message
            )));
        }
        serde_json::from_value(envelope.result.unwrap_or(Value::Null))
            .map_err(|e| crate::Error::Rpc(format!("{method}: unexpected result: {e}")))
    }
}

/// Receipt fields the console needs.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionReceipt {
    pub transaction_hash: String,
    #[serde(default)]
    pub block_number: Option<String>,
    /// `0x1` success, `0x0` reverted. Absent on pre-Byzantium chains.
    #[serde(default)]
    pub status: Option<String>,
}

impl TransactionReceipt {
    pub fn succeeded(&self) -> bool {
        self.status.as_deref() != Some("0x0")
    }
}

/// Read provider with primary → fallback failover.
pub struct RpcClient {
    primary: Endpoint,
    fallback: Endpoint,
    circuit: Mutex<CircuitState>,
    total_failovers: AtomicU64,
}

impl RpcClient {
    pub fn new(primary_url: &str, fallback_url: &str, timeout: Duration) -> Result<Self, crate::Error> {
        info!(
            primary = primary_url,
            fallback = fallback_url,
            "RPC client initialized with failover"
        );
        Ok(Self {
            primary: Endpoint::new(primary_url, timeout)?,
            fallback: Endpoint::new(fallback_url, timeout)?,
            circuit: Mutex::new(CircuitState {
                failures: 0,
                last_failure_ms: 0,
                open: false,
            }),
            total_failovers: AtomicU64::new(0),
        })
    }

    /// Call on the active endpoint, retrying once on the fallback.
    async fn call<T: DeserializeOwned>(&self, method: &str, params: Value) -> Result<T, crate::Error> {
        let circuit_open = self.is_circuit_open();
        let active = if circuit_open { &self.fallback } else { &self.primary };
        match active.call(method, params.clone()).await {
            Ok(v) => {
                if !circuit_open {
                    self.record_success();
                }
                Ok(v)
            }
            Err(e) if circuit_open => {
                METRICS.rpc_errors.fetch_add(1, Ordering::Relaxed);
                Err(e)
            }
            Err(e) => {
                self.record_failure();
                warn!(error = %e, method, "Primary RPC failed, trying fallback");
                self.fallback.call(method, params).await.map_err(|e2| {
                    METRICS.rpc_errors.fetch_add(1, Ordering::Relaxed);
                    crate::Error::Rpc(format!("{method} failed: primary={e}, fallback={e2}"))
                })
            }
        }
    }

    /// `eth_call` against the latest block. Returns the raw hex result.
    pub async fn eth_call(&self, to: &str, data: &str) -> Result<String, crate::Error> {
        self.call("eth_call", json!([{ "to": to, "data": data }, "latest"]))
            .await
    }

    pub async fn chain_id(&self) -> Result<u64, crate::Error> {
        let quantity: String = self.call("eth_chainId", json!([])).await?;
        Ok(cryptodevs_types::parse_quantity(&quantity)?)
    }

    /// `None` while the transaction is still pending.
    pub async fn transaction_receipt(
        &self,
        tx_hash: &str,
    ) -> Result<Option<TransactionReceipt>, crate::Error> {
        self.call("eth_getTransactionReceipt", json!([tx_hash])).await
    }

    /// Quick connectivity check. Returns "ok", "degraded", or error.
    pub async fn health_check(&self) -> Result<&'static str, crate::Error> {
        match self.primary.call::<String>("eth_blockNumber", json!([])).await {
            Ok(_) => Ok("ok"),
            Err(_) => match self.fallback.call::<String>("eth_blockNumber", json!([])).await {
                Ok(_) => Ok("degraded"),
                Err(e) => Err(crate::Error::Rpc(format!("Both RPCs unreachable: {e}"))),
            },
        }
    }

    // --- Failover / circuit breaker ---

    fn record_success(&self) {
        let mut circuit = self.circuit.lock().unwrap_or_else(|e| e.into_inner());
        if circuit.failures > 0 {
            info!(primary = %self.primary.url(), "Primary RPC recovered");
            circuit.failures = 0;
            circuit.open = false;
        }
    }

    fn record_failure(&self) {
        METRICS.rpc_errors.fetch_add(1, Ordering::Relaxed);
        let mut circuit = self.circuit.lock().unwrap_or_else(|e| e.into_inner());
        circuit.failures += 1;
        circuit.last_failure_ms = now_ms();
        if circuit.failures >= CIRCUIT_BREAKER_THRESHOLD && !circuit.open {
            circuit.open = true;
            self.total_failovers.fetch_add(1, Ordering::Relaxed);
            METRICS.rpc_failovers.fetch_add(1, Ordering::Relaxed);
            warn!(
                failures = circuit.failures,
                fallback = %self.fallback.url(),
                "Circuit breaker opened, routing to fallback"
            );
        }
    }

    pub fn is_circuit_open(&self) -> bool {
        let mut circuit = self.circuit.lock().unwrap_or_else(|e| e.into_inner());
        if !circuit.open {
            return false;
        }
        if now_ms().saturating_sub(circuit.last_failure_ms) > CIRCUIT_BREAKER_WINDOW_MS {
            circuit.open = false;
            circuit.failures = 0;
            info!(primary = %self.primary.url(), "Circuit breaker half-open, retrying primary");
            return false;
        }
        true
    }

    pub fn failover_count(&self) -> u64 {
        self.total_failovers.load(Ordering::Relaxed)
    }

    /// Currently active RPC URL.
    pub fn active_url(&self) -> &str {
        if self.is_circuit_open() {
            self.fallback.url()
        } else {
            self.primary.url()
        }
    }
}

fn now_ms() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as u64
}
