//! In-process JSON-RPC node + wallet bridge for tests.

use axum::extract::State;
use axum::routing::post;
use axum::{Json, Router};
use cryptodevs_types::ContractCall;
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

pub(crate) const OWNER: &str = "0x00000000000000000000000000000000000000aa";
pub(crate) const USER: &str = "0x00000000000000000000000000000000000000bb";
const CONTRACT: &str = "0x00000000000000000000000000000000000000cc";

struct StubState {
    chain_id: u64,
    accounts: Vec<String>,
    owner: String,
    minted: u64,
    presale_started: bool,
    presale_end: u64,
    fail_reads: bool,
    fail_chain_id: bool,
    reject_accounts: bool,
    revert_transactions: bool,
    sent: Vec<Value>,
    receipts: HashMap<String, Value>,
}

/// Shared, mutable fake chain. Clones observe the same state.
#[derive(Clone)]
pub(crate) struct ChainStub {
    inner: Arc<Mutex<StubState>>,
}

impl Default for ChainStub {
    fn default() -> Self {
        Self {
            inner: Arc::new(Mutex::new(StubState {
                chain_id: 11_155_111,
                accounts: vec![USER.to_string()],
                owner: OWNER.to_string(),
                minted: 0,
                presale_started: false,
                presale_end: 0,
                fail_reads: false,
                fail_chain_id: false,
                reject_accounts: false,
                revert_transactions: false,
                sent: Vec::new(),
                receipts: HashMap::new(),
            })),
        }
    }
}

impl ChainStub {
    fn with<R>(&self, f: impl FnOnce(&mut StubState) -> R) -> R {
        f(&mut self.inner.lock().unwrap())
    }

    pub(crate) fn contract(&self) -> String {
        CONTRACT.to_string()
    }

    pub(crate) fn set_chain_id(&self, chain_id: u64) {
        self.with(|s| s.chain_id = chain_id);
    }

    pub(crate) fn set_accounts(&self, accounts: Vec<String>) {
        self.with(|s| s.accounts = accounts);
    }

    pub(crate) fn set_minted(&self, minted: u64) {
        self.with(|s| s.minted = minted);
    }

    pub(crate) fn set_presale(&self, started: bool, end: u64) {
        self.with(|s| {
            s.presale_started = started;
            s.presale_end = end;
        });
    }

    pub(crate) fn fail_reads(&self, fail: bool) {
        self.with(|s| s.fail_reads = fail);
    }

    pub(crate) fn fail_chain_id(&self, fail: bool) {
        self.with(|s| s.fail_chain_id = fail);
    }

    pub(crate) fn reject_accounts(&self, reject: bool) {
        self.with(|s| s.reject_accounts = reject);
    }

    pub(crate) fn revert_transactions(&self, revert: bool) {
        self.with(|s| s.revert_transactions = revert);
    }

    /// Transactions received via `eth_sendTransaction`, in order.
    pub(crate) fn sent(&self) -> Vec<Value> {
        self.with(|s| s.sent.clone())
    }
}

fn word(value: u64) -> String {
    format!("0x{value:064x}")
}

fn address_word(address: &str) -> String {
    format!("0x{:0>64}", address.trim_start_matches("0x"))
}

fn rpc_error(id: &Value, code: i64, message: &str) -> Json<Value> {
    Json(json!({"jsonrpc": "2.0", "id": id, "error": {"code": code, "message": message}}))
}

async fn handle(State(stub): State<ChainStub>, Json(req): Json<Value>) -> Json<Value> {
    let id = req["id"].clone();
    let method = req["method"].as_str().unwrap_or_default().to_string();
    let params = req["params"].clone();
    let mut state = stub.inner.lock().unwrap();

    let result = match method.as_str() {
        "eth_chainId" => {
            if state.fail_chain_id {
                return rpc_error(&id, -32603, "internal error");
            }
            json!(format!("0x{:x}", state.chain_id))
        }
        "eth_blockNumber" => json!("0x10"),
        "eth_requestAccounts" | "eth_accounts" => {
            if state.reject_accounts {
                return rpc_error(&id, 4001, "User rejected the request.");
            }
            json!(state.accounts)
        }
        "eth_call" => {
            if state.fail_reads {
                return rpc_error(&id, -32000, "execution reverted");
            }
            let data = params[0]["data"].as_str().unwrap_or_default();
            let call = [
                ContractCall::TokenIds,
                ContractCall::PresaleStarted,
                ContractCall::PresaleEnded,
                ContractCall::Owner,
            ]
            .into_iter()
            .find(|c| c.calldata() == data);
            match call {
                Some(ContractCall::TokenIds) => json!(word(state.minted)),
                Some(ContractCall::PresaleStarted) => json!(word(u64::from(state.presale_started))),
                Some(ContractCall::PresaleEnded) => json!(word(state.presale_end)),
                Some(ContractCall::Owner) => json!(address_word(&state.owner)),
                _ => return rpc_error(&id, -32000, "unknown selector"),
            }
        }
        "eth_sendTransaction" => {
            let tx = params[0].clone();
            state.sent.push(tx.clone());
            let hash = word(state.sent.len() as u64);
            let reverted = state.revert_transactions;
            if !reverted {
                let data = tx["data"].as_str().unwrap_or_default();
                if data == ContractCall::StartPresale.calldata() {
                    state.presale_started = true;
                } else if data == ContractCall::Mint.calldata()
                    || data == ContractCall::PresaleMint.calldata()
                {
                    state.minted += 1;
                }
            }
            let status = if reverted { "0x0" } else { "0x1" };
            state.receipts.insert(
                hash.clone(),
                json!({"transactionHash": hash, "blockNumber": "0x11", "status": status}),
            );
            json!(hash)
        }
        "eth_getTransactionReceipt" => {
            let hash = params[0].as_str().unwrap_or_default();
            state.receipts.get(hash).cloned().unwrap_or(Value::Null)
        }
        _ => return rpc_error(&id, -32601, "method not found"),
    };

    Json(json!({"jsonrpc": "2.0", "id": id, "result": result}))
}

/// Serve `stub` on an ephemeral port. Returns its base URL.
pub(crate) async fn spawn_stub(stub: ChainStub) -> String {
    let app = Router::new().route("/", post(handle)).with_state(stub);
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{addr}")
}
