//! Mint console session.
//!
//! One session per service: the connected wallet account, the latest
//! contract reads, and the background poller that refreshes them. Reads
//! update only their own field and only on success, so a failed read leaves
//! the previous state in place.

use crate::config::Config;
use crate::contract::CryptoDevsContract;
use crate::metrics::METRICS;
use crate::rpc::RpcClient;
use crate::wallet::WalletBridge;
use cryptodevs_types::{ConsoleFlags, ContractCall, MintKind, Phase};
use serde::Serialize;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex, RwLock};
use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

pub const MINT_SUCCESS_NOTICE: &str = "You successfully minted a CryptoDev!";

/// Last-known contract state plus session details.
#[derive(Debug, Clone, Default)]
struct ConsoleState {
    wallet_connected: bool,
    presale_started: bool,
    presale_ended: bool,
    is_owner: bool,
    minted: String,
    account: Option<String>,
    network_warning: Option<String>,
    notice: Option<String>,
}

/// Snapshot rendered by the page and `/state`.
#[derive(Debug, Clone, Serialize)]
pub struct ConsoleView {
    pub phase: Phase,
    #[serde(flatten)]
    pub flags: ConsoleFlags,
    pub minted: String,
    pub max_supply: u64,
    pub account: Option<String>,
    pub network_warning: Option<String>,
    pub notice: Option<String>,
}

/// Session tunables taken from [`Config`].
#[derive(Debug, Clone)]
pub struct SessionSettings {
    pub chain_id: u64,
    pub network_name: String,
    pub mint_price_wei: u128,
    pub max_supply: u64,
    pub poll_interval: Duration,
    pub receipt_poll_interval: Duration,
    pub receipt_timeout: Duration,
}

impl SessionSettings {
    pub fn from_config(config: &Config) -> Result<Self, crate::Error> {
        Ok(Self {
            chain_id: config.chain_id,
            network_name: config.network_name.clone(),
            mint_price_wei: config.mint_price_wei()?,
            max_supply: config.max_supply,
            poll_interval: config.poll_interval(),
            receipt_poll_interval: config.receipt_poll_interval(),
            receipt_timeout: config.receipt_timeout(),
        })
    }
}

/// RAII marker for an in-flight operation. The console shows "Loading..."
/// while any marker is alive.
struct LoadingGuard<'a>(&'a AtomicU32);

impl<'a> LoadingGuard<'a> {
    fn new(counter: &'a AtomicU32) -> Self {
        counter.fetch_add(1, Ordering::Relaxed);
        Self(counter)
    }
}

impl Drop for LoadingGuard<'_> {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::Relaxed);
    }
}

pub struct Session {
    contract: CryptoDevsContract,
    wallet: WalletBridge,
    settings: SessionSettings,
    state: RwLock<ConsoleState>,
    in_flight: AtomicU32,
    /// Token of the running poller, if any.
    poller: Mutex<Option<CancellationToken>>,
    /// Parent of every poller token; cancelled on shutdown.
    shutdown: CancellationToken,
}

impl Session {
    pub fn new(
        contract: CryptoDevsContract,
        wallet: WalletBridge,
        settings: SessionSettings,
    ) -> Self {
        Self {
            contract,
            wallet,
            settings,
            state: RwLock::new(ConsoleState::default()),
            in_flight: AtomicU32::new(0),
            poller: Mutex::new(None),
            shutdown: CancellationToken::new(),
        }
    }

    pub fn from_config(config: &Config, provider: Arc<RpcClient>) -> Result<Self, crate::Error> {
        let contract = CryptoDevsContract::new(&config.contract_address, provider);
        let wallet = WalletBridge::new(&config.wallet_url, config.rpc_timeout())?;
        Ok(Self::new(contract, wallet, SessionSettings::from_config(config)?))
    }

    // --- State accessors ---

    fn read_state(&self) -> std::sync::RwLockReadGuard<'_, ConsoleState> {
        self.state.read().unwrap_or_else(|e| e.into_inner())
    }

    fn write_state(&self) -> std::sync::RwLockWriteGuard<'_, ConsoleState> {
        self.state.write().unwrap_or_else(|e| e.into_inner())
    }

    fn begin_loading(&self) -> LoadingGuard<'_> {
        LoadingGuard::new(&self.in_flight)
    }

    pub fn in_flight(&self) -> u32 {
        self.in_flight.load(Ordering::Relaxed)
    }

    pub fn contract_address(&self) -> &str {
        self.contract.address()
    }

    pub fn account(&self) -> Option<String> {
        self.read_state().account.clone()
    }

    pub fn is_connected(&self) -> bool {
        self.read_state().wallet_connected
    }

    pub fn poll_interval(&self) -> Duration {
        self.settings.poll_interval
    }

    pub fn view(&self) -> ConsoleView {
        let state = self.read_state();
        let flags = ConsoleFlags {
            wallet_connected: state.wallet_connected,
            presale_started: state.presale_started,
            presale_ended: state.presale_ended,
            is_owner: state.is_owner,
            loading: self.in_flight() > 0,
        };
        ConsoleView {
            phase: Phase::select(&flags),
            flags,
            minted: state.minted.clone(),
            max_supply: self.settings.max_supply,
            account: state.account.clone(),
            network_warning: state.network_warning.clone(),
            notice: state.notice.clone(),
        }
    }

    // --- Wallet ---

    /// Open the wallet session, refresh everything once, then start polling.
    /// A new connect replaces the previous poller.
    pub async fn connect(self: &Arc<Self>) -> Result<(), crate::Error> {
        let account = self.wallet.request_account().await?;
        self.check_network().await;
        {
            let mut state = self.write_state();
            state.wallet_connected = true;
            state.account = Some(account.clone());
        }
        info!(account = %account, "Wallet connected");

        self.refresh(true).await;
        self.start_poller();
        Ok(())
    }

    /// Compare the bridge's chain with the expected one. A mismatch only
    /// sets the warning; a failed lookup keeps the previous warning.
    async fn check_network(&self) {
        let chain_id = match self.wallet.chain_id().await {
            Ok(id) => id,
            Err(e) => {
                warn!(error = %e, "Could not read wallet chain id");
                return;
            }
        };
        let warning = (chain_id != self.settings.chain_id).then(|| {
            warn!(
                expected = self.settings.chain_id,
                actual = chain_id,
                "Wallet is on the wrong network"
            );
            format!("Please switch to {}", self.settings.network_name)
        });
        self.write_state().network_warning = warning;
    }

    fn signing_account(&self) -> Result<String, crate::Error> {
        self.read_state()
            .account
            .clone()
            .ok_or_else(|| crate::Error::Wallet("wallet not connected".into()))
    }

    // --- Reads ---

    pub async fn poll_minted_count(&self) -> Result<u64, crate::Error> {
        let _loading = self.begin_loading();
        let minted = self.contract.token_ids().await?;
        self.write_state().minted = minted.to_string();
        Ok(minted)
    }

    pub async fn poll_presale_started(&self) -> Result<bool, crate::Error> {
        let _loading = self.begin_loading();
        let started = self.contract.presale_started().await?;
        self.write_state().presale_started = started;
        Ok(started)
    }

    /// Ended iff the contract's end timestamp is before the current second.
    pub async fn poll_presale_ended(&self) -> Result<bool, crate::Error> {
        let _loading = self.begin_loading();
        let end = self.contract.presale_ended().await?;
        let ended = end < now_secs();
        self.write_state().presale_ended = ended;
        Ok(ended)
    }

    pub async fn poll_owner(&self) -> Result<bool, crate::Error> {
        let account = self.signing_account()?;
        let owner = self.contract.owner().await?;
        let is_owner = owner.eq_ignore_ascii_case(&account);
        self.write_state().is_owner = is_owner;
        Ok(is_owner)
    }

    /// One refresh pass. Every read is independent; failures are logged and
    /// leave the previous value.
    pub async fn refresh(&self, include_owner: bool) {
        if include_owner {
            if let Err(e) = self.poll_owner().await {
                error!(error = %e, "Owner check failed");
            }
        }
        match self.poll_presale_started().await {
            Ok(true) => {
                if let Err(e) = self.poll_presale_ended().await {
                    error!(error = %e, "Presale end check failed");
                }
            }
            Ok(false) => {}
            Err(e) => error!(error = %e, "Presale start check failed"),
        }
        if let Err(e) = self.poll_minted_count().await {
            error!(error = %e, "Minted count check failed");
        }
    }

    // --- Poller ---

    fn start_poller(self: &Arc<Self>) {
        let token = self.shutdown.child_token();
        let previous = self
            .poller
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .replace(token.clone());
        if let Some(previous) = previous {
            previous.cancel();
            debug!("Replaced previous poller");
        }

        let session = Arc::clone(self);
        tokio::spawn(async move {
            session.run_poller(token).await;
        });
    }

    async fn run_poller(&self, cancel: CancellationToken) {
        let mut ticker = tokio::time::interval(self.settings.poll_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        // First tick fires immediately; connect already refreshed.
        ticker.tick().await;

        info!(every_secs = self.settings.poll_interval.as_secs(), "Poller started");
        loop {
            tokio::select! {
                _ = cancel.cancelled() => break,
                _ = ticker.tick() => self.refresh(false).await,
            }
        }
        debug!("Poller stopped");
    }

    /// Stop the poller. Further connects start nothing.
    pub fn shutdown(&self) {
        self.shutdown.cancel();
    }

    // --- Transactions ---

    /// Send a payable mint and wait for one confirmation. Returns the hash.
    pub async fn mint(&self, kind: MintKind) -> Result<String, crate::Error> {
        let _loading = self.begin_loading();
        let hash = self.transact(kind.call()).await?;
        self.write_state().notice = Some(MINT_SUCCESS_NOTICE.to_string());
        info!(tx_hash = %hash, kind = %kind, "Mint confirmed");
        Ok(hash)
    }

    /// Owner-only. The contract enforces ownership; on confirmation the
    /// presale is marked started without waiting for the next poll.
    pub async fn start_presale(&self) -> Result<String, crate::Error> {
        let _loading = self.begin_loading();
        let hash = self.transact(ContractCall::StartPresale).await?;
        self.write_state().presale_started = true;
        info!(tx_hash = %hash, "Presale started");
        Ok(hash)
    }

    /// Payable calls carry the mint price.
    async fn transact(&self, call: ContractCall) -> Result<String, crate::Error> {
        let account = self.signing_account()?;
        self.check_network().await;
        let value_wei = call.is_payable().then_some(self.settings.mint_price_wei);

        let start = Instant::now();
        METRICS.tx_total.fetch_add(1, Ordering::Relaxed);
        let result = async {
            let hash = self
                .contract
                .send(&self.wallet, &account, call, value_wei)
                .await?;
            debug!(tx_hash = %hash, method = call.signature(), "Transaction sent");
            let receipt = self
                .contract
                .wait_for_receipt(
                    &hash,
                    self.settings.receipt_poll_interval,
                    self.settings.receipt_timeout,
                )
                .await?;
            debug!(
                tx_hash = %hash,
                block = receipt.block_number.as_deref().unwrap_or("unknown"),
                "Transaction confirmed"
            );
            Ok::<_, crate::Error>(hash)
        }
        .await;
        METRICS.record_tx_duration(start);

        match &result {
            Ok(_) => METRICS.tx_success.fetch_add(1, Ordering::Relaxed),
            Err(_) => METRICS.tx_error.fetch_add(1, Ordering::Relaxed),
        };
        result
    }
}

fn now_secs() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{spawn_stub, ChainStub, OWNER};

    async fn session_for(stub: &ChainStub, poll_interval: Duration) -> Arc<Session> {
        let url = spawn_stub(stub.clone()).await;
        let rpc = Arc::new(RpcClient::new(&url, &url, Duration::from_secs(2)).unwrap());
        let contract = CryptoDevsContract::new(&stub.contract(), rpc);
        let wallet = WalletBridge::new(&url, Duration::from_secs(2)).unwrap();
        let settings = SessionSettings {
            chain_id: 11_155_111,
            network_name: "sepolia".into(),
            mint_price_wei: 10_000_000_000_000_000,
            max_supply: 20,
            poll_interval,
            receipt_poll_interval: Duration::from_millis(10),
            receipt_timeout: Duration::from_secs(2),
        };
        Arc::new(Session::new(contract, wallet, settings))
    }

    #[tokio::test]
    async fn test_starts_disconnected() {
        let stub = ChainStub::default();
        let session = session_for(&stub, Duration::from_secs(60)).await;
        let view = session.view();
        assert_eq!(view.phase, Phase::Disconnected);
        assert_eq!(view.minted, "");
        assert_eq!(view.max_supply, 20);
    }

    #[tokio::test]
    async fn test_connect_refreshes_state() {
        let stub = ChainStub::default();
        stub.set_minted(4);
        let session = session_for(&stub, Duration::from_secs(60)).await;

        session.connect().await.unwrap();
        let view = session.view();
        assert_eq!(view.phase, Phase::PresaleNotStarted);
        assert_eq!(view.minted, "4");
        assert!(!view.flags.is_owner);
        assert!(view.network_warning.is_none());
        session.shutdown();
    }

    #[tokio::test]
    async fn test_owner_sees_setup() {
        let stub = ChainStub::default();
        stub.set_accounts(vec![OWNER.to_string()]);
        let session = session_for(&stub, Duration::from_secs(60)).await;

        session.connect().await.unwrap();
        assert_eq!(session.view().phase, Phase::OwnerSetup);
        session.shutdown();
    }

    #[tokio::test]
    async fn test_presale_active_and_ended() {
        let stub = ChainStub::default();
        stub.set_presale(true, now_secs() + 3_600);
        let session = session_for(&stub, Duration::from_secs(60)).await;
        session.connect().await.unwrap();
        assert_eq!(session.view().phase, Phase::PresaleActive);

        stub.set_presale(true, now_secs() - 1);
        assert!(session.poll_presale_ended().await.unwrap());
        assert_eq!(session.view().phase, Phase::PresaleEnded);
        session.shutdown();
    }

    #[tokio::test]
    async fn test_rejected_connect_leaves_state() {
        let stub = ChainStub::default();
        stub.reject_accounts(true);
        let session = session_for(&stub, Duration::from_secs(60)).await;

        assert!(session.connect().await.is_err());
        assert!(!session.is_connected());
        assert_eq!(session.view().phase, Phase::Disconnected);
    }

    #[tokio::test]
    async fn test_wrong_network_warns_but_connects() {
        let stub = ChainStub::default();
        stub.set_chain_id(1);
        let session = session_for(&stub, Duration::from_secs(60)).await;

        session.connect().await.unwrap();
        let view = session.view();
        assert!(view.flags.wallet_connected);
        assert_eq!(view.network_warning.as_deref(), Some("Please switch to sepolia"));
        session.shutdown();
    }

    #[tokio::test]
    async fn test_chain_id_failure_does_not_block() {
        let stub = ChainStub::default();
        stub.set_chain_id(1);
        let session = session_for(&stub, Duration::from_secs(60)).await;
        session.connect().await.unwrap();
        assert!(session.view().network_warning.is_some());

        stub.fail_chain_id(true);
        session.connect().await.unwrap();
        let view = session.view();
        assert!(view.flags.wallet_connected);
        assert_eq!(view.network_warning.as_deref(), Some("Please switch to sepolia"));

        session.mint(MintKind::Public).await.unwrap();
        assert_eq!(stub.sent().len(), 1);
        session.shutdown();
    }

    #[tokio::test]
    async fn test_connect_survives_chain_id_error() {
        let stub = ChainStub::default();
        stub.fail_chain_id(true);
        let session = session_for(&stub, Duration::from_secs(60)).await;

        session.connect().await.unwrap();
        let view = session.view();
        assert!(session.is_connected());
        assert!(view.network_warning.is_none());
        assert_eq!(view.phase, Phase::PresaleNotStarted);
        session.shutdown();
    }

    #[tokio::test]
    async fn test_failed_reads_leave_flags_unchanged() {
        let stub = ChainStub::default();
        stub.set_minted(9);
        stub.set_presale(true, now_secs() + 3_600);
        let session = session_for(&stub, Duration::from_secs(60)).await;
        session.connect().await.unwrap();
        let before = session.view();

        stub.fail_reads(true);
        stub.set_minted(10);
        assert!(session.poll_minted_count().await.is_err());
        assert!(session.poll_presale_started().await.is_err());
        assert!(session.poll_presale_ended().await.is_err());
        assert!(session.poll_owner().await.is_err());
        session.refresh(true).await;

        let after = session.view();
        assert_eq!(after.flags, before.flags);
        assert_eq!(after.minted, "9");
        assert_eq!(after.phase, Phase::PresaleActive);
        session.shutdown();
    }

    #[tokio::test]
    async fn test_poller_picks_up_changes() {
        let stub = ChainStub::default();
        let session = session_for(&stub, Duration::from_millis(20)).await;
        session.connect().await.unwrap();
        assert_eq!(session.view().minted, "0");

        stub.set_minted(5);
        stub.set_presale(true, now_secs() + 3_600);
        tokio::time::sleep(Duration::from_millis(200)).await;
        // Let any in-flight tick finish so the view is not mid-load.
        session.shutdown();
        tokio::time::sleep(Duration::from_millis(100)).await;

        let view = session.view();
        assert_eq!(view.minted, "5");
        assert_eq!(view.phase, Phase::PresaleActive);
    }

    #[tokio::test]
    async fn test_reconnect_replaces_poller() {
        let stub = ChainStub::default();
        let session = session_for(&stub, Duration::from_secs(60)).await;
        session.connect().await.unwrap();
        let first = session.poller.lock().unwrap().clone().unwrap();

        session.connect().await.unwrap();
        assert!(first.is_cancelled());
        let second = session.poller.lock().unwrap().clone().unwrap();
        assert!(!second.is_cancelled());

        session.shutdown();
        assert!(second.is_cancelled());
    }

    #[tokio::test]
    async fn test_mint_sets_notice_and_sends_price() {
        let stub = ChainStub::default();
        stub.set_presale(true, now_secs() + 3_600);
        let session = session_for(&stub, Duration::from_secs(60)).await;
        session.connect().await.unwrap();

        session.mint(MintKind::Presale).await.unwrap();
        assert_eq!(session.view().notice.as_deref(), Some(MINT_SUCCESS_NOTICE));
        assert_eq!(session.in_flight(), 0);

        let sent = stub.sent();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0]["data"], ContractCall::PresaleMint.calldata());
        assert_eq!(sent[0]["value"], "0x2386f26fc10000");
        session.shutdown();
    }

    #[tokio::test]
    async fn test_failed_mint_has_no_notice() {
        let stub = ChainStub::default();
        stub.revert_transactions(true);
        let session = session_for(&stub, Duration::from_secs(60)).await;
        session.connect().await.unwrap();

        assert!(session.mint(MintKind::Public).await.is_err());
        assert!(session.view().notice.is_none());
        assert_eq!(session.in_flight(), 0);
        session.shutdown();
    }

    #[tokio::test]
    async fn test_mint_requires_connection() {
        let stub = ChainStub::default();
        let session = session_for(&stub, Duration::from_secs(60)).await;
        assert!(matches!(
            session.mint(MintKind::Public).await,
            Err(crate::Error::Wallet(_))
        ));
        assert!(stub.sent().is_empty());
    }

    #[tokio::test]
    async fn test_start_presale_marks_started() {
        let stub = ChainStub::default();
        stub.set_accounts(vec![OWNER.to_string()]);
        let session = session_for(&stub, Duration::from_secs(60)).await;
        session.connect().await.unwrap();
        assert_eq!(session.view().phase, Phase::OwnerSetup);

        session.start_presale().await.unwrap();
        let view = session.view();
        assert!(view.flags.presale_started);
        assert_ne!(view.phase, Phase::OwnerSetup);
        let sent = stub.sent();
        assert!(sent[0].get("value").is_none());
        session.shutdown();
    }

    #[test]
    fn test_loading_guard_counts() {
        let counter = AtomicU32::new(0);
        {
            let _a = LoadingGuard::new(&counter);
            let _b = LoadingGuard::new(&counter);
            assert_eq!(counter.load(Ordering::Relaxed), 2);
        }
        assert_eq!(counter.load(Ordering::Relaxed), 0);
    }
}
