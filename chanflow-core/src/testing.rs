//! Scripted collaborators for unit tests.

use crate::chain::{BackendError, BlockListener, ChainBackend, ListenerError};
use crate::config::ChannelParameters;
use crate::engine::{
    ApiError, ChannelDetails, ChannelEngine, ConnectError, InvoiceParseError, PaymentError,
    PeerConnector,
};
use crate::events::{
    ChannelId, ClosureReason, Event, EventAggregator, PaymentHash, PaymentId, RouteHop,
};
use async_trait::async_trait;
use chanflow_sdk::objects::rpc::{DecodedScript, SegwitScript};
use chanflow_sdk::objects::{BlockHash, ChainTip, NodeId, PeerAddress, SATS_PER_BTC, Txid};
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};

pub(crate) const DISPOSABLE_ADDRESS: &str = "bcrt1qdisposable";
pub(crate) const FUNDING_ADDRESS: &str = "bcrt1qfunding";
pub(crate) const FUNDING_SCRIPT: [u8; 4] = [0x00, 0x20, 0xab, 0xcd];

/// Block hash whose every byte is `n`.
pub(crate) fn hash(n: u8) -> BlockHash {
    BlockHash::from_bytes([n; 32])
}

/// Compressed node id tagged with `n`.
pub(crate) fn node(n: u8) -> NodeId {
    let mut bytes = [n; 33];
    bytes[0] = 0x02;
    NodeId::from_bytes(bytes).unwrap()
}

// ---------------------------------------------------------------------------
// ScriptedBackend
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum WalletCall {
    Create(String),
    Load(String),
    Unload(String),
}

struct BackendState {
    chain: Vec<BlockHash>,
    /// Every block ever on a scripted chain, stale ones included.
    parents: HashMap<BlockHash, BlockHash>,
    failures_left: u32,
    available: Vec<String>,
    loaded: Vec<String>,
    balance: u64,
    addresses_issued: u32,
    scripts: HashMap<Vec<u8>, DecodedScript>,
    wallet_calls: Vec<WalletCall>,
    sends: Vec<(String, u64)>,
    broadcasts: Vec<Vec<u8>>,
    mined: Vec<(u32, String)>,
}

/// In-memory chain and wallet. Blocks are their own hash bytes.
pub(crate) struct ScriptedBackend {
    state: Mutex<BackendState>,
}

impl ScriptedBackend {
    /// Chain whose block at height `i` is `hash(blocks[i])`.
    pub(crate) fn with_chain(blocks: &[u8]) -> Self {
        let mut scripts = HashMap::new();
        scripts.insert(
            vec![0, 1, 0],
            DecodedScript {
                script_type: "nonstandard".to_string(),
                segwit: Some(SegwitScript {
                    address: Some(DISPOSABLE_ADDRESS.to_string()),
                    legacy_addresses: vec![],
                }),
                ..DecodedScript::default()
            },
        );
        scripts.insert(
            FUNDING_SCRIPT.to_vec(),
            DecodedScript {
                script_type: "witness_v0_scripthash".to_string(),
                address: Some(FUNDING_ADDRESS.to_string()),
                ..DecodedScript::default()
            },
        );

        let chain: Vec<BlockHash> = blocks.iter().map(|n| hash(*n)).collect();
        let mut parents = HashMap::new();
        record_parents(&mut parents, &chain);

        Self {
            state: Mutex::new(BackendState {
                chain,
                parents,
                failures_left: 0,
                available: vec![],
                loaded: vec![],
                balance: 0,
                addresses_issued: 0,
                scripts,
                wallet_calls: vec![],
                sends: vec![],
                broadcasts: vec![],
                mined: vec![],
            }),
        }
    }

    pub(crate) fn set_chain(&self, blocks: &[u8]) {
        let mut state = self.state.lock().unwrap();
        state.chain = blocks.iter().map(|n| hash(*n)).collect();
        let BackendState { chain, parents, .. } = &mut *state;
        record_parents(parents, chain);
    }

    /// Make the next `n` backend calls fail.
    pub(crate) fn fail_next_calls(&self, n: u32) {
        self.state.lock().unwrap().failures_left = n;
    }

    pub(crate) fn set_wallets<S: AsRef<str>>(&self, available: &[S], loaded: &[S]) {
        let mut state = self.state.lock().unwrap();
        state.available = available.iter().map(|w| w.as_ref().to_string()).collect();
        state.loaded = loaded.iter().map(|w| w.as_ref().to_string()).collect();
    }

    pub(crate) fn set_balance(&self, sats: u64) {
        self.state.lock().unwrap().balance = sats;
    }

    pub(crate) fn wallet_calls(&self) -> Vec<WalletCall> {
        self.state.lock().unwrap().wallet_calls.clone()
    }

    pub(crate) fn sends(&self) -> Vec<(String, u64)> {
        self.state.lock().unwrap().sends.clone()
    }

    pub(crate) fn broadcasts(&self) -> Vec<Vec<u8>> {
        self.state.lock().unwrap().broadcasts.clone()
    }

    pub(crate) fn mined(&self) -> Vec<(u32, String)> {
        self.state.lock().unwrap().mined.clone()
    }

    /// What `raw_transaction` returns for `txid`.
    pub(crate) fn raw_transaction_for(txid: &Txid) -> Vec<u8> {
        format!("raw-{txid}").into_bytes()
    }

    fn checked(&self) -> Result<std::sync::MutexGuard<'_, BackendState>, BackendError> {
        let mut state = self.state.lock().unwrap();
        if state.failures_left > 0 {
            state.failures_left -= 1;
            return Err(BackendError::Rpc {
                code: -28,
                message: "scripted failure".to_string(),
            });
        }
        Ok(state)
    }
}

fn record_parents(parents: &mut HashMap<BlockHash, BlockHash>, chain: &[BlockHash]) {
    for pair in chain.windows(2) {
        parents.insert(pair[1], pair[0]);
    }
}

#[async_trait]
impl ChainBackend for ScriptedBackend {
    async fn chain_tip(&self) -> Result<ChainTip, BackendError> {
        let state = self.checked()?;
        let hash = *state
            .chain
            .last()
            .ok_or_else(|| BackendError::Parse("empty chain".to_string()))?;
        Ok(ChainTip::new(state.chain.len() as u32 - 1, hash))
    }

    async fn block_hash(&self, height: u32) -> Result<BlockHash, BackendError> {
        self.checked()?
            .chain
            .get(height as usize)
            .copied()
            .ok_or(BackendError::Rpc {
                code: -8,
                message: "Block height out of range".to_string(),
            })
    }

    async fn block(&self, hash: &BlockHash) -> Result<Vec<u8>, BackendError> {
        self.checked()?;
        Ok(hash.as_bytes().to_vec())
    }

    async fn block_header(&self, hash: &BlockHash) -> Result<Vec<u8>, BackendError> {
        self.checked()?;
        Ok(hash.as_bytes().to_vec())
    }

    async fn previous_block_hash(
        &self,
        hash: &BlockHash,
    ) -> Result<Option<BlockHash>, BackendError> {
        Ok(self.checked()?.parents.get(hash).copied())
    }

    async fn decode_script(&self, script: &[u8]) -> Result<DecodedScript, BackendError> {
        Ok(self
            .checked()?
            .scripts
            .get(script)
            .cloned()
            .unwrap_or_default())
    }

    async fn send_to_address(
        &self,
        address: &str,
        amount_sats: u64,
    ) -> Result<Txid, BackendError> {
        let mut state = self.checked()?;
        state.sends.push((address.to_string(), amount_sats));
        state.balance = state.balance.saturating_sub(amount_sats);
        Ok(Txid::from_bytes([0xf0; 32]))
    }

    async fn raw_transaction(&self, txid: &Txid) -> Result<Vec<u8>, BackendError> {
        self.checked()?;
        Ok(Self::raw_transaction_for(txid))
    }

    async fn broadcast_transaction(&self, transaction: &[u8]) -> Result<Txid, BackendError> {
        self.checked()?.broadcasts.push(transaction.to_vec());
        Ok(Txid::from_bytes([0xb0; 32]))
    }

    async fn mine_blocks(
        &self,
        count: u32,
        address: &str,
    ) -> Result<Vec<BlockHash>, BackendError> {
        let mut state = self.checked()?;
        let mut mined = Vec::with_capacity(count as usize);
        for _ in 0..count {
            let mut bytes = [0xee; 32];
            bytes[..4].copy_from_slice(&(state.chain.len() as u32).to_be_bytes());
            let hash = BlockHash::from_bytes(bytes);
            if let Some(parent) = state.chain.last().copied() {
                state.parents.insert(hash, parent);
            }
            state.chain.push(hash);
            mined.push(hash);
        }
        if address.starts_with("bcrt1qwallet") {
            state.balance += 50 * SATS_PER_BTC * u64::from(count);
        }
        state.mined.push((count, address.to_string()));
        Ok(mined)
    }

    async fn new_address(&self) -> Result<String, BackendError> {
        let mut state = self.checked()?;
        state.addresses_issued += 1;
        Ok(format!("bcrt1qwallet{}", state.addresses_issued))
    }

    async fn list_available_wallets(&self) -> Result<Vec<String>, BackendError> {
        Ok(self.checked()?.available.clone())
    }

    async fn list_loaded_wallets(&self) -> Result<Vec<String>, BackendError> {
        Ok(self.checked()?.loaded.clone())
    }

    async fn create_wallet(&self, name: &str) -> Result<(), BackendError> {
        let mut state = self.checked()?;
        state.available.push(name.to_string());
        state.loaded.push(name.to_string());
        state.wallet_calls.push(WalletCall::Create(name.to_string()));
        Ok(())
    }

    async fn load_wallet(&self, name: &str) -> Result<(), BackendError> {
        let mut state = self.checked()?;
        state.loaded.push(name.to_string());
        state.wallet_calls.push(WalletCall::Load(name.to_string()));
        Ok(())
    }

    async fn unload_wallet(&self, name: &str) -> Result<(), BackendError> {
        let mut state = self.checked()?;
        state.loaded.retain(|w| w != name);
        state.wallet_calls.push(WalletCall::Unload(name.to_string()));
        Ok(())
    }

    async fn wallet_balance(&self) -> Result<u64, BackendError> {
        Ok(self.checked()?.balance)
    }
}

// ---------------------------------------------------------------------------
// ScriptedEngine
// ---------------------------------------------------------------------------

const TEMPORARY_CHANNEL_ID: ChannelId = ChannelId([1; 32]);

#[derive(Default)]
struct EngineState {
    create_error: Option<ApiError>,
    closure: Option<ClosureReason>,
    raised_on_create: Option<Event>,
    payment_events: Option<Vec<Event>>,
    never_usable: bool,
    /// Blocks that must connect after funding before the channel is usable.
    required_confirmations: usize,
    funded_at_block: usize,
    created: Vec<(NodeId, u128)>,
    funded: Option<(NodeId, Vec<u8>)>,
    payments: usize,
    blocks: Vec<u32>,
}

/// Channel engine that answers every call from a script and raises its
/// events into the aggregator it was given.
pub(crate) struct ScriptedEngine {
    events: EventAggregator<Event>,
    state: Mutex<EngineState>,
}

impl ScriptedEngine {
    pub(crate) fn new(events: EventAggregator<Event>) -> Self {
        Self {
            events,
            state: Mutex::new(EngineState::default()),
        }
    }

    pub(crate) fn fail_create(&self, error: ApiError) {
        self.state.lock().unwrap().create_error = Some(error);
    }

    /// Raise `ChannelClosed` instead of `FundingGenerationReady`.
    pub(crate) fn close_on_create(&self, reason: ClosureReason) {
        self.state.lock().unwrap().closure = Some(reason);
    }

    /// Raise `event` in answer to `create_channel`, whatever it is.
    pub(crate) fn raise_on_create(&self, event: Event) {
        self.state.lock().unwrap().raised_on_create = Some(event);
    }

    pub(crate) fn set_payment_events(&self, events: Vec<Event>) {
        self.state.lock().unwrap().payment_events = Some(events);
    }

    pub(crate) fn never_usable(&self) {
        self.state.lock().unwrap().never_usable = true;
    }

    /// Only report the channel usable once `n` blocks connected after funding.
    pub(crate) fn require_confirmations(&self, n: usize) {
        self.state.lock().unwrap().required_confirmations = n;
    }

    pub(crate) fn blocks_seen(&self) -> usize {
        self.state.lock().unwrap().blocks.len()
    }

    pub(crate) fn created(&self) -> Vec<(NodeId, u128)> {
        self.state.lock().unwrap().created.clone()
    }

    pub(crate) fn funding_transaction(&self) -> Option<Vec<u8>> {
        self.state
            .lock()
            .unwrap()
            .funded
            .as_ref()
            .map(|(_, tx)| tx.clone())
    }

    pub(crate) fn payments(&self) -> usize {
        self.state.lock().unwrap().payments
    }

    fn default_payment_events() -> Vec<Event> {
        vec![
            Event::PaymentSent {
                payment_id: Some(PaymentId([3; 32])),
                payment_hash: PaymentHash([4; 32]),
                fee_paid_msat: Some(1000),
            },
            Event::PaymentPathSuccessful {
                payment_id: PaymentId([3; 32]),
                payment_hash: Some(PaymentHash([4; 32])),
                path: vec![RouteHop {
                    node_id: node(9),
                    short_channel_id: 1,
                    fee_msat: 1000,
                }],
            },
        ]
    }
}

impl BlockListener for ScriptedEngine {
    fn name(&self) -> &str {
        "scripted-engine"
    }

    fn block_connected(&self, _block: &[u8], height: u32) -> Result<(), ListenerError> {
        self.state.lock().unwrap().blocks.push(height);
        Ok(())
    }

    fn block_disconnected(&self, _header: &[u8], height: u32) -> Result<(), ListenerError> {
        self.state.lock().unwrap().blocks.retain(|h| *h != height);
        Ok(())
    }
}

impl ChannelEngine for ScriptedEngine {
    type Invoice = String;

    fn create_channel(
        &self,
        counterparty: &NodeId,
        parameters: &ChannelParameters,
        user_channel_id: u128,
    ) -> Result<ChannelId, ApiError> {
        let (raised, closure) = {
            let mut state = self.state.lock().unwrap();
            if let Some(error) = state.create_error.clone() {
                return Err(error);
            }
            state.created.push((*counterparty, user_channel_id));
            (state.raised_on_create.clone(), state.closure.clone())
        };

        let event = match (raised, closure) {
            (Some(event), _) => event,
            (None, Some(reason)) => Event::ChannelClosed {
                channel_id: TEMPORARY_CHANNEL_ID,
                user_channel_id,
                reason,
            },
            (None, None) => Event::FundingGenerationReady {
                temporary_channel_id: TEMPORARY_CHANNEL_ID,
                counterparty_node_id: *counterparty,
                channel_value_satoshis: parameters.value_sats,
                output_script: FUNDING_SCRIPT.to_vec(),
                user_channel_id,
            },
        };
        self.events.add_event(event);
        Ok(TEMPORARY_CHANNEL_ID)
    }

    fn funding_transaction_generated(
        &self,
        temporary_channel_id: &ChannelId,
        counterparty: &NodeId,
        transaction: Vec<u8>,
    ) -> Result<(), ApiError> {
        if *temporary_channel_id != TEMPORARY_CHANNEL_ID {
            return Err(ApiError::ApiMisuse {
                err: format!("unknown channel {temporary_channel_id}"),
            });
        }
        let mut state = self.state.lock().unwrap();
        state.funded_at_block = state.blocks.len();
        state.funded = Some((*counterparty, transaction));
        Ok(())
    }

    fn list_usable_channels(&self) -> Vec<ChannelDetails> {
        let state = self.state.lock().unwrap();
        match &state.funded {
            Some((counterparty, _))
                if !state.never_usable
                    && state.blocks.len().saturating_sub(state.funded_at_block)
                        >= state.required_confirmations =>
            {
                vec![ChannelDetails {
                    channel_id: ChannelId([2; 32]),
                    counterparty: *counterparty,
                    short_channel_id: Some(1),
                    channel_value_satoshis: 1_300_000,
                    outbound_capacity_msat: 1_299_000_000,
                    is_usable: true,
                }]
            }
            _ => vec![],
        }
    }

    fn parse_invoice(&self, invoice: &str) -> Result<String, InvoiceParseError> {
        if invoice.starts_with("lnbcrt") {
            Ok(invoice.to_string())
        } else {
            Err(InvoiceParseError(format!("bad prefix in {invoice}")))
        }
    }

    fn pay_invoice(&self, _invoice: &String) -> Result<PaymentId, PaymentError> {
        let events = {
            let mut state = self.state.lock().unwrap();
            state.payments += 1;
            state
                .payment_events
                .clone()
                .unwrap_or_else(Self::default_payment_events)
        };
        self.events.add_events(events);
        Ok(PaymentId([3; 32]))
    }
}

// ---------------------------------------------------------------------------
// ScriptedConnector
// ---------------------------------------------------------------------------

#[derive(Default)]
pub(crate) struct ScriptedConnector {
    failing: Mutex<HashSet<NodeId>>,
    attempts: Mutex<Vec<NodeId>>,
    connected: Mutex<Vec<NodeId>>,
}

impl ScriptedConnector {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn fail_for(&self, node_id: NodeId) {
        self.failing.lock().unwrap().insert(node_id);
    }

    pub(crate) fn attempts(&self) -> Vec<NodeId> {
        self.attempts.lock().unwrap().clone()
    }
}

#[async_trait]
impl PeerConnector for ScriptedConnector {
    async fn connect(&self, peer: &PeerAddress) -> Result<(), ConnectError> {
        self.attempts.lock().unwrap().push(peer.node_id);
        if self.failing.lock().unwrap().contains(&peer.node_id) {
            return Err(ConnectError::Io {
                addr: peer.socket_addr(),
                source: std::io::Error::from(std::io::ErrorKind::ConnectionRefused),
            });
        }
        let mut connected = self.connected.lock().unwrap();
        if !connected.contains(&peer.node_id) {
            connected.push(peer.node_id);
        }
        Ok(())
    }

    fn connected_peers(&self) -> Vec<NodeId> {
        self.connected.lock().unwrap().clone()
    }
}

// ---------------------------------------------------------------------------
// RecordingListener
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Notification {
    Connected(u32, Vec<u8>),
    Disconnected(u32, Vec<u8>),
}

/// Block listener that remembers what it was told.
pub(crate) struct RecordingListener {
    name: String,
    journal: Option<Arc<Mutex<Vec<String>>>>,
    seen: Mutex<Vec<Notification>>,
    fail: bool,
}

impl RecordingListener {
    pub(crate) fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            journal: None,
            seen: Mutex::new(vec![]),
            fail: false,
        }
    }

    /// Also write `"<name> connect <height>"` lines into a shared journal.
    pub(crate) fn shared(name: &str, journal: Arc<Mutex<Vec<String>>>) -> Self {
        Self {
            journal: Some(journal),
            ..Self::new(name)
        }
    }

    /// Record notifications but report failure for each of them.
    pub(crate) fn failing(mut self) -> Self {
        self.fail = true;
        self
    }

    pub(crate) fn notifications(&self) -> Vec<Notification> {
        self.seen.lock().unwrap().clone()
    }

    pub(crate) fn clear(&self) {
        self.seen.lock().unwrap().clear();
    }

    fn record(&self, notification: Notification, kind: &str, height: u32) -> Result<(), ListenerError> {
        self.seen.lock().unwrap().push(notification);
        if let Some(journal) = &self.journal {
            journal
                .lock()
                .unwrap()
                .push(format!("{} {kind} {height}", self.name));
        }
        if self.fail {
            return Err(ListenerError::new(format!(
                "{} refused {kind} {height}",
                self.name
            )));
        }
        Ok(())
    }
}

impl BlockListener for RecordingListener {
    fn name(&self) -> &str {
        &self.name
    }

    fn block_connected(&self, block: &[u8], height: u32) -> Result<(), ListenerError> {
        self.record(Notification::Connected(height, block.to_vec()), "connect", height)
    }

    fn block_disconnected(&self, header: &[u8], height: u32) -> Result<(), ListenerError> {
        self.record(
            Notification::Disconnected(height, header.to_vec()),
            "disconnect",
            height,
        )
    }
}
