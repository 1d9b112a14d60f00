//! WorkflowOrchestrator.
//!
//! The WorkflowOrchestrator is responsible for:
//! - Walking one channel-and-payment run from wallet funding to payment
//!   result as a straight sequence of awaits
//! - Turning engine events, drained from the [`EventAggregator`], into the
//!   next step or a typed failure
//! - Publishing the current step on a `watch` channel for observers
//!
//! Steps never retry. The first failure ends the run with `Failed`.
//!
//! The engine only learns about confirmations through block notifications,
//! so a [`ChainTipPoller`](crate::chain::ChainTipPoller) feeding the engine
//! must be running for the usable-channel wait to finish;
//! [`launch`](super::launch::launch) starts both together.

use super::wallet_funding::{FundingError, FundingReport, WalletFunder};
use crate::chain::{BackendError, ChainBackend};
use crate::config::WorkflowConfig;
use crate::engine::{
    ApiError, ChannelDetails, ChannelEngine, ConnectError, InvoiceParseError, PaymentError,
    PeerConnector,
};
use crate::events::{
    ChannelId, ClosureReason, Event, EventAggregator, EventKind, PaymentHash, PaymentId,
};
use chanflow_sdk::objects::{NodeId, Txid};
use std::collections::VecDeque;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{Instrument, debug, error, info, info_span, warn};
use uuid::Uuid;

// ---------------------------------------------------------------------------
// Public data types
// ---------------------------------------------------------------------------

/// Where a run currently is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WorkflowState {
    Idle,
    FundingPrechecks,
    PeerConnecting,
    ChannelOpening,
    AwaitingFundingEvent,
    BroadcastingFunding,
    AwaitingConfirmations,
    AwaitingUsableChannel,
    PayingInvoice,
    AwaitingPaymentResult,
    Done,
    Failed,
}

impl WorkflowState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, WorkflowState::Done | WorkflowState::Failed)
    }
}

impl fmt::Display for WorkflowState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            WorkflowState::Idle => "idle",
            WorkflowState::FundingPrechecks => "funding_prechecks",
            WorkflowState::PeerConnecting => "peer_connecting",
            WorkflowState::ChannelOpening => "channel_opening",
            WorkflowState::AwaitingFundingEvent => "awaiting_funding_event",
            WorkflowState::BroadcastingFunding => "broadcasting_funding",
            WorkflowState::AwaitingConfirmations => "awaiting_confirmations",
            WorkflowState::AwaitingUsableChannel => "awaiting_usable_channel",
            WorkflowState::PayingInvoice => "paying_invoice",
            WorkflowState::AwaitingPaymentResult => "awaiting_payment_result",
            WorkflowState::Done => "done",
            WorkflowState::Failed => "failed",
        };
        f.write_str(name)
    }
}

/// Why a run failed.
#[derive(Debug, Error)]
pub enum WorkflowError {
    #[error("wallet funding failed: {0}")]
    Funding(#[from] FundingError),

    #[error("chain backend error: {0}")]
    Backend(#[from] BackendError),

    #[error("peer connection failed: {0}")]
    Connect(#[from] ConnectError),

    #[error("channel engine error: {0}")]
    Api(#[from] ApiError),

    #[error("channel {channel_id} closed: {reason}")]
    ChannelClosed {
        channel_id: ChannelId,
        reason: ClosureReason,
    },

    #[error("expected {expected} event, got {actual}")]
    UnexpectedEvent {
        expected: EventKind,
        actual: EventKind,
    },

    #[error("funding requested for channel {actual}, opened {requested}")]
    FundingForOtherChannel {
        requested: ChannelId,
        actual: ChannelId,
    },

    #[error("payment path unsuccessful: got {actual}")]
    PaymentPathUnsuccessful { actual: EventKind },

    #[error("funding output script {script} could not be decoded: {source}")]
    InvalidOutputScript {
        script: String,
        #[source]
        source: BackendError,
    },

    #[error("funding output script {script} has no address")]
    OutputScriptMissingAddresses { script: String },

    #[error("invoice decode error: {0}")]
    InvoiceDecode(#[from] InvoiceParseError),

    #[error("payment error: {0}")]
    Payment(#[from] PaymentError),

    #[error("timed out after {after:?} waiting for {waiting_for}")]
    Timeout {
        waiting_for: &'static str,
        after: Duration,
    },

    #[error("workflow aborted")]
    Aborted,
}

/// Everything a successful run produced.
#[derive(Debug, Clone)]
pub struct WorkflowReport {
    pub run_id: Uuid,
    pub funding: FundingReport,
    pub channel_id: ChannelId,
    pub funding_txid: Txid,
    pub channel: ChannelDetails,
    pub payment_id: PaymentId,
    pub payment_hash: PaymentHash,
    pub fee_paid_msat: Option<u64>,
    pub connected_peers: Vec<NodeId>,
}

// ---------------------------------------------------------------------------
// WorkflowOrchestrator
// ---------------------------------------------------------------------------

pub struct WorkflowOrchestrator<E: ChannelEngine> {
    backend: Arc<dyn ChainBackend>,
    engine: Arc<E>,
    connector: Arc<dyn PeerConnector>,
    events: EventAggregator<Event>,
    config: WorkflowConfig,
    /// Events drained beyond what a wait asked for, oldest first.
    carry: VecDeque<Event>,
    state_tx: watch::Sender<WorkflowState>,
    run_id: Uuid,
}

impl<E: ChannelEngine> WorkflowOrchestrator<E> {
    /// `events` must be the aggregator the engine hands its events to.
    pub fn new(
        backend: Arc<dyn ChainBackend>,
        engine: Arc<E>,
        connector: Arc<dyn PeerConnector>,
        events: EventAggregator<Event>,
        config: WorkflowConfig,
    ) -> Self {
        let (state_tx, _) = watch::channel(WorkflowState::Idle);
        Self {
            backend,
            engine,
            connector,
            events,
            config,
            carry: VecDeque::new(),
            state_tx,
            run_id: Uuid::new_v4(),
        }
    }

    pub fn run_id(&self) -> Uuid {
        self.run_id
    }

    pub fn state(&self) -> WorkflowState {
        *self.state_tx.borrow()
    }

    pub fn subscribe(&self) -> watch::Receiver<WorkflowState> {
        self.state_tx.subscribe()
    }

    fn enter(&self, state: WorkflowState) {
        info!(state = %state, "Workflow step");
        self.state_tx.send_replace(state);
    }

    // -- Event waits --------------------------------------------------------

    /// Wait until at least `n` events are at hand without consuming any.
    async fn await_events(&mut self, n: usize) {
        while self.carry.len() < n {
            let drained = self.events.await_at_least(n - self.carry.len()).await;
            self.carry.extend(drained);
        }
    }

    /// Take the oldest event, waiting for one if none is at hand.
    async fn take_event(&mut self) -> Event {
        loop {
            if let Some(event) = self.carry.pop_front() {
                if !self.carry.is_empty() {
                    debug!(kept = self.carry.len(), "Keeping extra events for the next wait");
                }
                return event;
            }
            self.await_events(1).await;
        }
    }

    async fn await_usable_channel(&self) -> Result<ChannelDetails, WorkflowError> {
        let interval = self.config.usable_channel_poll_interval;
        let poll = async {
            loop {
                if let Some(channel) = self.engine.list_usable_channels().into_iter().next() {
                    return channel;
                }
                tokio::time::sleep(interval).await;
            }
        };

        match self.config.confirmation_deadline {
            Some(deadline) => tokio::time::timeout(deadline, poll).await.map_err(|_| {
                WorkflowError::Timeout {
                    waiting_for: "usable channel",
                    after: deadline,
                }
            }),
            None => Ok(poll.await),
        }
    }

    // -- The run ------------------------------------------------------------

    /// Run every step in order. Ends in `Done` or `Failed`.
    pub async fn run(mut self) -> Result<WorkflowReport, WorkflowError> {
        let span = info_span!("workflow", run_id = %self.run_id);
        let result = self.execute().instrument(span).await;

        match &result {
            Ok(report) => {
                info!(
                    run_id = %self.run_id,
                    channel_id = %report.channel_id,
                    payment_hash = %report.payment_hash,
                    "Workflow complete"
                );
                self.enter(WorkflowState::Done);
            }
            Err(e) => {
                error!(run_id = %self.run_id, state = %self.state(), error = %e, "Workflow failed");
                self.enter(WorkflowState::Failed);
            }
        }
        result
    }

    async fn execute(&mut self) -> Result<WorkflowReport, WorkflowError> {
        // 1. Wallet and funds.
        self.enter(WorkflowState::FundingPrechecks);
        let funder = WalletFunder::new(Arc::clone(&self.backend), self.config.funding.clone());
        let funding = funder.ensure_spare_funds().await?;

        // 2. Counterparty.
        self.enter(WorkflowState::PeerConnecting);
        let peer = self.config.peer.clone();
        self.connector.connect(&peer).await?;
        tokio::time::sleep(self.config.peer_settle_delay).await;
        let peers = self.connector.connected_peers();
        info!(count = peers.len(), peers = ?peers, "Connected peers");

        // 3. Channel open.
        self.enter(WorkflowState::ChannelOpening);
        let user_channel_id = self.run_id.as_u128();
        let requested =
            self.engine
                .create_channel(&peer.node_id, &self.config.channel, user_channel_id)?;
        info!(channel_id = %requested, peer = %peer, value_sats = self.config.channel.value_sats, "Channel open initiated");

        // 4. Funding event.
        self.enter(WorkflowState::AwaitingFundingEvent);
        let (channel_id, counterparty, value_sats, output_script) = match self.take_event().await {
            Event::FundingGenerationReady {
                temporary_channel_id,
                counterparty_node_id,
                channel_value_satoshis,
                output_script,
                ..
            } => (
                temporary_channel_id,
                counterparty_node_id,
                channel_value_satoshis,
                output_script,
            ),
            Event::ChannelClosed {
                channel_id, reason, ..
            } => return Err(WorkflowError::ChannelClosed { channel_id, reason }),
            other => {
                return Err(WorkflowError::UnexpectedEvent {
                    expected: EventKind::FundingGenerationReady,
                    actual: other.kind(),
                });
            }
        };
        if channel_id != requested {
            return Err(WorkflowError::FundingForOtherChannel {
                requested,
                actual: channel_id,
            });
        }
        if value_sats != self.config.channel.value_sats {
            warn!(
                requested = self.config.channel.value_sats,
                engine = value_sats,
                "Engine asks for a different channel value, funding what it asks"
            );
        }

        // 5. Fund and hand over.
        self.enter(WorkflowState::BroadcastingFunding);
        let script = hex::encode(&output_script);
        let decoded = self
            .backend
            .decode_script(&output_script)
            .await
            .map_err(|source| WorkflowError::InvalidOutputScript {
                script: script.clone(),
                source,
            })?;
        let address = decoded
            .addresses()
            .into_iter()
            .next()
            .ok_or(WorkflowError::OutputScriptMissingAddresses { script })?;
        let funding_txid = self.backend.send_to_address(&address, value_sats).await?;
        let transaction = self.backend.raw_transaction(&funding_txid).await?;
        self.engine
            .funding_transaction_generated(&channel_id, &counterparty, transaction)?;
        info!(txid = %funding_txid, address = %address, value_sats, "Funding transaction handed to engine");

        // 6. Confirmations.
        self.enter(WorkflowState::AwaitingConfirmations);
        let disposable = funder.disposable_address().await?;
        self.backend
            .mine_blocks(self.config.confirmations, &disposable)
            .await?;

        // 7. Usable channel.
        self.enter(WorkflowState::AwaitingUsableChannel);
        let channel = self.await_usable_channel().await?;
        info!(
            channel_id = %channel.channel_id,
            short_channel_id = ?channel.short_channel_id,
            outbound_capacity_msat = channel.outbound_capacity_msat,
            "Channel usable"
        );

        // 8. Payment.
        self.enter(WorkflowState::PayingInvoice);
        let invoice = self.engine.parse_invoice(&self.config.invoice)?;
        let payment_id = self.engine.pay_invoice(&invoice)?;
        info!(payment_id = %payment_id, "Payment sent to engine");

        // 9. Payment result: sent, then the path that carried it.
        self.enter(WorkflowState::AwaitingPaymentResult);
        self.await_events(2).await;
        let (payment_hash, fee_paid_msat) = match self.take_event().await {
            Event::PaymentSent {
                payment_hash,
                fee_paid_msat,
                ..
            } => (payment_hash, fee_paid_msat),
            other => {
                return Err(WorkflowError::UnexpectedEvent {
                    expected: EventKind::PaymentSent,
                    actual: other.kind(),
                });
            }
        };
        match self.take_event().await {
            Event::PaymentPathSuccessful { path, .. } => {
                info!(payment_hash = %payment_hash, hops = path.len(), fee_paid_msat = ?fee_paid_msat, "Payment path successful");
            }
            other => {
                return Err(WorkflowError::PaymentPathUnsuccessful {
                    actual: other.kind(),
                });
            }
        }

        // 10. Observation.
        info!(period = ?self.config.observation_period, "Observing before teardown");
        tokio::time::sleep(self.config.observation_period).await;
        let connected_peers = self.connector.connected_peers();
        info!(count = connected_peers.len(), peers = ?connected_peers, "Connected peers at teardown");

        Ok(WorkflowReport {
            run_id: self.run_id,
            funding,
            channel_id,
            funding_txid,
            channel,
            payment_id,
            payment_hash,
            fee_paid_msat,
            connected_peers,
        })
    }
}

impl<E: ChannelEngine + 'static> WorkflowOrchestrator<E> {
    /// Run on a background task.
    pub fn spawn(self) -> WorkflowTask {
        let run_id = self.run_id;
        let state_rx = self.subscribe();
        let task = tokio::spawn(self.run());
        WorkflowTask {
            run_id,
            state_rx,
            task,
        }
    }
}

/// Handle onto a spawned run.
pub struct WorkflowTask {
    run_id: Uuid,
    state_rx: watch::Receiver<WorkflowState>,
    task: JoinHandle<Result<WorkflowReport, WorkflowError>>,
}

impl WorkflowTask {
    pub fn run_id(&self) -> Uuid {
        self.run_id
    }

    /// Latest published step. A cancelled run keeps its last step.
    pub fn state(&self) -> WorkflowState {
        *self.state_rx.borrow()
    }

    pub fn subscribe(&self) -> watch::Receiver<WorkflowState> {
        self.state_rx.clone()
    }

    /// Abort the run at its current await point.
    pub fn cancel(&self) {
        info!(run_id = %self.run_id, "Cancelling workflow");
        self.task.abort();
    }

    pub async fn join(self) -> Result<WorkflowReport, WorkflowError> {
        match self.task.await {
            Ok(result) => result,
            Err(e) => {
                if !e.is_cancelled() {
                    error!(run_id = %self.run_id, error = %e, "Workflow task panicked");
                }
                Err(WorkflowError::Aborted)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::FundingConfig;
    use crate::events::RouteHop;
    use crate::testing::{
        DISPOSABLE_ADDRESS, FUNDING_ADDRESS, FUNDING_SCRIPT, ScriptedBackend, ScriptedConnector, ScriptedEngine,
        node,
    };
    use chanflow_sdk::objects::{PeerAddress, SATS_PER_BTC};

    const INVOICE: &str = "lnbcrt1500n1pexample";

    struct Fixture {
        backend: Arc<ScriptedBackend>,
        engine: Arc<ScriptedEngine>,
        connector: Arc<ScriptedConnector>,
        events: EventAggregator<Event>,
        config: WorkflowConfig,
    }

    impl Fixture {
        fn new() -> Self {
            let events = EventAggregator::new();
            let backend = Arc::new(ScriptedBackend::with_chain(&[0]));
            let wallet = FundingConfig::default().wallet_name;
            backend.set_wallets(&[&wallet], &[&wallet]);
            backend.set_balance(10 * SATS_PER_BTC);
            Self {
                backend,
                engine: Arc::new(ScriptedEngine::new(events.clone())),
                connector: Arc::new(ScriptedConnector::new()),
                events,
                config: WorkflowConfig::new(PeerAddress::new(node(9), "127.0.0.1", 9735), INVOICE),
            }
        }

        fn orchestrator(&self) -> WorkflowOrchestrator<ScriptedEngine> {
            WorkflowOrchestrator::new(
                self.backend.clone(),
                self.engine.clone(),
                self.connector.clone(),
                self.events.clone(),
                self.config.clone(),
            )
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_end_to_end_reaches_done() {
        let fixture = Fixture::new();
        let orchestrator = fixture.orchestrator();
        let state_rx = orchestrator.subscribe();
        let run_id = orchestrator.run_id();

        let report = orchestrator.run().await.unwrap();

        assert_eq!(*state_rx.borrow(), WorkflowState::Done);
        assert_eq!(report.run_id, run_id);
        assert_eq!(fixture.connector.attempts(), vec![node(9)]);
        assert_eq!(fixture.engine.created(), vec![(node(9), run_id.as_u128())]);
        assert_eq!(
            fixture.backend.sends(),
            vec![(FUNDING_ADDRESS.to_string(), 1_300_000)]
        );
        assert_eq!(
            fixture.engine.funding_transaction(),
            Some(ScriptedBackend::raw_transaction_for(&report.funding_txid))
        );
        assert!(fixture.backend.mined().contains(&(6, DISPOSABLE_ADDRESS.to_string())));
        assert_eq!(fixture.engine.payments(), 1);
        assert_eq!(report.fee_paid_msat, Some(1000));
        assert_eq!(report.connected_peers, vec![node(9)]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_channel_unavailable_stops_before_funding() {
        let fixture = Fixture::new();
        fixture.engine.fail_create(ApiError::ChannelUnavailable {
            err: "peer not connected".to_string(),
        });
        let orchestrator = fixture.orchestrator();
        let state_rx = orchestrator.subscribe();

        let err = orchestrator.run().await.unwrap_err();

        assert!(matches!(
            err,
            WorkflowError::Api(ApiError::ChannelUnavailable { .. })
        ));
        assert_eq!(*state_rx.borrow(), WorkflowState::Failed);
        assert!(fixture.engine.funding_transaction().is_none());
        assert!(fixture.backend.sends().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_channel_closed_reports_reason() {
        let fixture = Fixture::new();
        fixture
            .engine
            .close_on_create(ClosureReason::CounterpartyForceClosed {
                peer_msg: "no thanks".to_string(),
            });

        let err = fixture.orchestrator().run().await.unwrap_err();

        match err {
            WorkflowError::ChannelClosed { reason, .. } => assert_eq!(
                reason,
                ClosureReason::CounterpartyForceClosed {
                    peer_msg: "no thanks".to_string()
                }
            ),
            other => panic!("unexpected error: {other}"),
        }
        assert!(fixture.backend.sends().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_other_event_instead_of_funding_fails() {
        let fixture = Fixture::new();
        fixture.engine.raise_on_create(Event::PaymentSent {
            payment_id: None,
            payment_hash: PaymentHash([4; 32]),
            fee_paid_msat: None,
        });
        let orchestrator = fixture.orchestrator();
        let state_rx = orchestrator.subscribe();

        let err = orchestrator.run().await.unwrap_err();

        assert!(matches!(
            err,
            WorkflowError::UnexpectedEvent {
                expected: EventKind::FundingGenerationReady,
                actual: EventKind::PaymentSent,
            }
        ));
        assert_eq!(*state_rx.borrow(), WorkflowState::Failed);
        assert!(fixture.backend.sends().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_funding_event_for_other_channel_is_not_funded() {
        let fixture = Fixture::new();
        fixture.engine.raise_on_create(Event::FundingGenerationReady {
            temporary_channel_id: ChannelId([7; 32]),
            counterparty_node_id: node(9),
            channel_value_satoshis: 1_300_000,
            output_script: FUNDING_SCRIPT.to_vec(),
            user_channel_id: 0,
        });

        let err = fixture.orchestrator().run().await.unwrap_err();

        match err {
            WorkflowError::FundingForOtherChannel { actual, .. } => {
                assert_eq!(actual, ChannelId([7; 32]))
            }
            other => panic!("unexpected error: {other}"),
        }
        assert!(fixture.backend.sends().is_empty());
        assert!(fixture.engine.funding_transaction().is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_wrong_payment_event_order_fails() {
        let fixture = Fixture::new();
        fixture.engine.set_payment_events(vec![
            Event::PaymentPathSuccessful {
                payment_id: PaymentId([3; 32]),
                payment_hash: None,
                path: vec![],
            },
            Event::PaymentSent {
                payment_id: None,
                payment_hash: PaymentHash([4; 32]),
                fee_paid_msat: None,
            },
        ]);

        let err = fixture.orchestrator().run().await.unwrap_err();

        assert!(matches!(
            err,
            WorkflowError::UnexpectedEvent {
                expected: EventKind::PaymentSent,
                actual: EventKind::PaymentPathSuccessful,
            }
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn test_failed_path_after_sent_is_unsuccessful() {
        let fixture = Fixture::new();
        fixture.engine.set_payment_events(vec![
            Event::PaymentSent {
                payment_id: Some(PaymentId([3; 32])),
                payment_hash: PaymentHash([4; 32]),
                fee_paid_msat: Some(10),
            },
            Event::PaymentFailed {
                payment_id: PaymentId([3; 32]),
                payment_hash: Some(PaymentHash([4; 32])),
            },
        ]);

        let err = fixture.orchestrator().run().await.unwrap_err();

        assert!(matches!(
            err,
            WorkflowError::PaymentPathUnsuccessful {
                actual: EventKind::PaymentFailed
            }
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn test_invoice_decode_error_before_paying() {
        let mut fixture = Fixture::new();
        fixture.config.invoice = "not-an-invoice".to_string();

        let err = fixture.orchestrator().run().await.unwrap_err();

        assert!(matches!(err, WorkflowError::InvoiceDecode(_)));
        assert_eq!(fixture.engine.payments(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_usable_channel_deadline() {
        let mut fixture = Fixture::new();
        fixture.engine.never_usable();
        fixture.config.confirmation_deadline = Some(Duration::from_secs(30));

        let err = fixture.orchestrator().run().await.unwrap_err();

        assert!(matches!(
            err,
            WorkflowError::Timeout {
                waiting_for: "usable channel",
                ..
            }
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancelled_run_is_aborted() {
        let fixture = Fixture::new();
        fixture.engine.never_usable();
        let task = fixture.orchestrator().spawn();

        let mut state_rx = task.subscribe();
        state_rx
            .wait_for(|state| *state == WorkflowState::AwaitingUsableChannel)
            .await
            .unwrap();
        task.cancel();

        assert!(matches!(task.join().await, Err(WorkflowError::Aborted)));
    }

    #[tokio::test(start_paused = true)]
    async fn test_peer_connection_failure_aborts_run() {
        let fixture = Fixture::new();
        fixture.connector.fail_for(node(9));

        let err = fixture.orchestrator().run().await.unwrap_err();

        assert!(matches!(err, WorkflowError::Connect(_)));
        assert!(fixture.engine.created().is_empty());
    }

    #[tokio::test]
    async fn test_extra_events_kept_for_next_wait() {
        let fixture = Fixture::new();
        let mut orchestrator = fixture.orchestrator();
        fixture.events.add_events(vec![
            Event::Other {
                kind: "first".to_string(),
            },
            Event::Other {
                kind: "second".to_string(),
            },
        ]);

        assert_eq!(
            orchestrator.take_event().await.kind(),
            EventKind::Other("first".to_string())
        );
        assert!(fixture.events.is_empty());
        assert_eq!(
            orchestrator.take_event().await.kind(),
            EventKind::Other("second".to_string())
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_multi_hop_payment_reported() {
        let fixture = Fixture::new();
        fixture.engine.set_payment_events(vec![
            Event::PaymentSent {
                payment_id: Some(PaymentId([3; 32])),
                payment_hash: PaymentHash([4; 32]),
                fee_paid_msat: Some(2000),
            },
            Event::PaymentPathSuccessful {
                payment_id: PaymentId([3; 32]),
                payment_hash: Some(PaymentHash([4; 32])),
                path: vec![
                    RouteHop {
                        node_id: node(9),
                        short_channel_id: 1,
                        fee_msat: 2000,
                    },
                    RouteHop {
                        node_id: node(8),
                        short_channel_id: 2,
                        fee_msat: 150_000,
                    },
                ],
            },
        ]);

        let report = fixture.orchestrator().run().await.unwrap();
        assert_eq!(report.payment_hash, PaymentHash([4; 32]));
        assert_eq!(report.fee_paid_msat, Some(2000));
    }
}
