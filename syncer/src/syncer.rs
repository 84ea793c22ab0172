/// Header syncer.
///
/// Owns the gossip cache and the sync target, and runs the catch-up loop
/// that moves the store head up to the target:
///
/// ```text
/// gossip ──► incoming_network_head ──► Ranges ──┐
///                   │                           ├──► catch-up ──► Store
///                   └──► sync target            │
/// exchange ◄────────────────────────────────────┘
/// ```
///
/// ## Lifecycle
///
/// `Stopped -> Running -> Stopping -> Stopped`. A syncer can be restarted
/// after a completed stop.
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use futures::FutureExt;
use header::{
    verify_range, Exchange, ExchangeError, Header, MessageAcceptance, Store, StoreError,
    Subscriber, Verifier, VerifyError,
};
use parking_lot::{Mutex, RwLock};
use tokio::sync::{watch, Notify};
use tokio::task::JoinHandle;
use tokio::time::{interval, sleep, timeout, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, info_span, warn, Instrument, Span};

use crate::config::{HEAD_REQUEST_TIMEOUT, MIN_SYNC_INTERVAL, RETRY_BACKOFF_MAX, RETRY_BACKOFF_MIN};
use crate::error::SyncError;
use crate::options::Parameters;
use crate::ranges::Ranges;
use crate::states::SyncState;

pub struct Syncer<H: Header, E, S, Sub> {
    pub(crate) exchange: Arc<E>,
    pub(crate) store: Arc<S>,
    subscriber: Arc<Sub>,
    pub(crate) params: Parameters,

    /// Accepted gossip headers waiting to be committed.
    pub(crate) pending: Ranges<H>,

    /// Highest height won in the acceptance race.
    pub(crate) claimed: AtomicU64,

    pub(crate) sync_target: RwLock<Option<H>>,

    /// Wakes the catch-up loop when a new target is accepted.
    pub(crate) trigger: Notify,

    /// Height of the committed head.
    committed: watch::Sender<u64>,

    state: Mutex<SyncState>,
    worker: Mutex<Option<(CancellationToken, JoinHandle<()>)>>,
    span: Span,
}

/// Snapshot of the syncer's progress.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SyncReport {
    pub state: SyncState,
    pub head_height: u64,
    pub target_height: u64,
    pub cached_ranges: usize,
}

/// Outcome of looking at the gossip cache for the next batch.
enum Cached<H> {
    /// Headers starting exactly at the next expected height.
    Headers(Vec<H>),
    /// Nothing cached until this height.
    Gap(u64),
    Missing,
}

impl<H, E, S, Sub> Syncer<H, E, S, Sub>
where
    H: Header,
    E: Exchange<H> + 'static,
    S: Store<H> + 'static,
    Sub: Subscriber<H> + 'static,
{
    pub fn new(
        exchange: Arc<E>,
        store: Arc<S>,
        subscriber: Arc<Sub>,
        params: Parameters,
    ) -> Result<Self, SyncError> {
        params.validate()?;
        let (committed, _) = watch::channel(0);

        Ok(Self {
            exchange,
            store,
            subscriber,
            params,
            pending: Ranges::new(),
            claimed: AtomicU64::new(0),
            sync_target: RwLock::new(None),
            trigger: Notify::new(),
            committed,
            state: Mutex::new(SyncState::default()),
            worker: Mutex::new(None),
            span: info_span!("syncer"),
        })
    }

    pub fn state(&self) -> SyncState {
        *self.state.lock()
    }

    pub fn params(&self) -> &Parameters {
        &self.params
    }

    /// Current sync target, if any header was accepted yet.
    pub fn sync_target(&self) -> Option<H> {
        self.sync_target.read().clone()
    }

    fn target_height(&self) -> u64 {
        self.sync_target
            .read()
            .as_ref()
            .map_or(0, |target| target.height())
    }

    pub fn report(&self) -> SyncReport {
        SyncReport {
            state: self.state(),
            head_height: *self.committed.borrow(),
            target_height: self.target_height(),
            cached_ranges: self.pending.len(),
        }
    }

    /// Resolves once the committed head reaches the current sync target.
    pub async fn wait_sync(&self) -> Result<(), SyncError> {
        let mut committed = self.committed.subscribe();
        loop {
            if *committed.borrow_and_update() >= self.target_height() {
                return Ok(());
            }
            committed
                .changed()
                .await
                .map_err(|_| SyncError::Cancelled)?;
        }
    }

    pub(crate) fn transition(&self, target: SyncState) -> Result<(), SyncError> {
        let mut state = self.state.lock();
        let from = *state;
        if !from.can_transition_to(target) {
            return Err(SyncError::InvalidTransition { from, to: target });
        }
        debug!(parent: &self.span, ?from, to = ?target, "State transition");
        *state = target;
        Ok(())
    }

    /// Starts syncing.
    ///
    /// Loads the subjective head (initialising an empty store from the
    /// network), registers the gossip verifier, resolves the first sync
    /// target and spawns the catch-up loop.
    pub async fn start(self: &Arc<Self>) -> Result<(), SyncError> {
        self.transition(SyncState::Running)?;

        if let Err(err) = self.prepare().instrument(self.span.clone()).await {
            warn!(parent: &self.span, %err, "Failed to start syncer");
            if let Err(rollback) = self.transition(SyncState::Stopped) {
                debug!(parent: &self.span, %rollback, "Syncer already stopped");
            }
            return Err(err);
        }

        // Held until the worker is stored so a concurrent stop waits for it
        let mut worker = self.worker.lock();
        let state = self.state();
        if state != SyncState::Running {
            warn!(parent: &self.span, ?state, "Syncer stopped while starting");
            return Err(SyncError::InvalidTransition {
                from: state,
                to: SyncState::Running,
            });
        }

        let token = CancellationToken::new();
        let syncer = Arc::clone(self);
        let handle = tokio::spawn(
            syncer
                .sync_loop(token.clone())
                .instrument(self.span.clone()),
        );
        *worker = Some((token, handle));
        drop(worker);

        info!(
            parent: &self.span,
            head = *self.committed.borrow(),
            target = self.target_height(),
            "Syncer started"
        );
        Ok(())
    }

    async fn prepare(self: &Arc<Self>) -> Result<(), SyncError> {
        let head = match self.store.head().await {
            Ok(head) => head,
            Err(StoreError::NoHead) => self.initialize().await?,
            Err(err) => return Err(err.into()),
        };
        self.set_committed(head.height());
        self.claimed.fetch_max(head.height(), Ordering::AcqRel);

        let syncer = Arc::downgrade(self);
        let span = self.span.clone();
        let verifier: Verifier<H> = Arc::new(move |header: H| {
            let syncer = syncer.clone();
            async move {
                match syncer.upgrade() {
                    Some(syncer) => syncer.incoming_network_head(header).await,
                    None => MessageAcceptance::Ignore,
                }
            }
            .instrument(span.clone())
            .boxed()
        });
        self.subscriber.set_verifier(verifier)?;

        let target = self.head().await?;
        debug!(height = target.height(), "Resolved initial sync target");
        Ok(())
    }

    /// Bootstraps an empty store from a head served by trusted peers.
    async fn initialize(&self) -> Result<H, SyncError> {
        info!("Store is empty, requesting trusted head");
        let head = timeout(HEAD_REQUEST_TIMEOUT, self.exchange.head(&[]))
            .await
            .map_err(|_| ExchangeError::Timeout)??;
        head.validate().map_err(VerifyError::from)?;

        self.store.init(head.clone()).await?;
        info!(height = head.height(), hash = %head.hash(), "Initialized store with trusted head");
        Ok(head)
    }

    /// Stops the catch-up loop and waits for it to exit.
    ///
    /// A batch already being appended to the store completes first.
    pub async fn stop(&self) -> Result<(), SyncError> {
        self.transition(SyncState::Stopping)?;

        let worker = self.worker.lock().take();
        if let Some((token, handle)) = worker {
            token.cancel();
            if let Err(err) = handle.await {
                warn!(parent: &self.span, %err, "Sync loop terminated abnormally");
            }
        }

        self.transition(SyncState::Stopped)?;
        info!(parent: &self.span, head = *self.committed.borrow(), "Syncer stopped");
        Ok(())
    }

    async fn sync_loop(self: Arc<Self>, token: CancellationToken) {
        let mut ticker = interval(self.params.block_time.max(MIN_SYNC_INTERVAL));
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            tokio::select! {
                _ = token.cancelled() => break,
                _ = ticker.tick() => {
                    tokio::select! {
                        _ = token.cancelled() => break,
                        result = self.head() => {
                            if let Err(err) = result {
                                warn!(%err, "Failed to refresh sync target");
                            }
                        }
                    }
                }
                _ = self.trigger.notified() => {}
            }

            self.sync(&token).await;
        }

        debug!("Sync loop exited");
    }

    /// Commits batches until the store head reaches the sync target.
    async fn sync(&self, token: &CancellationToken) {
        let mut backoff = RETRY_BACKOFF_MIN;

        while !token.is_cancelled() {
            let head = match self.store.head().await {
                Ok(head) => head,
                Err(err) => {
                    warn!(%err, "Failed to load store head");
                    return;
                }
            };
            self.set_committed(head.height());

            let Some(target) = self.sync_target() else {
                return;
            };
            if head.height() >= target.height() {
                debug!(height = head.height(), "Synced to target");
                return;
            }

            match self.sync_batch(&head, &target, token).await {
                Ok(height) => {
                    backoff = RETRY_BACKOFF_MIN;
                    self.set_committed(height);
                }
                Err(SyncError::Cancelled) => return,
                Err(err) => {
                    warn!(
                        %err,
                        from = head.height() + 1,
                        to = target.height(),
                        retry_in = ?backoff,
                        "Failed to sync headers"
                    );
                    tokio::select! {
                        _ = token.cancelled() => return,
                        _ = sleep(backoff) => {}
                    }
                    backoff = next_backoff(backoff);
                }
            }
        }
    }

    /// Commits the next batch on top of `head`, returning the new head height.
    async fn sync_batch(
        &self,
        head: &H,
        target: &H,
        token: &CancellationToken,
    ) -> Result<u64, SyncError> {
        let from = head.height() + 1;
        let to = target.height();
        self.pending.prune_below(from);

        let headers = match self.take_cached(from, to) {
            Cached::Headers(headers) => {
                if let Err(err) = verify_range(head, &headers) {
                    warn!(%err, from, count = headers.len(), "Dropping cached headers");
                    return Err(err.into());
                }
                debug!(from, count = headers.len(), "Committing cached headers");
                headers
            }
            Cached::Gap(next) => self.fetch(head, next - 1, token).await?,
            Cached::Missing => self.fetch(head, to, token).await?,
        };

        let count = headers.len() as u64;
        self.store.append(headers).await?;

        let height = head.height() + count;
        info!(from, to = height, target = to, "Committed headers");
        Ok(height)
    }

    fn take_cached(&self, from: u64, to: u64) -> Cached<H> {
        let Some(mut range) = self.pending.back_within(from, to + 1) else {
            return Cached::Missing;
        };

        if range.start() == from {
            let end = (to + 1).min(from + self.params.max_request_size);
            Cached::Headers(range.before(end))
        } else {
            Cached::Gap(range.start())
        }
    }

    /// Requests headers `head + 1 ..= to` from the exchange, at most one
    /// request's worth.
    async fn fetch(
        &self,
        head: &H,
        to: u64,
        token: &CancellationToken,
    ) -> Result<Vec<H>, SyncError> {
        let from = head.height() + 1;
        let amount = (to - from + 1).min(self.params.max_request_size);
        debug!(from, amount, "Requesting headers");

        let mut headers = tokio::select! {
            _ = token.cancelled() => return Err(SyncError::Cancelled),
            result = self.exchange.get_verified_range(head, amount) => result?,
        };
        if headers.is_empty() {
            return Err(SyncError::EmptyResponse { from });
        }

        headers.truncate(amount as usize);
        verify_range(head, &headers)?;
        Ok(headers)
    }

    fn set_committed(&self, height: u64) {
        self.committed.send_if_modified(|committed| {
            if *committed == height {
                return false;
            }
            *committed = height;
            true
        });
    }
}

fn next_backoff(backoff: Duration) -> Duration {
    (backoff * 2).min(RETRY_BACKOFF_MAX)
}
