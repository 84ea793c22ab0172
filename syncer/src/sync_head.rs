/// Subjective and objective head handling.
///
/// The subjective head is the store head. The objective head is the highest
/// header learned from the network, through gossip or a Head request, and
/// becomes the sync target. Gossip delivers the same header from many peers
/// concurrently; only the first delivery of a height is accepted.
use std::sync::atomic::Ordering;

use header::{
    age, verify, Exchange, HeadOption, Header, MessageAcceptance, Store, Subscriber, VerifyError,
};
use tokio::time::timeout;
use tracing::{debug, info, trace, warn};

use crate::config::HEAD_REQUEST_TIMEOUT;
use crate::error::SyncError;
use crate::states::SyncState;
use crate::syncer::Syncer;

impl<H, E, S, Sub> Syncer<H, E, S, Sub>
where
    H: Header,
    E: Exchange<H> + 'static,
    S: Store<H> + 'static,
    Sub: Subscriber<H> + 'static,
{
    /// Best known head of the chain.
    ///
    /// A recent subjective head is returned as is. Otherwise the network
    /// head is requested, without subjective initialisation while the
    /// subjective head is within the trusting period, and fed through the
    /// same acceptance path as gossip. Falls back to the subjective head when
    /// the exchange fails.
    pub async fn head(&self) -> Result<H, SyncError> {
        let sbj = self.store.head().await?;
        let sbj_age = age(&sbj);
        if sbj_age <= self.params.recency_threshold() {
            trace!(height = sbj.height(), "Subjective head is recent");
            return Ok(sbj);
        }

        let expired = sbj_age > self.params.trusting_period;
        let mut options = Vec::new();
        if expired {
            warn!(
                height = sbj.height(),
                age = ?sbj_age,
                "Subjective head is outside the trusting period, requesting head from trusted peers"
            );
        } else {
            options.push(HeadOption::DisableSubjectiveInit);
        }

        let net = match timeout(HEAD_REQUEST_TIMEOUT, self.exchange.head(&options)).await {
            Ok(Ok(net)) => net,
            Ok(Err(err)) => {
                warn!(%err, "Failed to request network head");
                return Ok(sbj);
            }
            Err(_) => {
                warn!(timeout = ?HEAD_REQUEST_TIMEOUT, "Network head request timed out");
                return Ok(sbj);
            }
        };

        if net.height() > sbj.height() {
            let acceptance = self.accept(net, expired).await;
            if matches!(acceptance, MessageAcceptance::Reject) {
                warn!(height = sbj.height(), "Network head rejected, keeping subjective head");
            }
        }

        match self.sync_target() {
            Some(target) if target.height() > sbj.height() => Ok(target),
            _ => Ok(sbj),
        }
    }

    /// Gossip verifier for incoming headers.
    ///
    /// Rejects headers failing verification against the subjective head and
    /// ignores known heights. Of all concurrent deliveries of a new height,
    /// exactly one is accepted; the rest are ignored. Everything is ignored
    /// unless the syncer is running.
    pub async fn incoming_network_head(&self, header: H) -> MessageAcceptance {
        let state = self.state();
        if state != SyncState::Running {
            trace!(height = header.height(), ?state, "Ignoring header while not running");
            return MessageAcceptance::Ignore;
        }
        self.accept(header, false).await
    }

    /// `trusted` skips verification for heads obtained from trusted peers.
    async fn accept(&self, header: H, trusted: bool) -> MessageAcceptance {
        let height = header.height();
        let sbj = match self.store.head().await {
            Ok(sbj) => sbj,
            Err(err) => {
                debug!(height, %err, "Ignoring header without subjective head");
                return MessageAcceptance::Ignore;
            }
        };

        if height <= sbj.height() || self.claimed.load(Ordering::Acquire) >= height {
            trace!(height, "Ignoring known header");
            return MessageAcceptance::Ignore;
        }

        if !trusted {
            match verify(&sbj, &header) {
                Ok(()) => {}
                Err(err @ VerifyError::FromFuture { .. }) => {
                    debug!(height, %err, "Ignoring header from the future");
                    return MessageAcceptance::Ignore;
                }
                Err(err) => {
                    warn!(height, trusted = sbj.height(), %err, "Rejecting invalid header");
                    return MessageAcceptance::Reject;
                }
            }
        }

        if !self.claim(height) {
            trace!(height, "Lost acceptance race");
            return MessageAcceptance::Ignore;
        }

        info!(height, hash = %header.hash(), "Accepted new network head");
        self.pending.add(header.clone());
        self.set_sync_target(header);
        self.trigger.notify_one();
        MessageAcceptance::Accept
    }

    /// Claims `height` unless an equal or higher height was claimed already.
    fn claim(&self, height: u64) -> bool {
        let mut current = self.claimed.load(Ordering::Acquire);
        while current < height {
            match self.claimed.compare_exchange_weak(
                current,
                height,
                Ordering::AcqRel,
                Ordering::Acquire,
            ) {
                Ok(_) => return true,
                Err(actual) => current = actual,
            }
        }
        false
    }

    fn set_sync_target(&self, header: H) {
        let mut target = self.sync_target.write();
        if target
            .as_ref()
            .map_or(true, |target| header.height() > target.height())
        {
            *target = Some(header);
        }
    }
}
