use async_trait::async_trait;
use header::{Header, MessageAcceptance, Subscriber, Subscription, SubscriptionError, Verifier};
use libp2p_identity::PeerId;
use parking_lot::RwLock;
use tokio::sync::broadcast::{self, error::RecvError};
use tracing::{debug, info, warn};

use crate::topic::HeaderTopic;

/// Headers buffered per subscription before slow readers start lagging.
pub const SUBSCRIPTION_BUFFER: usize = 256;

/// In-process gossip topic for headers.
///
/// Every received message runs through header validation and the
/// registered topic verifier. Only accepted headers reach subscriptions.
pub struct GossipSubscriber<H: Header> {
    topic: HeaderTopic,
    verifier: RwLock<Option<Verifier<H>>>,
    sender: broadcast::Sender<H>,
}

impl<H: Header> GossipSubscriber<H> {
    pub fn new(topic: HeaderTopic) -> Self {
        let (sender, _) = broadcast::channel(SUBSCRIPTION_BUFFER);
        Self {
            topic,
            verifier: RwLock::new(None),
            sender,
        }
    }

    pub fn topic(&self) -> &HeaderTopic {
        &self.topic
    }

    /// Handles a header received from `source`.
    ///
    /// Returns the acceptance decision that the transport reports back to
    /// gossip, which decides whether the message is propagated further.
    pub async fn deliver(&self, source: PeerId, header: H) -> MessageAcceptance {
        debug!(
            topic = %self.topic,
            peer = %source,
            height = header.height(),
            "Received message"
        );

        if let Err(err) = header.validate() {
            warn!(peer = %source, height = header.height(), %err, "Rejecting invalid header");
            return MessageAcceptance::Reject;
        }

        let verifier = self.verifier.read().clone();
        let acceptance = match verifier {
            Some(verifier) => verifier(header.clone()).await,
            None => MessageAcceptance::Accept,
        };

        if matches!(acceptance, MessageAcceptance::Accept) {
            // Fails only when nobody is subscribed
            let _ = self.sender.send(header);
        }

        acceptance
    }
}

impl<H: Header> Subscriber<H> for GossipSubscriber<H> {
    fn subscribe(&self) -> Result<Box<dyn Subscription<H>>, SubscriptionError> {
        Ok(Box::new(GossipSubscription {
            receiver: Some(self.sender.subscribe()),
        }))
    }

    fn set_verifier(&self, verifier: Verifier<H>) -> Result<(), SubscriptionError> {
        *self.verifier.write() = Some(verifier);
        Ok(())
    }
}

/// Subscription yielding accepted headers one at a time.
pub struct GossipSubscription<H: Header> {
    receiver: Option<broadcast::Receiver<H>>,
}

#[async_trait]
impl<H: Header> Subscription<H> for GossipSubscription<H> {
    async fn next_header(&mut self) -> Result<H, SubscriptionError> {
        loop {
            let receiver = self.receiver.as_mut().ok_or(SubscriptionError::Closed)?;
            match receiver.recv().await {
                Ok(header) => {
                    info!(height = header.height(), hash = %header.hash(), "Received new header");
                    return Ok(header);
                }
                Err(RecvError::Lagged(skipped)) => {
                    warn!(skipped, "Subscription lagged behind, skipping headers");
                }
                Err(RecvError::Closed) => {
                    self.receiver = None;
                    return Err(SubscriptionError::Closed);
                }
            }
        }
    }

    fn cancel(&mut self) {
        self.receiver = None;
    }
}
