use std::sync::Arc;

use async_trait::async_trait;
use header::{verify_range, Exchange, ExchangeError, Hash, HeadOption, Header, Store};
use tracing::trace;

/// Maximum headers served by a single range request.
pub const MAX_RANGE_REQUEST_SIZE: u64 = 512;

/// Exchange answering every request from a store.
///
/// Stands in for the network exchange in tests and local simulations.
/// Head options are ignored since there are no peers to choose between.
#[derive(Debug)]
pub struct LocalExchange<S> {
    store: Arc<S>,
}

impl<S> LocalExchange<S> {
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl<H, S> Exchange<H> for LocalExchange<S>
where
    H: Header,
    S: Store<H>,
{
    async fn head(&self, options: &[HeadOption]) -> Result<H, ExchangeError> {
        trace!(?options, "Serving head locally");
        Ok(self.store.head().await?)
    }

    async fn get(&self, hash: &Hash) -> Result<H, ExchangeError> {
        Ok(self.store.get(hash).await?)
    }

    async fn get_by_height(&self, height: u64) -> Result<H, ExchangeError> {
        Ok(self.store.get_by_height(height).await?)
    }

    async fn get_range_by_height(&self, from: u64, amount: u64) -> Result<Vec<H>, ExchangeError> {
        let head = self.store.height().await;
        if from > head {
            return Err(ExchangeError::NotFound);
        }

        let amount = amount.min(MAX_RANGE_REQUEST_SIZE);
        let to = (from + amount).min(head + 1);

        let mut headers = Vec::with_capacity((to - from) as usize);
        for height in from..to {
            headers.push(self.store.get_by_height(height).await?);
        }
        Ok(headers)
    }

    async fn get_verified_range(&self, from: &H, amount: u64) -> Result<Vec<H>, ExchangeError> {
        let headers =
            <Self as Exchange<H>>::get_range_by_height(self, from.height() + 1, amount).await?;
        verify_range(from, &headers)?;
        Ok(headers)
    }
}
