use header::{Exchange, ExchangeError, Hash, Header, Store, StoreError};
use thiserror::Error;
use tracing::info;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InitError {
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error(transparent)]
    Exchange(#[from] ExchangeError),
}

/// Ensures `store` is initialized.
///
/// An uninitialized store is bootstrapped with the header identified by
/// the trusted `hash`, fetched through `exchange`. Does nothing when the
/// store already has a head.
pub async fn init<H, S, E>(store: &S, exchange: &E, hash: Hash) -> Result<(), InitError>
where
    H: Header,
    S: Store<H> + ?Sized,
    E: Exchange<H> + ?Sized,
{
    match store.head().await {
        Ok(head) => {
            info!(height = head.height(), "Store already initialized");
            Ok(())
        }
        Err(StoreError::NoHead) => {
            info!(trusted_hash = %hash, "Initializing store from trusted hash");
            let initial = exchange.get(&hash).await?;
            store.init(initial).await?;
            Ok(())
        }
        Err(err) => Err(err.into()),
    }
}
