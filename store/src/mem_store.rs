/// In-memory header store.
///
/// Keeps a height index and a hash index behind one lock. Appends are
/// checked in full before anything is inserted, so a rejected batch
/// never leaves a partial chain behind.
use std::collections::{BTreeMap, HashMap};

use async_trait::async_trait;
use header::{Hash, Header, Store, StoreError};
use parking_lot::RwLock;
use tracing::debug;

#[derive(Debug)]
struct Inner<H> {
    by_height: BTreeMap<u64, H>,
    by_hash: HashMap<Hash, u64>,
}

impl<H> Default for Inner<H> {
    fn default() -> Self {
        Self {
            by_height: BTreeMap::new(),
            by_hash: HashMap::new(),
        }
    }
}

impl<H: Header> Inner<H> {
    fn head(&self) -> Option<&H> {
        self.by_height.values().next_back()
    }

    fn insert(&mut self, header: H) {
        self.by_hash.insert(header.hash(), header.height());
        self.by_height.insert(header.height(), header);
    }
}

#[derive(Debug)]
pub struct MemStore<H> {
    inner: RwLock<Inner<H>>,
}

impl<H: Header> Default for MemStore<H> {
    fn default() -> Self {
        Self::new()
    }
}

impl<H: Header> MemStore<H> {
    /// Creates an uninitialized store.
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(Inner::default()),
        }
    }

    /// Creates a store already initialized with `head`.
    pub fn with_head(head: H) -> Self {
        let mut inner = Inner::default();
        inner.insert(head);
        Self {
            inner: RwLock::new(inner),
        }
    }

    /// Headers with heights in `from..to`, stopping at the first missing height.
    pub fn get_range(&self, from: u64, to: u64) -> Vec<H> {
        let inner = self.inner.read();
        (from..to)
            .map_while(|height| inner.by_height.get(&height).cloned())
            .collect()
    }

    /// Number of stored headers.
    pub fn len(&self) -> usize {
        self.inner.read().by_height.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.read().by_height.is_empty()
    }
}

#[async_trait]
impl<H: Header> Store<H> for MemStore<H> {
    async fn head(&self) -> Result<H, StoreError> {
        self.inner.read().head().cloned().ok_or(StoreError::NoHead)
    }

    async fn get(&self, hash: &Hash) -> Result<H, StoreError> {
        let inner = self.inner.read();
        inner
            .by_hash
            .get(hash)
            .and_then(|height| inner.by_height.get(height))
            .cloned()
            .ok_or(StoreError::NotFound)
    }

    async fn get_by_height(&self, height: u64) -> Result<H, StoreError> {
        self.inner
            .read()
            .by_height
            .get(&height)
            .cloned()
            .ok_or(StoreError::NotFound)
    }

    async fn has(&self, hash: &Hash) -> bool {
        self.inner.read().by_hash.contains_key(hash)
    }

    async fn height(&self) -> u64 {
        self.inner.read().head().map(Header::height).unwrap_or(0)
    }

    async fn append(&self, headers: Vec<H>) -> Result<(), StoreError> {
        if headers.is_empty() {
            return Ok(());
        }

        let mut inner = self.inner.write();
        let head = inner.head().cloned().ok_or(StoreError::NoHead)?;

        let mut tip = &head;
        for header in &headers {
            if header.height() != tip.height() + 1 {
                return Err(StoreError::NonAdjacent {
                    head: tip.height(),
                    attempted: header.height(),
                });
            }
            if header.last_header() != tip.hash() {
                return Err(StoreError::BrokenLink {
                    height: header.height(),
                });
            }
            tip = header;
        }

        let from = headers[0].height();
        let to = tip.height();
        for header in headers {
            inner.insert(header);
        }

        debug!(from, to, "Appended headers");
        Ok(())
    }

    async fn init(&self, header: H) -> Result<(), StoreError> {
        let mut inner = self.inner.write();
        if inner.head().is_some() {
            return Err(StoreError::AlreadyInitialized);
        }

        debug!(height = header.height(), hash = %header.hash(), "Initialized store");
        inner.insert(header);
        Ok(())
    }
}
