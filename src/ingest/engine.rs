//! Ingestion engine: feed fetch plus store reconciliation.

use tracing::{info, warn};

use crate::database::RestaurantStoreTrait;
use crate::database::restaurant_store::RestaurantRow;
use crate::error::IngestError;
use crate::ingest::reconcile;
use crate::opendata::RestaurantSource;

/// Composes a feed source with the local store. Both sync modes share the
/// same matching: each surviving record resolves to an existing entity or a
/// freshly inserted one, committed per record in feed order.
pub struct IngestEngine<S, R> {
    source: S,
    store: R,
}

impl<S, R> IngestEngine<S, R>
where
    S: RestaurantSource,
    R: RestaurantStoreTrait,
{
    pub fn new(source: S, store: R) -> Self {
        Self { source, store }
    }

    /// Fetch the full feed and resolve every complete record, in feed order.
    /// No batch-level dedup: an entity listed twice upstream appears twice in
    /// the result (browse mode shows every listing).
    pub async fn sync_all(&self) -> Result<Vec<RestaurantRow>, IngestError> {
        let batch = self.fetch(None).await?;
        let identities = reconcile::complete_identities(&batch);

        let mut restaurants = Vec::with_capacity(identities.len());
        for identity in &identities {
            restaurants.push(self.store.find_or_create(identity).await?);
        }

        info!(
            "Synced {} restaurants from {} feed records",
            restaurants.len(),
            batch.len()
        );
        Ok(restaurants)
    }

    /// Fetch the feed, optionally narrowed by name, and resolve at most one
    /// entity per distinct address in the batch, first-seen order.
    pub async fn sync_unique(&self, name: Option<&str>) -> Result<Vec<RestaurantRow>, IngestError> {
        let batch = self.fetch(name).await?;
        let identities = reconcile::dedup_by_address(reconcile::complete_identities(&batch));

        let mut restaurants = Vec::with_capacity(identities.len());
        for identity in &identities {
            restaurants.push(self.store.find_or_create(identity).await?);
        }

        info!(
            "Resolved {} unique addresses from {} feed records",
            restaurants.len(),
            batch.len()
        );
        Ok(restaurants)
    }

    async fn fetch(
        &self,
        name: Option<&str>,
    ) -> Result<Vec<crate::opendata::RawRestaurantRecord>, IngestError> {
        self.source.fetch(name).await.map_err(|e| {
            warn!("Restaurant feed fetch failed: {e}");
            IngestError::Source(e)
        })
    }
}
