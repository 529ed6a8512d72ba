//! Restaurant ingestion and deduplication.
//!
//! The engine fetches raw records from the open-data feed, reconciles them
//! against the local store, and returns the canonical local entities that
//! bookmarks and reviews attach to. Reconciliation is split from I/O: batch
//! filtering and intra-batch dedup are pure functions in [`reconcile`], and
//! the engine composes a [`RestaurantSource`](crate::opendata::RestaurantSource)
//! with a store behind the [`RestaurantStoreTrait`](crate::database::RestaurantStoreTrait).

pub mod engine;
pub mod reconcile;

pub use engine::IngestEngine;
