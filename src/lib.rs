//! Plateful - restaurant discovery and review service.
//!
//! Restaurants come from the NYC DOHMH open-data feed. The ingestion engine
//! in [`ingest`] reconciles fetched records against the Postgres store so
//! every bookmark and review attaches to one stable local entity, no matter
//! how often the feed repeats a listing. The remaining modules are the data
//! services behind the web API: users, bookmarks, reviews, and follows.

pub mod database;
pub mod error;
pub mod ingest;
pub mod opendata;

pub use database::{DatabaseConfig, DatabaseManager};
pub use error::{IngestError, SourceError};
pub use ingest::IngestEngine;
pub use opendata::{OpenDataClient, RestaurantSource};
