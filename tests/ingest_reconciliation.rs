//! Engine-level reconciliation tests.
//!
//! These drive both sync modes against an in-memory store and a scripted
//! feed, so every dedup and failure property is checked without network or
//! database access.

use std::sync::{Arc, Mutex};

use anyhow::Result;
use async_trait::async_trait;
use chrono::Utc;
use uuid::Uuid;

use plateful::database::restaurant_store::{RestaurantRow, RestaurantStoreTrait};
use plateful::error::{IngestError, SourceError};
use plateful::ingest::IngestEngine;
use plateful::opendata::types::{RawRestaurantRecord, RestaurantIdentity};
use plateful::opendata::RestaurantSource;

// =========================================================================
// TEST INFRASTRUCTURE
// =========================================================================

#[derive(Clone, Default)]
struct InMemoryStore {
    rows: Arc<Mutex<Vec<RestaurantRow>>>,
}

impl InMemoryStore {
    fn len(&self) -> usize {
        self.rows.lock().unwrap().len()
    }
}

#[async_trait]
impl RestaurantStoreTrait for InMemoryStore {
    async fn find_or_create(&self, identity: &RestaurantIdentity) -> Result<RestaurantRow> {
        let mut rows = self.rows.lock().unwrap();
        if let Some(row) = rows.iter().find(|r| r.identity() == *identity) {
            return Ok(row.clone());
        }

        let row = RestaurantRow {
            restaurant_id: Uuid::new_v4(),
            name: identity.name.clone(),
            cuisine: identity.cuisine.clone(),
            borough: identity.borough.clone(),
            building_number: identity.building_number.clone(),
            street: identity.street.clone(),
            zipcode: identity.zipcode.clone(),
            created_at: Some(Utc::now()),
        };
        rows.push(row.clone());
        Ok(row)
    }
}

#[derive(Clone)]
enum Script {
    Batch(Vec<RawRestaurantRecord>),
    Failure(reqwest::StatusCode),
}

#[derive(Clone)]
struct ScriptedFeed {
    script: Script,
    queries: Arc<Mutex<Vec<Option<String>>>>,
}

impl ScriptedFeed {
    fn batch(records: Vec<RawRestaurantRecord>) -> Self {
        Self {
            script: Script::Batch(records),
            queries: Arc::default(),
        }
    }

    fn failing(status: reqwest::StatusCode) -> Self {
        Self {
            script: Script::Failure(status),
            queries: Arc::default(),
        }
    }
}

#[async_trait]
impl RestaurantSource for ScriptedFeed {
    async fn fetch(&self, name: Option<&str>) -> Result<Vec<RawRestaurantRecord>, SourceError> {
        self.queries.lock().unwrap().push(name.map(str::to_string));
        match &self.script {
            Script::Batch(records) => Ok(records.clone()),
            Script::Failure(status) => Err(SourceError::Status { status: *status }),
        }
    }
}

fn record(name: &str, building: &str, street: &str, zipcode: Option<&str>) -> RawRestaurantRecord {
    RawRestaurantRecord {
        dba: Some(name.to_string()),
        cuisine_description: Some("Pizza".to_string()),
        boro: Some("Queens".to_string()),
        building: Some(building.to_string()),
        street: Some(street.to_string()),
        zipcode: zipcode.map(str::to_string),
    }
}

fn names(rows: &[RestaurantRow]) -> Vec<&str> {
    rows.iter().map(|r| r.name.as_str()).collect()
}

// =========================================================================
// TESTS
// =========================================================================

#[tokio::test]
async fn sync_all_preserves_feed_order_and_drops_incomplete() {
    let feed = ScriptedFeed::batch(vec![
        record("CASA ROSA", "10", "Main St", Some("11101")),
        record("NO ZIP", "11", "Main St", None),
        record("LUCALI", "575", "Henry St", Some("11231")),
        record("DI FARA", "1424", "Avenue J", Some("11230")),
    ]);
    let store = InMemoryStore::default();
    let engine = IngestEngine::new(feed, store.clone());

    let result = engine.sync_all().await.unwrap();

    assert_eq!(names(&result), vec!["CASA ROSA", "LUCALI", "DI FARA"]);
    assert_eq!(store.len(), 3);
}

#[tokio::test]
async fn sync_all_keeps_feed_duplicates_but_stores_one_row() {
    let feed = ScriptedFeed::batch(vec![
        record("LUCALI", "575", "Henry St", Some("11231")),
        record("LUCALI", "575", "Henry St", Some("11231")),
    ]);
    let store = InMemoryStore::default();
    let engine = IngestEngine::new(feed, store.clone());

    let result = engine.sync_all().await.unwrap();

    assert_eq!(result.len(), 2);
    assert_eq!(result[0].restaurant_id, result[1].restaurant_id);
    assert_eq!(store.len(), 1);
}

#[tokio::test]
async fn same_address_resolves_differently_per_mode() {
    // Two complete records at one address, different names: browse keeps
    // both entities, unique keeps only the first seen.
    let batch = vec![
        record("A", "10", "Main St", Some("11101")),
        record("B", "10", "Main St", Some("11101")),
    ];

    let store = InMemoryStore::default();
    let engine = IngestEngine::new(ScriptedFeed::batch(batch.clone()), store.clone());
    let all = engine.sync_all().await.unwrap();
    assert_eq!(names(&all), vec!["A", "B"]);
    assert_ne!(all[0].restaurant_id, all[1].restaurant_id);

    let store = InMemoryStore::default();
    let engine = IngestEngine::new(ScriptedFeed::batch(batch), store.clone());
    let unique = engine.sync_unique(None).await.unwrap();
    assert_eq!(names(&unique), vec!["A"]);
    assert_eq!(store.len(), 1);
}

#[tokio::test]
async fn sync_unique_keeps_first_seen_order() {
    let feed = ScriptedFeed::batch(vec![
        record("DI FARA", "1424", "Avenue J", Some("11230")),
        record("LUCALI", "575", "Henry St", Some("11231")),
        record("DI FARA ANNEX", "1424", "Avenue J", Some("11230")),
        record("CASA ROSA", "10", "Main St", Some("11101")),
    ]);
    let engine = IngestEngine::new(feed, InMemoryStore::default());

    let result = engine.sync_unique(None).await.unwrap();

    assert_eq!(names(&result), vec!["DI FARA", "LUCALI", "CASA ROSA"]);
}

#[tokio::test]
async fn repeated_syncs_do_not_grow_the_store() {
    let batch = vec![
        record("LUCALI", "575", "Henry St", Some("11231")),
        record("DI FARA", "1424", "Avenue J", Some("11230")),
    ];
    let store = InMemoryStore::default();
    let engine = IngestEngine::new(ScriptedFeed::batch(batch), store.clone());

    engine.sync_all().await.unwrap();
    let after_first = store.len();

    engine.sync_all().await.unwrap();
    engine.sync_unique(None).await.unwrap();

    assert_eq!(store.len(), after_first);
}

#[tokio::test]
async fn feed_failure_is_an_error_with_no_writes() {
    let store = InMemoryStore::default();
    let feed = ScriptedFeed::failing(reqwest::StatusCode::SERVICE_UNAVAILABLE);
    let engine = IngestEngine::new(feed, store.clone());

    let all = engine.sync_all().await;
    assert!(matches!(all, Err(IngestError::Source(_))));

    let unique = engine.sync_unique(Some("LUCALI")).await;
    assert!(unique.err().map(|e| e.is_source()).unwrap_or(false));

    assert_eq!(store.len(), 0);
}

#[tokio::test]
async fn sync_unique_forwards_the_name_filter() {
    let feed = ScriptedFeed::batch(vec![]);
    let queries = feed.queries.clone();
    let engine = IngestEngine::new(feed, InMemoryStore::default());

    engine.sync_unique(Some("PATSY'S")).await.unwrap();
    engine.sync_unique(None).await.unwrap();
    engine.sync_all().await.unwrap();

    let seen = queries.lock().unwrap();
    assert_eq!(*seen, vec![Some("PATSY'S".to_string()), None, None]);
}
