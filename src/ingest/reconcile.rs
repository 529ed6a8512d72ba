//! Pure batch reconciliation.
//!
//! Decides which identities a fetched batch resolves to, independent of any
//! network or database access.

use std::collections::HashSet;

use crate::opendata::types::{RawRestaurantRecord, RestaurantIdentity};

/// Extract identities from the complete records of a batch, in feed order.
/// Incomplete records are dropped silently, not counted or reported.
pub fn complete_identities(records: &[RawRestaurantRecord]) -> Vec<RestaurantIdentity> {
    records.iter().filter_map(|r| r.identity()).collect()
}

/// Collapse a batch to at most one identity per address key, first-seen wins.
/// A later record at an already-seen address is skipped entirely, even when it
/// names a different restaurant.
pub fn dedup_by_address(identities: Vec<RestaurantIdentity>) -> Vec<RestaurantIdentity> {
    let mut seen = HashSet::new();
    identities
        .into_iter()
        .filter(|identity| seen.insert(identity.address_key()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(
        name: &str,
        building: &str,
        street: &str,
        zipcode: Option<&str>,
    ) -> RawRestaurantRecord {
        RawRestaurantRecord {
            dba: Some(name.to_string()),
            cuisine_description: Some("Pizza".to_string()),
            boro: Some("Queens".to_string()),
            building: Some(building.to_string()),
            street: Some(street.to_string()),
            zipcode: zipcode.map(str::to_string),
        }
    }

    #[test]
    fn drops_incomplete_records_and_preserves_order() {
        let batch = vec![
            record("A", "10", "Main St", Some("11101")),
            record("B", "11", "Main St", None),
            record("C", "12", "Main St", Some("11101")),
        ];

        let identities = complete_identities(&batch);
        let names: Vec<_> = identities.iter().map(|i| i.name.as_str()).collect();
        assert_eq!(names, vec!["A", "C"]);
    }

    #[test]
    fn keeps_feed_duplicates_without_address_dedup() {
        let batch = vec![
            record("A", "10", "Main St", Some("11101")),
            record("A", "10", "Main St", Some("11101")),
        ];

        assert_eq!(complete_identities(&batch).len(), 2);
    }

    #[test]
    fn first_seen_wins_per_address() {
        let identities = complete_identities(&[
            record("A", "10", "Main St", Some("11101")),
            record("B", "10", "Main St", Some("11101")),
            record("C", "20", "Broadway", Some("10001")),
        ]);

        let unique = dedup_by_address(identities);
        let names: Vec<_> = unique.iter().map(|i| i.name.as_str()).collect();
        assert_eq!(names, vec!["A", "C"]);
    }

    #[test]
    fn different_zipcode_is_a_different_address() {
        let identities = complete_identities(&[
            record("A", "10", "Main St", Some("11101")),
            record("B", "10", "Main St", Some("11102")),
        ]);

        assert_eq!(dedup_by_address(identities).len(), 2);
    }
}
