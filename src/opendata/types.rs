//! Raw record types for the open-data feed.

use serde::Deserialize;

/// One record as the feed returns it. Only the identity fields are modeled;
/// the feed carries dozens of inspection columns we ignore.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawRestaurantRecord {
    pub dba: Option<String>,
    pub cuisine_description: Option<String>,
    pub boro: Option<String>,
    pub building: Option<String>,
    pub street: Option<String>,
    pub zipcode: Option<String>,
}

impl RawRestaurantRecord {
    /// Extract the six-field identity, or `None` when any required field is
    /// missing or empty. Incomplete records are dropped from every result set.
    pub fn identity(&self) -> Option<RestaurantIdentity> {
        Some(RestaurantIdentity {
            name: required(&self.dba)?,
            cuisine: required(&self.cuisine_description)?,
            borough: required(&self.boro)?,
            building_number: required(&self.building)?,
            street: required(&self.street)?,
            zipcode: required(&self.zipcode)?,
        })
    }
}

fn required(value: &Option<String>) -> Option<String> {
    value
        .as_deref()
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

/// The six fields that define restaurant identity. Matching is exact and
/// case-sensitive: "St" and "Street" are distinct restaurants.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RestaurantIdentity {
    pub name: String,
    pub cuisine: String,
    pub borough: String,
    pub building_number: String,
    pub street: String,
    pub zipcode: String,
}

impl RestaurantIdentity {
    /// Address-only key used to collapse feed duplicates within one batch.
    pub fn address_key(&self) -> String {
        format!(
            "{} {} {} {}",
            self.building_number, self.street, self.borough, self.zipcode
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(name: &str) -> RawRestaurantRecord {
        RawRestaurantRecord {
            dba: Some(name.to_string()),
            cuisine_description: Some("Pizza".to_string()),
            boro: Some("Queens".to_string()),
            building: Some("10".to_string()),
            street: Some("Main St".to_string()),
            zipcode: Some("11101".to_string()),
        }
    }

    #[test]
    fn complete_record_yields_identity() {
        let identity = record("A").identity().unwrap();
        assert_eq!(identity.name, "A");
        assert_eq!(identity.address_key(), "10 Main St Queens 11101");
    }

    #[test]
    fn missing_field_is_incomplete() {
        let mut r = record("A");
        r.zipcode = None;
        assert!(r.identity().is_none());
    }

    #[test]
    fn empty_field_is_incomplete() {
        let mut r = record("A");
        r.street = Some(String::new());
        assert!(r.identity().is_none());
    }

    #[test]
    fn unknown_feed_columns_are_ignored() {
        let json = r#"{
            "dba": "A",
            "cuisine_description": "Pizza",
            "boro": "Queens",
            "building": "10",
            "street": "Main St",
            "zipcode": "11101",
            "inspection_date": "2024-01-01",
            "violation_code": "10F"
        }"#;
        let r: RawRestaurantRecord = serde_json::from_str(json).unwrap();
        assert!(r.identity().is_some());
    }
}
