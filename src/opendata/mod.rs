//! Client and record types for the NYC DOHMH restaurant inspection feed.

pub mod client;
pub mod types;

pub use client::{OpenDataClient, RestaurantSource};
pub use types::{RawRestaurantRecord, RestaurantIdentity};
