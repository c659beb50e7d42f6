//! The management API: a single dispatcher over `(type, action, options)`.
//!
//! [`ManageApi::handle`] takes the entity type (`account`, `bucket`,
//! `upgrade`), a type-specific action, and an options object, and produces
//! exactly one of a structured response or a structured error, never
//! both. All validation happens before any side effect; all crate-local
//! errors are recovered here and mapped to the wire error codes.

mod accounts;
mod api;
mod buckets;
mod options;
mod response;
mod upgrades;
mod validation;

pub use api::ManageApi;
pub use options::{AccountOptions, BucketOptions, ListFilter, UpgradeOptions};
pub use response::{ManageError, ManageErrorCode, ManageResponse, ResponseCode};
