//! Object fetching for data-quality runs.
//!
//! A run starts by copying one remote CSV object to local disk. The
//! [`ObjectStore`] trait is the seam: [`GcsStore`] talks to Google Cloud
//! Storage, [`LocalStore`] serves buckets from a directory.

#![deny(unsafe_code)]

pub mod error;
pub mod gcs;
pub mod local;
pub mod location;
pub mod store;

pub use error::{FetchError, Result};
pub use gcs::{Credentials, GcsConfig, GcsStore};
pub use local::LocalStore;
pub use location::ObjectLocation;
pub use store::{FetchReport, ObjectStore};
