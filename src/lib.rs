//! enrollcheck - an embedded, indexed store and query engine for validating
//! student course enrollment data
//!
//! Three parsed datasets (students, courses, course requests) are loaded into
//! a schema-on-write store, then checked with cross-table joins.
//!
//! ```ignore
//! let store = Store::open(StoreOptions::from_config(&config))?;
//! store.load(Dataset { students, courses, requests }).await?;
//!
//! let engine = QueryEngine::new(store, Arc::new(config));
//! let outcome = engine.check_credits().collect().await;
//! ```

pub mod cli;
pub mod config;
pub mod index;
pub mod model;
pub mod observability;
pub mod query;
pub mod schema;
pub mod storage;
pub mod store;
