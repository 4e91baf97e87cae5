//! Canopy: Hierarchical Collections over an Embedded Ordered Store
//!
//! A filesystem-like view over an embedded ordered key-value engine: entries
//! are addressed by slash-delimited paths, intermediate segments behave as
//! nested containers, and the terminal segment holds opaque byte content.
//! Collections render to deterministic indented text listings.

pub mod config;
pub mod error;
pub mod node;
pub mod path;
pub mod store;
pub mod tree;

pub use config::StoreConfig;
pub use error::StoreError;
pub use path::PathKey;
pub use store::Store;
