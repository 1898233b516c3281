//! Dotted-path access to JSON namespaces in key-value mediums.
//!
//! A type path such as `local.user.profile.name` names a medium (`local`,
//! `session`, or anything else for the in-memory fallback), a root key
//! (`user`) and a field path inside the JSON tree stored under that key.
//!
//! - [`path`]: type path and segment parsing
//! - [`tree`]: get / set / remove inside a JSON tree
//! - [`namespace`]: loading, persisting and collapsing namespace roots
//! - [`expiration`]: session expiry records and the background sweep
//! - [`store`]: the [`Kando`] adapter tying it together

pub mod config;
pub mod error;
pub mod expiration;
pub mod namespace;
pub mod path;
pub mod store;
pub mod tree;

pub use config::KandoConfig;
pub use error::{ConfigError, KandoError, KandoResult};
pub use expiration::SweepReport;
pub use path::{MediumKind, Segment, TypePath};
pub use store::{Kando, KandoBuilder};

pub use kando_storage::{FileMedium, Medium, MemoryMedium, StorageError};
