pub mod configuration;
pub mod error;
pub mod event;
pub mod pipeline;
pub mod signal;
pub mod vault;

pub use configuration::*;
pub use error::*;
pub use event::*;
pub use pipeline::*;
pub use signal::*;
pub use vault::*;

pub type Unit = ();

/// Opaque key/value configuration of a component, kept sorted by key.
pub type ConfigProperties = std::collections::BTreeMap<String, serde_json::Value>;
