//! Translates the listeners of a Gateway-API `Gateway`, together with the
//! routes bound to them, into per-port proxy listener configuration.
//!
//! ```text
//! Gateway + RoutesForGwResult -> validate -> merge by port -> filter chains -> Vec<ListenerIr>
//! ```
//!
//! Problems never abort a translation; they are reported as status
//! conditions through a [`reports::Reporter`].

pub mod common;
pub mod configuration;
pub mod ir;
pub mod query;
pub mod reports;
pub mod route_rules;
pub mod ssl;
pub mod telemetry;
pub mod translator;

pub use configuration::ListenerTranslatorConfig;
pub use translator::{translate_listeners, ListenerTranslator};

pub type Error = Box<dyn std::error::Error + Send + Sync>;
pub type Result<T> = std::result::Result<T, Error>;
