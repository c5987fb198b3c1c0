pub mod config;
pub mod error;
pub mod loader;
pub mod metrics;
pub mod plot;
pub mod query;
pub mod record;
pub mod table;
pub mod util;

pub use error::ReportError;
pub use record::Record;

pub const SECONDS_TO_MS: f64 = 1_000.0;
