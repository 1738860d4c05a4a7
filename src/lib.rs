// Library interface for runstatus modules
// The CLI and the integration tests both go through this crate root

pub mod config;
pub mod consistency;
pub mod dashboard;
pub mod database;
pub mod error;
pub mod format;
pub mod insights;
pub mod logging;
pub mod models;
pub mod pmc;
pub mod race;
pub mod recovery;
pub mod risk;
pub mod source;
pub mod stats;
pub mod suggestion;
pub mod taper;
pub mod thresholds;
pub mod zones;

// Re-export commonly used types for convenience
pub use models::*;
pub use config::AppConfig;
pub use dashboard::{Analysis, Dashboard};
pub use database::Database;
pub use error::{Result, RunStatusError};
pub use logging::{LogConfig, LogFormat, LogLevel};
pub use source::{MemorySource, SnapshotSource};
pub use taper::TaperModel;
pub use zones::ZoneCalculator;
