//! Configuration module for Monthwise
//!
//! - Data directory resolution
//! - User settings persistence, including the aggregator's product constants

pub mod paths;
pub mod settings;

pub use paths::MonthwisePaths;
pub use settings::Settings;
