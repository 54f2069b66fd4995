// Core business logic module

pub mod config;
pub mod disk_monitor;

// Re-export commonly used items
pub use config::{Config, ConfigStore, ConfigUpdate};
pub use disk_monitor::{AlertStateMachine, EventContext, Poller, Severity, Volume};
