// UI and formatting module

pub mod console;
pub mod formatters;
pub mod notifier;

// Re-export commonly used items for cleaner imports
pub use formatters::{format_size, print_status_table, severity_badge, usage_line};
pub use notifier::TerminalNotifier;
