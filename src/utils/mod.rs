pub mod logging;

pub use logging::{log_startup, print_result, truncate_text};
