//! Utility functions for common operations.
//!
//! - **URL validation**: article URLs are checked before they reach the browser
//! - **Text processing**: control-character stripping and width-aware truncation
//! - **Tasks**: panic capture for spawned background work

mod task;
mod text;
mod url_validator;

pub use task::catch_task_panic;
pub use text::{display_width, strip_control_chars, truncate_to_width};
pub use url_validator::{validate_url, validate_url_for_open, UrlValidationError};

/// Maximum accepted length of a search tag typed by the user.
pub const MAX_TAG_LENGTH: usize = 64;
