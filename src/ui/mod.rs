//! Terminal User Interface module.
//!
//! - `loop_runner` - main event loop and terminal management
//! - `input` - keyboard dispatch for the alert, search overlay and views
//! - `render` - view dispatch, size guard, alert overlay
//! - `articles` - feed list widget
//! - `read_later` - saved-articles widget
//! - `search` - search overlay
//! - `status` - status bar with spinner

mod articles;
mod input;
mod loop_runner;
mod read_later;
mod render;
mod search;
mod status;

pub use articles::format_relative_time;
pub use loop_runner::{run, Action};
