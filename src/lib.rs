//! qiita-pocket: a terminal reader for Qiita.
//!
//! Browse articles by tag with infinite scroll, search with sort and period
//! filters, and keep a read-later list in a local SQLite database.

pub mod api;
pub mod app;
pub mod config;
pub mod feed;
pub mod storage;
pub mod ui;
pub mod util;
