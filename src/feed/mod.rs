//! The article feed: what to show and how it pages.
//!
//! - [`query`] - tag, sort and period that make up a search
//! - [`stores`] - persistence seams the controller talks to
//! - [`view_model`] - fetch orchestration, page cursor, loading state
//! - [`controller`] - the on-screen list and the user actions that mutate it

mod controller;
mod query;
mod stores;
mod view_model;

pub use controller::{FeedController, ListUpdate, SCROLL_THRESHOLD};
pub use query::{FeedQuery, SearchPeriod, SearchSort, UnknownVariant};
pub use stores::{FeedStore, ReadLaterStore, SearchHistoryStore, SettingsStore};
pub use view_model::{FeedError, FeedOutput, FeedViewModel, FetchCompletion, PageKind};
