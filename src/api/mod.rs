//! Qiita API access.
//!
//! - [`qiita`] - HTTP client for `/api/v2/items`, search query building and
//!   the [`ArticleSource`] seam the feed view model fetches through
//! - [`types`] - the [`Article`] model and the raw response DTOs
//! - [`http`] - the shared `reqwest` client

mod http;
mod qiita;
mod types;

pub use qiita::{
    search_query, ApiError, ArticleSource, QiitaClient, DEFAULT_BASE_URL, POPULAR_MIN_STOCKS,
};
pub use http::build_http_client;
pub use types::Article;
