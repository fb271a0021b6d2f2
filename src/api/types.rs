use serde::Deserialize;

use crate::util::strip_control_chars;

/// A Qiita article as shown in the feed and stored in the read-later list.
///
/// Text fields are sanitized on decode; nothing downstream needs to worry
/// about escape sequences in titles or tag names.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Article {
    pub id: String,
    pub title: String,
    pub url: String,
    /// Qiita user id of the author.
    pub author: String,
    pub tags: Vec<String>,
    pub likes_count: i64,
    /// Unix seconds. `None` when the API sent an unparseable timestamp.
    pub created_at: Option<i64>,
}

/// Raw item from `GET /api/v2/items`.
#[derive(Debug, Deserialize)]
pub(crate) struct ItemDto {
    pub id: String,
    pub title: String,
    pub url: String,
    #[serde(default)]
    pub likes_count: i64,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub tags: Vec<TagDto>,
    pub user: UserDto,
}

#[derive(Debug, Deserialize)]
pub(crate) struct TagDto {
    pub name: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct UserDto {
    pub id: String,
}

/// Error body returned by the API on 4xx/5xx.
#[derive(Debug, Deserialize)]
pub(crate) struct ErrorDto {
    pub message: String,
    #[serde(rename = "type", default)]
    pub kind: Option<String>,
}

impl ItemDto {
    pub(crate) fn into_article(self) -> Article {
        let created_at = self.created_at.as_deref().and_then(|raw| {
            match chrono::DateTime::parse_from_rfc3339(raw) {
                Ok(dt) => Some(dt.timestamp()),
                Err(e) => {
                    tracing::debug!(id = %self.id, raw, error = %e, "Unparseable created_at");
                    None
                }
            }
        });

        Article {
            title: strip_control_chars(&self.title).into_owned(),
            url: self.url,
            author: strip_control_chars(&self.user.id).into_owned(),
            tags: self
                .tags
                .into_iter()
                .map(|t| strip_control_chars(&t.name).into_owned())
                .collect(),
            likes_count: self.likes_count,
            created_at,
            id: self.id,
        }
    }
}
