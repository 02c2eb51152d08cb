//! View-models decoded from the backend's JSON.
//!
//! Nothing here is cached: every render decodes a fresh snapshot.

use std::fmt;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// Accepts either a JSON string or a JSON number for an identifier.
#[derive(Deserialize)]
#[serde(untagged)]
enum RawId {
    Text(String),
    Int(i64),
}

impl From<RawId> for String {
    fn from(raw: RawId) -> Self {
        match raw {
            RawId::Text(s) => s,
            RawId::Int(n) => n.to_string(),
        }
    }
}

macro_rules! string_id {
    ($name:ident) => {
        #[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            pub fn new(id: impl Into<String>) -> Self {
                Self(id.into())
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }

            /// An empty id never reaches the backend.
            pub fn is_empty(&self) -> bool {
                self.0.is_empty()
            }
        }

        impl<'de> Deserialize<'de> for $name {
            fn deserialize<D: Deserializer<'de>>(d: D) -> Result<Self, D::Error> {
                RawId::deserialize(d).map(|raw| Self(raw.into()))
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<&str> for $name {
            fn from(s: &str) -> Self {
                Self(s.to_string())
            }
        }
    };
}

string_id!(PostId);
string_id!(CommentId);

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct LinkPreview {
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub image: Option<String>,
}

/// A feed post. Text fields sent as `null` decode as empty, and a malformed
/// timestamp or preview is dropped without losing the post.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Post {
    pub id: PostId,
    #[serde(default, deserialize_with = "null_as_default")]
    pub title: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub content: String,
    #[serde(default, deserialize_with = "lenient")]
    pub author_name: Option<String>,
    #[serde(default, deserialize_with = "lenient_timestamp")]
    pub created_at: Option<i64>,
    #[serde(default, deserialize_with = "lenient")]
    pub link_preview: Option<LinkPreview>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Comment {
    pub id: CommentId,
    #[serde(default, deserialize_with = "null_as_default")]
    pub content: String,
    #[serde(default, deserialize_with = "lenient")]
    pub author_name: Option<String>,
    #[serde(default, deserialize_with = "lenient_timestamp")]
    pub created_at: Option<i64>,
    #[serde(default, deserialize_with = "lenient")]
    pub post_id: Option<PostId>,
}

/// The logged-in user as reported by `/users/me`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct User {
    #[serde(default)]
    pub name: String,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

/// Rendered author label; the backend may omit or blank it.
pub fn author_label(author_name: Option<&str>) -> &str {
    match author_name {
        Some(name) if !name.is_empty() => name,
        _ => "unknown",
    }
}

fn null_as_default<'de, D, T>(d: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + Default,
{
    Ok(Option::<T>::deserialize(d)?.unwrap_or_default())
}

/// `None` for null and for anything that does not decode as `T`.
fn lenient<'de, D, T>(d: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    let value = Option::<Value>::deserialize(d)?;
    Ok(value.and_then(|v| serde_json::from_value(v).ok()))
}

/// Unix seconds; fractional values are truncated.
fn lenient_timestamp<'de, D>(d: D) -> Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(d)?;
    Ok(value.and_then(|v| {
        v.as_i64()
            .or_else(|| v.as_f64().filter(|f| f.is_finite()).map(|f| f as i64))
    }))
}

// Response envelopes. A missing or null list decodes as empty.

/// Decodes each entry on its own; entries that fail are logged and skipped.
fn lenient_list<'de, D, T>(d: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    let items = Option::<Vec<Value>>::deserialize(d)?.unwrap_or_default();
    Ok(items
        .into_iter()
        .filter_map(|item| match serde_json::from_value(item) {
            Ok(v) => Some(v),
            Err(e) => {
                tracing::warn!(error = %e, "skipping undecodable entry");
                None
            }
        })
        .collect())
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct PostsEnvelope {
    #[serde(default, deserialize_with = "lenient_list")]
    pub(crate) posts: Vec<Post>,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct CommentsEnvelope {
    #[serde(default, deserialize_with = "lenient_list")]
    pub(crate) comments: Vec<Comment>,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct TagsEnvelope {
    #[serde(default, deserialize_with = "null_as_default")]
    pub(crate) tags: Vec<String>,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct UserEnvelope {
    #[serde(default)]
    pub(crate) user: Option<User>,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct ErrorEnvelope {
    #[serde(default)]
    pub(crate) error: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_accept_strings_and_numbers() {
        let p: Post = serde_json::from_str(r#"{"id": 7, "title": "t"}"#).unwrap();
        assert_eq!(p.id.as_str(), "7");

        let p: Post =
            serde_json::from_str(r#"{"id": "5b1c", "title": "t", "content": "c"}"#).unwrap();
        assert_eq!(p.id, PostId::from("5b1c"));
        assert_eq!(p.author_name, None);
        assert_eq!(p.created_at, None);
        assert_eq!(p.link_preview, None);
    }

    #[test]
    fn post_with_preview_decodes() {
        let p: Post = serde_json::from_str(
            r#"{
                "id": "a", "title": "t", "content": "see https://x.y",
                "author_name": "ann", "created_at": 1700000000,
                "link_preview": {"url": "https://x.y", "title": "X"}
            }"#,
        )
        .unwrap();
        let lp = p.link_preview.unwrap();
        assert_eq!(lp.url.as_deref(), Some("https://x.y"));
        assert_eq!(lp.title.as_deref(), Some("X"));
        assert_eq!(lp.image, None);
        assert_eq!(p.created_at, Some(1_700_000_000));
    }

    #[test]
    fn envelopes_default_to_empty() {
        let e: PostsEnvelope = serde_json::from_str(r#"{"error": "boom"}"#).unwrap();
        assert!(e.posts.is_empty());
        let e: TagsEnvelope = serde_json::from_str(r#"{"tags": null}"#).unwrap();
        assert!(e.tags.is_empty());
        let e: UserEnvelope = serde_json::from_str(r#"{"user": null}"#).unwrap();
        assert!(e.user.is_none());
    }

    #[test]
    fn null_text_and_odd_timestamps_degrade_per_field() {
        let p: Post = serde_json::from_str(
            r#"{"id": "2", "title": null, "content": null, "author_name": 3,
                "created_at": 1700000000.75, "link_preview": "nope"}"#,
        )
        .unwrap();
        assert_eq!(p.title, "");
        assert_eq!(p.content, "");
        assert_eq!(p.author_name, None);
        assert_eq!(p.created_at, Some(1_700_000_000));
        assert_eq!(p.link_preview, None);

        let c: Comment =
            serde_json::from_str(r#"{"id": 1, "content": null, "created_at": "soon"}"#).unwrap();
        assert_eq!(c.content, "");
        assert_eq!(c.created_at, None);
    }

    #[test]
    fn one_bad_entry_does_not_sink_the_list() {
        let e: PostsEnvelope = serde_json::from_str(
            r#"{"posts": [
                {"id": "1", "title": "ok"},
                {"title": "no id"},
                {"id": "3", "title": ["not", "text"]},
                {"id": "4", "title": null}
            ]}"#,
        )
        .unwrap();
        let ids: Vec<&str> = e.posts.iter().map(|p| p.id.as_str()).collect();
        assert_eq!(ids, vec!["1", "4"]);

        let e: CommentsEnvelope =
            serde_json::from_str(r#"{"comments": [{"id": "c1"}, 42, null]}"#).unwrap();
        assert_eq!(e.comments.len(), 1);
    }

    #[test]
    fn user_keeps_unknown_fields() {
        let e: UserEnvelope =
            serde_json::from_str(r#"{"user": {"id": "u1", "name": "ann"}}"#).unwrap();
        let u = e.user.unwrap();
        assert_eq!(u.name, "ann");
        assert_eq!(u.extra.get("id"), Some(&serde_json::json!("u1")));
    }

    #[test]
    fn blank_author_renders_as_unknown() {
        assert_eq!(author_label(None), "unknown");
        assert_eq!(author_label(Some("")), "unknown");
        assert_eq!(author_label(Some("bo")), "bo");
    }
}
