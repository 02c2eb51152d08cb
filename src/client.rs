//! Typed access to the feed backend's REST endpoints.
//!
//! Every call is a single request/response with no retry and no caching.
//! Reads are lenient about status codes (an error body simply lacks the list
//! field); writes report non-OK statuses so callers can log them.

use std::rc::Rc;

use serde::de::DeserializeOwned;
use serde_json::{json, Value};
use urlencoding::encode;

use crate::error::ApiError;
use crate::model::{
    CommentsEnvelope, ErrorEnvelope, PostId, PostsEnvelope, TagsEnvelope, User, UserEnvelope,
};
use crate::model::{Comment, Post};
use crate::transport::{HttpRequest, HttpResponse, Transport};

#[derive(Clone)]
pub struct Api {
    transport: Rc<dyn Transport>,
}

impl Api {
    pub fn new(transport: Rc<dyn Transport>) -> Self {
        Self { transport }
    }

    async fn send(&self, request: HttpRequest) -> Result<HttpResponse, ApiError> {
        self.transport.send(request).await
    }

    async fn read<T: DeserializeOwned>(&self, path: String) -> Result<T, ApiError> {
        self.send(HttpRequest::get(path)).await?.json()
    }

    async fn write(&self, request: HttpRequest) -> Result<(), ApiError> {
        let method = request.method.as_str();
        let path = request.path.clone();
        let response = self.send(request).await?;
        if !response.is_ok() {
            return Err(ApiError::Status {
                method,
                path,
                status: response.status,
            });
        }
        Ok(())
    }

    // Session

    /// `None` for any non-OK answer, including "not logged in".
    pub async fn get_session(&self) -> Result<Option<User>, ApiError> {
        let response = self.send(HttpRequest::get("/users/me")).await?;
        if !response.is_ok() {
            return Ok(None);
        }
        Ok(response.json::<UserEnvelope>()?.user)
    }

    /// Ends the server-side session. The status is not inspected.
    pub async fn logout(&self) -> Result<(), ApiError> {
        self.send(HttpRequest::post("/logout", json!({}))).await?;
        Ok(())
    }

    pub async fn signup(&self, name: &str, email: &str, password: &str) -> Result<Option<User>, ApiError> {
        let body = json!({ "name": name, "email": email, "password": password });
        self.authenticate(HttpRequest::post("/signup", body)).await
    }

    pub async fn login(&self, email: &str, password: &str) -> Result<Option<User>, ApiError> {
        let body = json!({ "email": email, "password": password });
        self.authenticate(HttpRequest::post("/login", body)).await
    }

    async fn authenticate(&self, request: HttpRequest) -> Result<Option<User>, ApiError> {
        let response = self.send(request).await?;
        if !response.is_ok() {
            let message = response.json::<ErrorEnvelope>()?.error;
            return Err(ApiError::Rejected {
                status: response.status,
                message,
            });
        }
        // A success body we cannot read still means we are logged in.
        Ok(response
            .json::<UserEnvelope>()
            .ok()
            .and_then(|envelope| envelope.user))
    }

    // Posts and comments

    pub async fn list_posts(&self) -> Result<Vec<Post>, ApiError> {
        Ok(self.read::<PostsEnvelope>("/posts".into()).await?.posts)
    }

    pub async fn create_post(&self, title: &str, content: &str) -> Result<(), ApiError> {
        self.write(HttpRequest::post(
            "/posts",
            json!({ "title": title, "content": content }),
        ))
        .await
    }

    pub async fn list_comments(&self, post_id: &PostId) -> Result<Vec<Comment>, ApiError> {
        let path = format!("/comments?post_id={}", encode(post_id.as_str()));
        Ok(self.read::<CommentsEnvelope>(path).await?.comments)
    }

    pub async fn create_comment(&self, post_id: &PostId, content: &str) -> Result<(), ApiError> {
        self.write(HttpRequest::post(
            "/comments",
            json!({ "content": content, "post_id": post_id }),
        ))
        .await
    }

    // Tags

    /// Tags of one post, or every known tag when `post_id` is `None`.
    pub async fn list_tags(&self, post_id: Option<&PostId>) -> Result<Vec<String>, ApiError> {
        let path = match post_id.filter(|id| !id.is_empty()) {
            Some(id) => format!("/tags?post_id={}", encode(id.as_str())),
            None => "/tags".to_string(),
        };
        Ok(self.read::<TagsEnvelope>(path).await?.tags)
    }

    /// Returns the decoded response, or `None` when skipped or refused.
    pub async fn add_tag(&self, post_id: &PostId, tag: &str) -> Result<Option<Value>, ApiError> {
        if tag.is_empty() || post_id.is_empty() {
            return Ok(None);
        }
        let path = format!("/posts/{}/tags", encode(post_id.as_str()));
        let response = self.send(HttpRequest::post(path, json!({ "tag": tag }))).await?;
        if !response.is_ok() {
            return Ok(None);
        }
        response.json().map(Some)
    }

    pub async fn remove_tag(&self, post_id: &PostId, tag: &str) -> Result<Option<Value>, ApiError> {
        if tag.is_empty() || post_id.is_empty() {
            return Ok(None);
        }
        let path = format!("/posts/{}/tags/{}", encode(post_id.as_str()), encode(tag));
        let response = self.send(HttpRequest::delete(path)).await?;
        if !response.is_ok() {
            return Ok(None);
        }
        response.json().map(Some)
    }

    pub async fn list_posts_by_tag(&self, tag: &str) -> Result<Vec<Post>, ApiError> {
        if tag.is_empty() {
            return Ok(Vec::new());
        }
        let response = self
            .send(HttpRequest::get(format!("/posts/by-tag/{}", encode(tag))))
            .await?;
        if !response.is_ok() {
            return Ok(Vec::new());
        }
        Ok(response.json::<PostsEnvelope>()?.posts)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::FakeBackend;
    use crate::transport::Method;

    fn api(backend: &Rc<FakeBackend>) -> Api {
        Api::new(backend.clone())
    }

    #[tokio::test]
    async fn add_tag_skips_empty_arguments() {
        let backend = FakeBackend::new();
        let api = api(&backend);

        assert_eq!(api.add_tag(&PostId::from("1"), "").await.unwrap(), None);
        assert_eq!(api.add_tag(&PostId::default(), "x").await.unwrap(), None);
        assert_eq!(api.remove_tag(&PostId::default(), "x").await.unwrap(), None);
        assert!(backend.requests().is_empty());
    }

    #[tokio::test]
    async fn add_tag_posts_and_returns_body() {
        let backend = FakeBackend::new();
        backend.add_post("1", "first", 100);
        let api = api(&backend);

        let body = api.add_tag(&PostId::from("1"), "rust").await.unwrap();
        assert!(body.is_some());
        let sent = backend.requests();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].method, Method::Post);
        assert_eq!(sent[0].path, "/posts/1/tags");
        assert_eq!(sent[0].body, Some(json!({ "tag": "rust" })));
        assert_eq!(backend.tags_of("1"), vec!["rust".to_string()]);
    }

    #[tokio::test]
    async fn refused_tag_write_is_none() {
        let backend = FakeBackend::new();
        backend.fail_status("/posts/1/tags", 403);
        let api = api(&backend);
        assert_eq!(api.add_tag(&PostId::from("1"), "rust").await.unwrap(), None);
    }

    #[tokio::test]
    async fn remove_tag_encodes_the_tag() {
        let backend = FakeBackend::new();
        backend.add_post("1", "first", 100);
        backend.set_tags("1", &["c++ tips"]);
        let api = api(&backend);

        assert!(api.remove_tag(&PostId::from("1"), "c++ tips").await.unwrap().is_some());
        assert_eq!(backend.requests()[0].path, "/posts/1/tags/c%2B%2B%20tips");
        assert!(backend.tags_of("1").is_empty());
    }

    #[tokio::test]
    async fn by_tag_with_empty_tag_is_empty_without_request() {
        let backend = FakeBackend::new();
        let api = api(&backend);
        assert!(api.list_posts_by_tag("").await.unwrap().is_empty());
        assert!(backend.requests().is_empty());
    }

    #[tokio::test]
    async fn by_tag_non_ok_is_empty() {
        let backend = FakeBackend::new();
        backend.fail_status("/posts/by-tag/rust", 500);
        let api = api(&backend);
        assert!(api.list_posts_by_tag("rust").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn session_is_none_when_not_ok() {
        let backend = FakeBackend::new();
        let api = api(&backend);
        assert_eq!(api.get_session().await.unwrap(), None);

        backend.log_in("ann");
        assert_eq!(api.get_session().await.unwrap().unwrap().name, "ann");
    }

    #[tokio::test]
    async fn tag_listing_paths() {
        let backend = FakeBackend::new();
        let api = api(&backend);
        api.list_tags(None).await.unwrap();
        api.list_tags(Some(&PostId::from("9"))).await.unwrap();
        let paths: Vec<String> = backend.requests().into_iter().map(|r| r.path).collect();
        assert_eq!(paths, vec!["/tags".to_string(), "/tags?post_id=9".to_string()]);
    }

    #[tokio::test]
    async fn list_reads_ignore_error_status() {
        let backend = FakeBackend::new();
        backend.fail_status("/posts", 500);
        let api = api(&backend);
        assert!(api.list_posts().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn network_failures_propagate() {
        let backend = FakeBackend::new();
        backend.fail_network("/posts");
        let api = api(&backend);
        assert!(api.list_posts().await.unwrap_err().is_transport());
    }

    #[tokio::test]
    async fn login_rejection_carries_server_message() {
        let backend = FakeBackend::new();
        backend.register("ann", "ann@x.io", "pw");
        let api = api(&backend);

        match api.login("ann@x.io", "wrong").await {
            Err(ApiError::Rejected { status, message }) => {
                assert_eq!(status, 401);
                assert_eq!(message.as_deref(), Some("invalid credentials"));
            }
            other => panic!("unexpected {other:?}"),
        }

        let user = api.login("ann@x.io", "pw").await.unwrap();
        assert_eq!(user.unwrap().name, "ann");
        assert_eq!(api.get_session().await.unwrap().unwrap().name, "ann");
    }

    #[tokio::test]
    async fn comment_write_reports_status() {
        let backend = FakeBackend::new();
        let api = api(&backend);
        // Anonymous writes are refused by the backend.
        let err = api
            .create_comment(&PostId::from("1"), "hello")
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::Status { status: 401, .. }));
    }
}
