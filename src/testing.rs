//! Test support: an in-process backend speaking the feed's REST dialect.

use std::cell::RefCell;
use std::collections::{BTreeMap, HashMap, HashSet, VecDeque};
use std::future::Future;
use std::rc::Rc;

use async_trait::async_trait;
use futures::channel::oneshot;
use serde_json::{json, Value};

use crate::error::ApiError;
use crate::transport::{HttpRequest, HttpResponse, Method, Transport};

pub(crate) const NOW: i64 = 1_750_000_000;

#[derive(Default)]
struct State {
    posts: Vec<Value>,
    comments: Vec<Value>,
    tags: BTreeMap<String, Vec<String>>,
    users: Vec<(String, String, String)>,
    session: Option<String>,
    next_id: u64,
}

impl State {
    fn next_id(&mut self, prefix: &str) -> String {
        self.next_id += 1;
        format!("{prefix}{}", self.next_id)
    }
}

#[derive(Default)]
pub(crate) struct FakeBackend {
    state: RefCell<State>,
    log: RefCell<Vec<HttpRequest>>,
    statuses: RefCell<HashMap<String, u16>>,
    network: RefCell<HashSet<String>>,
    gates: RefCell<HashMap<String, VecDeque<oneshot::Receiver<()>>>>,
}

impl FakeBackend {
    pub(crate) fn new() -> Rc<Self> {
        Rc::new(Self::default())
    }

    pub(crate) fn add_post(&self, id: &str, title: &str, created_at: i64) {
        self.insert_post(json!({
            "id": id,
            "title": title,
            "content": format!("body of {title}"),
            "author_name": "ann",
            "created_at": created_at,
        }));
    }

    pub(crate) fn insert_post(&self, post: Value) {
        self.state.borrow_mut().posts.push(post);
    }

    pub(crate) fn add_comment(&self, post_id: &str, content: &str) {
        let mut state = self.state.borrow_mut();
        let id = state.next_id("c");
        state.comments.push(json!({
            "id": id,
            "post_id": post_id,
            "content": content,
            "author_name": "bo",
            "created_at": NOW - 120,
        }));
    }

    pub(crate) fn set_tags(&self, post_id: &str, tags: &[&str]) {
        self.state.borrow_mut().tags.insert(
            post_id.to_string(),
            tags.iter().map(|t| t.to_string()).collect(),
        );
    }

    pub(crate) fn tags_of(&self, post_id: &str) -> Vec<String> {
        self.state
            .borrow()
            .tags
            .get(post_id)
            .cloned()
            .unwrap_or_default()
    }

    pub(crate) fn post_titles(&self) -> Vec<String> {
        self.state
            .borrow()
            .posts
            .iter()
            .filter_map(|p| p["title"].as_str().map(str::to_string))
            .collect()
    }

    pub(crate) fn register(&self, name: &str, email: &str, password: &str) {
        self.state
            .borrow_mut()
            .users
            .push((name.into(), email.into(), password.into()));
    }

    pub(crate) fn log_in(&self, name: &str) {
        self.state.borrow_mut().session = Some(name.to_string());
    }

    pub(crate) fn session(&self) -> Option<String> {
        self.state.borrow().session.clone()
    }

    /// Every request to `path` answers with `status` and an error body.
    pub(crate) fn fail_status(&self, path: &str, status: u16) {
        self.statuses.borrow_mut().insert(path.to_string(), status);
    }

    /// Every request to `path` fails before reaching the server.
    pub(crate) fn fail_network(&self, path: &str) {
        self.network.borrow_mut().insert(path.to_string());
    }

    /// Holds the next request to `path` until the returned sender fires.
    pub(crate) fn hold(&self, path: &str) -> oneshot::Sender<()> {
        let (tx, rx) = oneshot::channel();
        self.gates
            .borrow_mut()
            .entry(path.to_string())
            .or_default()
            .push_back(rx);
        tx
    }

    pub(crate) fn requests(&self) -> Vec<HttpRequest> {
        self.log.borrow().clone()
    }

    pub(crate) fn count(&self, method: Method, path: &str) -> usize {
        self.log
            .borrow()
            .iter()
            .filter(|r| r.method == method && r.path == path)
            .count()
    }

    fn route(&self, request: &HttpRequest) -> HttpResponse {
        let (route, query) = request
            .path
            .split_once('?')
            .unwrap_or((request.path.as_str(), ""));
        let query: HashMap<String, String> = url::form_urlencoded::parse(query.as_bytes())
            .into_owned()
            .collect();
        let segments: Vec<String> = route
            .trim_start_matches('/')
            .split('/')
            .map(|s| {
                urlencoding::decode(s)
                    .map(|s| s.into_owned())
                    .unwrap_or_else(|_| s.to_string())
            })
            .collect();
        let segments: Vec<&str> = segments.iter().map(String::as_str).collect();
        let body = request.body.clone().unwrap_or(Value::Null);
        let mut state = self.state.borrow_mut();

        let reply = |status: u16, value: Value| HttpResponse::new(status, value.to_string());

        match (request.method, segments.as_slice()) {
            (Method::Get, ["users", "me"]) => match &state.session {
                Some(name) => reply(200, json!({ "user": { "id": format!("u-{name}"), "name": name } })),
                None => reply(401, json!({ "user": null })),
            },
            (Method::Post, ["logout"]) => {
                state.session = None;
                reply(200, json!({ "message": "logged out" }))
            }
            (Method::Get, ["posts"]) => reply(200, json!({ "posts": state.posts })),
            (Method::Post, ["posts"]) => {
                let Some(author) = state.session.clone() else {
                    return reply(401, json!({ "error": "login required" }));
                };
                let id = state.next_id("p");
                let post = json!({
                    "id": id,
                    "title": body["title"],
                    "content": body["content"],
                    "author_name": author,
                    "created_at": NOW,
                });
                state.posts.push(post.clone());
                reply(201, json!({ "post": post }))
            }
            (Method::Get, ["comments"]) => {
                let post_id = query.get("post_id").cloned().unwrap_or_default();
                let comments: Vec<&Value> = state
                    .comments
                    .iter()
                    .filter(|c| c["post_id"] == json!(post_id))
                    .collect();
                reply(200, json!({ "comments": comments }))
            }
            (Method::Post, ["comments"]) => {
                let Some(author) = state.session.clone() else {
                    return reply(401, json!({ "error": "login required" }));
                };
                let id = state.next_id("c");
                let comment = json!({
                    "id": id,
                    "post_id": body["post_id"],
                    "content": body["content"],
                    "author_name": author,
                    "created_at": NOW,
                });
                state.comments.push(comment.clone());
                reply(201, json!({ "comment": comment }))
            }
            (Method::Get, ["tags"]) => {
                let tags: Vec<String> = match query.get("post_id") {
                    Some(id) => state.tags.get(id).cloned().unwrap_or_default(),
                    None => {
                        let mut all: Vec<String> = state.tags.values().flatten().cloned().collect();
                        all.sort();
                        all.dedup();
                        all
                    }
                };
                reply(200, json!({ "tags": tags }))
            }
            (Method::Get, ["posts", "by-tag", tag]) => {
                let posts: Vec<&Value> = state
                    .posts
                    .iter()
                    .filter(|p| {
                        let id = p["id"].as_str().unwrap_or_default();
                        state
                            .tags
                            .get(id)
                            .map(|tags| tags.iter().any(|t| t == tag))
                            .unwrap_or(false)
                    })
                    .collect();
                reply(200, json!({ "posts": posts }))
            }
            (Method::Post, ["posts", id, "tags"]) => {
                let tag = body["tag"].as_str().unwrap_or_default().to_string();
                let tags = state.tags.entry(id.to_string()).or_default();
                tags.push(tag);
                reply(200, json!({ "tags": tags }))
            }
            (Method::Delete, ["posts", id, "tags", tag]) => {
                let tags = state.tags.entry(id.to_string()).or_default();
                tags.retain(|t| t != tag);
                reply(200, json!({ "tags": tags }))
            }
            (Method::Post, ["signup"]) => {
                let field = |k: &str| body[k].as_str().unwrap_or_default().to_string();
                let (name, email, password) = (field("name"), field("email"), field("password"));
                if name.is_empty() || email.is_empty() || password.is_empty() {
                    return reply(400, json!({ "error": "all fields required" }));
                }
                state.users.push((name.clone(), email, password));
                state.session = Some(name.clone());
                reply(201, json!({ "user": { "id": format!("u-{name}"), "name": name } }))
            }
            (Method::Post, ["login"]) => {
                let email = body["email"].as_str().unwrap_or_default();
                let password = body["password"].as_str().unwrap_or_default();
                let found = state
                    .users
                    .iter()
                    .find(|(_, e, p)| e == email && p == password)
                    .map(|(n, _, _)| n.clone());
                match found {
                    Some(name) => {
                        state.session = Some(name.clone());
                        reply(200, json!({ "user": { "id": format!("u-{name}"), "name": name } }))
                    }
                    None => reply(401, json!({ "error": "invalid credentials" })),
                }
            }
            _ => reply(404, json!({ "error": "not found" })),
        }
    }
}

#[async_trait(?Send)]
impl Transport for FakeBackend {
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse, ApiError> {
        self.log.borrow_mut().push(request.clone());

        let gate = self
            .gates
            .borrow_mut()
            .get_mut(&request.path)
            .and_then(|q| q.pop_front());
        if let Some(gate) = gate {
            let _ = gate.await;
        }

        if self.network.borrow().contains(&request.path) {
            return Err(ApiError::Network("connection refused".into()));
        }
        let forced = self.statuses.borrow().get(&request.path).copied();
        if let Some(status) = forced {
            return Ok(HttpResponse::new(status, r#"{"error":"forced failure"}"#));
        }
        Ok(self.route(&request))
    }
}

/// Runs `task` and everything it spawns to completion.
pub(crate) async fn settle<F>(task: F)
where
    F: Future<Output = ()> + 'static,
{
    let local = tokio::task::LocalSet::new();
    local.spawn_local(task);
    local.await;
}
