//! Renderers for the feed page.
//!
//! Each renderer owns the region it is handed and replaces its contents
//! wholesale. Sub-renders are spawned and never awaited by their parent, so a
//! slow comment fetch for one post does not hold up anything else.

mod auth;
mod comments;
mod feed;
mod forms;
mod tags;

use std::cell::OnceCell;
use std::rc::Rc;

use urlencoding::encode;

use crate::client::Api;
use crate::config::RenderOptions;
use crate::dom::{el, Element, Host, Node, Region};
use crate::linkify::{linkify, linkify_escaped};
use crate::model::{author_label, User};
use crate::time_ago::{time_ago, unix_now};

pub use feed::sort_newest_first;

/// A region whose handle only exists once the surrounding markup is mounted.
///
/// Handlers are built before the mount, so they look the region up lazily.
type LateRegion = Rc<OnceCell<Rc<dyn Region>>>;

/// Containers of the feed page.
#[derive(Clone)]
pub struct FeedPage {
    pub auth_links: Rc<dyn Region>,
    pub composer: Option<Rc<dyn Region>>,
    pub banner: Rc<dyn Region>,
    pub feed: Rc<dyn Region>,
}

/// Shared context for every renderer: the backend, the host page and the
/// rendering options. Cheap to clone; handlers keep their own copy.
#[derive(Clone)]
pub struct FeedView {
    api: Api,
    host: Rc<dyn Host>,
    clock: Rc<dyn Fn() -> i64>,
    options: RenderOptions,
}

impl FeedView {
    pub fn new(api: Api, host: Rc<dyn Host>, options: RenderOptions) -> Self {
        Self {
            api,
            host,
            clock: Rc::new(unix_now),
            options,
        }
    }

    /// Replaces the wall clock used for relative ages.
    pub fn with_clock(mut self, clock: impl Fn() -> i64 + 'static) -> Self {
        self.clock = Rc::new(clock);
        self
    }

    pub fn api(&self) -> &Api {
        &self.api
    }

    pub fn host(&self) -> &Rc<dyn Host> {
        &self.host
    }

    /// Page bootstrap: session, header links, composer, then the feed.
    pub async fn start(&self, page: FeedPage) {
        let user = self.session().await;
        self.render_auth_links(page.auth_links.as_ref(), user.as_ref());
        if let Some(composer) = &page.composer {
            self.render_composer(composer.as_ref(), page.feed.clone(), page.banner.clone());
        }
        self.render_feed(page.feed, page.banner).await;
    }

    /// Current user, with any failure read as "anonymous".
    async fn session(&self) -> Option<User> {
        match self.api.get_session().await {
            Ok(user) => user,
            Err(e) => {
                tracing::debug!(error = %e, "session check failed");
                None
            }
        }
    }

    fn now(&self) -> i64 {
        (self.clock)()
    }

    /// Backend-supplied text.
    fn markup(&self, text: &str) -> Node {
        if self.options.escape_markup {
            Node::Text(text.to_string())
        } else {
            Node::Html(text.to_string())
        }
    }

    /// Post and comment bodies, with bare URLs turned into links.
    fn body(&self, text: &str) -> Node {
        if self.options.escape_markup {
            Node::Html(linkify_escaped(text))
        } else {
            Node::Html(linkify(text))
        }
    }

    fn author_link(&self, author_name: Option<&str>) -> Element {
        let label = author_label(author_name);
        el("a")
            .attr("href", format!("/@{}", encode(label)))
            .child(self.markup(label))
    }

    /// `" • 5m ago"`, or nothing without a timestamp.
    fn age_suffix(&self, created_at: Option<i64>) -> String {
        match created_at {
            Some(ts) if ts != 0 => format!(" • {}", time_ago(Some(ts), self.now())),
            _ => String::new(),
        }
    }
}
