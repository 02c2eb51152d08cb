use std::rc::Rc;

use tracing::debug;

use super::FeedView;
use crate::dom::{el, Node, Region};
use crate::model::PostId;
use crate::spawn::spawn_detached;

impl FeedView {
    /// Replaces `container` with the current comments of `post_id`.
    pub async fn render_comments(&self, post_id: PostId, container: Rc<dyn Region>) {
        let ticket = container.begin_render();
        let comments = self.api.list_comments(&post_id).await.unwrap_or_else(|e| {
            debug!(error = %e, post = %post_id, "comment fetch failed");
            Vec::new()
        });

        let lines: Vec<Node> = comments
            .iter()
            .map(|c| {
                el("div")
                    .class("comment")
                    .child(self.body(&c.content))
                    .text(" ")
                    .child(
                        el("span")
                            .class("comment-meta")
                            .text("by ")
                            .child(self.author_link(c.author_name.as_deref()))
                            .text(self.age_suffix(c.created_at)),
                    )
                    .into()
            })
            .collect();
        container.commit(ticket, lines);
    }

    /// Fire-and-forget [`FeedView::render_comments`].
    pub fn spawn_comments(&self, post_id: PostId, container: Rc<dyn Region>) {
        let view = self.clone();
        spawn_detached(async move { view.render_comments(post_id, container).await });
    }
}
