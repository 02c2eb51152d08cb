use std::cell::OnceCell;
use std::rc::Rc;

use tracing::{debug, warn};

use super::{FeedView, LateRegion};
use crate::dom::{el, Element, FormFields, Node, Region, RenderTicket};
use crate::model::{LinkPreview, Post, PostId};
use crate::spawn::spawn_detached;

/// Newest first; posts without a timestamp count as 0. Stable.
pub fn sort_newest_first(posts: &mut [Post]) {
    posts.sort_by_key(|p| std::cmp::Reverse(p.created_at.unwrap_or(0)));
}

pub(super) fn tags_slot(id: &PostId) -> String {
    format!("tags-{id}")
}

pub(super) fn comments_slot(id: &PostId) -> String {
    format!("comments-{id}")
}

fn non_empty(s: &Option<String>) -> Option<&str> {
    s.as_deref().filter(|s| !s.is_empty())
}

impl FeedView {
    /// Renders the post list into `feed`, honouring the `tag` query parameter.
    ///
    /// Returns once the list is attached; tags and comments for each post are
    /// filled in by spawned renders afterwards.
    pub async fn render_feed(&self, feed: Rc<dyn Region>, banner: Rc<dyn Region>) {
        let ticket = feed.begin_render();
        let banner_ticket = banner.begin_render();
        feed.clear();

        let filter = self.host.query_param("tag").filter(|t| !t.is_empty());
        let fetched = match &filter {
            Some(tag) => {
                self.render_filter_banner(banner.as_ref(), banner_ticket, tag);
                self.api.list_posts_by_tag(tag).await
            }
            None => {
                banner.commit(banner_ticket, Vec::new());
                self.api.list_posts().await
            }
        };
        let mut posts = fetched.unwrap_or_else(|e| {
            warn!(error = %e, tag = ?filter, "feed fetch failed");
            Vec::new()
        });
        sort_newest_first(&mut posts);

        let mut late = Vec::with_capacity(posts.len());
        let blocks: Vec<Node> = posts
            .iter()
            .map(|post| {
                let comments: LateRegion = Rc::new(OnceCell::new());
                late.push(comments.clone());
                self.post_block(post, comments).into()
            })
            .collect();

        let Some(mut slots) = feed.commit(ticket, blocks) else {
            return;
        };
        debug!(posts = posts.len(), "feed rendered");

        for (post, comments_cell) in posts.iter().zip(late) {
            if let Some(tags) = slots.take(&tags_slot(&post.id)) {
                self.spawn_tags(post.id.clone(), tags);
            }
            if let Some(comments) = slots.take(&comments_slot(&post.id)) {
                let _ = comments_cell.set(comments.clone());
                self.spawn_comments(post.id.clone(), comments);
            }
        }
    }

    /// Fire-and-forget [`FeedView::render_feed`].
    pub fn spawn_feed(&self, feed: Rc<dyn Region>, banner: Rc<dyn Region>) {
        let view = self.clone();
        spawn_detached(async move { view.render_feed(feed, banner).await });
    }

    fn render_filter_banner(&self, banner: &dyn Region, ticket: RenderTicket, tag: &str) {
        let host = self.host.clone();
        banner.commit(ticket, vec![el("div")
            .class("tag-filter")
            .child(
                el("div")
                    .text("Showing posts tagged with: ")
                    .child(el("span").class("tag").child(self.markup(tag))),
            )
            .child(
                el("button")
                    .id("clear-tag-filter")
                    .text("Clear Filter")
                    .on_click(move || host.navigate("/")),
            )
            .into()]);
    }

    fn post_block(&self, post: &Post, comments: LateRegion) -> Element {
        let id = &post.id;
        let mut block = el("div").class("post").child(
            el("div")
                .class("post-title")
                .child(self.markup(&post.title))
                .text(" ")
                .child(
                    el("span")
                        .class("post-meta")
                        .text("by ")
                        .child(self.author_link(post.author_name.as_deref()))
                        .text(self.age_suffix(post.created_at)),
                ),
        );
        block = block.child(el("div").class("post-content").child(self.body(&post.content)));
        if let Some(card) = post.link_preview.as_ref().and_then(|lp| self.link_preview(lp)) {
            block = block.child(card);
        }
        block
            .child(
                el("div")
                    .class("tags-container")
                    .id(format!("tags-{id}"))
                    .slot(tags_slot(id)),
            )
            .child(
                el("div")
                    .class("comments")
                    .id(format!("comments-{id}"))
                    .slot(comments_slot(id)),
            )
            .child(self.comment_form(id, comments))
    }

    fn link_preview(&self, lp: &LinkPreview) -> Option<Element> {
        let url = non_empty(&lp.url)?;
        let mut card = el("div").class("link-preview");
        if let Some(image) = non_empty(&lp.image) {
            card = card.child(el("img").attr("src", image).attr("alt", "preview image"));
        }
        let title = non_empty(&lp.title).unwrap_or(url);
        let description = non_empty(&lp.description).unwrap_or("");
        Some(
            card.child(
                el("div")
                    .child(el("div").class("link-preview-title").child(self.markup(title)))
                    .child(
                        el("div")
                            .class("link-preview-description")
                            .child(self.markup(description)),
                    )
                    .child(
                        el("a")
                            .attr("href", url)
                            .attr("target", "_blank")
                            .child(self.markup(url)),
                    ),
            ),
        )
    }

    fn comment_form(&self, post_id: &PostId, comments: LateRegion) -> Element {
        let view = self.clone();
        let post_id_for_handler = post_id.clone();
        el("form")
            .class("comment-form")
            .attr("data-post-id", post_id.as_str())
            .child(
                el("input")
                    .attr("type", "text")
                    .attr("placeholder", "Add a comment...")
                    .attr("required", ""),
            )
            .child(el("button").attr("type", "submit").text("Comment"))
            .on_submit(move |fields: FormFields| {
                let Some(region) = comments.get().cloned() else {
                    return;
                };
                let content = fields.value(0);
                // Hosts without native validation still honour `required`.
                if content.is_empty() {
                    return;
                }
                let view = view.clone();
                let post_id = post_id_for_handler.clone();
                spawn_detached(async move {
                    match view.api.create_comment(&post_id, &content).await {
                        Err(e) if e.is_transport() => {
                            warn!(error = %e, post = %post_id, "comment not sent");
                            return;
                        }
                        Err(e) => warn!(error = %e, post = %post_id, "comment rejected"),
                        Ok(()) => {}
                    }
                    fields.clear();
                    view.spawn_comments(post_id, region);
                });
            })
    }
}
