use std::rc::Rc;

use tracing::{debug, warn};
use urlencoding::encode;

use super::FeedView;
use crate::dom::{el, Element, FormFields, Node, Region};
use crate::model::PostId;
use crate::spawn::spawn_detached;

fn chip_slot(index: usize) -> String {
    format!("chip-{index}")
}

impl FeedView {
    /// Renders the tag chips of one post, plus the add-tag form for
    /// logged-in users. Every re-render is a full re-fetch.
    pub async fn render_tags(&self, post_id: PostId, container: Rc<dyn Region>) {
        let ticket = container.begin_render();

        let (tags, session) =
            futures::join!(self.api.list_tags(Some(&post_id)), self.session());
        let tags = tags.unwrap_or_else(|e| {
            debug!(error = %e, post = %post_id, "tag fetch failed");
            Vec::new()
        });

        let chips: Vec<Node> = tags
            .iter()
            .enumerate()
            .map(|(i, tag)| {
                el("span")
                    .class("tag")
                    .child(
                        el("a")
                            .attr("href", format!("/?tag={}", encode(tag)))
                            .child(self.markup(tag)),
                    )
                    .slot(chip_slot(i))
                    .into()
            })
            .collect();
        let mut block = el("div").class("tags").children(chips);
        if session.is_some() {
            block = block.child(self.tag_form(&post_id, &container));
        }

        let Some(mut slots) = container.commit(ticket, vec![block.into()]) else {
            return;
        };

        // Each chip checks the session on its own and grows its remove
        // control whenever that answer arrives.
        for (i, tag) in tags.into_iter().enumerate() {
            let Some(chip) = slots.take(&chip_slot(i)) else {
                continue;
            };
            let view = self.clone();
            let post_id = post_id.clone();
            let container = container.clone();
            spawn_detached(async move {
                if view.session().await.is_none() {
                    return;
                }
                let remove = view.remove_control(post_id, tag, container);
                chip.append(vec![remove.into()]);
            });
        }
    }

    /// Fire-and-forget [`FeedView::render_tags`].
    pub fn spawn_tags(&self, post_id: PostId, container: Rc<dyn Region>) {
        let view = self.clone();
        spawn_detached(async move { view.render_tags(post_id, container).await });
    }

    fn remove_control(&self, post_id: PostId, tag: String, container: Rc<dyn Region>) -> Element {
        let view = self.clone();
        el("span").class("remove").text("×").on_click(move || {
            let view = view.clone();
            let post_id = post_id.clone();
            let tag = tag.clone();
            let container = container.clone();
            spawn_detached(async move {
                if let Err(e) = view.api.remove_tag(&post_id, &tag).await {
                    warn!(error = %e, post = %post_id, tag = %tag, "tag not removed");
                    return;
                }
                view.spawn_tags(post_id, container);
            });
        })
    }

    fn tag_form(&self, post_id: &PostId, container: &Rc<dyn Region>) -> Element {
        let view = self.clone();
        let post_id = post_id.clone();
        let container = container.clone();
        el("form")
            .class("tag-form")
            .child(
                el("input")
                    .attr("type", "text")
                    .attr("placeholder", "Add tag..."),
            )
            .child(el("button").attr("type", "submit").text("Add"))
            .on_submit(move |fields: FormFields| {
                let tag = fields.value(0).trim().to_string();
                if tag.is_empty() {
                    return;
                }
                let view = view.clone();
                let post_id = post_id.clone();
                let container = container.clone();
                spawn_detached(async move {
                    if let Err(e) = view.api.add_tag(&post_id, &tag).await {
                        warn!(error = %e, post = %post_id, tag = %tag, "tag not added");
                        return;
                    }
                    fields.clear();
                    view.spawn_tags(post_id, container);
                });
            })
    }
}
