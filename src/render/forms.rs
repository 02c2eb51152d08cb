use std::cell::OnceCell;
use std::rc::Rc;

use tracing::warn;

use super::{FeedView, LateRegion};
use crate::dom::{el, Element, FormFields, Node, Region};
use crate::error::ApiError;
use crate::model::User;
use crate::spawn::spawn_detached;

const ERROR_SLOT: &str = "error";

/// The message to show for a finished login/signup, or `None` on success.
fn auth_failure(result: Result<Option<User>, ApiError>, fallback: &str) -> Option<String> {
    match result {
        Ok(_) => None,
        Err(ApiError::Rejected { message, .. }) => {
            Some(message.filter(|m| !m.is_empty()).unwrap_or_else(|| fallback.to_string()))
        }
        Err(e) => {
            warn!(error = %e, "auth request failed");
            Some("Network error".to_string())
        }
    }
}

fn input(id: &'static str, kind: &'static str, placeholder: &'static str) -> Element {
    el("input")
        .id(id)
        .attr("type", kind)
        .attr("placeholder", placeholder)
        .attr("required", "")
}

#[derive(Clone, Copy)]
enum AuthKind {
    Login,
    Signup,
}

impl FeedView {
    /// New-post form. After a submission the whole feed is re-rendered.
    pub fn render_composer(&self, region: &dyn Region, feed: Rc<dyn Region>, banner: Rc<dyn Region>) {
        let view = self.clone();
        region.replace(vec![el("form")
            .id("postForm")
            .child(input("title", "text", "Title"))
            .child(
                el("textarea")
                    .id("content")
                    .attr("placeholder", "What's on your mind?")
                    .attr("required", ""),
            )
            .child(el("button").attr("type", "submit").text("Post"))
            .on_submit(move |fields: FormFields| {
                let title = fields.value(0);
                let content = fields.value(1);
                let view = view.clone();
                let feed = feed.clone();
                let banner = banner.clone();
                spawn_detached(async move {
                    match view.api.create_post(&title, &content).await {
                        Err(e) if e.is_transport() => {
                            warn!(error = %e, "post not sent");
                            return;
                        }
                        Err(e) => warn!(error = %e, "post rejected"),
                        Ok(()) => {}
                    }
                    fields.clear();
                    view.spawn_feed(feed, banner);
                });
            })
            .into()]);
    }

    pub fn render_login_form(&self, region: &dyn Region) {
        self.render_auth_form(region, AuthKind::Login);
    }

    pub fn render_signup_form(&self, region: &dyn Region) {
        self.render_auth_form(region, AuthKind::Signup);
    }

    fn render_auth_form(&self, region: &dyn Region, kind: AuthKind) {
        let error: LateRegion = Rc::new(OnceCell::new());
        let form = match kind {
            AuthKind::Login => el("form")
                .id("loginForm")
                .child(input("loginEmail", "email", "Email"))
                .child(input("loginPassword", "password", "Password"))
                .child(el("button").attr("type", "submit").text("Login"))
                .child(el("div").id("loginError").class("error").slot(ERROR_SLOT)),
            AuthKind::Signup => el("form")
                .id("signupForm")
                .child(input("signupName", "text", "Name"))
                .child(input("signupEmail", "email", "Email"))
                .child(input("signupPassword", "password", "Password"))
                .child(el("button").attr("type", "submit").text("Sign Up"))
                .child(el("div").id("signupError").class("error").slot(ERROR_SLOT)),
        };

        let view = self.clone();
        let late_error = error.clone();
        let form = form.on_submit(move |fields: FormFields| {
            let Some(error) = late_error.get().cloned() else {
                return;
            };
            error.clear();
            let view = view.clone();
            spawn_detached(async move {
                let (result, fallback) = match kind {
                    AuthKind::Login => (
                        view.api.login(&fields.value(0), &fields.value(1)).await,
                        "Login failed",
                    ),
                    AuthKind::Signup => (
                        view.api
                            .signup(&fields.value(0), &fields.value(1), &fields.value(2))
                            .await,
                        "Signup failed",
                    ),
                };
                match auth_failure(result, fallback) {
                    None => view.host.navigate("/"),
                    Some(message) => {
                        error.replace(vec![Node::Text(message)]);
                    }
                }
            });
        });

        let mut slots = region.replace(vec![form.into()]);
        if let Some(slot) = slots.take(ERROR_SLOT) {
            let _ = error.set(slot);
        }
    }
}
