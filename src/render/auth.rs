use tracing::warn;

use super::FeedView;
use crate::dom::{el, Node, Region};
use crate::model::User;
use crate::spawn::spawn_detached;

impl FeedView {
    /// Header links for the current session state.
    pub fn render_auth_links(&self, region: &dyn Region, user: Option<&User>) {
        let nodes = match user {
            Some(user) => {
                let view = self.clone();
                vec![
                    el("span")
                        .text("Logged in as ")
                        .child(el("b").child(self.markup(&user.name)))
                        .into(),
                    Node::Text(" ".into()),
                    el("button")
                        .id("logoutBtn")
                        .text("Logout")
                        .on_click(move || view.spawn_logout())
                        .into(),
                ]
            }
            None => vec![
                el("a").attr("href", "/login.html").text("Login").into(),
                Node::Text(" | ".into()),
                el("a").attr("href", "/signup.html").text("Sign Up").into(),
            ],
        };
        region.replace(nodes);
    }

    fn spawn_logout(&self) {
        let view = self.clone();
        spawn_detached(async move {
            if let Err(e) = view.api.logout().await {
                warn!(error = %e, "logout failed");
                return;
            }
            view.host.clear_session_cookie();
            view.host.reload();
        });
    }
}
