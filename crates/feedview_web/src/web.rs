use std::rc::Rc;

use feedview::{Api, ClientConfig, FeedPage, FeedView, HttpTransport, RenderOptions};
use leptos::html;
use leptos::prelude::*;
use wasm_bindgen_futures::spawn_local;

mod console;
mod dom;

use dom::{BrowserHost, DomRegion};

pub fn start() {
    console_error_panic_hook::set_once();
    console::init_tracing();
    mount_to_body(|| view! { <App /> });
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Page {
    Feed,
    Login,
    Signup,
}

impl Page {
    fn from_path(path: &str) -> Self {
        match path.trim_end_matches('/') {
            "/login.html" | "/login" => Page::Login,
            "/signup.html" | "/signup" => Page::Signup,
            _ => Page::Feed,
        }
    }

    fn current() -> Self {
        web_sys::window()
            .and_then(|w| w.location().pathname().ok())
            .map(|p| Self::from_path(&p))
            .unwrap_or(Page::Feed)
    }
}

/// The renderers talk to the origin that served the page.
fn feed_view() -> Result<FeedView, String> {
    let window = web_sys::window().ok_or("no window".to_string())?;
    let origin = window
        .location()
        .origin()
        .map_err(|_| "location: origin unavailable".to_string())?;
    let transport = HttpTransport::new(&ClientConfig::new(origin));
    Ok(FeedView::new(
        Api::new(Rc::new(transport)),
        Rc::new(BrowserHost),
        RenderOptions::default(),
    ))
}

#[component]
fn App() -> impl IntoView {
    match Page::current() {
        Page::Feed => view! { <FeedScreen /> }.into_any(),
        Page::Login => view! { <AuthScreen page=Page::Login /> }.into_any(),
        Page::Signup => view! { <AuthScreen page=Page::Signup /> }.into_any(),
    }
}

#[component]
fn FeedScreen() -> impl IntoView {
    let auth_links = NodeRef::<html::Nav>::new();
    let composer = NodeRef::<html::Section>::new();
    let banner = NodeRef::<html::Div>::new();
    let feed = NodeRef::<html::Div>::new();
    let started = StoredValue::new(false);

    Effect::new(move |_| {
        let (Some(auth_links), Some(composer), Some(banner), Some(feed)) =
            (auth_links.get(), composer.get(), banner.get(), feed.get())
        else {
            return;
        };
        if started.get_value() {
            return;
        }
        started.set_value(true);

        let view = match feed_view() {
            Ok(v) => v,
            Err(e) => {
                tracing::error!(error = %e, "cannot start feed");
                return;
            }
        };
        let page = FeedPage {
            auth_links: DomRegion::new(auth_links.into()),
            composer: Some(DomRegion::new(composer.into())),
            banner: DomRegion::new(banner.into()),
            feed: DomRegion::new(feed.into()),
        };
        spawn_local(async move { view.start(page).await });
    });

    view! {
        <header>
            <h1>"Feed"</h1>
            <nav id="authLinks" node_ref=auth_links></nav>
        </header>
        <main>
            <section id="composer" node_ref=composer></section>
            <div id="tagFilter" node_ref=banner></div>
            <div id="feed" node_ref=feed></div>
        </main>
    }
}

#[component]
fn AuthScreen(page: Page) -> impl IntoView {
    let container = NodeRef::<html::Div>::new();
    let started = StoredValue::new(false);

    Effect::new(move |_| {
        let Some(container) = container.get() else {
            return;
        };
        if started.get_value() {
            return;
        }
        started.set_value(true);

        let view = match feed_view() {
            Ok(v) => v,
            Err(e) => {
                tracing::error!(error = %e, "cannot start form");
                return;
            }
        };
        let region = DomRegion::new(container.into());
        match page {
            Page::Signup => view.render_signup_form(region.as_ref()),
            _ => view.render_login_form(region.as_ref()),
        }
    });

    let title = match page {
        Page::Signup => "Sign Up",
        _ => "Login",
    };
    view! {
        <main>
            <h1>{title}</h1>
            <div node_ref=container></div>
            <p><a href="/">"Back to feed"</a></p>
        </main>
    }
}
