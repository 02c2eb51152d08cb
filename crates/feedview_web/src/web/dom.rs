//! Regions and host backed by the live document.

use std::rc::Rc;

use feedview::dom::{Field, FormFields, Generation, Host, Listener, Node, Region, Slots};
use wasm_bindgen::closure::Closure;
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;

/// Container element owned by one renderer.
pub(super) struct DomRegion {
    element: web_sys::Element,
    generation: Generation,
}

impl DomRegion {
    pub(super) fn new(element: web_sys::Element) -> Rc<Self> {
        Rc::new(Self {
            element,
            generation: Generation::default(),
        })
    }

    fn mount(&self, nodes: Vec<Node>) -> Slots {
        let mut slots = Slots::default();
        let Some(document) = self.element.owner_document() else {
            tracing::warn!("region is detached from any document");
            return slots;
        };
        if let Err(e) = mount_into(&document, &self.element, nodes, &mut slots) {
            tracing::warn!(error = ?e, "mount failed");
        }
        slots
    }
}

impl Region for DomRegion {
    fn replace(&self, nodes: Vec<Node>) -> Slots {
        self.element.set_inner_html("");
        self.mount(nodes)
    }

    fn append(&self, nodes: Vec<Node>) -> Slots {
        self.mount(nodes)
    }

    fn generation(&self) -> &Generation {
        &self.generation
    }
}

fn mount_into(
    document: &web_sys::Document,
    parent: &web_sys::Element,
    nodes: Vec<Node>,
    slots: &mut Slots,
) -> Result<(), JsValue> {
    for node in nodes {
        match node {
            Node::Text(text) => {
                parent.append_child(&document.create_text_node(&text))?;
            }
            Node::Html(markup) => parent.insert_adjacent_html("beforeend", &markup)?,
            Node::Element(e) => {
                let element = document.create_element(e.tag)?;
                for (name, value) in &e.attrs {
                    element.set_attribute(name, value)?;
                }
                mount_into(document, &element, e.children, slots)?;
                if let Some(listener) = e.listener {
                    listen(&element, listener)?;
                }
                parent.append_child(&element)?;
                if let Some(name) = e.slot {
                    slots.insert(name, DomRegion::new(element));
                }
            }
        }
    }
    Ok(())
}

/// Wires `listener` to `element`. The closure lives as long as the page:
/// handlers may outlive every Rust handle to the region that mounted them.
fn listen(element: &web_sys::Element, listener: Listener) -> Result<(), JsValue> {
    let (event, cb) = match listener {
        Listener::Click(handler) => {
            let cb = Closure::wrap(
                Box::new(move |_: web_sys::Event| handler()) as Box<dyn FnMut(web_sys::Event)>
            );
            ("click", cb)
        }
        Listener::Submit(handler) => {
            let form = element.clone();
            (
                "submit",
                Closure::wrap(Box::new(move |ev: web_sys::Event| {
                    ev.prevent_default();
                    handler(form_fields(&form));
                }) as Box<dyn FnMut(web_sys::Event)>),
            )
        }
    };
    element.add_event_listener_with_callback(event, cb.as_ref().unchecked_ref())?;
    cb.forget();
    Ok(())
}

enum DomField {
    Input(web_sys::HtmlInputElement),
    TextArea(web_sys::HtmlTextAreaElement),
}

impl Field for DomField {
    fn value(&self) -> String {
        match self {
            DomField::Input(e) => e.value(),
            DomField::TextArea(e) => e.value(),
        }
    }

    fn set_value(&self, value: &str) {
        match self {
            DomField::Input(e) => e.set_value(value),
            DomField::TextArea(e) => e.set_value(value),
        }
    }
}

fn form_fields(form: &web_sys::Element) -> FormFields {
    let Ok(list) = form.query_selector_all("input, textarea") else {
        return FormFields::default();
    };
    let mut fields: Vec<Rc<dyn Field>> = Vec::new();
    for i in 0..list.length() {
        let Some(node) = list.get(i) else {
            continue;
        };
        let field = match node.dyn_into::<web_sys::HtmlInputElement>() {
            Ok(input) => DomField::Input(input),
            Err(node) => match node.dyn_into::<web_sys::HtmlTextAreaElement>() {
                Ok(area) => DomField::TextArea(area),
                Err(_) => continue,
            },
        };
        fields.push(Rc::new(field));
    }
    FormFields(fields)
}

/// The browser window the app runs in.
pub(super) struct BrowserHost;

impl BrowserHost {
    fn location() -> Option<web_sys::Location> {
        web_sys::window().map(|w| w.location())
    }
}

impl Host for BrowserHost {
    fn query_param(&self, name: &str) -> Option<String> {
        let search = Self::location()?.search().ok()?;
        web_sys::UrlSearchParams::new_with_str(&search).ok()?.get(name)
    }

    fn navigate(&self, href: &str) {
        if let Some(location) = Self::location() {
            let _ = location.set_href(href);
        }
    }

    fn reload(&self) {
        if let Some(location) = Self::location() {
            let _ = location.reload();
        }
    }

    fn clear_session_cookie(&self) {
        let document = web_sys::window()
            .and_then(|w| w.document())
            .and_then(|d| d.dyn_into::<web_sys::HtmlDocument>().ok());
        if let Some(document) = document {
            let _ = document.set_cookie("session=; Max-Age=0; path=/;");
        }
    }
}
