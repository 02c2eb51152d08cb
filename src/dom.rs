//! Page regions and the nodes renderers put into them.
//!
//! A [`Region`] is an owned handle to one container on the page. Whoever holds
//! the handle owns that subtree and replaces it wholesale; nothing looks
//! containers up by id. Renderers describe content as [`Node`] trees, and a
//! region implementation turns them into real DOM (browser) or an inspectable
//! tree (`memory`).

use std::cell::Cell;
use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;

/// One editable form control (`input` or `textarea`).
pub trait Field {
    fn value(&self) -> String;
    fn set_value(&self, value: &str);
}

/// The form's controls in document order.
#[derive(Clone, Default)]
pub struct FormFields(pub Vec<Rc<dyn Field>>);

impl FormFields {
    pub fn get(&self, index: usize) -> Option<&Rc<dyn Field>> {
        self.0.get(index)
    }

    pub fn value(&self, index: usize) -> String {
        self.get(index).map(|f| f.value()).unwrap_or_default()
    }

    pub fn clear(&self) {
        for field in &self.0 {
            field.set_value("");
        }
    }
}

pub type ClickHandler = Rc<dyn Fn()>;
pub type SubmitHandler = Rc<dyn Fn(FormFields)>;

/// Event wiring for an element. Submit handlers run with default navigation
/// already prevented.
#[derive(Clone)]
pub enum Listener {
    Click(ClickHandler),
    Submit(SubmitHandler),
}

impl fmt::Debug for Listener {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Listener::Click(_) => f.write_str("Click(..)"),
            Listener::Submit(_) => f.write_str("Submit(..)"),
        }
    }
}

#[derive(Debug, Clone)]
pub enum Node {
    Element(Element),
    /// Plain text, always escaped.
    Text(String),
    /// Markup inserted as-is.
    Html(String),
}

impl From<Element> for Node {
    fn from(e: Element) -> Self {
        Node::Element(e)
    }
}

impl From<&str> for Node {
    fn from(s: &str) -> Self {
        Node::Text(s.to_string())
    }
}

impl From<String> for Node {
    fn from(s: String) -> Self {
        Node::Text(s)
    }
}

#[derive(Debug, Clone)]
pub struct Element {
    pub tag: &'static str,
    pub attrs: Vec<(&'static str, String)>,
    pub children: Vec<Node>,
    pub listener: Option<Listener>,
    /// Named handle to this element, returned from the mount in [`Slots`].
    pub slot: Option<String>,
}

/// Starts an element builder.
pub fn el(tag: &'static str) -> Element {
    Element {
        tag,
        attrs: Vec::new(),
        children: Vec::new(),
        listener: None,
        slot: None,
    }
}

impl Element {
    pub fn attr(mut self, name: &'static str, value: impl Into<String>) -> Self {
        self.attrs.push((name, value.into()));
        self
    }

    pub fn class(self, class: &str) -> Self {
        self.attr("class", class)
    }

    pub fn id(self, id: impl Into<String>) -> Self {
        self.attr("id", id)
    }

    pub fn child(mut self, node: impl Into<Node>) -> Self {
        self.children.push(node.into());
        self
    }

    pub fn children(mut self, nodes: impl IntoIterator<Item = Node>) -> Self {
        self.children.extend(nodes);
        self
    }

    pub fn text(self, text: impl Into<String>) -> Self {
        self.child(Node::Text(text.into()))
    }

    pub fn html(self, markup: impl Into<String>) -> Self {
        self.child(Node::Html(markup.into()))
    }

    pub fn slot(mut self, name: impl Into<String>) -> Self {
        self.slot = Some(name.into());
        self
    }

    pub fn on_click(mut self, handler: impl Fn() + 'static) -> Self {
        self.listener = Some(Listener::Click(Rc::new(handler)));
        self
    }

    pub fn on_submit(mut self, handler: impl Fn(FormFields) + 'static) -> Self {
        self.listener = Some(Listener::Submit(Rc::new(handler)));
        self
    }

    pub fn get_attr(&self, name: &str) -> Option<&str> {
        self.attrs
            .iter()
            .find(|(k, _)| *k == name)
            .map(|(_, v)| v.as_str())
    }
}

/// Regions for the slotted elements of one mount, keyed by slot name.
#[derive(Default)]
pub struct Slots(HashMap<String, Rc<dyn Region>>);

impl Slots {
    pub fn insert(&mut self, name: String, region: Rc<dyn Region>) {
        self.0.insert(name, region);
    }

    pub fn take(&mut self, name: &str) -> Option<Rc<dyn Region>> {
        self.0.remove(name)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Issued when a render of a region starts; see [`Region::begin_render`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RenderTicket(u64);

/// Per-region render counter. Only the newest started render may commit.
#[derive(Debug, Default)]
pub struct Generation(Cell<u64>);

impl Generation {
    pub fn next(&self) -> RenderTicket {
        let n = self.0.get() + 1;
        self.0.set(n);
        RenderTicket(n)
    }

    pub fn is_current(&self, ticket: RenderTicket) -> bool {
        self.0.get() == ticket.0
    }
}

/// An owned page container.
pub trait Region {
    /// Drops the current contents and mounts `nodes` in their place.
    fn replace(&self, nodes: Vec<Node>) -> Slots;

    /// Mounts `nodes` after the current contents.
    fn append(&self, nodes: Vec<Node>) -> Slots;

    fn generation(&self) -> &Generation;

    fn clear(&self) {
        self.replace(Vec::new());
    }

    /// Marks the start of a render. A slower render that started earlier can
    /// no longer commit once this is called.
    fn begin_render(&self) -> RenderTicket {
        self.generation().next()
    }

    /// Replaces the contents only if `ticket` is still the newest render.
    fn commit(&self, ticket: RenderTicket, nodes: Vec<Node>) -> Option<Slots> {
        if !self.generation().is_current(ticket) {
            tracing::debug!("dropping stale render");
            return None;
        }
        Some(self.replace(nodes))
    }
}

/// The page around the regions: URL, navigation and cookies.
pub trait Host {
    fn query_param(&self, name: &str) -> Option<String>;
    fn navigate(&self, href: &str);
    fn reload(&self);
    fn clear_session_cookie(&self);
}
