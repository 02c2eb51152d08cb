//! In-memory page: regions that keep their node tree around so it can be
//! serialised to HTML and poked at (clicks, submits) without a browser.
//!
//! The snapshot binary renders into these, and so do the renderer tests.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use maud::Render;

use crate::dom::{
    Field, FormFields, Generation, Host, Listener, Node, Region, Slots,
};

#[derive(Debug, Default)]
pub struct MemoryField {
    value: RefCell<String>,
}

impl Field for MemoryField {
    fn value(&self) -> String {
        self.value.borrow().clone()
    }

    fn set_value(&self, value: &str) {
        *self.value.borrow_mut() = value.to_string();
    }
}

enum MemNode {
    Element(Rc<MemoryElement>),
    Text(String),
    Html(String),
}

/// A mounted element. Its children live in their own region so slotted
/// elements can be re-rendered in place.
pub struct MemoryElement {
    tag: &'static str,
    attrs: Vec<(&'static str, String)>,
    listener: Option<Listener>,
    field: Option<Rc<MemoryField>>,
    body: Rc<MemoryRegion>,
}

impl MemoryElement {
    pub fn tag(&self) -> &'static str {
        self.tag
    }

    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attrs
            .iter()
            .find(|(k, _)| *k == name)
            .map(|(_, v)| v.as_str())
    }

    pub fn has_class(&self, class: &str) -> bool {
        self.attr("class")
            .map(|c| c.split_whitespace().any(|c| c == class))
            .unwrap_or(false)
    }

    pub fn body(&self) -> &Rc<MemoryRegion> {
        &self.body
    }

    pub fn html(&self) -> String {
        let mut out = String::new();
        self.write_html(&mut out);
        out
    }

    /// Text of the subtree. Markup nodes contribute their source as-is.
    pub fn text(&self) -> String {
        self.body.text()
    }

    pub fn field(&self) -> Option<&Rc<MemoryField>> {
        self.field.as_ref()
    }

    /// Fires the click handler. Returns false when there is none.
    pub fn click(&self) -> bool {
        match &self.listener {
            Some(Listener::Click(handler)) => {
                handler();
                true
            }
            _ => false,
        }
    }

    /// Fills the form's controls with `values` (in order) and submits it.
    /// Returns false when this element has no submit handler.
    pub fn submit(&self, values: &[&str]) -> bool {
        let Some(Listener::Submit(handler)) = &self.listener else {
            return false;
        };
        let fields = self.fields();
        for (field, value) in fields.iter().zip(values) {
            field.set_value(value);
        }
        let fields = fields
            .into_iter()
            .map(|f| f as Rc<dyn Field>)
            .collect::<Vec<_>>();
        handler(FormFields(fields));
        true
    }

    /// Every form control in the subtree, in document order.
    pub fn fields(&self) -> Vec<Rc<MemoryField>> {
        let mut out = Vec::new();
        self.body.collect_fields(&mut out);
        out
    }

    fn write_html(&self, out: &mut String) {
        out.push('<');
        out.push_str(self.tag);
        for (k, v) in &self.attrs {
            out.push(' ');
            out.push_str(k);
            out.push_str("=\"");
            v.as_str().render_to(out);
            out.push('"');
        }
        out.push('>');
        if is_void(self.tag) {
            return;
        }
        self.body.write_html(out);
        out.push_str("</");
        out.push_str(self.tag);
        out.push('>');
    }
}

fn is_void(tag: &str) -> bool {
    matches!(tag, "input" | "img" | "br" | "hr")
}

fn is_control(tag: &str) -> bool {
    matches!(tag, "input" | "textarea")
}

#[derive(Default)]
pub struct MemoryRegion {
    children: RefCell<Vec<MemNode>>,
    generation: Generation,
}

impl MemoryRegion {
    pub fn new() -> Rc<Self> {
        Rc::new(Self::default())
    }

    pub fn html(&self) -> String {
        let mut out = String::new();
        self.write_html(&mut out);
        out
    }

    pub fn text(&self) -> String {
        let mut out = String::new();
        for node in self.children.borrow().iter() {
            match node {
                MemNode::Element(e) => out.push_str(&e.text()),
                MemNode::Text(t) => out.push_str(t),
                MemNode::Html(h) => out.push_str(h),
            }
        }
        out
    }

    pub fn is_empty(&self) -> bool {
        self.children.borrow().is_empty()
    }

    /// Depth-first list of elements carrying `class`.
    pub fn find_class(&self, class: &str) -> Vec<Rc<MemoryElement>> {
        let mut out = Vec::new();
        self.walk(&mut |e| {
            if e.has_class(class) {
                out.push(e.clone());
            }
        });
        out
    }

    /// Depth-first list of elements with the given tag.
    pub fn find_tag(&self, tag: &str) -> Vec<Rc<MemoryElement>> {
        let mut out = Vec::new();
        self.walk(&mut |e| {
            if e.tag == tag {
                out.push(e.clone());
            }
        });
        out
    }

    pub fn find_id(&self, id: &str) -> Option<Rc<MemoryElement>> {
        let mut found = None;
        self.walk(&mut |e| {
            if found.is_none() && e.attr("id") == Some(id) {
                found = Some(e.clone());
            }
        });
        found
    }

    fn walk(&self, f: &mut dyn FnMut(&Rc<MemoryElement>)) {
        let children: Vec<Rc<MemoryElement>> = self
            .children
            .borrow()
            .iter()
            .filter_map(|n| match n {
                MemNode::Element(e) => Some(e.clone()),
                _ => None,
            })
            .collect();
        for e in children {
            f(&e);
            e.body.walk(f);
        }
    }

    fn collect_fields(&self, out: &mut Vec<Rc<MemoryField>>) {
        self.walk(&mut |e| {
            if let Some(field) = &e.field {
                out.push(field.clone());
            }
        });
    }

    fn write_html(&self, out: &mut String) {
        for node in self.children.borrow().iter() {
            match node {
                MemNode::Element(e) => e.write_html(out),
                MemNode::Text(t) => t.as_str().render_to(out),
                MemNode::Html(h) => out.push_str(h),
            }
        }
    }

    fn mount(nodes: Vec<Node>, slots: &mut Slots) -> Vec<MemNode> {
        nodes
            .into_iter()
            .map(|node| match node {
                Node::Text(t) => MemNode::Text(t),
                Node::Html(h) => MemNode::Html(h),
                Node::Element(e) => {
                    let body = MemoryRegion::new();
                    let kids = Self::mount(e.children, slots);
                    body.children.borrow_mut().extend(kids);
                    let field = is_control(e.tag).then(|| {
                        let field = Rc::new(MemoryField::default());
                        if let Some((_, v)) = e.attrs.iter().find(|(k, _)| *k == "value") {
                            field.set_value(v);
                        }
                        field
                    });
                    if let Some(name) = e.slot {
                        slots.insert(name, body.clone());
                    }
                    MemNode::Element(Rc::new(MemoryElement {
                        tag: e.tag,
                        attrs: e.attrs,
                        listener: e.listener,
                        field,
                        body,
                    }))
                }
            })
            .collect()
    }
}

impl Region for MemoryRegion {
    fn replace(&self, nodes: Vec<Node>) -> Slots {
        let mut slots = Slots::default();
        let mounted = Self::mount(nodes, &mut slots);
        *self.children.borrow_mut() = mounted;
        slots
    }

    fn append(&self, nodes: Vec<Node>) -> Slots {
        let mut slots = Slots::default();
        let mounted = Self::mount(nodes, &mut slots);
        self.children.borrow_mut().extend(mounted);
        slots
    }

    fn generation(&self) -> &Generation {
        &self.generation
    }
}

/// Host that records what the page was asked to do.
#[derive(Default)]
pub struct MemoryHost {
    query: Vec<(String, String)>,
    navigations: RefCell<Vec<String>>,
    reloads: Cell<u32>,
    cookie_cleared: Cell<bool>,
}

impl MemoryHost {
    pub fn new() -> Rc<Self> {
        Rc::new(Self::default())
    }

    /// `query` is a raw query string such as `tag=rust&x=1` (leading `?` allowed).
    pub fn with_query(query: &str) -> Rc<Self> {
        let query = query.trim_start_matches('?');
        Rc::new(Self {
            query: url::form_urlencoded::parse(query.as_bytes())
                .into_owned()
                .collect(),
            ..Self::default()
        })
    }

    pub fn navigations(&self) -> Vec<String> {
        self.navigations.borrow().clone()
    }

    pub fn reloads(&self) -> u32 {
        self.reloads.get()
    }

    pub fn cookie_cleared(&self) -> bool {
        self.cookie_cleared.get()
    }
}

impl Host for MemoryHost {
    fn query_param(&self, name: &str) -> Option<String> {
        self.query
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.clone())
    }

    fn navigate(&self, href: &str) {
        self.navigations.borrow_mut().push(href.to_string());
    }

    fn reload(&self) {
        self.reloads.set(self.reloads.get() + 1);
    }

    fn clear_session_cookie(&self) {
        self.cookie_cleared.set(true);
    }
}
