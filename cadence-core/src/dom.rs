//! In-memory document the bindings write into.

use std::{collections::BTreeMap, fmt, fmt::Write as _};

use itertools::Itertools;

use crate::value::Value;

#[derive(Copy, Clone, Debug, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct ElementId(u64);

impl fmt::Display for ElementId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "cadence-{}", self.0)
    }
}

#[derive(Clone, Debug, Default)]
pub struct Element {
    tag: String,
    classes: Vec<String>,
    attributes: BTreeMap<String, String>,
    text: Option<String>,
    children: Vec<ElementId>,
    parent: Option<ElementId>,
}

impl Element {
    pub fn tag(&self) -> &str {
        &self.tag
    }

    pub fn classes(&self) -> &[String] {
        &self.classes
    }

    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes.get(name).map(String::as_str)
    }

    pub fn text(&self) -> Option<&str> {
        self.text.as_deref()
    }

    pub fn children(&self) -> &[ElementId] {
        &self.children
    }
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Mutation {
    AddClass { element: ElementId, class: String },
    RemoveClass { element: ElementId, class: String },
    SetAttribute { element: ElementId, name: String, value: String },
    RemoveAttribute { element: ElementId, name: String },
}

impl fmt::Display for Mutation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Mutation::AddClass { element, class } => write!(f, "{element}: +class {class}"),
            Mutation::RemoveClass { element, class } => write!(f, "{element}: -class {class}"),
            Mutation::SetAttribute {
                element,
                name,
                value,
            } => write!(f, "{element}: {name}={value:?}"),
            Mutation::RemoveAttribute { element, name } => write!(f, "{element}: -{name}"),
        }
    }
}

#[derive(Debug, Default)]
pub struct Document {
    next_id: u64,
    elements: BTreeMap<ElementId, Element>,
    mutations: Vec<Mutation>,
}

impl Document {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn create_element(&mut self, tag: &str) -> ElementId {
        self.next_id += 1;
        let id = ElementId(self.next_id);
        self.elements.insert(
            id,
            Element {
                tag: tag.to_owned(),
                ..Element::default()
            },
        );
        id
    }

    pub fn append_child(&mut self, parent: ElementId, child: ElementId) {
        if !self.elements.contains_key(&child) {
            log::warn!("cannot append missing element {}", child);
            return;
        }
        let Some(parent_element) = self.elements.get_mut(&parent) else {
            log::warn!("cannot append to missing element {}", parent);
            return;
        };
        parent_element.children.push(child);
        if let Some(child_element) = self.elements.get_mut(&child) {
            child_element.parent = Some(parent);
        }
    }

    /// Removes the element and all of its descendants.
    pub fn remove_element(&mut self, id: ElementId) {
        let Some(element) = self.elements.remove(&id) else {
            return;
        };
        if let Some(parent) = element.parent.and_then(|p| self.elements.get_mut(&p)) {
            parent.children.retain(|child| *child != id);
        }
        for child in element.children {
            self.remove_element(child);
        }
    }

    pub fn element(&self, id: ElementId) -> Option<&Element> {
        self.elements.get(&id)
    }

    pub fn contains(&self, id: ElementId) -> bool {
        self.elements.contains_key(&id)
    }

    pub fn len(&self) -> usize {
        self.elements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    pub fn has_class(&self, id: ElementId, class: &str) -> bool {
        self.element(id)
            .is_some_and(|element| element.classes.iter().any(|c| c == class))
    }

    pub fn attribute(&self, id: ElementId, name: &str) -> Option<&str> {
        self.element(id).and_then(|element| element.attribute(name))
    }

    pub fn set_text(&mut self, id: ElementId, text: impl Into<String>) {
        if let Some(element) = self.element_mut(id) {
            element.text = Some(text.into());
        }
    }

    pub fn add_class(&mut self, id: ElementId, class: &str) {
        let Some(element) = self.element_mut(id) else {
            return;
        };
        if element.classes.iter().any(|c| c == class) {
            return;
        }
        element.classes.push(class.to_owned());
        self.mutations.push(Mutation::AddClass {
            element: id,
            class: class.to_owned(),
        });
    }

    pub fn remove_class(&mut self, id: ElementId, class: &str) {
        let Some(element) = self.element_mut(id) else {
            return;
        };
        let before = element.classes.len();
        element.classes.retain(|c| c != class);
        if element.classes.len() != before {
            self.mutations.push(Mutation::RemoveClass {
                element: id,
                class: class.to_owned(),
            });
        }
    }

    pub fn set_attribute(&mut self, id: ElementId, name: &str, value: &str) {
        let Some(element) = self.element_mut(id) else {
            return;
        };
        if element.attribute(name) == Some(value) {
            return;
        }
        element.attributes.insert(name.to_owned(), value.to_owned());
        self.mutations.push(Mutation::SetAttribute {
            element: id,
            name: name.to_owned(),
            value: value.to_owned(),
        });
    }

    pub fn remove_attribute(&mut self, id: ElementId, name: &str) {
        let Some(element) = self.element_mut(id) else {
            return;
        };
        if element.attributes.remove(name).is_some() {
            self.mutations.push(Mutation::RemoveAttribute {
                element: id,
                name: name.to_owned(),
            });
        }
    }

    /// Maps a bound value onto an attribute. Strings and numbers (but NaN) are
    /// written as text, `true` makes a boolean attribute present, anything
    /// else removes the attribute.
    pub fn apply_attribute(&mut self, id: ElementId, name: &str, value: &Value) {
        match value {
            Value::String(s) => self.set_attribute(id, name, s),
            Value::Number(n) if !n.is_nan() => self.set_attribute(id, name, &value.to_string()),
            Value::Bool(true) => self.set_attribute(id, name, ""),
            _ => self.remove_attribute(id, name),
        }
    }

    pub fn mutations(&self) -> &[Mutation] {
        &self.mutations
    }

    pub fn take_mutations(&mut self) -> Vec<Mutation> {
        std::mem::take(&mut self.mutations)
    }

    /// Markup of the element and its subtree, for display and debugging.
    pub fn outer_html(&self, id: ElementId) -> String {
        let mut out = String::new();
        self.write_html(id, &mut out);
        out
    }

    fn write_html(&self, id: ElementId, out: &mut String) {
        let Some(element) = self.element(id) else {
            return;
        };
        let _ = write!(out, "<{} id=\"{}\"", element.tag, id);
        if !element.classes.is_empty() {
            let _ = write!(out, " class=\"{}\"", element.classes.iter().join(" "));
        }
        for (name, value) in &element.attributes {
            if value.is_empty() {
                let _ = write!(out, " {}", name);
            } else {
                let _ = write!(out, " {}=\"{}\"", name, value);
            }
        }
        out.push('>');
        if let Some(text) = &element.text {
            out.push_str(text);
        }
        for child in &element.children {
            self.write_html(*child, out);
        }
        let _ = write!(out, "</{}>", element.tag);
    }

    fn element_mut(&mut self, id: ElementId) -> Option<&mut Element> {
        let element = self.elements.get_mut(&id);
        if element.is_none() {
            log::warn!("write to missing element {}", id);
        }
        element
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn class_writes_are_recorded_once() {
        let mut doc = Document::new();
        let row = doc.create_element("tr");
        doc.add_class(row, "quiet");
        doc.add_class(row, "quiet");
        doc.remove_class(row, "quiet");
        doc.remove_class(row, "quiet");
        assert_eq!(
            doc.take_mutations(),
            vec![
                Mutation::AddClass {
                    element: row,
                    class: "quiet".into()
                },
                Mutation::RemoveClass {
                    element: row,
                    class: "quiet".into()
                },
            ]
        );
    }

    #[test]
    fn apply_attribute_maps_value_types() {
        let mut doc = Document::new();
        let button = doc.create_element("button");
        doc.apply_attribute(button, "title", &Value::from("Song A"));
        doc.apply_attribute(button, "tabindex", &Value::from(3));
        doc.apply_attribute(button, "disabled", &Value::Bool(true));
        assert_eq!(doc.attribute(button, "title"), Some("Song A"));
        assert_eq!(doc.attribute(button, "tabindex"), Some("3"));
        assert_eq!(doc.attribute(button, "disabled"), Some(""));

        doc.apply_attribute(button, "disabled", &Value::Bool(false));
        doc.apply_attribute(button, "title", &Value::Null);
        doc.apply_attribute(button, "tabindex", &Value::Number(f64::NAN));
        assert_eq!(doc.attribute(button, "disabled"), None);
        assert_eq!(doc.attribute(button, "title"), None);
        assert_eq!(doc.attribute(button, "tabindex"), None);
    }

    #[test]
    fn unchanged_attribute_is_not_rewritten() {
        let mut doc = Document::new();
        let cell = doc.create_element("td");
        doc.set_attribute(cell, "title", "Song A");
        doc.set_attribute(cell, "title", "Song A");
        assert_eq!(doc.mutations().len(), 1);
    }

    #[test]
    fn writes_to_missing_elements_are_ignored() {
        let mut doc = Document::new();
        let cell = doc.create_element("td");
        doc.remove_element(cell);
        doc.add_class(cell, "x");
        doc.set_attribute(cell, "title", "y");
        assert!(doc.mutations().is_empty());
    }

    #[test]
    fn removing_an_element_removes_its_subtree() {
        let mut doc = Document::new();
        let table = doc.create_element("table");
        let row = doc.create_element("tr");
        let cell = doc.create_element("td");
        doc.append_child(table, row);
        doc.append_child(row, cell);
        doc.remove_element(row);
        assert!(!doc.contains(cell));
        assert!(doc.element(table).unwrap().children().is_empty());
        assert_eq!(doc.len(), 1);
    }

    #[test]
    fn outer_html_renders_subtree() {
        let mut doc = Document::new();
        let row = doc.create_element("tr");
        let cell = doc.create_element("td");
        doc.append_child(row, cell);
        doc.add_class(row, "is-current-item");
        doc.set_attribute(cell, "title", "Song A");
        doc.set_attribute(cell, "hidden", "");
        doc.set_text(cell, "Song A");
        assert_eq!(
            doc.outer_html(row),
            format!(
                "<tr id=\"{row}\" class=\"is-current-item\">\
                 <td id=\"{cell}\" hidden title=\"Song A\">Song A</td></tr>"
            )
        );
    }
}
