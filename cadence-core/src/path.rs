use std::{fmt, str::FromStr};

use itertools::Itertools;

use crate::{
    context::{Context, ObjectRef},
    value::Value,
};

const THIS: &str = "this";

/// Path from a root context to a value, e.g. `song.title`.
#[derive(Clone, Debug, Eq, PartialEq, Hash)]
pub enum KeyPath {
    /// The root context itself.
    This,
    Keys(Vec<String>),
}

impl KeyPath {
    pub fn parse(text: &str) -> Self {
        let text = text.trim();
        let text = text.strip_prefix("this.").unwrap_or(text);
        if text.is_empty() || text == THIS {
            return KeyPath::This;
        }
        KeyPath::Keys(text.split('.').map(str::to_owned).collect())
    }

    pub fn is_this(&self) -> bool {
        matches!(self, KeyPath::This)
    }

    pub fn keys(&self) -> &[String] {
        match self {
            KeyPath::This => &[],
            KeyPath::Keys(keys) => keys,
        }
    }

    pub fn last_key(&self) -> Option<&str> {
        self.keys().last().map(String::as_str)
    }
}

impl FromStr for KeyPath {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self::parse(s))
    }
}

impl fmt::Display for KeyPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            KeyPath::This => f.write_str(THIS),
            KeyPath::Keys(keys) => f.write_str(&keys.iter().join(".")),
        }
    }
}

#[derive(Clone, Debug)]
pub enum Lookup {
    Found(Value),
    NotFound,
}

impl Lookup {
    /// Missing values read as `undefined`.
    pub fn into_value(self) -> Value {
        match self {
            Lookup::Found(value) => value,
            Lookup::NotFound => Value::Undefined,
        }
    }

    pub fn is_found(&self) -> bool {
        matches!(self, Lookup::Found(_))
    }
}

pub fn resolve(root: &ObjectRef, path: &KeyPath) -> Lookup {
    let mut current = Value::Object(root.clone());
    for key in path.keys() {
        match current.get(key) {
            Some(next) => current = next,
            None => return Lookup::NotFound,
        }
    }
    Lookup::Found(current)
}

/// Objects whose change may alter the value at `path`: the root, then every
/// object reached along the way, stopping at the owner of the last key.
pub(crate) fn chain(root: &ObjectRef, path: &KeyPath) -> Vec<ObjectRef> {
    let mut objects = vec![root.clone()];
    let keys = path.keys();
    let mut current = root.clone();
    for key in keys.iter().take(keys.len().saturating_sub(1)) {
        match current.get(key) {
            Some(Value::Object(next)) => {
                objects.push(next.clone());
                current = next;
            }
            _ => break,
        }
    }
    objects
}

#[cfg(test)]
mod tests {
    use std::rc::Rc;

    use serde_json::json;

    use super::*;
    use crate::context::Record;

    fn root() -> ObjectRef {
        match Value::from(json!({
            "title": "Song A",
            "album": { "name": "Blue", "year": 1971 },
            "empty": null
        })) {
            Value::Object(object) => object,
            _ => unreachable!(),
        }
    }

    #[test]
    fn parse_normalizes_this() {
        assert_eq!(KeyPath::parse(""), KeyPath::This);
        assert_eq!(KeyPath::parse("this"), KeyPath::This);
        assert_eq!(KeyPath::parse("this.title"), KeyPath::parse("title"));
        assert_eq!(KeyPath::parse("album.name").to_string(), "album.name");
        assert_eq!(KeyPath::parse("album.name").last_key(), Some("name"));
    }

    #[test]
    fn resolve_walks_nested_objects() {
        let root = root();
        let name = resolve(&root, &KeyPath::parse("album.name")).into_value();
        assert_eq!(name.as_str(), Some("Blue"));
        let this = resolve(&root, &KeyPath::This).into_value();
        assert!(this.same(&Value::Object(root.clone())));
    }

    #[test]
    fn resolve_reports_missing_keys() {
        let root = root();
        assert!(!resolve(&root, &KeyPath::parse("artist")).is_found());
        assert!(!resolve(&root, &KeyPath::parse("empty.name")).is_found());
        assert!(!resolve(&root, &KeyPath::parse("title.name")).is_found());
        assert!(resolve(&root, &KeyPath::parse("empty")).is_found());
    }

    #[test]
    fn chain_stops_at_owner_of_last_key() {
        let album: ObjectRef = Rc::new(Record::new().with("name", "Blue"));
        let root: ObjectRef = Rc::new(Record::new().with("album", Value::Object(album.clone())));
        let objects = chain(&root, &KeyPath::parse("album.name"));
        assert_eq!(objects.len(), 2);
        assert!(Value::Object(objects[1].clone()).same(&Value::Object(album)));
        assert_eq!(chain(&root, &KeyPath::parse("album")).len(), 1);
        assert_eq!(chain(&root, &KeyPath::This).len(), 1);
    }
}
