use std::{cell::RefCell, collections::BTreeMap, fmt, rc::Rc};

use crate::{observe::Signal, value::Value};

/// Something a key path can walk through.
pub trait Context {
    /// Value of the field named `key`, `None` if there is no such field.
    fn get(&self, key: &str) -> Option<Value>;

    /// Fires whenever any field of this object may have changed. Objects
    /// without a signal are treated as immutable.
    fn changes(&self) -> Option<&Signal> {
        None
    }
}

pub type ObjectRef = Rc<dyn Context>;

/// Dynamic key/value object that notifies on every effective change.
#[derive(Default)]
pub struct Record {
    fields: RefCell<BTreeMap<String, Value>>,
    changes: Signal,
}

impl Record {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.insert(key.into(), value.into());
        self
    }

    /// Sets a field without notifying, for building records up front.
    pub fn insert(&self, key: String, value: Value) {
        self.fields.borrow_mut().insert(key, value);
    }

    pub fn set(&self, key: &str, value: impl Into<Value>) {
        let value = value.into();
        let changed = {
            let mut fields = self.fields.borrow_mut();
            match fields.get_mut(key) {
                Some(old) if old.same(&value) => false,
                Some(old) => {
                    *old = value;
                    true
                }
                None => {
                    fields.insert(key.to_owned(), value);
                    true
                }
            }
        };
        if changed {
            self.changes.notify();
        }
    }

    pub fn remove(&self, key: &str) {
        let removed = self.fields.borrow_mut().remove(key).is_some();
        if removed {
            self.changes.notify();
        }
    }
}

impl Context for Record {
    fn get(&self, key: &str) -> Option<Value> {
        self.fields.borrow().get(key).cloned()
    }

    fn changes(&self) -> Option<&Signal> {
        Some(&self.changes)
    }
}

impl fmt::Debug for Record {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.fields.borrow().iter()).finish()
    }
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;

    use super::*;

    #[test]
    fn set_notifies_only_on_change() {
        let record = Record::new().with("volume", 0);
        let calls = Rc::new(Cell::new(0));
        let _sub = record.changes().unwrap().subscribe({
            let calls = calls.clone();
            move || calls.set(calls.get() + 1)
        });
        record.set("volume", 0);
        assert_eq!(calls.get(), 0);
        record.set("volume", 5);
        record.set("title", "Song A");
        record.remove("missing");
        assert_eq!(calls.get(), 2);
        assert_eq!(record.get("volume").unwrap().to_string(), "5");
    }
}
