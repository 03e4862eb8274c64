//! Render-pass batching.
//!
//! Bindings never write to the document when their data changes. They
//! enqueue an update keyed by the element and property they own, and the host
//! calls [`RenderQueue::flush`] once per turn. Enqueueing a key that is
//! already pending is a no-op, so any number of changes within one turn end
//! up as a single write that sees the final state.

use std::{cell::RefCell, collections::HashSet, fmt, mem, rc::Rc};

use crate::{
    dom::{Document, ElementId},
    error::Error,
};

#[derive(Clone, Debug, Eq, PartialEq, Hash)]
pub enum Property {
    /// The class token owned by the class binding with this id.
    Class(u64),
    Attribute(String),
}

#[derive(Clone, Debug, Eq, PartialEq, Hash)]
pub struct UpdateKey {
    pub element: ElementId,
    pub property: Property,
}

impl fmt::Display for UpdateKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.property {
            Property::Class(id) => write!(f, "{} class#{}", self.element, id),
            Property::Attribute(name) => write!(f, "{} [{}]", self.element, name),
        }
    }
}

/// An update returns whether it wrote anything.
pub type Update = Box<dyn FnOnce(&mut Document) -> Result<bool, Error>>;

#[derive(Default)]
struct Pending {
    keys: HashSet<UpdateKey>,
    updates: Vec<(UpdateKey, Update)>,
}

#[derive(Clone, Default)]
pub struct RenderQueue {
    pending: Rc<RefCell<Pending>>,
}

impl RenderQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns `false` if an update for `key` was already pending.
    pub fn schedule(&self, key: UpdateKey, update: Update) -> bool {
        let mut pending = self.pending.borrow_mut();
        if !pending.keys.insert(key.clone()) {
            return false;
        }
        log::trace!("scheduled {}", key);
        pending.updates.push((key, update));
        true
    }

    pub fn len(&self) -> usize {
        self.pending.borrow().updates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn is_pending(&self, key: &UpdateKey) -> bool {
        self.pending.borrow().keys.contains(key)
    }

    /// Runs every pending update in the order it was first scheduled and
    /// returns how many of them wrote to the document.
    ///
    /// Updates scheduled while flushing run on the next flush. A failing
    /// update does not stop the others, the first error is returned once all
    /// of them ran.
    pub fn flush(&self, doc: &mut Document) -> Result<usize, Error> {
        let batch = mem::take(&mut *self.pending.borrow_mut());
        let mut writes = 0;
        let mut first_err = None;
        for (key, update) in batch.updates {
            match update(doc) {
                Ok(true) => writes += 1,
                Ok(false) => {}
                Err(err) => {
                    log::error!("update of {} failed: {}", key, err);
                    first_err.get_or_insert(err);
                }
            }
        }
        if writes > 0 {
            log::debug!("render pass wrote {} bindings", writes);
        }
        match first_err {
            Some(err) => Err(err),
            None => Ok(writes),
        }
    }
}

impl fmt::Debug for RenderQueue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RenderQueue")
            .field("pending", &self.len())
            .finish()
    }
}
