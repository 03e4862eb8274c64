//! One-way bindings from a key path to a class token or an attribute.
//!
//! Binding computes the initial value for the template to render and starts
//! watching the path. Later changes are never written directly: they schedule
//! an update on the [`RenderQueue`], which re-reads the path when it is
//! flushed. Dropping the returned [`Binding`] stops the watching.

use std::{
    cell::{Cell, RefCell},
    fmt,
    rc::{Rc, Weak},
    sync::atomic::{AtomicU64, Ordering},
};

use crate::{
    context::{Context, ObjectRef},
    dom::{Document, ElementId},
    error::Error,
    observe::Subscription,
    path::{self, KeyPath},
    scheduler::{Property, RenderQueue, UpdateKey},
    value::Value,
};

/// Class names to use for truthy and falsy values instead of deriving one
/// from the value.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct ClassLabels {
    pub truthy: Option<String>,
    pub falsy: Option<String>,
}

impl ClassLabels {
    pub fn new(truthy: impl Into<String>, falsy: impl Into<String>) -> Self {
        Self {
            truthy: Some(truthy.into()),
            falsy: Some(falsy.into()),
        }
    }

    pub fn truthy(truthy: impl Into<String>) -> Self {
        Self {
            truthy: Some(truthy.into()),
            falsy: None,
        }
    }

    fn is_empty(&self) -> bool {
        self.truthy.is_none() && self.falsy.is_none()
    }

    fn is_complete(&self) -> bool {
        self.truthy.is_some() && self.falsy.is_some()
    }
}

/// Text around a bound attribute value.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct Affix {
    pub prefix: Option<String>,
    pub suffix: Option<String>,
}

impl Affix {
    pub fn new(prefix: impl Into<String>, suffix: impl Into<String>) -> Self {
        Self {
            prefix: Some(prefix.into()),
            suffix: Some(suffix.into()),
        }
    }
}

/// `isCurrentSong` -> `is-current-song`, `Song A` -> `song-a`.
pub fn dasherize(s: &str) -> String {
    let mut out = String::with_capacity(s.len() + 4);
    let mut prev_lower = false;
    for c in s.chars() {
        if c.is_uppercase() && prev_lower {
            out.push('-');
        }
        prev_lower = c.is_lowercase() || c.is_ascii_digit();
        match c {
            ' ' | '_' => out.push('-'),
            c => out.extend(c.to_lowercase()),
        }
    }
    out
}

pub fn class_string_for_value(
    path: &KeyPath,
    value: &Value,
    labels: &ClassLabels,
) -> Option<String> {
    let value = match value {
        Value::List(items) => Value::Bool(!items.is_empty()),
        value => value.clone(),
    };
    if !labels.is_empty() {
        return if value.is_truthy() {
            labels.truthy.clone()
        } else {
            labels.falsy.clone()
        };
    }
    match value {
        Value::Bool(true) => path.last_key().map(dasherize),
        Value::Bool(false) | Value::Null | Value::Undefined => None,
        value => Some(dasherize(&value.to_string())).filter(|class| !class.is_empty()),
    }
}

/// Wraps the value in the affix. Without one the value is returned as is.
pub fn attribute_value(value: Value, affix: &Affix) -> Value {
    let prefix = affix.prefix.as_deref().filter(|s| !s.is_empty());
    let suffix = affix.suffix.as_deref().filter(|s| !s.is_empty());
    if prefix.is_none() && suffix.is_none() {
        return value;
    }
    Value::from(format!(
        "{}{}{}",
        prefix.unwrap_or_default(),
        value,
        suffix.unwrap_or_default()
    ))
}

pub fn check_attribute(path: &KeyPath, value: &Value) -> Result<(), Error> {
    match value {
        Value::Undefined | Value::Null | Value::Bool(_) | Value::Number(_) | Value::String(_) => {
            Ok(())
        }
        Value::List(_) | Value::Object(_) => Err(Error::InvalidAttributeType {
            path: path.to_string(),
            value_type: value.type_of(),
        }),
    }
}

/// Keeps a callback registered on every observable object along a path.
///
/// When an object in the middle of the path changes, the chain is walked
/// again so that the observer follows the new object.
pub struct PathObserver {
    link: Rc<ObserverLink>,
}

struct ObserverLink {
    root: ObjectRef,
    path: KeyPath,
    on_change: Box<dyn Fn()>,
    subscriptions: RefCell<Vec<Subscription>>,
}

impl ObserverLink {
    fn relink(self: &Rc<Self>) {
        let subscriptions = path::chain(&self.root, &self.path)
            .iter()
            .filter_map(|object| {
                let link = Rc::downgrade(self);
                object.changes().map(|signal| {
                    signal.subscribe(move || {
                        if let Some(link) = link.upgrade() {
                            link.fire();
                        }
                    })
                })
            })
            .collect();
        *self.subscriptions.borrow_mut() = subscriptions;
    }

    fn fire(self: &Rc<Self>) {
        if self.path.keys().len() > 1 {
            self.relink();
        }
        (self.on_change)();
    }
}

impl PathObserver {
    pub fn is_active(&self) -> bool {
        !self.link.subscriptions.borrow().is_empty()
    }

    pub fn unsubscribe(self) {}
}

impl fmt::Debug for PathObserver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PathObserver")
            .field("path", &self.link.path)
            .field("links", &self.link.subscriptions.borrow().len())
            .finish()
    }
}

/// Calls `on_change` whenever the value at `path` may have changed. Nothing
/// is registered for [`KeyPath::This`], the root never changes identity.
pub fn observe(
    root: &ObjectRef,
    path: &KeyPath,
    on_change: impl Fn() + 'static,
) -> Option<PathObserver> {
    if path.is_this() {
        return None;
    }
    let link = Rc::new(ObserverLink {
        root: root.clone(),
        path: path.clone(),
        on_change: Box::new(on_change),
        subscriptions: RefCell::new(Vec::new()),
    });
    link.relink();
    Some(PathObserver { link })
}

enum Target {
    Class(ClassLabels),
    Attribute { name: String, affix: Affix },
}

static NEXT_BINDING_ID: AtomicU64 = AtomicU64::new(1);

struct BindingState {
    /// Keys class updates, several class bindings may share an element and a
    /// path.
    id: u64,
    root: ObjectRef,
    path: KeyPath,
    element: ElementId,
    target: Target,
    /// Class token currently on the element.
    applied: RefCell<Option<String>>,
    observer: RefCell<Option<PathObserver>>,
    halted: Cell<bool>,
}

impl BindingState {
    fn key(&self) -> UpdateKey {
        let property = match &self.target {
            Target::Class(_) => Property::Class(self.id),
            Target::Attribute { name, .. } => Property::Attribute(name.clone()),
        };
        UpdateKey {
            element: self.element,
            property,
        }
    }

    fn watch(self: &Rc<Self>, queue: &RenderQueue) {
        let state = Rc::downgrade(self);
        let queue = queue.clone();
        let observer = observe(&self.root, &self.path, move || {
            if let Some(state) = state.upgrade() {
                state.schedule(&queue);
            }
        });
        *self.observer.borrow_mut() = observer;
    }

    fn schedule(self: &Rc<Self>, queue: &RenderQueue) {
        if self.halted.get() {
            return;
        }
        let state: Weak<Self> = Rc::downgrade(self);
        queue.schedule(
            self.key(),
            Box::new(move |doc| match state.upgrade() {
                Some(state) => state.update(doc),
                None => Ok(false),
            }),
        );
    }

    fn update(&self, doc: &mut Document) -> Result<bool, Error> {
        if self.halted.get() {
            return Ok(false);
        }
        let value = path::resolve(&self.root, &self.path).into_value();
        match &self.target {
            Target::Class(labels) => {
                let class = class_string_for_value(&self.path, &value, labels);
                let mut applied = self.applied.borrow_mut();
                if *applied == class {
                    return Ok(false);
                }
                if let Some(old) = applied.as_deref() {
                    doc.remove_class(self.element, old);
                }
                if let Some(new) = class.as_deref() {
                    doc.add_class(self.element, new);
                }
                *applied = class;
                Ok(true)
            }
            Target::Attribute { name, affix } => {
                if let Err(err) = check_attribute(&self.path, &value) {
                    self.halt();
                    return Err(err);
                }
                let before = doc.attribute(self.element, name).map(str::to_owned);
                doc.apply_attribute(self.element, name, &attribute_value(value, affix));
                Ok(doc.attribute(self.element, name) != before.as_deref())
            }
        }
    }

    fn halt(&self) {
        log::error!("halting binding of `{}` on {}", self.path, self.element);
        self.halted.set(true);
        self.observer.borrow_mut().take();
    }
}

/// Handle of a live binding, carrying the value to render initially.
pub struct Binding<T> {
    state: Rc<BindingState>,
    initial: T,
}

impl<T> Binding<T> {
    pub fn initial(&self) -> &T {
        &self.initial
    }

    pub fn path(&self) -> &KeyPath {
        &self.state.path
    }

    pub fn element(&self) -> ElementId {
        self.state.element
    }

    pub fn key(&self) -> UpdateKey {
        self.state.key()
    }

    /// Whether changes to the path are still being watched.
    pub fn is_active(&self) -> bool {
        !self.state.halted.get()
            && self
                .state
                .observer
                .borrow()
                .as_ref()
                .is_some_and(PathObserver::is_active)
    }

    pub fn unsubscribe(self) {}
}

impl<T: fmt::Debug> fmt::Debug for Binding<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Binding")
            .field("key", &self.key())
            .field("initial", &self.initial)
            .finish()
    }
}

fn bind(
    root: &ObjectRef,
    path: KeyPath,
    element: ElementId,
    target: Target,
    applied: Option<String>,
    queue: &RenderQueue,
) -> Rc<BindingState> {
    let state = Rc::new(BindingState {
        id: NEXT_BINDING_ID.fetch_add(1, Ordering::Relaxed),
        root: root.clone(),
        path,
        element,
        target,
        applied: RefCell::new(applied),
        observer: RefCell::new(None),
        halted: Cell::new(false),
    });
    state.watch(queue);
    log::debug!("bound `{}` as {}", state.path, state.key());
    state
}

/// Binds a class token on `element` to the value at `path`. The initial
/// token, if any, is for the caller to render.
pub fn bind_class(
    root: &ObjectRef,
    path: &str,
    labels: ClassLabels,
    element: ElementId,
    queue: &RenderQueue,
) -> Result<Binding<Option<String>>, Error> {
    let path = KeyPath::parse(path);
    if path.is_this() && !labels.is_complete() {
        return Err(Error::MissingClassLabels {
            path: path.to_string(),
        });
    }
    let value = path::resolve(root, &path).into_value();
    let initial = class_string_for_value(&path, &value, &labels);
    let state = bind(
        root,
        path,
        element,
        Target::Class(labels),
        initial.clone(),
        queue,
    );
    Ok(Binding { state, initial })
}

/// Binds the attribute `name` on `element` to the value at `path`. The
/// initial value is for the caller to render, see
/// [`Document::apply_attribute`].
pub fn bind_attribute(
    root: &ObjectRef,
    name: &str,
    path: &str,
    affix: Affix,
    element: ElementId,
    queue: &RenderQueue,
) -> Result<Binding<Value>, Error> {
    let path = KeyPath::parse(path);
    let value = path::resolve(root, &path).into_value();
    check_attribute(&path, &value)?;
    let initial = attribute_value(value, &affix);
    let target = Target::Attribute {
        name: name.to_owned(),
        affix,
    };
    let state = bind(root, path, element, target, None, queue);
    Ok(Binding { state, initial })
}

/// Owns the bindings of one view and releases all of them together.
#[derive(Default)]
pub struct BindingScope {
    bindings: Vec<Rc<BindingState>>,
}

impl BindingScope {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add<T>(&mut self, binding: Binding<T>) -> T {
        self.bindings.push(binding.state);
        binding.initial
    }

    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }

    pub fn clear(&mut self) {
        self.bindings.clear();
    }
}

impl fmt::Debug for BindingScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list()
            .entries(self.bindings.iter().map(|state| state.key()))
            .finish()
    }
}
