//! Change notification.
//!
//! A [`Signal`] is a list of observers that get called, in registration
//! order, every time the owner calls [`Signal::notify`]. Registering returns
//! a [`Subscription`]; the observer stays registered for exactly as long as
//! the subscription is alive.

use std::{
    cell::RefCell,
    fmt,
    rc::{Rc, Weak},
};

type Observer = Rc<dyn Fn()>;

#[derive(Default)]
struct Observers {
    next_id: u64,
    entries: Vec<(u64, Observer)>,
}

/// Shared handle, clones notify the same observers.
#[derive(Clone, Default)]
pub struct Signal {
    observers: Rc<RefCell<Observers>>,
}

impl Signal {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe(&self, observer: impl Fn() + 'static) -> Subscription {
        let mut observers = self.observers.borrow_mut();
        let id = observers.next_id;
        observers.next_id += 1;
        observers.entries.push((id, Rc::new(observer)));
        Subscription {
            observers: Rc::downgrade(&self.observers),
            id,
        }
    }

    pub fn notify(&self) {
        // Observers may subscribe or unsubscribe while being called, so we
        // must not hold the borrow across the calls.
        let snapshot: Vec<Observer> = self
            .observers
            .borrow()
            .entries
            .iter()
            .map(|(_, observer)| observer.clone())
            .collect();
        for observer in snapshot {
            observer();
        }
    }

    pub fn observer_count(&self) -> usize {
        self.observers.borrow().entries.len()
    }
}

impl fmt::Debug for Signal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Signal")
            .field("observers", &self.observer_count())
            .finish()
    }
}

/// Registration of one observer on a [`Signal`]. Dropping it deregisters.
#[must_use = "the observer is removed as soon as the subscription is dropped"]
pub struct Subscription {
    observers: Weak<RefCell<Observers>>,
    id: u64,
}

impl Subscription {
    pub fn unsubscribe(self) {}

    pub fn is_active(&self) -> bool {
        self.observers
            .upgrade()
            .is_some_and(|observers| observers.borrow().entries.iter().any(|(id, _)| *id == self.id))
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(observers) = self.observers.upgrade() {
            observers
                .borrow_mut()
                .entries
                .retain(|(id, _)| *id != self.id);
        }
    }
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription").field("id", &self.id).finish()
    }
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;

    use super::*;

    #[test]
    fn observers_run_in_registration_order() {
        let signal = Signal::new();
        let order = Rc::new(RefCell::new(Vec::new()));
        let _a = signal.subscribe({
            let order = order.clone();
            move || order.borrow_mut().push("a")
        });
        let _b = signal.subscribe({
            let order = order.clone();
            move || order.borrow_mut().push("b")
        });
        signal.notify();
        assert_eq!(*order.borrow(), vec!["a", "b"]);
    }

    #[test]
    fn dropping_subscription_removes_observer() {
        let signal = Signal::new();
        let calls = Rc::new(Cell::new(0));
        let sub = signal.subscribe({
            let calls = calls.clone();
            move || calls.set(calls.get() + 1)
        });
        signal.notify();
        assert!(sub.is_active());
        sub.unsubscribe();
        signal.notify();
        assert_eq!(calls.get(), 1);
        assert_eq!(signal.observer_count(), 0);
    }

    #[test]
    fn observer_may_unsubscribe_itself_during_notify() {
        let signal = Signal::new();
        let slot: Rc<RefCell<Option<Subscription>>> = Rc::new(RefCell::new(None));
        let sub = signal.subscribe({
            let slot = slot.clone();
            move || {
                slot.borrow_mut().take();
            }
        });
        *slot.borrow_mut() = Some(sub);
        signal.notify();
        assert_eq!(signal.observer_count(), 0);
    }

    #[test]
    fn subscription_outliving_signal_is_inert() {
        let signal = Signal::new();
        let sub = signal.subscribe(|| {});
        drop(signal);
        assert!(!sub.is_active());
    }
}
