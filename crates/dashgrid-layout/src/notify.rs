//! Change notification for engine subscribers.
//!
//! Callbacks are owned by the [`Subscription`] guard handed back from
//! [`ChangeNotifier::subscribe`]; the notifier only keeps `Weak` handles.
//! Dropping the guard unsubscribes. Dead handles are pruned on the next
//! notification. Single-threaded by construction (`Rc`, not `Send`).

use std::any::Any;
use std::cell::RefCell;
use std::fmt;
use std::rc::{Rc, Weak};

type CallbackRc<T> = Rc<dyn Fn(&T)>;
type CallbackWeak<T> = Weak<dyn Fn(&T)>;

pub struct ChangeNotifier<T> {
    subscribers: RefCell<Vec<CallbackWeak<T>>>,
}

impl<T> Default for ChangeNotifier<T> {
    fn default() -> Self {
        Self {
            subscribers: RefCell::new(Vec::new()),
        }
    }
}

impl<T> fmt::Debug for ChangeNotifier<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ChangeNotifier")
            .field("subscribers", &self.subscribers.borrow().len())
            .finish()
    }
}

impl<T: 'static> ChangeNotifier<T> {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `callback`; it stays active while the returned guard lives.
    pub fn subscribe(&self, callback: impl Fn(&T) + 'static) -> Subscription {
        let strong: CallbackRc<T> = Rc::new(callback);
        self.subscribers.borrow_mut().push(Rc::downgrade(&strong));
        Subscription {
            _guard: Box::new(strong),
        }
    }

    /// Registered handles, including dead ones not yet pruned.
    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        self.subscribers.borrow().len()
    }

    /// Deliver `event` to live subscribers in registration order.
    ///
    /// Returns the number of callbacks invoked.
    pub fn notify(&self, event: &T) -> usize {
        let callbacks: Vec<CallbackRc<T>> = {
            let mut subscribers = self.subscribers.borrow_mut();
            subscribers.retain(|weak| weak.strong_count() > 0);
            subscribers.iter().filter_map(Weak::upgrade).collect()
        };
        for callback in &callbacks {
            callback(event);
        }
        callbacks.len()
    }
}

/// Guard that keeps a subscriber callback alive.
pub struct Subscription {
    _guard: Box<dyn Any>,
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription").finish_non_exhaustive()
    }
}
