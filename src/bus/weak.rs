use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, Weak};

use parking_lot::Mutex;

/// Handler type accepted by [`WeakEventManager`].
pub type WeakHandler<A> = dyn Fn(&A) + Send + Sync;

/// Name-indexed handlers that do not keep their owners alive.
///
/// The manager stores only `Weak` references. Once the caller drops the
/// last `Arc` of a handler it stops being called, and it is pruned on the
/// next [`raise`](Self::raise) of its name.
pub struct WeakEventManager<A> {
    handlers: Mutex<HashMap<String, Vec<Weak<WeakHandler<A>>>>>,
}

impl<A> WeakEventManager<A> {
    pub fn new() -> Self {
        Self {
            handlers: Mutex::new(HashMap::new()),
        }
    }

    pub fn add_handler(&self, name: &str, handler: &Arc<WeakHandler<A>>) {
        self.handlers.lock()
            .entry(name.to_string())
            .or_default()
            .push(Arc::downgrade(handler));
    }

    /// Remove `handler` (and any dead handlers) from `name`. Returns whether
    /// `handler` was registered.
    pub fn remove_handler(&self, name: &str, handler: &Arc<WeakHandler<A>>) -> bool {
        let mut handlers = self.handlers.lock();
        let Some(list) = handlers.get_mut(name) else {
            return false;
        };
        let target = Arc::downgrade(handler);
        let mut found = false;
        list.retain(|weak| {
            if weak.ptr_eq(&target) {
                found = true;
                return false;
            }
            weak.strong_count() > 0
        });
        if list.is_empty() {
            handlers.remove(name);
        }
        found
    }

    /// Call every live handler of `name` with `args`. Returns how many ran.
    pub fn raise(&self, name: &str, args: &A) -> usize {
        let live: Vec<Arc<WeakHandler<A>>> = {
            let mut handlers = self.handlers.lock();
            let Some(list) = handlers.get_mut(name) else {
                return 0;
            };
            list.retain(|weak| weak.strong_count() > 0);
            let live = list.iter().filter_map(Weak::upgrade).collect();
            if list.is_empty() {
                handlers.remove(name);
            }
            live
        };

        for handler in &live {
            handler(args);
        }
        live.len()
    }

    /// Registered handlers for `name`, dead ones included until pruned.
    pub fn handler_count(&self, name: &str) -> usize {
        self.handlers.lock().get(name).map_or(0, Vec::len)
    }
}

impl<A> Default for WeakEventManager<A> {
    fn default() -> Self {
        Self::new()
    }
}

impl<A> fmt::Debug for WeakEventManager<A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WeakEventManager")
            .field("names", &self.handlers.lock().len())
            .finish()
    }
}
