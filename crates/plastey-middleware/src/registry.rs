//! Ordered observer registry.
//!
//! A [`Registry`] maps references (event names) to ordered lists of
//! observers.  It is generic over the reference type `K`, the observer
//! trait-object type `O` (usually `dyn FnMut(&mut SomeFrame<'_>)`) and a
//! persistent state value `S` that every observer can read and update.
//!
//! Two flavours exist:
//!
//! - **open** registries create a reference on first registration;
//! - **restricted** registries only accept the references they were built
//!   with and reject anything else with [`PlasteyError::InvalidReference`].
//!   Clearing a restricted registry empties every list but keeps the keys.
//!
//! Firing walks references in the order they were first created, then each
//! list in registration order.  Every observer call is isolated: a panicking
//! observer is logged and skipped and the remaining observers still run.
//!
//! # Example
//!
//! ```rust
//! use plastey_middleware::registry::Registry;
//!
//! type Observer = dyn FnMut(&mut Vec<&'static str>);
//!
//! let mut registry: Registry<&str, Observer> = Registry::restricted("demo", ["pinch", "swipe"]);
//! registry.register("swipe", Box::new(|log| log.push("swipe"))).unwrap();
//! registry.register("pinch", Box::new(|log| log.push("pinch"))).unwrap();
//! assert!(registry.register("wave", Box::new(|_| {})).is_err());
//!
//! let mut log = Vec::new();
//! registry.fire_all(|observer, _| observer(&mut log));
//! assert_eq!(log, vec!["pinch", "swipe"]);
//! ```

use std::any::Any;
use std::fmt::Debug;
use std::panic::{self, AssertUnwindSafe};

use plastey_types::PlasteyError;
use tracing::error;

pub struct Registry<K, O: ?Sized, S = ()> {
    name: &'static str,
    restricted: bool,
    entries: Vec<(K, Vec<Box<O>>)>,
    states: S,
}

impl<K, O, S> Registry<K, O, S>
where
    K: PartialEq + Debug,
    O: ?Sized,
    S: Default,
{
    /// A registry that creates references on demand.
    pub fn open(name: &'static str) -> Self {
        Self {
            name,
            restricted: false,
            entries: Vec::new(),
            states: S::default(),
        }
    }

    /// A registry that only accepts `references`.
    pub fn restricted(name: &'static str, references: impl IntoIterator<Item = K>) -> Self {
        let mut entries: Vec<(K, Vec<Box<O>>)> = Vec::new();
        for reference in references {
            if !entries.iter().any(|(k, _)| *k == reference) {
                entries.push((reference, Vec::new()));
            }
        }
        Self {
            name,
            restricted: true,
            entries,
            states: S::default(),
        }
    }
}

impl<K, O, S> Registry<K, O, S>
where
    K: PartialEq + Debug,
    O: ?Sized,
{
    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn is_restricted(&self) -> bool {
        self.restricted
    }

    /// Append `observer` to the list of `reference`.
    ///
    /// # Errors
    ///
    /// Returns [`PlasteyError::InvalidReference`] if the registry is
    /// restricted and `reference` is not one of its keys.
    pub fn register(&mut self, reference: K, observer: Box<O>) -> Result<(), PlasteyError> {
        if let Some(list) = self.list_mut(&reference) {
            list.push(observer);
            return Ok(());
        }
        if self.restricted {
            return Err(self.invalid(&reference));
        }
        self.entries.push((reference, vec![observer]));
        Ok(())
    }

    /// Remove the observer at `index` of `reference`'s list.
    pub fn unregister(&mut self, reference: &K, index: usize) -> Option<Box<O>> {
        let list = self.list_mut(reference)?;
        (index < list.len()).then(|| list.remove(index))
    }

    /// Remove every observer of `reference`.  Restricted registries keep the
    /// (now empty) key.  Returns how many observers were dropped.
    pub fn unregister_all(&mut self, reference: &K) -> usize {
        let Some(pos) = self.entries.iter().position(|(k, _)| k == reference) else {
            return 0;
        };
        if self.restricted {
            std::mem::take(&mut self.entries[pos].1).len()
        } else {
            self.entries.remove(pos).1.len()
        }
    }

    /// Drop every observer.  Restricted registries keep their keys.
    pub fn clear_all(&mut self) {
        if self.restricted {
            for (_, list) in &mut self.entries {
                list.clear();
            }
        } else {
            self.entries.clear();
        }
    }

    /// Total number of registered observers.
    pub fn len(&self) -> usize {
        self.entries.iter().map(|(_, list)| list.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn observers(&self, reference: &K) -> usize {
        self.entries
            .iter()
            .find(|(k, _)| k == reference)
            .map_or(0, |(_, list)| list.len())
    }

    pub fn references(&self) -> impl Iterator<Item = &K> {
        self.entries.iter().map(|(k, _)| k)
    }

    pub fn states(&self) -> &S {
        &self.states
    }

    /// Update the state handed to every observer on the next fire.
    pub fn set_states(&mut self, update: impl FnOnce(&mut S)) {
        update(&mut self.states);
    }

    /// Invoke the observers of one reference in order.  Returns how many
    /// completed without panicking.
    ///
    /// # Errors
    ///
    /// Returns [`PlasteyError::InvalidReference`] for an unknown reference.
    pub fn fire(
        &mut self,
        reference: &K,
        mut invoke: impl FnMut(&mut O, &mut S),
    ) -> Result<usize, PlasteyError> {
        let name = self.name;
        let Some(pos) = self.entries.iter().position(|(k, _)| k == reference) else {
            return Err(self.invalid(reference));
        };
        let (key, list) = &mut self.entries[pos];
        let states = &mut self.states;
        let mut completed = 0;
        for observer in list.iter_mut() {
            if invoke_isolated(name, key, observer, states, &mut invoke) {
                completed += 1;
            }
        }
        Ok(completed)
    }

    /// Invoke every observer.  Returns how many completed without panicking.
    pub fn fire_all(&mut self, mut invoke: impl FnMut(&mut O, &mut S)) -> usize {
        let name = self.name;
        let states = &mut self.states;
        let mut completed = 0;
        for (key, list) in &mut self.entries {
            for observer in list.iter_mut() {
                if invoke_isolated(name, key, observer, states, &mut invoke) {
                    completed += 1;
                }
            }
        }
        completed
    }

    fn list_mut(&mut self, reference: &K) -> Option<&mut Vec<Box<O>>> {
        self.entries
            .iter_mut()
            .find(|(k, _)| k == reference)
            .map(|(_, list)| list)
    }

    fn invalid(&self, reference: &K) -> PlasteyError {
        PlasteyError::InvalidReference {
            registry: self.name.to_string(),
            reference: format!("{reference:?}"),
        }
    }
}

/// Run one observer, containing any panic.  Returns `true` on success.
fn invoke_isolated<K, O, S>(
    registry: &str,
    reference: &K,
    observer: &mut Box<O>,
    states: &mut S,
    invoke: &mut impl FnMut(&mut O, &mut S),
) -> bool
where
    K: Debug,
    O: ?Sized,
{
    match panic::catch_unwind(AssertUnwindSafe(|| invoke(&mut **observer, states))) {
        Ok(()) => true,
        Err(payload) => {
            error!(
                registry,
                reference = ?reference,
                panic = panic_message(payload.as_ref()),
                "observer panicked; continuing with the remaining observers"
            );
            false
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.as_str()
    } else {
        "<non-string panic>"
    }
}
