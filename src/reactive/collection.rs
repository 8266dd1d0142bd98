use std::fmt;

use super::subject::Subject;
use crate::disposable::{Disposable, Subscription};
use crate::error::{ReactiveError, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChangeKind {
    Add,
    Remove,
}

/// One logical mutation of a [`ReactiveCollection`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CollectionChange<T> {
    pub kind: ChangeKind,
    pub item: T,
}

/// Ordered sequence that reports each mutation.
///
/// Owned by a single model; share it only behind external synchronization.
/// Replacing an element reports `Remove(old)` followed by `Add(new)`.
pub struct ReactiveCollection<T> {
    items: Vec<T>,
    changes: Subject<CollectionChange<T>>,
}

impl<T> ReactiveCollection<T>
where
    T: Clone + PartialEq + Send + Sync + 'static,
{
    pub fn new() -> Self {
        Self::from(Vec::new())
    }

    pub fn subscribe<F>(&self, on_change: F) -> Subscription
    where
        F: Fn(&CollectionChange<T>) + Send + Sync + 'static,
    {
        self.changes.subscribe(on_change)
    }

    pub fn add(&mut self, item: T) {
        self.items.push(item.clone());
        self.emit(ChangeKind::Add, item);
    }

    /// Insert at `index`, shifting later elements right.
    ///
    /// # Errors
    ///
    /// [`ReactiveError::OutOfBounds`] if `index > len`.
    pub fn insert(&mut self, index: usize, item: T) -> Result<()> {
        if index > self.items.len() {
            return Err(self.out_of_bounds(index));
        }
        self.items.insert(index, item.clone());
        self.emit(ChangeKind::Add, item);
        Ok(())
    }

    /// Remove the first element equal to `item`.
    pub fn remove(&mut self, item: &T) -> bool {
        match self.index_of(item) {
            Some(index) => {
                let removed = self.items.remove(index);
                self.emit(ChangeKind::Remove, removed);
                true
            }
            None => false,
        }
    }

    /// # Errors
    ///
    /// [`ReactiveError::OutOfBounds`] if `index >= len`; the collection is left untouched.
    pub fn remove_at(&mut self, index: usize) -> Result<T> {
        if index >= self.items.len() {
            return Err(self.out_of_bounds(index));
        }
        let removed = self.items.remove(index);
        self.emit(ChangeKind::Remove, removed.clone());
        Ok(removed)
    }

    /// Replace the element at `index`, returning the old one.
    ///
    /// # Errors
    ///
    /// [`ReactiveError::OutOfBounds`] if `index >= len`.
    pub fn set(&mut self, index: usize, item: T) -> Result<T> {
        if index >= self.items.len() {
            return Err(self.out_of_bounds(index));
        }
        let old = std::mem::replace(&mut self.items[index], item.clone());
        self.emit(ChangeKind::Remove, old.clone());
        self.emit(ChangeKind::Add, item);
        Ok(old)
    }

    /// Remove everything, reporting one `Remove` per element in order.
    pub fn clear(&mut self) {
        for item in std::mem::take(&mut self.items) {
            self.emit(ChangeKind::Remove, item);
        }
    }

    pub fn get(&self, index: usize) -> Option<&T> {
        self.items.get(index)
    }

    pub fn contains(&self, item: &T) -> bool {
        self.items.contains(item)
    }

    pub fn index_of(&self, item: &T) -> Option<usize> {
        self.items.iter().position(|candidate| candidate == item)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, T> {
        self.items.iter()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn to_vec(&self) -> Vec<T> {
        self.items.clone()
    }

    fn emit(&self, kind: ChangeKind, item: T) {
        self.changes.next(&CollectionChange { kind, item });
    }

    fn out_of_bounds(&self, index: usize) -> ReactiveError {
        ReactiveError::OutOfBounds {
            index,
            len: self.items.len(),
        }
    }
}

impl<T> From<Vec<T>> for ReactiveCollection<T>
where
    T: Clone + PartialEq + Send + Sync + 'static,
{
    fn from(items: Vec<T>) -> Self {
        Self {
            items,
            changes: Subject::new(),
        }
    }
}

impl<T> Default for ReactiveCollection<T>
where
    T: Clone + PartialEq + Send + Sync + 'static,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<'a, T> IntoIterator for &'a ReactiveCollection<T> {
    type Item = &'a T;
    type IntoIter = std::slice::Iter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.iter()
    }
}

/// Completes the change stream only; the items stay.
impl<T> Disposable for ReactiveCollection<T>
where
    T: Send + Sync + 'static,
{
    fn dispose(&self) {
        self.changes.complete();
    }

    fn is_disposed(&self) -> bool {
        self.changes.is_completed()
    }
}

impl<T: fmt::Debug> fmt::Debug for ReactiveCollection<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.items.iter()).finish()
    }
}
