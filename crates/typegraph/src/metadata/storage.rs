//! Insertion-ordered collections of metadata records.
//!
//! Storages never validate; builders do.

use super::classes::TargetId;
use super::definitions::{Member, Owned};

/// Records of one category, keyed by owning class.
#[derive(Debug, Clone)]
pub struct TargetSpecificStorage<T> {
    items: Vec<T>,
}

impl<T> Default for TargetSpecificStorage<T> {
    fn default() -> Self {
        Self { items: Vec::new() }
    }
}

impl<T> TargetSpecificStorage<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a record.
    pub fn collect(&mut self, item: T) {
        self.items.push(item);
    }

    /// Prepends records, keeping their relative order.
    pub fn unshift(&mut self, items: Vec<T>) {
        if items.is_empty() {
            return;
        }
        self.items.splice(0..0, items);
    }

    pub fn iter(&self) -> std::slice::Iter<'_, T> {
        self.items.iter()
    }

    pub fn iter_mut(&mut self) -> std::slice::IterMut<'_, T> {
        self.items.iter_mut()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn clear(&mut self) {
        self.items.clear();
    }
}

impl<T: Owned> TargetSpecificStorage<T> {
    /// Returns the first record owned by `target`.
    pub fn find(&self, target: TargetId) -> Option<&T> {
        self.items.iter().find(|item| item.target() == target)
    }

    pub fn find_mut(&mut self, target: TargetId) -> Option<&mut T> {
        self.items.iter_mut().find(|item| item.target() == target)
    }

    /// Returns every record owned by `target`, in insertion order.
    pub fn find_many(&self, target: TargetId) -> impl Iterator<Item = &T> {
        self.items.iter().filter(move |item| item.target() == target)
    }
}

impl<T: Member> TargetSpecificStorage<T> {
    /// Returns the first record owned by the `(target, member)` pair.
    pub fn find_member(&self, target: TargetId, member: &str) -> Option<&T> {
        self.items
            .iter()
            .find(|item| item.target() == target && item.member_name() == member)
    }

    /// Returns every record owned by the `(target, member)` pair.
    pub fn find_many_for_member<'a>(
        &'a self,
        target: TargetId,
        member: &'a str,
    ) -> impl Iterator<Item = &'a T> {
        self.items
            .iter()
            .filter(move |item| item.target() == target && item.member_name() == member)
    }
}

impl<'a, T> IntoIterator for &'a TargetSpecificStorage<T> {
    type Item = &'a T;
    type IntoIter = std::slice::Iter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.iter()
    }
}
