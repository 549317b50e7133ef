//! Class identities and the declared-supertype relation.
//!
//! Every declared class (object, input, args, interface or resolver class)
//! gets an opaque [`TargetId`] when it is declared. The [`ClassTable`] records
//! its name and immediate parent so inheritance can be walked explicitly.

use std::fmt;

/// Opaque identity of a declared class.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TargetId(u32);

impl TargetId {
    /// Returns the raw index of this id.
    #[must_use]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for TargetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "class#{}", self.0)
    }
}

/// Opaque identity of a registered enum.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct EnumId(pub(crate) u32);

/// Opaque identity of a registered union, standing in for its type value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct UnionId(pub(crate) u32);

#[derive(Debug, Clone)]
struct ClassDecl {
    name: String,
    parent: Option<TargetId>,
}

/// Table of declared classes and their parents.
#[derive(Debug, Clone, Default)]
pub struct ClassTable {
    classes: Vec<ClassDecl>,
}

impl ClassTable {
    /// Creates an empty class table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Declares a class, optionally extending an already declared parent.
    pub fn declare(&mut self, name: impl Into<String>, parent: Option<TargetId>) -> TargetId {
        let id = TargetId(self.classes.len() as u32);
        self.classes.push(ClassDecl {
            name: name.into(),
            parent,
        });
        id
    }

    /// Returns the declared class name.
    ///
    /// Unknown ids (minted by another table) render as their display form.
    pub fn name(&self, id: TargetId) -> String {
        self.classes
            .get(id.index())
            .map(|decl| decl.name.clone())
            .unwrap_or_else(|| id.to_string())
    }

    /// Returns the immediate parent of a class.
    pub fn parent(&self, id: TargetId) -> Option<TargetId> {
        self.classes.get(id.index()).and_then(|decl| decl.parent)
    }

    /// Returns whether the class extends another class.
    pub fn has_parent(&self, id: TargetId) -> bool {
        self.parent(id).is_some()
    }

    /// Iterates over the ancestors of a class, nearest first.
    pub fn ancestors(&self, id: TargetId) -> Ancestors<'_> {
        Ancestors {
            table: self,
            next: self.parent(id),
        }
    }

    /// Returns whether an instance of `instance` is also an instance of `target`.
    pub fn is_assignable(&self, instance: TargetId, target: TargetId) -> bool {
        instance == target || self.ancestors(instance).any(|ancestor| ancestor == target)
    }

    /// Returns the number of declared classes.
    pub fn len(&self) -> usize {
        self.classes.len()
    }

    /// Returns whether no class has been declared.
    pub fn is_empty(&self) -> bool {
        self.classes.is_empty()
    }
}

/// Iterator over the ancestors of a class.
pub struct Ancestors<'a> {
    table: &'a ClassTable,
    next: Option<TargetId>,
}

impl Iterator for Ancestors<'_> {
    type Item = TargetId;

    fn next(&mut self) -> Option<Self::Item> {
        let current = self.next?;
        self.next = self.table.parent(current);
        Some(current)
    }
}
