//! Stack-of-scopes symbol table.
//!
//! Entries form a singly-linked LIFO chain (each entry points to the one
//! declared immediately before it); the table itself is a fixed-depth stack
//! of "base" pointers snapshotting `head` on `enter_scope`, restored on
//! `exit_scope`. Lookup walks from `head` toward older entries and returns
//! the first name match, which is exactly what gives shadowing its nesting
//! behavior: popping a scope forgets nothing except that the walk once again
//! passes straight through where the inner scope's entries used to be.

use plx_ast::{EntryId, Location, NodeId};

/// Entries are declared at module scope (visible everywhere after their
/// declaration point) or inside a function body.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Scope {
    Local,
    Global,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Mutability {
    Const,
    Var,
}

#[derive(Clone, Debug)]
pub struct Entry {
    prev: Option<EntryId>,
    pub name: String,
    pub location: Location,
    pub scope: Scope,
    pub mutability: Mutability,
    /// Filled in by the type checker; `None` until then.
    pub ty: Option<NodeId>,
    /// Filled in by the constant folder once a `const`'s initializer
    /// collapses to a literal; `None` until then, and never set for `var`.
    pub folded_value: Option<NodeId>,
    /// Stack-slot index for locals compiled to LLVM; assigned by the LLVM
    /// back-end, not by any front-end pass.
    pub local_slot: Option<u32>,
}

/// Scopes are allowed to nest at least this deep; deeper nesting is a fatal
/// internal condition (the reference implementation's fixed-size array of
/// bases overflowing), not a recoverable diagnostic.
pub const MAX_SCOPE_DEPTH: usize = 256;

#[derive(Default)]
pub struct SymbolTable {
    entries: Vec<Entry>,
    head: Option<EntryId>,
    bases: Vec<Option<EntryId>>,
}

impl SymbolTable {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn enter_scope(&mut self) {
        assert!(
            self.bases.len() < MAX_SCOPE_DEPTH,
            "scope nesting exceeds the fixed symbol table depth of {MAX_SCOPE_DEPTH}"
        );
        self.bases.push(self.head);
    }

    pub fn exit_scope(&mut self) {
        self.head = self.bases.pop().expect("exit_scope called without a matching enter_scope");
    }

    /// Declares `name` in the innermost scope. Returns the new entry's id on
    /// success, or the id of the conflicting entry already present in this
    /// scope (not an outer one) on failure — enclosing scopes are shadowed,
    /// never conflicted with.
    pub fn declare(&mut self, name: &str, location: Location, scope: Scope, mutability: Mutability) -> Result<EntryId, EntryId> {
        let boundary = self.bases.last().copied().unwrap_or(None);
        let mut cursor = self.head;
        while let Some(id) = cursor {
            if Some(id) == boundary {
                break;
            }
            if self.entries[id as usize].name == name {
                return Err(id);
            }
            cursor = self.entries[id as usize].prev;
        }

        let id = u32::try_from(self.entries.len()).expect("symbol table exhausted u32 index space");
        self.entries.push(Entry {
            prev: self.head,
            name: name.to_string(),
            location,
            scope,
            mutability,
            ty: None,
            folded_value: None,
            local_slot: None,
        });
        self.head = Some(id);
        Ok(id)
    }

    /// Finds the first match from innermost scope outward, or `None`.
    #[must_use]
    pub fn lookup(&self, name: &str) -> Option<EntryId> {
        let mut cursor = self.head;
        while let Some(id) = cursor {
            if self.entries[id as usize].name == name {
                return Some(id);
            }
            cursor = self.entries[id as usize].prev;
        }
        None
    }

    #[must_use]
    pub fn get(&self, id: EntryId) -> &Entry {
        &self.entries[id as usize]
    }

    pub fn get_mut(&mut self, id: EntryId) -> &mut Entry {
        &mut self.entries[id as usize]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn loc() -> Location {
        Location::new("t.plx", 1, 1, 0)
    }

    #[test]
    fn declare_then_lookup_returns_fresh_entry() {
        let mut table = SymbolTable::new();
        let id = table.declare("n", loc(), Scope::Global, Mutability::Const).unwrap();
        assert_eq!(table.lookup("n"), Some(id));
    }

    #[test]
    fn duplicate_declare_in_same_scope_fails() {
        let mut table = SymbolTable::new();
        let first = table.declare("n", loc(), Scope::Global, Mutability::Const).unwrap();
        let err = table.declare("n", loc(), Scope::Global, Mutability::Const).unwrap_err();
        assert_eq!(err, first);
    }

    #[test]
    fn exiting_scope_forgets_local_declarations() {
        let mut table = SymbolTable::new();
        table.enter_scope();
        table.declare("n", loc(), Scope::Local, Mutability::Var).unwrap();
        assert!(table.lookup("n").is_some());
        table.exit_scope();
        assert!(table.lookup("n").is_none());
    }

    #[test]
    fn shadowing_nests_and_unnests_correctly() {
        let mut table = SymbolTable::new();
        let outer = table.declare("n", loc(), Scope::Global, Mutability::Const).unwrap();
        table.enter_scope();
        let inner = table.declare("n", loc(), Scope::Local, Mutability::Var).unwrap();
        assert_eq!(table.lookup("n"), Some(inner));
        table.exit_scope();
        assert_eq!(table.lookup("n"), Some(outer));
    }

    #[test]
    #[should_panic(expected = "exceeds the fixed symbol table depth")]
    fn scope_nesting_beyond_fixed_depth_is_fatal() {
        let mut table = SymbolTable::new();
        for _ in 0..=MAX_SCOPE_DEPTH {
            table.enter_scope();
        }
    }
}
