//! Arena storage for tree nodes.
//!
//! The pool owns every [`Node`] created during a compilation and is never
//! pruned during the run; a compilation drops the whole pool at once when it
//! finishes. Everywhere else in the pipeline, nodes are referred to by the
//! lightweight, `Copy` [`NodeId`] index rather than by reference, so passes
//! can hold many ids around without fighting the borrow checker while they
//! mutate the pool in place (constant folding, type annotation).

use crate::kind::NodeKind;
use crate::Location;

/// Index of a [`Node`] within its owning [`Pool`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct NodeId(pub u32);

/// Opaque index into a symbol table's entry storage, stashed on resolved
/// identifier payloads. The entry storage itself lives in `plx-sema`; this
/// crate only needs something `Copy` to park on the node.
pub type EntryId = u32;

/// The payload carried by a node, keyed by its kind. Non-literal,
/// non-identifier kinds carry [`Payload::None`].
#[derive(Clone, Debug, PartialEq)]
pub enum Payload {
    None,
    /// An identifier's name and, once name resolution has run, the id of the
    /// symbol-table entry it refers to.
    Ident { name: String, entry: Option<EntryId> },
    SignedInt(i64),
    UnsignedInt(u64),
    Float(f64),
    Bool(bool),
    Bytes(Vec<u8>),
}

/// One tree node: a kind tag, its payload, an ordered child list, and an
/// optional type annotation filled in by the type checker.
#[derive(Clone, Debug)]
pub struct Node {
    pub kind: NodeKind,
    pub payload: Payload,
    pub children: Vec<NodeId>,
    pub ty: Option<NodeId>,
    pub location: Location,
}

impl Node {
    #[must_use]
    pub fn ident_name(&self) -> Option<&str> {
        match &self.payload {
            Payload::Ident { name, .. } => Some(name.as_str()),
            _ => None,
        }
    }

    #[must_use]
    pub fn ident_entry(&self) -> Option<EntryId> {
        match &self.payload {
            Payload::Ident { entry, .. } => *entry,
            _ => None,
        }
    }
}

/// Owns every node allocated during one compilation.
#[derive(Default)]
pub struct Pool {
    nodes: Vec<Node>,
}

impl Pool {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Allocates a new leaf or container node and returns its id.
    pub fn alloc(&mut self, kind: NodeKind, payload: Payload, children: Vec<NodeId>, location: Location) -> NodeId {
        let id = NodeId(u32::try_from(self.nodes.len()).expect("node pool exhausted u32 index space"));
        self.nodes.push(Node {
            kind,
            payload,
            children,
            ty: None,
            location,
        });
        id
    }

    #[must_use]
    pub fn get(&self, id: NodeId) -> &Node {
        &self.nodes[id.0 as usize]
    }

    pub fn get_mut(&mut self, id: NodeId) -> &mut Node {
        &mut self.nodes[id.0 as usize]
    }

    #[must_use]
    pub fn kind(&self, id: NodeId) -> NodeKind {
        self.get(id).kind
    }

    #[must_use]
    pub fn children(&self, id: NodeId) -> &[NodeId] {
        &self.get(id).children
    }

    #[must_use]
    pub fn child(&self, id: NodeId, index: usize) -> Option<NodeId> {
        self.get(id).children.get(index).copied()
    }

    #[must_use]
    pub fn type_of(&self, id: NodeId) -> Option<NodeId> {
        self.get(id).ty
    }

    pub fn set_type(&mut self, id: NodeId, ty: NodeId) {
        self.get_mut(id).ty = Some(ty);
    }

    /// Rewrites a node in place, preserving its id (and therefore any
    /// sibling slot that referenced it) while replacing its kind, payload,
    /// and children. Used by the constant folder and the validator, which
    /// must never change a node's identity mid-traversal.
    pub fn rewrite(&mut self, id: NodeId, kind: NodeKind, payload: Payload, children: Vec<NodeId>) {
        let node = self.get_mut(id);
        node.kind = kind;
        node.payload = payload;
        node.children = children;
    }

    /// Deep-copies the subtree rooted at `id`, allocating fresh nodes and
    /// preserving the original's type annotation. Used when a literal value
    /// stashed on a symbol entry is spliced into a use site, or when a type
    /// node is duplicated into a freshly synthesized composite type.
    pub fn clone_subtree(&mut self, id: NodeId) -> NodeId {
        let node = self.get(id).clone();
        let children: Vec<NodeId> = node.children.iter().map(|&child| self.clone_subtree(child)).collect();
        let new_id = self.alloc(node.kind, node.payload, children, node.location);
        if let Some(ty) = node.ty {
            self.set_type(new_id, ty);
        }
        new_id
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn loc() -> Location {
        Location::new("t.plx", 1, 1, 0)
    }

    #[test]
    fn alloc_assigns_increasing_ids() {
        let mut pool = Pool::new();
        let a = pool.alloc(NodeKind::Nop, Payload::None, vec![], loc());
        let b = pool.alloc(NodeKind::Nop, Payload::None, vec![], loc());
        assert_eq!(a.0 + 1, b.0);
    }

    #[test]
    fn clone_subtree_preserves_shape_and_type() {
        let mut pool = Pool::new();
        let lit = pool.alloc(NodeKind::LitS32, Payload::SignedInt(3), vec![], loc());
        let ty = pool.alloc(NodeKind::TypeS32, Payload::None, vec![], loc());
        pool.set_type(lit, ty);
        let block = pool.alloc(NodeKind::Block, Payload::None, vec![lit], loc());

        let clone = pool.clone_subtree(block);
        assert_ne!(clone, block);
        assert_eq!(pool.kind(clone), NodeKind::Block);
        let clone_lit = pool.child(clone, 0).unwrap();
        assert_ne!(clone_lit, lit);
        assert_eq!(pool.kind(clone_lit), NodeKind::LitS32);
        assert_eq!(pool.type_of(clone_lit), Some(ty));
    }

    #[test]
    fn rewrite_preserves_id() {
        let mut pool = Pool::new();
        let id = pool.alloc(NodeKind::If, Payload::None, vec![], loc());
        pool.rewrite(id, NodeKind::Nop, Payload::None, vec![]);
        assert_eq!(pool.kind(id), NodeKind::Nop);
    }
}
