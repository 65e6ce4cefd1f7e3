//! The tree intermediate representation shared by every compiler stage.
//!
//! One uniform node shape represents modules, definitions, statements,
//! expressions, literals, and type expressions alike. Nodes are allocated
//! from a [`Pool`] owned by a single compilation and referenced everywhere
//! else by the lightweight [`NodeId`] index, mirroring the arena-of-ids shape
//! used throughout this codebase's other tree-shaped data structures.

pub mod kind;
pub mod pool;

pub use kind::NodeKind;
pub use plx_diagnostics::SourceLocation as Location;
pub use pool::{EntryId, Node, NodeId, Payload, Pool};
