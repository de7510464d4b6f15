//! Host-defined nodes.

use std::fmt;

use super::Node;
use crate::errors::{BuildError, RewriteError};
use crate::types::Type;

/// Callback an extension uses to rewrite one of its children.
pub type ChildVisitor<'a> = dyn FnMut(&Node) -> Result<Node, RewriteError> + 'a;

/// A node kind defined outside this crate.
///
/// The interpreter never evaluates an extension directly: it calls
/// [`reduce`](Extension::reduce) and evaluates the result. Rewriters see the
/// extension through `visit_extension`, whose default walk defers to
/// [`visit_children`](Extension::visit_children).
pub trait Extension: fmt::Debug + Send + Sync {
    /// Short name used in rendering.
    fn name(&self) -> &str;

    fn value_type(&self) -> Type;

    /// An equivalent tree of built-in nodes.
    fn reduce(&self) -> Result<Node, BuildError>;

    /// Rewrite this node's children with `visit`. `Ok(None)` means nothing
    /// changed and the original node is kept.
    fn visit_children(&self, _visit: &mut ChildVisitor<'_>) -> Result<Option<Node>, RewriteError> {
        Ok(None)
    }
}
