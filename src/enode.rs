use std::fmt::{self, Display, Formatter};

use smallvec::SmallVec;

use crate::{Id, Symbol};

/// An e-node: an operator applied to an ordered list of child e-class [`Id`]s.
///
/// A leaf (no children) is how literal atoms like `x` or `0` are
/// represented. E-nodes are plain values; what makes one canonical is
/// that every child id is a root of the [`EGraph`](crate::EGraph)'s
/// union-find, which [`EGraph`](crate::EGraph) takes care of.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ENode {
    /// The operator or atom label.
    pub op: Symbol,
    /// The children, in order.
    pub children: SmallVec<[Id; 2]>,
}

#[allow(clippy::len_without_is_empty)]
impl ENode {
    /// Create an e-node from an operator and its children.
    pub fn new(op: impl Into<Symbol>, children: impl IntoIterator<Item = Id>) -> Self {
        let op = op.into();
        let children = children.into_iter().collect();
        Self { op, children }
    }

    /// Create an e-node with no children.
    pub fn leaf(op: impl Into<Symbol>) -> Self {
        Self {
            op: op.into(),
            children: SmallVec::new(),
        }
    }

    /// The child ids of this node.
    pub fn children(&self) -> &[Id] {
        &self.children
    }

    /// Number of children.
    pub fn len(&self) -> usize {
        self.children.len()
    }

    /// Returns true if this node has no children.
    pub fn is_leaf(&self) -> bool {
        self.children.is_empty()
    }

    /// Returns true if `other` has the same operator and arity.
    /// Children are not compared.
    pub fn matches(&self, other: &Self) -> bool {
        self.op == other.op && self.len() == other.len()
    }

    /// Replace every child id with `f(child)`.
    pub fn update_children<F: FnMut(Id) -> Id>(&mut self, mut f: F) {
        for id in self.children.iter_mut() {
            *id = f(*id)
        }
    }

    /// Like [`update_children`](ENode::update_children), but by value.
    pub fn map_children<F: FnMut(Id) -> Id>(mut self, f: F) -> Self {
        self.update_children(f);
        self
    }
}

impl Display for ENode {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        if self.is_leaf() {
            return write!(f, "{}", self.op);
        }
        write!(f, "({}", self.op)?;
        for child in &self.children {
            write!(f, " {}", child)?;
        }
        write!(f, ")")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_and_matches() {
        let x = ENode::leaf("x");
        let f1 = ENode::new("f", vec![Id::from(0), Id::from(1)]);
        let f2 = ENode::new("f", vec![Id::from(2), Id::from(3)]);
        let f3 = ENode::new("f", vec![Id::from(2)]);

        assert_eq!(x.to_string(), "x");
        assert_eq!(f1.to_string(), "(f 0 1)");
        assert!(x.is_leaf());
        assert!(f1.matches(&f2));
        assert!(!f1.matches(&f3));
        assert!(!f1.matches(&x));
        assert_ne!(f1, f2);
    }

    #[test]
    fn map_children_rewrites_ids() {
        let n = ENode::new("g", vec![Id::from(1), Id::from(4)]);
        let n = n.map_children(|id| Id::from(usize::from(id) * 2));
        assert_eq!(n.children(), &[Id::from(2), Id::from(8)]);
    }
}
