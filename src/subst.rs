use std::fmt;

use smallvec::SmallVec;

use crate::{util::IndexMap, ENode, Symbol};

/// A substitution mapping pattern variables to the e-nodes they matched.
///
/// Variables are bound to a specific [`ENode`] found in a class, not
/// just to the class [`Id`](crate::Id). This is what lets a search
/// enumerate every combination of nodes across argument classes.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Subst {
    vec: SmallVec<[(Symbol, ENode); 3]>,
}

impl Subst {
    /// A substitution binding only `var`.
    pub fn singleton(var: Symbol, node: ENode) -> Self {
        let mut subst = Self::default();
        subst.insert(var, node);
        subst
    }

    /// Insert something, returning the old node if `var` was bound.
    pub fn insert(&mut self, var: Symbol, node: ENode) -> Option<ENode> {
        for pair in &mut self.vec {
            if pair.0 == var {
                return Some(std::mem::replace(&mut pair.1, node));
            }
        }
        self.vec.push((var, node));
        None
    }

    /// Retrieve a variable's binding, returning `None` if not present.
    pub fn get(&self, var: Symbol) -> Option<&ENode> {
        self.vec
            .iter()
            .find_map(|(v, node)| if *v == var { Some(node) } else { None })
    }

    /// Number of bound variables.
    pub fn len(&self) -> usize {
        self.vec.len()
    }

    /// Returns true if nothing is bound.
    pub fn is_empty(&self) -> bool {
        self.vec.is_empty()
    }

    /// Iterates over the bindings in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (Symbol, &ENode)> {
        self.vec.iter().map(|(v, node)| (*v, node))
    }

    /// The union of two substitutions, or `None` if some variable is
    /// bound to different nodes in each.
    pub fn merge(&self, other: &Subst) -> Option<Subst> {
        let mut merged = self.clone();
        for (var, node) in other.iter() {
            match merged.get(var) {
                Some(bound) if bound != node => return None,
                Some(_) => {}
                None => {
                    merged.vec.push((var, node.clone()));
                }
            }
        }
        Some(merged)
    }

    /// Rekeys the bindings through `renaming`. Variables not named in
    /// `renaming` are dropped.
    ///
    /// # Panics
    /// Panics if a key of `renaming` is unbound here.
    pub(crate) fn rename(&self, renaming: &IndexMap<Symbol, Symbol>) -> Subst {
        let mut renamed = Subst::default();
        for (&from, &to) in renaming {
            let node = self
                .get(from)
                .unwrap_or_else(|| panic!("Var '{}' not found in {}", from, self));
            renamed.insert(to, node.clone());
        }
        renamed
    }
}

impl std::ops::Index<Symbol> for Subst {
    type Output = ENode;

    fn index(&self, var: Symbol) -> &Self::Output {
        match self.get(var) {
            Some(node) => node,
            None => panic!("Var '{}' not found in {}", var, self),
        }
    }
}

impl fmt::Display for Subst {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{{")?;
        for (i, (var, node)) in self.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}: {}", var, node)?;
        }
        write!(f, "}}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Id;

    fn leaf(name: &str) -> ENode {
        ENode::leaf(name)
    }

    #[test]
    fn merge_agrees_or_fails() {
        let a = Symbol::from("a");
        let b = Symbol::from("b");
        let s1 = Subst::singleton(a, leaf("x"));
        let s2 = Subst::singleton(b, leaf("y"));
        let s3 = Subst::singleton(a, leaf("x"));
        let s4 = Subst::singleton(a, ENode::new("f", vec![Id::from(0)]));

        let merged = s1.merge(&s2).unwrap();
        assert_eq!(merged.len(), 2);
        assert_eq!(merged[a], leaf("x"));
        assert_eq!(merged[b], leaf("y"));

        assert_eq!(s1.merge(&s3), Some(s1.clone()));
        assert_eq!(s1.merge(&s4), None);
        assert_eq!(Subst::default().merge(&s4), Some(s4));
    }

    #[test]
    fn rename_rekeys_and_drops() {
        let (a, b, c) = (Symbol::from("a"), Symbol::from("b"), Symbol::from("c"));
        let mut subst = Subst::singleton(a, leaf("x"));
        subst.insert(b, leaf("y"));

        let mut renaming = IndexMap::default();
        renaming.insert(a, c);
        let renamed = subst.rename(&renaming);

        assert_eq!(renamed.len(), 1);
        assert_eq!(renamed.get(c), Some(&leaf("x")));
        assert_eq!(renamed.get(a), None);
        assert_eq!(renamed.to_string(), "{c: x}");
    }

    #[test]
    #[should_panic(expected = "not found")]
    fn rename_panics_on_unbound_variable() {
        let subst = Subst::singleton(Symbol::from("a"), leaf("x"));
        let mut renaming = IndexMap::default();
        renaming.insert(Symbol::from("zzz"), Symbol::from("a"));
        subst.rename(&renaming);
    }
}
