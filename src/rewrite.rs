use std::fmt::{self, Debug};

use log::*;
use thiserror::Error;

use crate::{util::IndexMap, EGraph, Id, Pattern, SearchMatch, Subst, Symbol};

/// A rewrite that searches for the lefthand side and instantiates the
/// righthand side.
///
/// The `rename` map carries each lhs variable over to the name the rhs
/// uses for it. Leaves of the rhs that are not targets of the renaming
/// are literal atoms.
///
/// Most rewrites are written with the [`rewrite!`] macro, which uses
/// [`Rewrite::simple`]:
///
/// ```
/// use eqsat::*;
/// let comm: Rewrite = rewrite!("comm-add"; "(add a b)" => "(add b a)");
/// assert_eq!(comm.name(), "comm-add");
/// ```
#[derive(Clone)]
pub struct Rewrite {
    name: String,
    lhs: Pattern,
    rhs: Pattern,
    rename: IndexMap<Symbol, Symbol>,
}

/// An error raised when building a [`Rewrite`].
#[derive(Debug, Error, PartialEq, Eq)]
pub enum RewriteError {
    /// A renaming key does not occur in the lefthand side.
    #[error("rewrite {name}: variable '{var}' is not a leaf of the lefthand side")]
    UnboundVariable {
        /// The rule name.
        name: String,
        /// The offending variable.
        var: Symbol,
    },
}

impl Debug for Rewrite {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Rewrite")
            .field("name", &self.name)
            .field("lhs", &DisplayAsDebug(&self.lhs))
            .field("rhs", &DisplayAsDebug(&self.rhs))
            .field("rename", &self.rename)
            .finish()
    }
}

struct DisplayAsDebug<'a>(&'a Pattern);

impl Debug for DisplayAsDebug<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl Rewrite {
    /// Create a new [`Rewrite`] with an explicit variable renaming.
    ///
    /// # Example
    /// ```
    /// use eqsat::*;
    /// let lhs: Pattern = "(neg (neg x))".parse().unwrap();
    /// let rhs = Pattern::leaf("y");
    /// let rw = Rewrite::new("neg-neg", lhs.clone(), rhs.clone(), vec![("x", "y")]).unwrap();
    /// assert_eq!(rw.rhs(), &rhs);
    ///
    /// let bad = Rewrite::new("oops", lhs, rhs, vec![("z", "y")]);
    /// assert!(bad.is_err());
    /// ```
    pub fn new<S>(
        name: impl Into<String>,
        lhs: Pattern,
        rhs: Pattern,
        rename: impl IntoIterator<Item = (S, S)>,
    ) -> Result<Self, RewriteError>
    where
        S: Into<Symbol>,
    {
        let name = name.into();
        let leaves = lhs.leaves();
        let mut map = IndexMap::default();
        for (from, to) in rename {
            let from = from.into();
            if !leaves.contains(&from) {
                return Err(RewriteError::UnboundVariable { name, var: from });
            }
            map.insert(from, to.into());
        }
        Ok(Self {
            name,
            lhs,
            rhs,
            rename: map,
        })
    }

    /// Create a [`Rewrite`] that keeps every lhs variable's name.
    pub fn simple(name: impl Into<String>, lhs: Pattern, rhs: Pattern) -> Self {
        let rename = lhs.leaves().into_iter().map(|v| (v, v)).collect();
        Self {
            name: name.into(),
            lhs,
            rhs,
            rename,
        }
    }

    /// The name of the rewrite.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The lefthand side.
    pub fn lhs(&self) -> &Pattern {
        &self.lhs
    }

    /// The righthand side.
    pub fn rhs(&self) -> &Pattern {
        &self.rhs
    }

    /// Searches the whole graph for the lefthand side.
    pub fn search(&self, egraph: &EGraph) -> Vec<SearchMatch> {
        self.lhs.search(egraph)
    }

    /// Instantiates the righthand side for one match and returns its id.
    /// The caller is responsible for merging it with the matched class.
    ///
    /// # Panics
    /// Panics if a variable of the renaming is not bound in `subst`.
    pub fn apply(&self, egraph: &mut EGraph, subst: &Subst) -> Id {
        let renamed = subst.rename(&self.rename);
        let id = self.rhs.apply(egraph, &renamed);
        trace!("Applied {} with {}: {}", self.name, renamed, id);
        id
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_checks_the_renaming() {
        let lhs: Pattern = "(mul a one)".parse().unwrap();
        let rhs = Pattern::leaf("b");

        assert!(Rewrite::new("ok", lhs.clone(), rhs.clone(), vec![("a", "b")]).is_ok());
        // an empty renaming is fine, everything on the right is literal
        assert!(Rewrite::new("lit", lhs.clone(), rhs.clone(), Vec::<(&str, &str)>::new()).is_ok());

        let err = Rewrite::new("bad", lhs, rhs, vec![("c", "b")]).unwrap_err();
        assert_eq!(
            err,
            RewriteError::UnboundVariable {
                name: "bad".into(),
                var: Symbol::from("c"),
            }
        );
        assert!(err.to_string().contains("'c'"));
    }

    #[test]
    fn apply_renames_variables() {
        crate::init_logger();
        let mut egraph = EGraph::default();
        let x = egraph.make("x", &[]);
        let one = egraph.make("one", &[]);
        let root = egraph.make("mul", &[x, one]);

        let rw = Rewrite::new(
            "mul-one",
            "(mul a one)".parse().unwrap(),
            "(id b)".parse().unwrap(),
            vec![("a", "b")],
        )
        .unwrap();

        let matches = rw.search(&egraph);
        assert_eq!(matches.len(), 1);
        assert_eq!(matches[0].eclass, root);

        let id = rw.apply(&mut egraph, &matches[0].subst);
        assert_eq!(egraph.lookup(&crate::ENode::new("id", vec![x])), Some(id));
        assert!(!egraph.equal(id, root));
    }

    #[test]
    fn unrenamed_rhs_leaves_are_literals() {
        let mut egraph = EGraph::default();
        let x = egraph.make("x", &[]);
        egraph.make("f", &[x]);

        let rw = Rewrite::simple(
            "f-to-g",
            "(f a)".parse().unwrap(),
            "(g a zero)".parse().unwrap(),
        );
        let m = rw.search(&egraph).remove(0);
        let id = rw.apply(&mut egraph, &m.subst);

        let zero = egraph.lookup(&crate::ENode::leaf("zero")).unwrap();
        assert_eq!(egraph.lookup(&crate::ENode::new("g", vec![x, zero])), Some(id));
    }

    #[test]
    #[should_panic(expected = "not found")]
    fn apply_with_missing_binding_panics() {
        let mut egraph = EGraph::default();
        let rw = Rewrite::simple("r", "(f a)".parse().unwrap(), "a".parse().unwrap());
        rw.apply(&mut egraph, &Subst::default());
    }
}
