use std::fmt::{self, Display, Formatter};
use std::str::FromStr;

use log::*;
use smallvec::SmallVec;
use symbolic_expressions::Sexp;
use thiserror::Error;

use crate::{
    util::{HashMap, IndexSet},
    EGraph, ENode, Id, Subst, Symbol,
};

/// A pattern that can match against an [`EGraph`] and be instantiated
/// into one.
///
/// A [`Leaf`](Pattern::Leaf) matches any e-node and binds its name to
/// that node. When instantiating, a leaf whose name is bound in the
/// substitution stands for the bound node's class; otherwise it is a
/// literal atom and gets interned as a leaf e-node.
///
/// A [`Compound`](Pattern::Compound) matches e-nodes with the same
/// operator and the same number of children, and each sub-pattern
/// against every node in the corresponding child class.
///
/// Patterns parse from s-expressions:
///
/// ```
/// use eqsat::*;
/// let pat: Pattern = "(add a (add b c))".parse().unwrap();
/// assert_eq!(
///     pat,
///     Pattern::compound("add", vec![
///         Pattern::leaf("a"),
///         Pattern::compound("add", vec![Pattern::leaf("b"), Pattern::leaf("c")]),
///     ])
/// );
/// assert_eq!(pat.to_string(), "(add a (add b c))");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Pattern {
    /// A variable, or a literal atom when instantiated unbound.
    Leaf(Symbol),
    /// An operator applied to sub-patterns.
    Compound(Symbol, Vec<Pattern>),
}

/// A match of a [`Pattern`] somewhere in an [`EGraph`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchMatch {
    /// The canonical class of the node the pattern was rooted at.
    pub eclass: Id,
    /// The bindings found for the pattern's leaves.
    pub subst: Subst,
}

impl Pattern {
    /// Make a [`Leaf`](Pattern::Leaf).
    pub fn leaf(name: impl Into<Symbol>) -> Self {
        Pattern::Leaf(name.into())
    }

    /// Make a [`Compound`](Pattern::Compound).
    pub fn compound(op: impl Into<Symbol>, children: Vec<Pattern>) -> Self {
        Pattern::Compound(op.into(), children)
    }

    /// The distinct leaf names of this pattern, in first-seen order.
    pub fn leaves(&self) -> Vec<Symbol> {
        fn collect(pattern: &Pattern, set: &mut IndexSet<Symbol>) {
            match pattern {
                Pattern::Leaf(name) => {
                    set.insert(*name);
                }
                Pattern::Compound(_, children) => {
                    for child in children {
                        collect(child, set)
                    }
                }
            }
        }
        let mut set = IndexSet::default();
        collect(self, &mut set);
        set.into_iter().collect()
    }

    /// Checks only the root of the pattern against `enode`.
    ///
    /// A leaf accepts anything. A compound pattern needs the same
    /// operator and arity; a same-operator node with a different
    /// number of children is rejected with a warning.
    pub fn matches_locally(&self, enode: &ENode) -> bool {
        match self {
            Pattern::Leaf(_) => true,
            Pattern::Compound(op, children) => {
                if *op != enode.op {
                    return false;
                }
                if children.len() != enode.len() {
                    warn!(
                        concat!(
                            "Different length children in pattern and enode\n",
                            "  enode: {}\n",
                            "  pat: {}"
                        ),
                        enode, self
                    );
                    return false;
                }
                true
            }
        }
    }

    /// All substitutions for this pattern rooted at `enode`.
    pub fn match_node(&self, egraph: &EGraph, enode: &ENode) -> Vec<Subst> {
        Matcher::new(egraph).match_node(self, enode)
    }

    /// All substitutions for this pattern rooted at any node of the
    /// class of `eclass`.
    pub fn match_class(&self, egraph: &EGraph, eclass: Id) -> Vec<Subst> {
        Matcher::new(egraph).match_class(self, egraph.find(eclass))
    }

    /// Searches every entry of the hash-cons table.
    ///
    /// This is a full rescan; nothing is indexed between calls.
    pub fn search(&self, egraph: &EGraph) -> Vec<SearchMatch> {
        let matcher = Matcher::new(egraph);
        let mut matches = vec![];
        for (enode, eclass) in egraph.nodes() {
            for subst in matcher.match_node(self, enode) {
                matches.push(SearchMatch { eclass, subst });
            }
        }
        debug!("Found {} matches for {}", matches.len(), self);
        matches
    }

    /// Instantiates this pattern in `egraph` under `subst`, returning
    /// the id of the root.
    ///
    /// # Panics
    /// Panics if a bound node is not in `egraph`.
    pub fn apply(&self, egraph: &mut EGraph, subst: &Subst) -> Id {
        match self {
            Pattern::Leaf(name) => match subst.get(*name) {
                Some(node) => egraph.get_id(node),
                None => egraph.add(ENode::leaf(*name)),
            },
            Pattern::Compound(op, children) => {
                let ids: SmallVec<[Id; 2]> = children
                    .iter()
                    .map(|child| child.apply(egraph, subst))
                    .collect();
                egraph.add(ENode::new(*op, ids))
            }
        }
    }
}

/// A snapshot of the graph's classes used for one round of matching.
struct Matcher<'a> {
    egraph: &'a EGraph,
    classes: HashMap<Id, Vec<&'a ENode>>,
}

impl<'a> Matcher<'a> {
    fn new(egraph: &'a EGraph) -> Self {
        Self {
            egraph,
            classes: egraph.class_index(),
        }
    }

    fn match_class(&self, pattern: &Pattern, eclass: Id) -> Vec<Subst> {
        match self.classes.get(&eclass) {
            Some(nodes) => nodes
                .iter()
                .flat_map(|enode| self.match_node(pattern, enode))
                .collect(),
            None => vec![],
        }
    }

    fn match_node(&self, pattern: &Pattern, enode: &ENode) -> Vec<Subst> {
        if !pattern.matches_locally(enode) {
            return vec![];
        }

        let children = match pattern {
            Pattern::Leaf(name) => return vec![Subst::singleton(*name, enode.clone())],
            Pattern::Compound(_, children) => children,
        };

        // cartesian product over the child positions, dropping
        // combinations that bind a variable two different ways
        let mut substs = vec![Subst::default()];
        for (child, &id) in children.iter().zip(enode.children()) {
            let candidates = self.match_class(child, self.egraph.find(id));
            let mut next = Vec::with_capacity(substs.len() * candidates.len());
            for partial in &substs {
                next.extend(candidates.iter().filter_map(|c| partial.merge(c)));
            }
            substs = next;
            if substs.is_empty() {
                break;
            }
        }
        substs
    }
}

/// An error raised when parsing a [`Pattern`].
#[derive(Debug, Error)]
pub enum PatternParseError {
    /// The input was not a well-formed s-expression.
    #[error("could not parse s-expression: {0}")]
    BadSexp(String),
    /// The input (or a sub-list) was empty.
    #[error("found an empty s-expression")]
    EmptySexp,
    /// A list appeared where an operator was expected.
    #[error("found a list in the head position: {0}")]
    ListInHead(String),
}

fn parse_sexp(sexp: &Sexp) -> Result<Pattern, PatternParseError> {
    match sexp {
        Sexp::Empty => Err(PatternParseError::EmptySexp),
        Sexp::String(s) => Ok(Pattern::leaf(s.as_str())),
        Sexp::List(list) if list.is_empty() => Err(PatternParseError::EmptySexp),
        Sexp::List(list) => match &list[0] {
            Sexp::Empty => Err(PatternParseError::EmptySexp),
            Sexp::List(_) => Err(PatternParseError::ListInHead(sexp.to_string())),
            Sexp::String(op) => {
                let children = list[1..]
                    .iter()
                    .map(parse_sexp)
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(Pattern::compound(op.as_str(), children))
            }
        },
    }
}

impl FromStr for Pattern {
    type Err = PatternParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let sexp = symbolic_expressions::parser::parse_str(s.trim())
            .map_err(|e| PatternParseError::BadSexp(e.to_string()))?;
        parse_sexp(&sexp)
    }
}

impl Display for Pattern {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Pattern::Leaf(name) => write!(f, "{}", name),
            Pattern::Compound(op, children) => {
                write!(f, "({}", op)?;
                for child in children {
                    write!(f, " {}", child)?;
                }
                write!(f, ")")
            }
        }
    }
}
