use std::fmt::{self, Debug};

use instant::Instant;
use log::*;
use smallvec::SmallVec;

use crate::{
    util::{concat_vecs, HashMap, IndexMap, IndexSet},
    ENode, Id, Pattern, SearchMatch, Subst, Symbol, UnionFind,
};

/** A data structure to keep track of equalities between terms.

An [`EGraph`] is built from three pieces, all owned by the graph:

- a union-find over dense [`Id`]s (the equivalence store),
- a hash-cons table from canonical [`ENode`]s to the [`Id`] that owns
  them, plus the node each fresh [`Id`] was created for,
- a user index: for every class, the `(node, owner)` pairs of the
  nodes that mention the class as a child.

[`merge`](EGraph::merge) only unions and queues work. Congruence
closure is restored in bulk by [`rebuild`](EGraph::rebuild), which
is the only place the hash-cons table and the user index are fixed up.
Searching a graph that has pending work is allowed, but matches are
only complete on a clean graph.
**/
#[derive(Clone, Default)]
pub struct EGraph {
    unionfind: UnionFind,
    /// The node each id was created for, indexed by id.
    nodes: Vec<ENode>,
    /// Canonical at the end of each rebuild, possibly stale in between.
    memo: HashMap<ENode, Id>,
    /// Indexed by id; only the entries of canonical ids are live.
    users: Vec<Vec<(ENode, Id)>>,
    pending: Vec<Id>,
}

impl EGraph {
    /// Canonicalizes an eclass id.
    pub fn find(&self, id: Id) -> Id {
        self.unionfind.find(id)
    }

    /// Same as [`find`](EGraph::find) but compresses paths.
    pub fn find_mut(&mut self, id: Id) -> Id {
        self.unionfind.find_mut(id)
    }

    /// Returns true if `id1` and `id2` are in the same e-class.
    ///
    /// This only reflects the union-find; congruences implied by
    /// unions since the last [`rebuild`](EGraph::rebuild) are not
    /// visible until it runs.
    pub fn equal(&self, id1: Id, id2: Id) -> bool {
        self.unionfind.connected(id1, id2)
    }

    /// Number of entries in the hash-cons table.
    ///
    /// This counts distinct canonical nodes, not classes. After a
    /// [`rebuild`](EGraph::rebuild), two congruent nodes count once.
    ///
    /// # Example
    /// ```
    /// use eqsat::*;
    /// let mut egraph = EGraph::default();
    /// let x = egraph.make("x", &[]);
    /// let y = egraph.make("y", &[]);
    /// egraph.make("f", &[x]);
    /// egraph.make("f", &[y]);
    /// assert_eq!(egraph.size(), 4);
    ///
    /// egraph.merge(x, y);
    /// egraph.rebuild();
    /// assert_eq!(egraph.size(), 3);
    /// assert_eq!(egraph.number_of_classes(), 2);
    /// ```
    pub fn size(&self) -> usize {
        self.memo.len()
    }

    /// Returns true if nothing was ever added.
    pub fn is_empty(&self) -> bool {
        self.unionfind.size() == 0
    }

    /// Number of distinct e-classes.
    pub fn number_of_classes(&self) -> usize {
        self.unionfind.number_of_roots()
    }

    /// Returns true if there is no congruence work waiting for
    /// [`rebuild`](EGraph::rebuild).
    pub fn is_clean(&self) -> bool {
        self.pending.is_empty()
    }

    /// The node `id` was created for, with its children as they were then.
    pub fn id_to_node(&self, id: Id) -> &ENode {
        &self.nodes[usize::from(id)]
    }

    /// Iterates over every entry of the hash-cons table along with
    /// the canonical id of its class.
    pub fn nodes(&self) -> impl Iterator<Item = (&ENode, Id)> + '_ {
        self.memo.iter().map(move |(node, &id)| (node, self.find(id)))
    }

    /// The nodes currently in the class of `id`.
    ///
    /// This scans the whole hash-cons table.
    pub fn class_nodes(&self, id: Id) -> Vec<&ENode> {
        let id = self.find(id);
        self.nodes().filter(|&(_, c)| c == id).map(|(n, _)| n).collect()
    }

    /// Groups the hash-cons table by canonical class id.
    pub(crate) fn class_index(&self) -> HashMap<Id, Vec<&ENode>> {
        let mut classes: HashMap<Id, Vec<&ENode>> = HashMap::default();
        for (node, id) in self.nodes() {
            classes.entry(id).or_default().push(node);
        }
        classes
    }

    fn canonicalize(&mut self, enode: &ENode) -> ENode {
        let unionfind = &mut self.unionfind;
        enode.clone().map_children(|id| unionfind.find_mut(id))
    }

    /// Interns the node `op(children...)`. See [`add`](EGraph::add).
    pub fn make(&mut self, op: impl Into<Symbol>, children: &[Id]) -> Id {
        self.add(ENode::new(op, children.iter().copied()))
    }

    /// Adds `enode` to the [`EGraph`], returning its class id.
    ///
    /// The children are canonicalized first. If an equal node is already
    /// in the hash-cons table its (canonical) id is returned and nothing
    /// changes. Otherwise the node gets a fresh id and is registered as
    /// a user of each of its children's classes.
    pub fn add(&mut self, enode: ENode) -> Id {
        let canon = self.canonicalize(&enode);
        if let Some(&existing) = self.memo.get(&canon) {
            trace!("Added *{:4}: {}", existing, canon);
            return self.find_mut(existing);
        }

        let id = self.unionfind.make_set();
        debug_assert_eq!(Id::from(self.nodes.len()), id);
        self.nodes.push(enode);
        self.users.push(Vec::new());

        let mut child_classes: SmallVec<[Id; 2]> = canon.children.clone();
        child_classes.sort_unstable();
        child_classes.dedup();
        for child in child_classes {
            self.users[usize::from(child)].push((canon.clone(), id));
        }

        trace!("Added  {:4}: {}", id, canon);
        self.memo.insert(canon, id);
        id
    }

    /// Interns a ground term, treating every leaf of `expr` as a
    /// literal atom. Returns the id of the root.
    ///
    /// # Example
    /// ```
    /// use eqsat::*;
    /// let mut egraph = EGraph::default();
    /// let e = egraph.add_expr(&"(add a (add b c))".parse().unwrap());
    /// let a = egraph.make("a", &[]);
    /// let b = egraph.make("b", &[]);
    /// let c = egraph.make("c", &[]);
    /// let bc = egraph.make("add", &[b, c]);
    /// assert_eq!(egraph.size(), 5);
    /// assert_eq!(egraph.lookup(&ENode::new("add", vec![a, bc])), Some(e));
    /// ```
    pub fn add_expr(&mut self, expr: &Pattern) -> Id {
        expr.apply(self, &Subst::default())
    }

    /// Looks up the class of `enode`, if it was interned.
    ///
    /// The node is first looked up exactly as given, which finds nodes
    /// handed out by a search even if unions happened since; failing
    /// that, its canonical form is tried.
    pub fn lookup(&self, enode: &ENode) -> Option<Id> {
        let id = match self.memo.get(enode) {
            Some(&id) => id,
            None => {
                let canon = enode.clone().map_children(|id| self.find(id));
                *self.memo.get(&canon)?
            }
        };
        Some(self.find(id))
    }

    /// Like [`lookup`](EGraph::lookup), but the node must be in the graph.
    ///
    /// # Panics
    /// Panics if `enode` was never interned. That is a bug in the caller.
    pub fn get_id(&self, enode: &ENode) -> Id {
        self.lookup(enode)
            .unwrap_or_else(|| panic!("ENode {} was never added to the egraph", enode))
    }

    /// Looks up a ground term without adding anything, treating every
    /// leaf as a literal atom.
    pub fn lookup_expr(&self, expr: &Pattern) -> Option<Id> {
        match expr {
            Pattern::Leaf(name) => self.lookup(&ENode::leaf(*name)),
            Pattern::Compound(op, children) => {
                let ids = children
                    .iter()
                    .map(|child| self.lookup_expr(child))
                    .collect::<Option<SmallVec<[Id; 2]>>>()?;
                self.lookup(&ENode::new(*op, ids))
            }
        }
    }

    /// Unions the classes of `id1` and `id2`, returning the new canonical id.
    ///
    /// If they are already equal nothing happens. Otherwise the user
    /// lists are combined under the new root and the root is queued
    /// for [`rebuild`](EGraph::rebuild).
    pub fn merge(&mut self, id1: Id, id2: Id) -> Id {
        let id1 = self.find_mut(id1);
        let id2 = self.find_mut(id2);
        if id1 == id2 {
            return id1;
        }

        let root = self.unionfind.union(id1, id2);
        let other = if root == id1 { id2 } else { id1 };
        trace!("Merged {} into {}", other, root);

        let moved = std::mem::take(&mut self.users[usize::from(other)]);
        concat_vecs(&mut self.users[usize::from(root)], moved);
        self.pending.push(root);
        root
    }

    /// Restores the hash-cons and congruence invariants.
    ///
    /// Drains the worklist until it stays empty, repairing every
    /// class that was merged into. Returns how many passes over the
    /// worklist were needed.
    ///
    /// # Example
    /// ```
    /// use eqsat::*;
    /// let mut egraph = EGraph::default();
    /// let x = egraph.make("x", &[]);
    /// let y = egraph.make("y", &[]);
    /// let fx = egraph.make("f", &[x]);
    /// let fy = egraph.make("f", &[y]);
    /// let gfx = egraph.make("g", &[fx]);
    /// let gfy = egraph.make("g", &[fy]);
    ///
    /// egraph.merge(x, y);
    /// assert!(!egraph.equal(gfx, gfy));
    /// assert!(egraph.rebuild() > 1);
    /// assert!(egraph.equal(gfx, gfy));
    /// assert!(egraph.is_clean());
    /// ```
    pub fn rebuild(&mut self) -> usize {
        if self.pending.is_empty() {
            debug!("Skipping rebuild!");
            return 0;
        }

        let old_size = self.size();
        let old_n_classes = self.number_of_classes();
        let start = Instant::now();

        let mut n_passes = 0;
        while !self.pending.is_empty() {
            let pending = std::mem::take(&mut self.pending);
            let todo: IndexSet<Id> = pending.into_iter().map(|id| self.find_mut(id)).collect();
            n_passes += 1;
            trace!("Rebuild pass {}: repairing {:?}", n_passes, todo);
            for class in todo {
                self.repair(class);
            }
        }

        let trimmed = self.trim_memo();

        let elapsed = start.elapsed();
        info!(
            concat!(
                "REBUILT! {} passes in {}.{:03}s\n",
                "  Old: hc size {}, eclasses: {}\n",
                "  New: hc size {}, eclasses: {}\n",
                "  trimmed memo entries: {}"
            ),
            n_passes,
            elapsed.as_secs(),
            elapsed.subsec_millis(),
            old_size,
            old_n_classes,
            self.size(),
            self.number_of_classes(),
            trimmed,
        );
        n_passes
    }

    /// Re-canonicalizes every user of `class`, merging the owners of
    /// users that turn out to be congruent.
    fn repair(&mut self, class: Id) {
        let class = self.find_mut(class);
        let users = std::mem::take(&mut self.users[usize::from(class)]);
        if users.is_empty() {
            return;
        }

        for (node, owner) in &users {
            self.memo.remove(node);
            let canon = self.canonicalize(node);
            let owner = self.find_mut(*owner);
            self.memo.insert(canon, owner);
        }

        let mut repaired: IndexMap<ENode, Id> = IndexMap::default();
        for (node, owner) in users {
            let canon = self.canonicalize(&node);
            if let Some(&other) = repaired.get(&canon) {
                if self.find_mut(owner) != self.find_mut(other) {
                    trace!("Congruent users {} and {} at {}", owner, other, canon);
                    self.merge(owner, other);
                }
            }
            let owner = self.find_mut(owner);
            repaired.insert(canon, owner);
        }

        // a nested merge may have moved this class under another root
        let root = self.find_mut(class);
        concat_vecs(&mut self.users[usize::from(root)], repaired.into_iter().collect());
    }

    /// Drops hash-cons entries left stale by earlier repairs and points
    /// the survivors at canonical ids. Returns how many were dropped.
    ///
    /// A node appears in the user list of each of its child classes,
    /// possibly in an older form, so repairing one class cannot remove
    /// every stale copy. Once the worklist is empty the canonical form
    /// of every node is present, so only canonical keys are kept.
    fn trim_memo(&mut self) -> usize {
        let before = self.memo.len();
        let unionfind = &mut self.unionfind;
        self.memo.retain(|node, id| {
            *id = unionfind.find_mut(*id);
            node.children().iter().all(|&c| unionfind.find_mut(c) == c)
        });
        before - self.memo.len()
    }

    /// Searches the whole graph for `pattern`. See [`Pattern::search`].
    pub fn search(&self, pattern: &Pattern) -> Vec<SearchMatch> {
        pattern.search(self)
    }

    /// Returns a [`Debug`] wrapper that prints every class and its nodes.
    pub fn dump(&self) -> impl Debug + '_ {
        EGraphDump(self)
    }
}

// manual debug impl so the output stays readable
impl Debug for EGraph {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("EGraph")
            .field("size", &self.size())
            .field("classes", &self.number_of_classes())
            .field("pending", &self.pending)
            .finish()
    }
}

struct EGraphDump<'a>(&'a EGraph);

impl<'a> Debug for EGraphDump<'a> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut classes: Vec<_> = self.0.class_index().into_iter().collect();
        classes.sort_unstable_by_key(|(id, _)| *id);
        for (id, mut nodes) in classes {
            nodes.sort_unstable();
            write!(f, "{}:", id)?;
            for node in nodes {
                write!(f, " {}", node)?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}
