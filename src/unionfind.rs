use crate::Id;

/// The equivalence store: a union-find over dense [`Id`]s with
/// union-by-size and path compression.
#[derive(Debug, Clone, Default)]
pub struct UnionFind {
    parents: Vec<Id>,
    sizes: Vec<u32>,
    n_roots: usize,
}

impl UnionFind {
    /// Creates a new singleton set, returning its id.
    pub fn make_set(&mut self) -> Id {
        let id = Id::from(self.parents.len());
        self.parents.push(id);
        self.sizes.push(1);
        self.n_roots += 1;
        id
    }

    /// Number of ids handed out so far.
    pub fn size(&self) -> usize {
        self.parents.len()
    }

    /// Number of distinct sets.
    pub fn number_of_roots(&self) -> usize {
        self.n_roots
    }

    fn parent(&self, query: Id) -> Id {
        self.parents[usize::from(query)]
    }

    /// Finds the root of `current` without touching the structure.
    pub fn find(&self, mut current: Id) -> Id {
        while current != self.parent(current) {
            current = self.parent(current)
        }
        current
    }

    /// Finds the root of `current`, pointing every id on the way
    /// directly at it.
    pub fn find_mut(&mut self, current: Id) -> Id {
        let root = self.find(current);
        let mut current = current;
        while current != root {
            let next = self.parent(current);
            self.parents[usize::from(current)] = root;
            current = next;
        }
        root
    }

    /// Unions the sets containing `id1` and `id2`, returning the new root.
    ///
    /// The bigger set keeps its root; on a tie `id1`'s root wins.
    pub fn union(&mut self, id1: Id, id2: Id) -> Id {
        let mut root1 = self.find_mut(id1);
        let mut root2 = self.find_mut(id2);
        if root1 == root2 {
            return root1;
        }

        if self.sizes[usize::from(root1)] < self.sizes[usize::from(root2)] {
            std::mem::swap(&mut root1, &mut root2);
        }

        self.parents[usize::from(root2)] = root1;
        self.sizes[usize::from(root1)] += self.sizes[usize::from(root2)];
        self.n_roots -= 1;
        root1
    }

    /// Returns true if `id1` and `id2` are in the same set.
    pub fn connected(&self, id1: Id, id2: Id) -> bool {
        self.find(id1) == self.find(id2)
    }
}
