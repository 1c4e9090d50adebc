/// Disjoint sets over the indices `0..n`, with path compression and union by rank.
#[derive(Debug, Clone)]
pub struct UnionFind {
    parent: Vec<usize>,
    rank: Vec<u8>,
}

impl UnionFind {
    pub fn new(n: usize) -> Self {
        Self {
            parent: (0..n).collect(),
            rank: vec![0; n],
        }
    }

    pub fn len(&self) -> usize {
        self.parent.len()
    }

    pub fn is_empty(&self) -> bool {
        self.parent.is_empty()
    }

    pub fn find(&mut self, x: usize) -> usize {
        let mut root = x;
        while self.parent[root] != root {
            root = self.parent[root];
        }
        let mut node = x;
        while self.parent[node] != root {
            let next = self.parent[node];
            self.parent[node] = root;
            node = next;
        }
        root
    }

    /// Merges the sets of `x` and `y` and returns the new representative.
    pub fn union(&mut self, x: usize, y: usize) -> usize {
        let xr = self.find(x);
        let yr = self.find(y);
        if xr == yr {
            return xr;
        }
        match self.rank[xr].cmp(&self.rank[yr]) {
            std::cmp::Ordering::Less => {
                self.parent[xr] = yr;
                yr
            }
            std::cmp::Ordering::Greater => {
                self.parent[yr] = xr;
                xr
            }
            std::cmp::Ordering::Equal => {
                self.parent[yr] = xr;
                self.rank[xr] += 1;
                xr
            }
        }
    }

    /// Groups all indices by representative. Groups are ordered by their
    /// smallest member and members are ascending.
    pub fn groups(&mut self) -> Vec<Vec<usize>> {
        let mut slot_of_root = vec![usize::MAX; self.len()];
        let mut groups: Vec<Vec<usize>> = Vec::new();
        for i in 0..self.len() {
            let root = self.find(i);
            if slot_of_root[root] == usize::MAX {
                slot_of_root[root] = groups.len();
                groups.push(Vec::new());
            }
            groups[slot_of_root[root]].push(i);
        }
        groups
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn singletons_until_joined() {
        let mut uf = UnionFind::new(4);
        assert_eq!(uf.groups(), vec![vec![0], vec![1], vec![2], vec![3]]);
        uf.union(0, 2);
        uf.union(3, 1);
        assert_eq!(uf.groups(), vec![vec![0, 2], vec![1, 3]]);
        assert_eq!(uf.find(2), uf.find(0));
        assert_ne!(uf.find(0), uf.find(1));
    }

    #[test]
    fn union_is_transitive() {
        let mut uf = UnionFind::new(6);
        uf.union(0, 1);
        uf.union(2, 3);
        uf.union(1, 3);
        uf.union(4, 5);
        assert_eq!(uf.groups(), vec![vec![0, 1, 2, 3], vec![4, 5]]);
    }

    #[test]
    fn union_same_set_is_noop() {
        let mut uf = UnionFind::new(3);
        let root = uf.union(0, 1);
        assert_eq!(uf.union(1, 0), root);
        assert_eq!(uf.groups().len(), 2);
    }

    #[test]
    fn empty() {
        let mut uf = UnionFind::new(0);
        assert!(uf.is_empty());
        assert!(uf.groups().is_empty());
    }
}
