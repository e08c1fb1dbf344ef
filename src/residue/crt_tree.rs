//! Balanced product tree over the slot factors.
//!
//! Node `n` covers the factors `offset..offset + extent` and stores their
//! product. Reconstruction walks the tree bottom-up, merging two children as
//! `left * prod(right) + right * prod(left)`; decomposition walks it
//! top-down, reducing by each node's product. Both cost `O(log nSlots)`
//! levels of polynomial arithmetic instead of `nSlots` sequential steps.

use crate::rings::poly::ModPoly;

#[derive(Debug, Clone)]
struct CrtNode {
    product: ModPoly,
    offset: usize,
    extent: usize,
    children: Option<(usize, usize)>,
}

/// Arena of tree nodes; the root is the last node pushed.
#[derive(Debug, Clone)]
pub struct CrtTree {
    nodes: Vec<CrtNode>,
}

impl CrtTree {
    pub fn new(factors: &[ModPoly]) -> Self {
        assert!(!factors.is_empty(), "CrtTree::new: no factors");
        let mut tree = Self {
            nodes: Vec::with_capacity(2 * factors.len()),
        };
        tree.build(factors, 0, factors.len());
        tree
    }

    fn build(&mut self, factors: &[ModPoly], offset: usize, extent: usize) -> usize {
        let node = if extent == 1 {
            CrtNode {
                product: factors[offset].clone(),
                offset,
                extent,
                children: None,
            }
        } else {
            let half = extent / 2;
            let left = self.build(factors, offset, half);
            let right = self.build(factors, offset + half, extent - half);
            CrtNode {
                product: &self.nodes[left].product * &self.nodes[right].product,
                offset,
                extent,
                children: Some((left, right)),
            }
        };
        self.nodes.push(node);
        self.nodes.len() - 1
    }

    fn root(&self) -> usize {
        self.nodes.len() - 1
    }

    pub fn len(&self) -> usize {
        self.nodes[self.root()].extent
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Product of all factors.
    pub fn product(&self) -> &ModPoly {
        &self.nodes[self.root()].product
    }

    /// `sum_i leaves[i] * prod_{j != i} F_j`.
    pub fn evaluate(&self, leaves: &[ModPoly]) -> ModPoly {
        assert_eq!(leaves.len(), self.len(), "CrtTree::evaluate: wrong leaf count");
        self.eval_node(self.root(), leaves)
    }

    fn eval_node(&self, idx: usize, leaves: &[ModPoly]) -> ModPoly {
        let node = &self.nodes[idx];
        match node.children {
            None => leaves[node.offset].clone(),
            Some((left, right)) => {
                let l = self.eval_node(left, leaves);
                let r = self.eval_node(right, leaves);
                &(&l * &self.nodes[right].product) + &(&r * &self.nodes[left].product)
            }
        }
    }

    /// `h mod F_i` for every factor, by a remainder tree.
    pub fn reduce(&self, h: &ModPoly) -> Vec<ModPoly> {
        let mut out = Vec::with_capacity(self.len());
        self.reduce_node(self.root(), &h.rem(self.product()), &mut out);
        out
    }

    fn reduce_node(&self, idx: usize, h: &ModPoly, out: &mut Vec<ModPoly>) {
        let node = &self.nodes[idx];
        match node.children {
            None => out.push(h.clone()),
            Some((left, right)) => {
                self.reduce_node(left, &h.rem(&self.nodes[left].product), out);
                self.reduce_node(right, &h.rem(&self.nodes[right].product), out);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn linear_factors(roots: &[u64], q: u64) -> Vec<ModPoly> {
        roots
            .iter()
            .map(|&a| ModPoly::from_coeffs(&[q - a, 1], q))
            .collect()
    }

    #[test]
    fn product_and_reduction() {
        let factors = linear_factors(&[1, 2, 3, 4, 5], 17);
        let tree = CrtTree::new(&factors);
        assert_eq!(tree.len(), 5);
        let expected = factors.iter().fold(ModPoly::one(17), |acc, f| &acc * f);
        assert_eq!(tree.product(), &expected);

        // h = x^2 evaluates to a^2 at each root a.
        let h = ModPoly::monomial(1, 2, 17);
        let residues = tree.reduce(&h);
        let values: Vec<u64> = residues.iter().map(|r| r.coeff(0)).collect();
        assert_eq!(values, vec![1, 4, 9, 16, 8]);
    }

    #[test]
    fn evaluate_weights_each_leaf_by_its_cofactor() {
        let factors = linear_factors(&[1, 2, 3], 17);
        let tree = CrtTree::new(&factors);
        let leaves = vec![ModPoly::one(17), ModPoly::zero(17), ModPoly::zero(17)];
        // (x - 2)(x - 3)
        assert_eq!(tree.evaluate(&leaves), &factors[1] * &factors[2]);
    }
}
