//! Regression tree structures
//!
//! Nodes live in a flat vector with node 0 as the root. Thresholds and leaf
//! values are fixed-point integers at `SCALE`.

use serde::{Deserialize, Serialize};

/// A split or leaf node
///
/// Split nodes have `feature >= 0` and valid child indices; leaves have
/// `feature == -1` and carry `leaf`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct Node {
    pub left: i32,
    pub right: i32,
    pub feature: i32,
    pub threshold: i64,
    pub leaf: Option<i64>,
}

impl Node {
    pub fn split(feature: i32, threshold: i64, left: i32, right: i32) -> Self {
        Self {
            left,
            right,
            feature,
            threshold,
            leaf: None,
        }
    }

    pub fn leaf(value: i64) -> Self {
        Self {
            left: -1,
            right: -1,
            feature: -1,
            threshold: 0,
            leaf: Some(value),
        }
    }

    pub fn is_leaf(&self) -> bool {
        self.feature < 0 || self.leaf.is_some()
    }
}

/// A single regression tree
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct Tree {
    pub nodes: Vec<Node>,
}

impl Tree {
    pub fn new(nodes: Vec<Node>) -> Self {
        Self { nodes }
    }

    /// Walk from the root to a leaf; `feature <= threshold` goes left.
    ///
    /// Callers validate the tree first; a malformed path evaluates to 0.
    pub fn evaluate(&self, row: &[i64]) -> i64 {
        let mut idx = 0usize;

        while let Some(node) = self.nodes.get(idx) {
            if node.is_leaf() {
                return node.leaf.unwrap_or(0);
            }

            let Some(&value) = row.get(node.feature as usize) else {
                return 0;
            };

            let next = if value <= node.threshold {
                node.left
            } else {
                node.right
            };
            if next < 0 {
                return 0;
            }
            idx = next as usize;
        }

        0
    }

    /// Highest feature index referenced by any split
    pub fn max_feature(&self) -> Option<usize> {
        self.nodes
            .iter()
            .filter(|n| !n.is_leaf())
            .map(|n| n.feature as usize)
            .max()
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.nodes.is_empty() {
            return Err("tree has no nodes".to_string());
        }

        let len = self.nodes.len() as i32;
        for (i, node) in self.nodes.iter().enumerate() {
            if node.is_leaf() {
                if node.leaf.is_none() {
                    return Err(format!("leaf node {i} has no value"));
                }
                continue;
            }
            // Children must point forward so traversal cannot loop
            for child in [node.left, node.right] {
                if child <= i as i32 || child >= len {
                    return Err(format!("node {i} has invalid child {child}"));
                }
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stump() -> Tree {
        Tree::new(vec![
            Node::split(0, 50, 1, 2),
            Node::leaf(100),
            Node::leaf(200),
        ])
    }

    #[test]
    fn equal_goes_left() {
        let tree = stump();
        assert_eq!(tree.evaluate(&[30]), 100);
        assert_eq!(tree.evaluate(&[50]), 100);
        assert_eq!(tree.evaluate(&[51]), 200);
    }

    #[test]
    fn short_row_evaluates_to_zero() {
        assert_eq!(stump().evaluate(&[]), 0);
    }

    #[test]
    fn validation_rejects_backward_children() {
        assert!(stump().validate().is_ok());

        let cyclic = Tree::new(vec![Node::split(0, 50, 0, 2), Node::leaf(1), Node::leaf(2)]);
        assert!(cyclic.validate().is_err());

        let dangling = Tree::new(vec![Node::split(0, 50, 1, 7), Node::leaf(1)]);
        assert!(dangling.validate().is_err());
    }

    #[test]
    fn max_feature_ignores_leaves() {
        let tree = Tree::new(vec![
            Node::split(3, 10, 1, 2),
            Node::leaf(1),
            Node::split(5, 10, 3, 4),
            Node::leaf(2),
            Node::leaf(3),
        ]);
        assert_eq!(tree.max_feature(), Some(5));
        assert_eq!(Tree::new(vec![Node::leaf(9)]).max_feature(), None);
    }
}
