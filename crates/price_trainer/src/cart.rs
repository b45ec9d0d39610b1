//! CART regression tree builder
//!
//! Exact-greedy splits that maximise the reduction in squared error, using
//! integer arithmetic only. Split thresholds are midpoints between adjacent
//! distinct feature values; equal-gain candidates are ordered by
//! [`SplitTieBreaker`].

use agriprice_core::{Node, Tree};

use crate::dataset::Dataset;
use crate::deterministic::SplitTieBreaker;

/// Growth limits for a single tree
#[derive(Clone, Debug)]
pub struct TreeConfig {
    pub max_depth: usize,
    pub min_samples_leaf: usize,
}

impl Default for TreeConfig {
    fn default() -> Self {
        Self {
            max_depth: 12,
            min_samples_leaf: 1,
        }
    }
}

#[derive(Debug, Clone)]
struct SplitCandidate {
    feature_idx: usize,
    threshold: i64,
    gain: i128,
    tie_breaker: SplitTieBreaker,
}

impl SplitCandidate {
    fn beats(&self, other: &SplitCandidate) -> bool {
        self.gain > other.gain || (self.gain == other.gain && self.tie_breaker < other.tie_breaker)
    }
}

/// Grows one regression tree over a (possibly repeated) sample of rows
pub struct CartBuilder<'a> {
    config: TreeConfig,
    dataset: &'a Dataset,
}

impl<'a> CartBuilder<'a> {
    pub fn new(dataset: &'a Dataset, config: TreeConfig) -> Self {
        Self { config, dataset }
    }

    /// Build a tree from the given row indices; duplicates count as weight
    pub fn build(&self, sample: &[usize]) -> Tree {
        let mut nodes = Vec::new();
        self.build_node(sample, 0, &mut nodes);
        Tree::new(nodes)
    }

    fn build_node(&self, indices: &[usize], depth: usize, nodes: &mut Vec<Node>) -> i32 {
        let current = nodes.len();
        let min_leaf = self.config.min_samples_leaf.max(1);

        if depth >= self.config.max_depth || indices.len() < 2 * min_leaf {
            nodes.push(Node::leaf(self.mean_target(indices)));
            return current as i32;
        }

        let Some(split) = self.find_best_split(indices, min_leaf) else {
            nodes.push(Node::leaf(self.mean_target(indices)));
            return current as i32;
        };

        let (left, right) = self.partition(indices, split.feature_idx, split.threshold);

        // Children are filled in once their indices are known
        nodes.push(Node::split(split.feature_idx as i32, split.threshold, -1, -1));
        let left_idx = self.build_node(&left, depth + 1, nodes);
        let right_idx = self.build_node(&right, depth + 1, nodes);
        nodes[current].left = left_idx;
        nodes[current].right = right_idx;

        current as i32
    }

    /// Gain = S_l²/n_l + S_r²/n_r - S²/n over target sums S
    fn find_best_split(&self, indices: &[usize], min_leaf: usize) -> Option<SplitCandidate> {
        let n = indices.len();
        let total: i128 = indices
            .iter()
            .map(|&i| self.dataset.targets[i] as i128)
            .sum();
        let parent_term = total * total / n as i128;

        let mut best: Option<SplitCandidate> = None;

        for feature_idx in 0..self.dataset.feature_count {
            let mut pairs: Vec<(i64, i64)> = indices
                .iter()
                .map(|&i| (self.dataset.features[i][feature_idx], self.dataset.targets[i]))
                .collect();
            pairs.sort_unstable();

            let mut left_sum: i128 = 0;
            for k in 0..n - 1 {
                left_sum += pairs[k].1 as i128;
                let (value, next_value) = (pairs[k].0, pairs[k + 1].0);
                if value == next_value {
                    continue;
                }

                let n_left = k + 1;
                let n_right = n - n_left;
                if n_left < min_leaf || n_right < min_leaf {
                    continue;
                }

                let right_sum = total - left_sum;
                let gain = left_sum * left_sum / n_left as i128
                    + right_sum * right_sum / n_right as i128
                    - parent_term;
                if gain <= 0 {
                    continue;
                }

                let threshold = midpoint(value, next_value);
                let candidate = SplitCandidate {
                    feature_idx,
                    threshold,
                    gain,
                    tie_breaker: SplitTieBreaker::new(feature_idx, threshold),
                };

                if best.as_ref().map_or(true, |current| candidate.beats(current)) {
                    best = Some(candidate);
                }
            }
        }

        best
    }

    fn partition(&self, indices: &[usize], feature_idx: usize, threshold: i64) -> (Vec<usize>, Vec<usize>) {
        indices
            .iter()
            .copied()
            .partition(|&i| self.dataset.features[i][feature_idx] <= threshold)
    }

    fn mean_target(&self, indices: &[usize]) -> i64 {
        if indices.is_empty() {
            return 0;
        }
        let sum: i128 = indices
            .iter()
            .map(|&i| self.dataset.targets[i] as i128)
            .sum();
        (sum / indices.len() as i128) as i64
    }
}

/// Rounds toward `low`, so `low <= m < high` for any `low < high`
fn midpoint(low: i64, high: i64) -> i64 {
    let half = (i128::from(high) - i128::from(low)) / 2;
    (i128::from(low) + half) as i64
}
