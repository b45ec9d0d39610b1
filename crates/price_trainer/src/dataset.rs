//! In-memory training dataset
//!
//! Rows are fixed-point feature vectors in the order of the schema they were
//! built from; targets are fixed-point prices.

use crate::deterministic::LcgRng;
use crate::errors::TrainerError;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Dataset {
    pub features: Vec<Vec<i64>>,
    pub targets: Vec<i64>,
    pub feature_count: usize,
}

impl Dataset {
    pub fn new(feature_count: usize) -> Self {
        Self {
            features: Vec::new(),
            targets: Vec::new(),
            feature_count,
        }
    }

    pub fn push(&mut self, row: Vec<i64>, target: i64) -> Result<(), TrainerError> {
        if row.len() != self.feature_count {
            return Err(TrainerError::Dataset(format!(
                "row {}: expected {} features, got {}",
                self.features.len() + 1,
                self.feature_count,
                row.len()
            )));
        }
        self.features.push(row);
        self.targets.push(target);
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.features.len()
    }

    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }

    /// Sample `len()` row indices with replacement
    pub fn bootstrap(&self, rng: &mut LcgRng) -> Vec<usize> {
        let n = self.len();
        (0..n).map(|_| rng.next_index(n)).collect()
    }

    /// (min, max) per feature column
    pub fn feature_stats(&self) -> Vec<(i64, i64)> {
        let mut stats = vec![(i64::MAX, i64::MIN); self.feature_count];
        for row in &self.features {
            for (i, &val) in row.iter().enumerate() {
                stats[i].0 = stats[i].0.min(val);
                stats[i].1 = stats[i].1.max(val);
            }
        }
        stats
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dataset() -> Dataset {
        let mut ds = Dataset::new(3);
        ds.push(vec![100, 200, 300], 1).unwrap();
        ds.push(vec![150, 250, 350], 2).unwrap();
        ds.push(vec![200, 300, 400], 3).unwrap();
        ds
    }

    #[test]
    fn push_checks_width() {
        let mut ds = dataset();
        assert!(ds.push(vec![1, 2], 4).is_err());
        assert_eq!(ds.len(), 3);
    }

    #[test]
    fn bootstrap_is_seeded() {
        let ds = dataset();
        let a = ds.bootstrap(&mut LcgRng::new(42));
        let b = ds.bootstrap(&mut LcgRng::new(42));
        assert_eq!(a, b);
        assert_eq!(a.len(), 3);
        assert!(a.iter().all(|&i| i < 3));
    }

    #[test]
    fn stats_are_min_max() {
        let stats = dataset().feature_stats();
        assert_eq!(stats, vec![(100, 200), (200, 300), (300, 400)]);
    }
}
