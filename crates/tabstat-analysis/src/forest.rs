//! Random forest classification of the `group` column

use crate::classify::{argmax, LabelledSet};
use nalgebra::DMatrix;
use rand::{seq::index, Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use rayon::prelude::*;
use tabstat_core::{Dataset, Error, Result};

/// Parameters for growing the forest
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ForestParams {
    pub trees: usize,
    /// Unlimited when `None`
    pub max_depth: Option<usize>,
    /// Nodes with fewer samples become leaves
    pub min_samples_split: usize,
    /// Features tried per split; `sqrt(p)` when `None`
    pub max_features: Option<usize>,
    pub seed: u64,
}

impl Default for ForestParams {
    fn default() -> Self {
        Self {
            trees: 100,
            max_depth: None,
            min_samples_split: 2,
            max_features: None,
            seed: 42,
        }
    }
}

impl ForestParams {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_trees(mut self, trees: usize) -> Self {
        self.trees = trees;
        self
    }

    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = Some(max_depth);
        self
    }

    pub fn with_max_features(mut self, max_features: usize) -> Self {
        self.max_features = Some(max_features);
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    fn validate(&self) -> Result<()> {
        if self.trees == 0 {
            return Err(Error::InvalidParameter("trees must be positive".to_string()));
        }
        if self.max_features == Some(0) {
            return Err(Error::InvalidParameter(
                "max_features must be positive".to_string(),
            ));
        }
        Ok(())
    }

    fn features_per_split(&self, p: usize) -> usize {
        self.max_features
            .unwrap_or_else(|| (p as f64).sqrt().round() as usize)
            .clamp(1, p.max(1))
    }
}

#[derive(Debug, Clone, PartialEq)]
enum Node {
    Leaf(usize),
    Split {
        feature: usize,
        threshold: f64,
        left: usize,
        right: usize,
    },
}

/// A CART tree stored as a node arena; node 0 is the root
#[derive(Debug, Clone)]
pub struct DecisionTree {
    nodes: Vec<Node>,
}

impl DecisionTree {
    pub fn predict_row(&self, x: &DMatrix<f64>, row: usize) -> usize {
        let mut node = 0;
        loop {
            match self.nodes[node] {
                Node::Leaf(class) => return class,
                Node::Split {
                    feature,
                    threshold,
                    left,
                    right,
                } => {
                    node = if x[(row, feature)] <= threshold { left } else { right };
                }
            }
        }
    }

    pub fn n_nodes(&self) -> usize {
        self.nodes.len()
    }
}

fn gini(counts: &[usize], total: usize) -> f64 {
    if total == 0 {
        return 0.0;
    }
    let t = total as f64;
    1.0 - counts.iter().map(|&c| (c as f64 / t).powi(2)).sum::<f64>()
}

/// Most frequent class, lowest index on ties
fn majority(counts: &[usize]) -> usize {
    argmax(counts.iter().map(|&c| c as f64))
}

struct Split {
    feature: usize,
    threshold: f64,
    /// Weighted impurity decrease
    gain: f64,
}

struct Grower<'a> {
    x: &'a DMatrix<f64>,
    targets: &'a [usize],
    n_classes: usize,
    params: &'a ForestParams,
    max_features: usize,
    rng: ChaCha8Rng,
    nodes: Vec<Node>,
    importances: Vec<f64>,
}

impl Grower<'_> {
    fn class_counts(&self, samples: &[usize]) -> Vec<usize> {
        let mut counts = vec![0; self.n_classes];
        for &i in samples {
            counts[self.targets[i]] += 1;
        }
        counts
    }

    fn best_split(&mut self, samples: &[usize], counts: &[usize], impurity: f64) -> Option<Split> {
        let x = self.x;
        let n = samples.len();
        let parent = n as f64 * impurity;
        let mut best: Option<Split> = None;
        let candidates = index::sample(&mut self.rng, x.ncols(), self.max_features);
        for feature in candidates.iter() {
            let mut order = samples.to_vec();
            order.sort_by(|&a, &b| x[(a, feature)].total_cmp(&x[(b, feature)]));
            let mut left = vec![0; self.n_classes];
            let mut right = counts.to_vec();
            for pos in 0..n - 1 {
                let class = self.targets[order[pos]];
                left[class] += 1;
                right[class] -= 1;
                let here = x[(order[pos], feature)];
                let next = x[(order[pos + 1], feature)];
                if next <= here {
                    continue;
                }
                let (nl, nr) = (pos + 1, n - pos - 1);
                let gain = parent - nl as f64 * gini(&left, nl) - nr as f64 * gini(&right, nr);
                if gain > best.as_ref().map_or(1e-12, |b| b.gain) {
                    best = Some(Split {
                        feature,
                        threshold: 0.5 * (here + next),
                        gain,
                    });
                }
            }
        }
        best
    }

    fn grow(&mut self, samples: Vec<usize>, depth: usize) -> usize {
        let counts = self.class_counts(&samples);
        let impurity = gini(&counts, samples.len());
        let id = self.nodes.len();
        self.nodes.push(Node::Leaf(majority(&counts)));

        let depth_reached = self.params.max_depth.is_some_and(|d| depth >= d);
        if impurity <= 0.0 || depth_reached || samples.len() < self.params.min_samples_split {
            return id;
        }
        let Some(split) = self.best_split(&samples, &counts, impurity) else {
            return id;
        };
        let x = self.x;
        let (left, right): (Vec<usize>, Vec<usize>) = samples
            .iter()
            .partition(|&&i| x[(i, split.feature)] <= split.threshold);
        if left.is_empty() || right.is_empty() {
            return id;
        }

        self.importances[split.feature] += split.gain;
        let left = self.grow(left, depth + 1);
        let right = self.grow(right, depth + 1);
        self.nodes[id] = Node::Split {
            feature: split.feature,
            threshold: split.threshold,
            left,
            right,
        };
        id
    }
}

/// Bagged trees with per-split feature subsampling
#[derive(Debug, Clone)]
pub struct RandomForest {
    pub trees: Vec<DecisionTree>,
    pub n_classes: usize,
    /// Mean decrease in impurity per feature, summing to 1
    pub importances: Vec<f64>,
}

/// Grow every tree on its own bootstrap sample, in parallel
pub fn fit(
    x: &DMatrix<f64>,
    targets: &[usize],
    n_classes: usize,
    params: &ForestParams,
) -> Result<RandomForest> {
    params.validate()?;
    if x.nrows() != targets.len() {
        return Err(Error::size_mismatch(x.nrows(), targets.len(), "random forest targets"));
    }
    let (n, p) = x.shape();
    if n == 0 || p == 0 {
        return Err(Error::InsufficientData {
            expected: 1,
            actual: 0,
        });
    }
    let max_features = params.features_per_split(p);

    let grown: Vec<(DecisionTree, Vec<f64>)> = (0..params.trees)
        .into_par_iter()
        .map(|t| {
            let mut rng = ChaCha8Rng::seed_from_u64(params.seed.wrapping_add(t as u64));
            let bootstrap: Vec<usize> = (0..n).map(|_| rng.gen_range(0..n)).collect();
            let mut grower = Grower {
                x,
                targets,
                n_classes,
                params,
                max_features,
                rng,
                nodes: Vec::new(),
                importances: vec![0.0; p],
            };
            grower.grow(bootstrap, 0);
            let total: f64 = grower.importances.iter().sum();
            if total > 0.0 {
                grower.importances.iter_mut().for_each(|v| *v /= total);
            }
            (DecisionTree { nodes: grower.nodes }, grower.importances)
        })
        .collect();

    let mut importances = vec![0.0; p];
    for (_, tree_importances) in &grown {
        for (total, v) in importances.iter_mut().zip(tree_importances) {
            *total += v;
        }
    }
    let sum: f64 = importances.iter().sum();
    if sum > 0.0 {
        importances.iter_mut().for_each(|v| *v /= sum);
    }

    Ok(RandomForest {
        trees: grown.into_iter().map(|(tree, _)| tree).collect(),
        n_classes,
        importances,
    })
}

impl RandomForest {
    /// Majority vote of the trees for each row
    pub fn predict(&self, x: &DMatrix<f64>) -> Vec<usize> {
        (0..x.nrows())
            .map(|row| {
                let mut votes = vec![0; self.n_classes];
                for tree in &self.trees {
                    votes[tree.predict_row(x, row)] += 1;
                }
                majority(&votes)
            })
            .collect()
    }
}

/// Train on every labelled row and report importances and training accuracy
pub fn analyze(data: &Dataset, params: &ForestParams) -> Result<(String, Dataset)> {
    let set = LabelledSet::extract(data)?;
    let forest = fit(&set.x, &set.targets, set.n_classes(), params)?;
    let predicted = forest.predict(&set.x);

    let mut summary = format!(
        "ランダムフォレスト\n木の数: {}\n{}\n特徴量の重要度:",
        forest.trees.len(),
        set.describe(&predicted)
    );
    let mut ranked: Vec<(&String, f64)> = set.names.iter().zip(forest.importances.iter().copied()).collect();
    ranked.sort_by(|a, b| b.1.total_cmp(&a.1));
    for (name, importance) in ranked {
        summary.push_str(&format!("\n  {name}: {importance:.4}"));
    }
    Ok((summary, set.output(data, &predicted)?))
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    /// Class decided by the first feature; the second is noise
    fn informative_first() -> (DMatrix<f64>, Vec<usize>) {
        let mut rows = Vec::new();
        let mut targets = Vec::new();
        for i in 0..30 {
            let class = i % 3;
            rows.extend_from_slice(&[class as f64 * 2.0 + (i % 5) as f64 * 0.1, ((i * 7) % 11) as f64]);
            targets.push(class);
        }
        (DMatrix::from_row_slice(30, 2, &rows), targets)
    }

    #[test]
    fn test_gini() {
        assert_eq!(gini(&[4, 0], 4), 0.0);
        assert_relative_eq!(gini(&[2, 2], 4), 0.5);
        assert_eq!(majority(&[1, 3, 3]), 1);
    }

    #[test]
    fn test_forest_fits_training_data() {
        let (x, targets) = informative_first();
        let params = ForestParams::new().with_trees(25).with_max_features(2);
        let forest = fit(&x, &targets, 3, &params).unwrap();
        assert_eq!(forest.trees.len(), 25);
        assert_eq!(forest.predict(&x), targets);
    }

    #[test]
    fn test_importance_favours_informative_feature() {
        let (x, targets) = informative_first();
        let params = ForestParams::new().with_trees(25).with_max_features(2);
        let forest = fit(&x, &targets, 3, &params).unwrap();
        assert_relative_eq!(forest.importances.iter().sum::<f64>(), 1.0, epsilon = 1e-12);
        assert!(forest.importances[0] > forest.importances[1]);
    }

    #[test]
    fn test_depth_limit_gives_stumps() {
        let (x, targets) = informative_first();
        let forest = fit(&x, &targets, 3, &ForestParams::new().with_trees(5).with_max_depth(1)).unwrap();
        assert!(forest.trees.iter().all(|t| t.n_nodes() <= 3));
    }

    #[test]
    fn test_deterministic_for_seed() {
        let (x, targets) = informative_first();
        let params = ForestParams::new().with_trees(10).with_seed(3);
        let a = fit(&x, &targets, 3, &params).unwrap();
        let b = fit(&x, &targets, 3, &params).unwrap();
        assert_eq!(a.importances, b.importances);
        assert_eq!(a.predict(&x), b.predict(&x));
    }

    #[test]
    fn test_zero_trees_rejected() {
        let (x, targets) = informative_first();
        assert!(fit(&x, &targets, 3, &ForestParams::new().with_trees(0)).is_err());
    }
}
