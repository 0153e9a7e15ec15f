//! p-adaptive cubature on nested Clenshaw–Curtis tensor grids.
//!
//! Every dimension carries a level `l`: level 0 is the midpoint rule,
//! level `l ≥ 1` the Clenshaw–Curtis rule on `2^l` intervals. The levels
//! nest, so all points are addressed by their index on the finest grid and
//! cached across refinements. The error contributed by dimension `i` is
//! `|Q(l) - Q(l - e_i)|`; the dimension with the largest one is refined
//! until the tolerance, the evaluation budget or the level cap is reached.

use std::collections::HashMap;
use std::f64::consts::PI;

use super::{Cubature, CubatureConfig, CubatureOutcome, VectorIntegrand, evaluate};
use crate::error::IntegResult;
use crate::integrator::IntegStatus;

/// Finest level; indices on it fit in a `u32`.
const MAX_LEVEL: usize = 20;

/// Nodes (as finest-grid indices) and weights on `[-1, 1]` of one level.
#[derive(Clone, Debug)]
struct LevelRule {
    index: Vec<u32>,
    weight: Vec<f64>,
}

impl LevelRule {
    fn new(level: usize) -> Self {
        if level == 0 {
            return Self {
                index: vec![1 << (MAX_LEVEL - 1)],
                weight: vec![2.0],
            };
        }
        let n = 1usize << level;
        let stride = 1u32 << (MAX_LEVEL - level);
        let mut index = Vec::with_capacity(n + 1);
        let mut weight = Vec::with_capacity(n + 1);
        for k in 0..=n {
            let c = if k == 0 || k == n { 1.0 } else { 2.0 };
            let mut s = 0.0;
            for j in 1..=n / 2 {
                let b = if j == n / 2 { 1.0 } else { 2.0 };
                let jf = j as f64;
                s += b / (4.0 * jf * jf - 1.0) * (2.0 * jf * k as f64 * PI / n as f64).cos();
            }
            index.push(k as u32 * stride);
            weight.push(c / n as f64 * (1.0 - s));
        }
        Self { index, weight }
    }
}

#[inline]
fn node(index: u32) -> f64 {
    (index as f64 * PI / (1u64 << MAX_LEVEL) as f64).cos()
}

/// Calls `visit(multi_index)` for every tensor-grid point of `levels`.
fn for_each_point(rules: &[LevelRule], mut visit: impl FnMut(&[usize])) {
    let dim = rules.len();
    let mut k = vec![0usize; dim];
    loop {
        visit(&k);
        let mut i = 0;
        loop {
            if i == dim {
                return;
            }
            k[i] += 1;
            if k[i] < rules[i].index.len() {
                break;
            }
            k[i] = 0;
            i += 1;
        }
    }
}

struct Grid<'a> {
    f: &'a dyn VectorIntegrand,
    fdim: usize,
    center: Vec<f64>,
    half: Vec<f64>,
    rules: Vec<LevelRule>,
    cache: HashMap<Vec<u32>, Vec<f64>>,
    parallel: bool,
    evals: usize,
}

impl Grid<'_> {
    fn rule(&mut self, level: usize) -> LevelRule {
        while self.rules.len() <= level {
            let l = self.rules.len();
            self.rules.push(LevelRule::new(l));
        }
        self.rules[level].clone()
    }

    fn rules_for(&mut self, levels: &[usize]) -> Vec<LevelRule> {
        levels.iter().map(|&l| self.rule(l)).collect()
    }

    fn missing(&mut self, levels: &[usize]) -> Vec<Vec<u32>> {
        let rules = self.rules_for(levels);
        let mut keys = Vec::new();
        for_each_point(&rules, |k| {
            let key: Vec<u32> = k.iter().zip(&rules).map(|(&ki, r)| r.index[ki]).collect();
            if !self.cache.contains_key(&key) {
                keys.push(key);
            }
        });
        keys
    }

    fn fill(&mut self, keys: Vec<Vec<u32>>) {
        if keys.is_empty() {
            return;
        }
        let dim = self.center.len();
        let mut pts = Vec::with_capacity(keys.len() * dim);
        for key in &keys {
            for (i, &idx) in key.iter().enumerate() {
                pts.push(self.center[i] + self.half[i] * node(idx));
            }
        }
        let mut fvals = vec![0.0; keys.len() * self.fdim];
        evaluate(self.f, dim, self.fdim, &pts, &mut fvals, self.parallel);
        self.evals += keys.len();
        for (key, fv) in keys.into_iter().zip(fvals.chunks(self.fdim)) {
            self.cache.insert(key, fv.to_vec());
        }
    }

    /// Tensor-product estimate for `levels`; all its points must be cached.
    fn estimate(&mut self, levels: &[usize]) -> Vec<f64> {
        let rules = self.rules_for(levels);
        let scale: f64 = self.half.iter().product();
        let mut sum = vec![0.0; self.fdim];
        let cache = &self.cache;
        for_each_point(&rules, |k| {
            let mut w = 1.0;
            let mut key = Vec::with_capacity(k.len());
            for (&ki, r) in k.iter().zip(&rules) {
                w *= r.weight[ki];
                key.push(r.index[ki]);
            }
            if let Some(fv) = cache.get(&key) {
                for (s, v) in sum.iter_mut().zip(fv) {
                    *s += w * v;
                }
            }
        });
        sum.iter_mut().for_each(|s| *s *= scale);
        sum
    }
}

/// p-adaptive cubature.
#[derive(Clone, Debug, Default)]
pub struct PCubature {
    pub config: CubatureConfig,
}

impl PCubature {
    pub fn new(config: CubatureConfig) -> Self {
        Self { config }
    }
}

impl Cubature for PCubature {
    fn config(&self) -> &CubatureConfig {
        &self.config
    }

    fn integ_box(
        &self,
        fdim: usize,
        f: &dyn VectorIntegrand,
        lower: &[f64],
        upper: &[f64],
    ) -> IntegResult<CubatureOutcome> {
        let cfg = &self.config;
        let dim = lower.len();
        let mut grid = Grid {
            f,
            fdim,
            center: lower.iter().zip(upper).map(|(a, b)| 0.5 * (a + b)).collect(),
            half: lower.iter().zip(upper).map(|(a, b)| 0.5 * (b - a)).collect(),
            rules: Vec::new(),
            cache: HashMap::new(),
            parallel: cfg.parallel,
            evals: 0,
        };

        let mut levels = vec![1usize; dim];
        let keys = grid.missing(&levels);
        if keys.len() > cfg.max_evals {
            return Ok(CubatureOutcome::budget_exhausted(fdim));
        }
        grid.fill(keys);
        let mut values = grid.estimate(&levels);
        let mut errors: Vec<f64>;
        let status;

        loop {
            errors = vec![0.0; fdim];
            let mut per_dim = vec![0.0; dim];
            for i in 0..dim {
                let mut coarser = levels.clone();
                coarser[i] -= 1;
                let q = grid.estimate(&coarser);
                for k in 0..fdim {
                    let e = (values[k] - q[k]).abs();
                    errors[k] += e;
                    per_dim[i] += e;
                }
            }
            if cfg.norm.converged(&values, &errors, cfg.tol_abs, cfg.tol_rel) {
                status = IntegStatus::Converged;
                break;
            }

            let target = (0..dim)
                .filter(|&i| levels[i] < MAX_LEVEL)
                .max_by(|&a, &b| per_dim[a].total_cmp(&per_dim[b]));
            let Some(i) = target else {
                status = IntegStatus::MaxSubdivisions;
                break;
            };
            let mut finer = levels.clone();
            finer[i] += 1;
            let keys = grid.missing(&finer);
            if grid.evals + keys.len() > cfg.max_evals {
                status = IntegStatus::MaxEvalsReached;
                break;
            }
            grid.fill(keys);
            levels = finer;
            values = grid.estimate(&levels);
        }

        Ok(CubatureOutcome {
            values,
            errors,
            status,
            evals: grid.evals,
        })
    }
}
