//! h-adaptive cubature.
//!
//! Regions sit in a max-heap keyed by their largest component error. The
//! worst region is bisected along the dimension with the largest fourth
//! difference and both halves are evaluated in one batch. The rule is
//! Genz–Malik degree 7 with an embedded degree-5 error estimate for
//! `dim ≥ 2`, and Gauss–Kronrod 15/7 for `dim = 1`.

use std::cmp::Ordering;
use std::collections::BinaryHeap;

use super::{Cubature, CubatureConfig, CubatureOutcome, VectorIntegrand, evaluate};
use crate::error::IntegResult;
use crate::integrator::IntegStatus;

#[derive(Clone, Debug)]
struct Region {
    center: Vec<f64>,
    half: Vec<f64>,
    split_dim: usize,
    values: Vec<f64>,
    errors: Vec<f64>,
    errmax: f64,
}

impl Region {
    fn new(center: Vec<f64>, half: Vec<f64>, fdim: usize) -> Self {
        Self {
            center,
            half,
            split_dim: 0,
            values: vec![0.0; fdim],
            errors: vec![0.0; fdim],
            errmax: 0.0,
        }
    }

    fn volume(&self) -> f64 {
        self.half.iter().map(|h| 2.0 * h).product()
    }

    fn bisect(self) -> [Region; 2] {
        let d = self.split_dim;
        let fdim = self.values.len();
        let mut half = self.half;
        half[d] *= 0.5;
        let mut left = self.center.clone();
        let mut right = self.center;
        left[d] -= half[d];
        right[d] += half[d];
        [
            Region::new(left, half.clone(), fdim),
            Region::new(right, half, fdim),
        ]
    }
}

impl PartialEq for Region {
    fn eq(&self, other: &Self) -> bool {
        self.errmax.total_cmp(&other.errmax) == Ordering::Equal
    }
}

impl Eq for Region {}

impl PartialOrd for Region {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Region {
    fn cmp(&self, other: &Self) -> Ordering {
        self.errmax.total_cmp(&other.errmax)
    }
}

// Genz–Malik abscissae
const LAMBDA2: f64 = 0.358_568_582_800_318_1; // sqrt(9/70)
const LAMBDA4: f64 = 0.948_683_298_050_513_8; // sqrt(9/10)
const LAMBDA5: f64 = 0.688_247_201_611_685_3; // sqrt(9/19)

// Kronrod abscissae/weights, odd indices are the Gauss nodes
const XGK: [f64; 8] = [
    0.991_455_371_120_812_639_206_854_697_526_329,
    0.949_107_912_342_758_524_526_189_684_047_851,
    0.864_864_423_359_769_072_789_712_788_640_926,
    0.741_531_185_599_394_439_863_864_773_280_788,
    0.586_087_235_467_691_130_294_144_845_693_013,
    0.405_845_151_377_397_166_906_606_412_076_961,
    0.207_784_955_007_898_467_600_689_403_773_245,
    0.0,
];
const WGK: [f64; 8] = [
    0.022_935_322_010_529_224_963_732_008_058_970,
    0.063_092_092_629_978_553_290_700_663_189_204,
    0.104_790_010_322_250_183_839_876_322_541_518,
    0.140_653_259_715_525_918_745_189_590_510_238,
    0.169_004_726_639_267_902_826_583_426_598_550,
    0.190_350_578_064_785_409_913_256_402_421_014,
    0.204_432_940_075_298_892_414_161_999_234_649,
    0.209_482_141_084_727_828_012_999_174_891_714,
];
const WG: [f64; 4] = [
    0.129_484_966_168_869_693_270_611_432_679_082,
    0.279_705_391_489_276_667_901_467_771_423_780,
    0.381_830_050_505_118_944_950_369_775_488_975,
    0.417_959_183_673_469_387_755_102_040_816_327,
];

/// Relative tolerance under which two fourth differences count as equal.
const DIFF_TIE: f64 = 1e-10;

#[derive(Clone, Copy, Debug)]
enum Rule {
    GaussKronrod,
    GenzMalik { dim: usize },
}

impl Rule {
    fn for_dim(dim: usize) -> Self {
        if dim == 1 {
            Rule::GaussKronrod
        } else {
            Rule::GenzMalik { dim }
        }
    }

    fn npoints(self) -> usize {
        match self {
            Rule::GaussKronrod => 15,
            Rule::GenzMalik { dim } => 1 + 4 * dim + 2 * dim * (dim - 1) + (1 << dim),
        }
    }

    /// Append this rule's points for `r` to `pts`.
    fn push_points(self, r: &Region, pts: &mut Vec<f64>) {
        match self {
            Rule::GaussKronrod => {
                let (c, h) = (r.center[0], r.half[0]);
                pts.push(c);
                for &x in &XGK[..7] {
                    pts.push(c - h * x);
                    pts.push(c + h * x);
                }
            }
            Rule::GenzMalik { dim } => {
                let c = &r.center;
                let h = &r.half;
                pts.extend_from_slice(c);
                for i in 0..dim {
                    for offset in [LAMBDA2, -LAMBDA2, LAMBDA4, -LAMBDA4] {
                        let start = pts.len();
                        pts.extend_from_slice(c);
                        pts[start + i] += offset * h[i];
                    }
                }
                for i in 0..dim {
                    for j in i + 1..dim {
                        for (si, sj) in [(1.0, 1.0), (1.0, -1.0), (-1.0, 1.0), (-1.0, -1.0)] {
                            let start = pts.len();
                            pts.extend_from_slice(c);
                            pts[start + i] += si * LAMBDA4 * h[i];
                            pts[start + j] += sj * LAMBDA4 * h[j];
                        }
                    }
                }
                for mask in 0..(1usize << dim) {
                    for i in 0..dim {
                        let s = if mask & (1 << i) != 0 { -1.0 } else { 1.0 };
                        pts.push(c[i] + s * LAMBDA5 * h[i]);
                    }
                }
            }
        }
    }

    /// Fill in value, error and split dimension of `r` from its point values.
    fn finish(self, r: &mut Region, fv: &[f64]) {
        let fdim = r.values.len();
        let at = |p: usize, k: usize| fv[p * fdim + k];
        match self {
            Rule::GaussKronrod => {
                let h = r.half[0];
                for k in 0..fdim {
                    let fc = at(0, k);
                    let mut resg = fc * WG[3];
                    let mut resk = fc * WGK[7];
                    let mut resabs = resk.abs();
                    for j in 0..7 {
                        let (f1, f2) = (at(1 + 2 * j, k), at(2 + 2 * j, k));
                        if j % 2 == 1 {
                            resg += WG[j / 2] * (f1 + f2);
                        }
                        resk += WGK[j] * (f1 + f2);
                        resabs += WGK[j] * (f1.abs() + f2.abs());
                    }
                    let reskh = resk * 0.5;
                    let mut resasc = WGK[7] * (fc - reskh).abs();
                    for j in 0..7 {
                        let (f1, f2) = (at(1 + 2 * j, k), at(2 + 2 * j, k));
                        resasc += WGK[j] * ((f1 - reskh).abs() + (f2 - reskh).abs());
                    }
                    let value = resk * h;
                    let resabs = resabs * h;
                    let resasc = resasc * h;
                    let mut err = ((resk - resg) * h).abs();
                    if resasc != 0.0 && err != 0.0 {
                        err = resasc * (200.0 * err / resasc).powf(1.5).min(1.0);
                    }
                    if resabs > f64::MIN_POSITIVE / (50.0 * f64::EPSILON) {
                        err = err.max(50.0 * f64::EPSILON * resabs);
                    }
                    r.values[k] = value;
                    r.errors[k] = err;
                }
                r.split_dim = 0;
            }
            Rule::GenzMalik { dim } => {
                let d = dim as f64;
                let w1 = (12824.0 - 9120.0 * d + 400.0 * d * d) / 19683.0;
                let w2 = 980.0 / 6561.0;
                let w3 = (1820.0 - 400.0 * d) / 19683.0;
                let w4 = 200.0 / 19683.0;
                let w5 = 6859.0 / 19683.0 / (1u64 << dim) as f64;
                let e1 = (729.0 - 950.0 * d + 50.0 * d * d) / 729.0;
                let e2 = 245.0 / 486.0;
                let e3 = (265.0 - 100.0 * d) / 1458.0;
                let e4 = 25.0 / 729.0;
                let ratio = (LAMBDA2 * LAMBDA2) / (LAMBDA4 * LAMBDA4);

                let vol = r.volume();
                let pairs_start = 1 + 4 * dim;
                let corners_start = pairs_start + 2 * dim * (dim - 1);
                let ncorners = 1usize << dim;
                let mut diff = vec![0.0; dim];

                for k in 0..fdim {
                    let f0 = at(0, k);
                    let (mut sum2, mut sum3) = (0.0, 0.0);
                    for i in 0..dim {
                        let p = 1 + 4 * i;
                        let s2 = at(p, k) + at(p + 1, k);
                        let s4 = at(p + 2, k) + at(p + 3, k);
                        diff[i] += (s2 - 2.0 * f0 - ratio * (s4 - 2.0 * f0)).abs();
                        sum2 += s2;
                        sum3 += s4;
                    }
                    let sum4: f64 = (pairs_start..corners_start).map(|p| at(p, k)).sum();
                    let sum5: f64 = (corners_start..corners_start + ncorners)
                        .map(|p| at(p, k))
                        .sum();
                    let res7 = f0 * w1 + sum2 * w2 + sum3 * w3 + sum4 * w4 + sum5 * w5;
                    let res5 = f0 * e1 + sum2 * e2 + sum3 * e3 + sum4 * e4;
                    r.values[k] = res7 * vol;
                    r.errors[k] = ((res7 - res5) * vol).abs();
                }

                let mut best = 0;
                for i in 1..dim {
                    let delta = diff[i] - diff[best];
                    if delta > DIFF_TIE * diff[best] {
                        best = i;
                    } else if delta.abs() <= DIFF_TIE * diff[best] && r.half[i] > r.half[best] {
                        best = i;
                    }
                }
                r.split_dim = best;
            }
        }
        r.errmax = r.errors.iter().fold(0.0_f64, |m, &e| m.max(e));
    }
}

/// h-adaptive cubature.
#[derive(Clone, Debug, Default)]
pub struct HCubature {
    pub config: CubatureConfig,
}

impl HCubature {
    pub fn new(config: CubatureConfig) -> Self {
        Self { config }
    }

    /// Evaluate the rule on every region in one batch; returns point count.
    fn eval_regions(&self, rule: Rule, f: &dyn VectorIntegrand, regions: &mut [Region]) -> usize {
        let Some(first) = regions.first() else {
            return 0;
        };
        let dim = first.center.len();
        let fdim = first.values.len();
        let npts = rule.npoints();

        let mut pts = Vec::with_capacity(regions.len() * npts * dim);
        for r in regions.iter() {
            rule.push_points(r, &mut pts);
        }
        let mut fvals = vec![0.0; regions.len() * npts * fdim];
        evaluate(f, dim, fdim, &pts, &mut fvals, self.config.parallel);

        for (r, fv) in regions.iter_mut().zip(fvals.chunks(npts * fdim)) {
            rule.finish(r, fv);
        }
        regions.len() * npts
    }
}

impl Cubature for HCubature {
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
        let rule = Rule::for_dim(lower.len());
        let npts = rule.npoints();
        if npts > cfg.max_evals {
            return Ok(CubatureOutcome::budget_exhausted(fdim));
        }

        let center = lower.iter().zip(upper).map(|(a, b)| 0.5 * (a + b)).collect();
        let half = lower.iter().zip(upper).map(|(a, b)| 0.5 * (b - a)).collect();
        let mut root = [Region::new(center, half, fdim)];
        let mut evals = self.eval_regions(rule, f, &mut root);
        let [root] = root;

        let mut totals_v = root.values.clone();
        let mut totals_e = root.errors.clone();
        let mut heap = BinaryHeap::new();
        heap.push(root);

        let mut status = IntegStatus::Converged;
        loop {
            if cfg
                .norm
                .converged(&totals_v, &totals_e, cfg.tol_abs, cfg.tol_rel)
            {
                break;
            }
            if evals + 2 * npts > cfg.max_evals {
                status = IntegStatus::MaxEvalsReached;
                break;
            }
            let Some(worst) = heap.pop() else {
                break;
            };
            for k in 0..fdim {
                totals_v[k] -= worst.values[k];
                totals_e[k] -= worst.errors[k];
            }
            let mut halves = worst.bisect();
            evals += self.eval_regions(rule, f, &mut halves);
            for r in halves {
                for k in 0..fdim {
                    totals_v[k] += r.values[k];
                    totals_e[k] += r.errors[k];
                }
                heap.push(r);
            }
        }

        // Re-sum from scratch to shed the running-total drift
        let mut values = vec![0.0; fdim];
        let mut errors = vec![0.0; fdim];
        for r in heap.into_vec() {
            for k in 0..fdim {
                values[k] += r.values[k];
                errors[k] += r.errors[k];
            }
        }
        Ok(CubatureOutcome {
            values,
            errors,
            status,
            evals,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn genz_malik_point_count() {
        assert_eq!(Rule::for_dim(2).npoints(), 17);
        assert_eq!(Rule::for_dim(3).npoints(), 33);
        assert_eq!(Rule::for_dim(1).npoints(), 15);
    }

    #[test]
    fn genz_malik_weights_sum_to_one() {
        for dim in 2..6usize {
            let d = dim as f64;
            let w = 1.0 * (12824.0 - 9120.0 * d + 400.0 * d * d) / 19683.0
                + 2.0 * d * 980.0 / 6561.0
                + 2.0 * d * (1820.0 - 400.0 * d) / 19683.0
                + 2.0 * d * (d - 1.0) * 200.0 / 19683.0
                + 6859.0 / 19683.0;
            assert!((w - 1.0).abs() < 1e-13, "dim {dim}: {w}");
        }
    }

    #[test]
    fn splits_along_the_varying_dimension() {
        let f = |x: &[f64], out: &mut [f64]| out[0] = (3.0 * x[1]).exp();
        let mut r = [Region::new(vec![0.5; 3], vec![0.5; 3], 1)];
        HCubature::default().eval_regions(Rule::for_dim(3), &f, &mut r);
        assert_eq!(r[0].split_dim, 1);
    }

    #[test]
    fn budget_below_one_region_evaluates_nothing() {
        let calls = std::sync::atomic::AtomicUsize::new(0);
        let f = |_: &[f64], out: &mut [f64]| {
            calls.fetch_add(1, std::sync::atomic::Ordering::Relaxed);
            out[0] = 1.0;
        };
        let h = HCubature::new(CubatureConfig {
            max_evals: 16,
            ..CubatureConfig::default()
        });
        let out = h.integ(1, &f, &[0.0, 0.0], &[1.0, 1.0]).unwrap();
        assert_eq!(out.status, IntegStatus::MaxEvalsReached);
        assert_eq!(out.evals, 0);
        assert_eq!(calls.load(std::sync::atomic::Ordering::Relaxed), 0);

        // one region fits exactly
        let h = HCubature::new(CubatureConfig {
            max_evals: 17,
            ..CubatureConfig::default()
        });
        let out = h.integ(1, &f, &[0.0, 0.0], &[1.0, 1.0]).unwrap();
        assert!(out.evals <= 17);
    }

    #[test]
    fn ties_split_the_widest_dimension() {
        let f = |_: &[f64], out: &mut [f64]| out[0] = 1.0;
        let mut r = [Region::new(vec![0.0; 2], vec![1.0, 3.0], 1)];
        HCubature::default().eval_regions(Rule::for_dim(2), &f, &mut r);
        assert_eq!(r[0].split_dim, 1);
    }
}
