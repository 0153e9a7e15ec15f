//! Globally adaptive Gauss–Kronrod integration.
//!
//! Each interval is integrated with the 7-point Gauss / 15-point Kronrod
//! pair on shared nodes. The interval with the largest error estimate is
//! bisected until the summed error meets the tolerance, the subdivision
//! limit is hit, or the worst interval cannot be split further.

use std::marker::PhantomData;

use qs_core::{Scalar, cst};
use tracing::{debug, warn};

use crate::error::IntegResult;
use crate::integrator::{
    Domain, Estimate, IntegStatus, Integrator, Subdivision, SubdivisionLog, checked, too_narrow,
};

/// Adaptive integrator configuration.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct AdaptiveConfig {
    /// Absolute tolerance on the summed error
    pub tol_abs: f64,
    /// Relative tolerance on the summed error
    pub tol_rel: f64,
    /// Maximum number of intervals
    pub max_subdivisions: usize,
}

impl Default for AdaptiveConfig {
    fn default() -> Self {
        Self {
            tol_abs: 0.0,
            tol_rel: 1e-9,
            max_subdivisions: 1000,
        }
    }
}

// Kronrod abscissae; odd indices are the Gauss nodes.
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

/// 15-point Kronrod estimate on `[a, b]` with the QUADPACK error heuristic.
pub(crate) fn gk15<T: Scalar>(
    domain: &Domain<T>,
    f: &mut dyn FnMut(T) -> T,
    a: T,
    b: T,
) -> IntegResult<Subdivision<T>> {
    let half = cst::<T>(0.5);
    let center = (a + b) * half;
    let h = (b - a) * half;
    let abs_h = h.abs();

    let fc = checked(domain, f, center)?;
    let mut resg = fc * cst(WG[3]);
    let mut resk = fc * cst(WGK[7]);
    let mut resabs = resk.abs();
    let mut fv1 = [T::zero(); 7];
    let mut fv2 = [T::zero(); 7];

    for j in 0..3 {
        let jtw = 2 * j + 1;
        let dx = h * cst(XGK[jtw]);
        let f1 = checked(domain, f, center - dx)?;
        let f2 = checked(domain, f, center + dx)?;
        fv1[jtw] = f1;
        fv2[jtw] = f2;
        resg = resg + cst::<T>(WG[j]) * (f1 + f2);
        resk = resk + cst::<T>(WGK[jtw]) * (f1 + f2);
        resabs = resabs + cst::<T>(WGK[jtw]) * (f1.abs() + f2.abs());
    }
    for j in 0..4 {
        let jtwm1 = 2 * j;
        let dx = h * cst(XGK[jtwm1]);
        let f1 = checked(domain, f, center - dx)?;
        let f2 = checked(domain, f, center + dx)?;
        fv1[jtwm1] = f1;
        fv2[jtwm1] = f2;
        resk = resk + cst::<T>(WGK[jtwm1]) * (f1 + f2);
        resabs = resabs + cst::<T>(WGK[jtwm1]) * (f1.abs() + f2.abs());
    }

    let reskh = resk * half;
    let mut resasc = cst::<T>(WGK[7]) * (fc - reskh).abs();
    for j in 0..7 {
        resasc = resasc + cst::<T>(WGK[j]) * ((fv1[j] - reskh).abs() + (fv2[j] - reskh).abs());
    }

    let value = resk * h;
    resabs = resabs * abs_h;
    resasc = resasc * abs_h;
    let mut error = ((resk - resg) * h).abs();
    if resasc != T::zero() && error != T::zero() {
        let scale = (cst::<T>(200.0) * error / resasc).powf(cst(1.5));
        error = resasc * scale.min(T::one());
    }
    let floor = T::min_positive_value() / (cst::<T>(50.0) * T::epsilon());
    if resabs > floor {
        error = error.max(cst::<T>(50.0) * T::epsilon() * resabs);
    }

    Ok(Subdivision {
        low: a,
        high: b,
        value,
        error,
    })
}

/// Globally adaptive Gauss–Kronrod integrator, generic over precision.
#[derive(Debug)]
pub struct AdaptiveIntegrator<T: Scalar = f64> {
    pub config: AdaptiveConfig,
    log: SubdivisionLog<T>,
    _precision: PhantomData<T>,
}

impl<T: Scalar> Default for AdaptiveIntegrator<T> {
    fn default() -> Self {
        Self::new(AdaptiveConfig::default())
    }
}

impl<T: Scalar> AdaptiveIntegrator<T> {
    pub fn new(config: AdaptiveConfig) -> Self {
        Self {
            config,
            log: SubdivisionLog::new(),
            _precision: PhantomData,
        }
    }

    fn run(
        &self,
        domain: &Domain<T>,
        f: &mut dyn FnMut(T) -> T,
    ) -> IntegResult<(Estimate<T>, Vec<Subdivision<T>>)> {
        let (lo, hi) = domain.limits();
        let tol_abs = cst::<T>(self.config.tol_abs);
        let tol_rel = cst::<T>(self.config.tol_rel);
        let max_subdivisions = self.config.max_subdivisions.max(1);

        let mut intervals = vec![gk15(domain, f, lo, hi)?];
        let mut status = IntegStatus::Converged;

        loop {
            let (total, err) = intervals
                .iter()
                .fold((T::zero(), T::zero()), |(v, e), s| (v + s.value, e + s.error));
            if err <= tol_abs.max(tol_rel * total.abs()) {
                break;
            }
            if intervals.len() >= max_subdivisions {
                status = IntegStatus::MaxSubdivisions;
                break;
            }

            let worst = intervals
                .iter()
                .enumerate()
                .max_by(|(_, x), (_, y)| {
                    x.error
                        .partial_cmp(&y.error)
                        .unwrap_or(std::cmp::Ordering::Equal)
                })
                .map(|(i, _)| i)
                .unwrap_or(0);
            let region = intervals.swap_remove(worst);
            if too_narrow(region.low, region.high) {
                intervals.push(region);
                status = IntegStatus::RoundOff;
                break;
            }
            let mid = (region.low + region.high) * cst::<T>(0.5);
            intervals.push(gk15(domain, f, region.low, mid)?);
            intervals.push(gk15(domain, f, mid, region.high)?);
        }

        let (value, error) = intervals
            .iter()
            .fold((T::zero(), T::zero()), |(v, e), s| (v + s.value, e + s.error));
        Ok((
            Estimate {
                value,
                error,
                status,
            },
            intervals,
        ))
    }
}

impl<T: Scalar> Integrator<T> for AdaptiveIntegrator<T> {
    fn integ_err(&self, f: &mut dyn FnMut(T) -> T, a: T, b: T) -> IntegResult<Estimate<T>> {
        let (domain, sign) = Domain::classify(a, b)?;
        if a == b {
            self.log.replace(Vec::new());
            return Ok(Estimate {
                value: T::zero(),
                error: T::zero(),
                status: IntegStatus::Converged,
            });
        }

        let (mut est, records) = self.run(&domain, f)?;
        debug!(
            subdivisions = records.len(),
            status = ?est.status,
            "adaptive integration finished"
        );
        if !est.status.is_converged() {
            warn!(
                status = ?est.status,
                value = ?est.value,
                error = ?est.error,
                "adaptive integration did not reach tolerance"
            );
        }
        self.log.replace(records);
        est.value = est.value * sign;
        Ok(est)
    }

    fn nsubdivisions(&self) -> usize {
        self.log.len()
    }

    fn subdivisions(&self) -> Vec<Subdivision<T>> {
        self.log.snapshot()
    }
}
