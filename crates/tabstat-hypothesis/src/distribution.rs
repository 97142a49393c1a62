//! Reference distributions used to turn statistics into p-values
//!
//! Student's t, F, chi-squared and the standard normal come from `statrs`.
//! The studentized range distribution, needed by Tukey HSD and
//! Games-Howell, is computed here by Gauss-Legendre quadrature (Copenhaver
//! and Holland, 1988).

use statrs::distribution::{ChiSquared, ContinuousCDF, FisherSnedecor, Normal, StudentsT};
use statrs::function::erf::erfc;
use statrs::function::gamma::ln_gamma;
use std::f64::consts::{FRAC_1_SQRT_2, PI};
use tabstat_core::{Error, Result};

/// Two-sided p-value of a t statistic
pub fn student_t_two_sided(t: f64, df: f64) -> Result<f64> {
    let dist = StudentsT::new(0.0, 1.0, df)?;
    Ok((2.0 * dist.sf(t.abs())).min(1.0))
}

/// Upper tail of the F distribution
pub fn f_sf(f: f64, df1: f64, df2: f64) -> Result<f64> {
    if f.is_infinite() {
        return Ok(0.0);
    }
    let dist = FisherSnedecor::new(df1, df2)?;
    Ok(dist.sf(f))
}

/// Upper tail of the chi-squared distribution
pub fn chi2_sf(x: f64, df: f64) -> Result<f64> {
    let dist = ChiSquared::new(df)?;
    Ok(dist.sf(x))
}

/// Two-sided p-value of a standard normal statistic
pub fn normal_two_sided(z: f64) -> Result<f64> {
    let dist = Normal::new(0.0, 1.0)?;
    Ok((2.0 * dist.sf(z.abs())).min(1.0))
}

fn phi(x: f64) -> f64 {
    0.5 * erfc(-x * FRAC_1_SQRT_2)
}

const XLEG: [f64; 6] = [
    0.981_560_634_246_719_3,
    0.904_117_256_370_474_9,
    0.769_902_674_194_304_7,
    0.587_317_954_286_617_4,
    0.367_831_498_998_180_2,
    0.125_233_408_511_468_9,
];

const ALEG: [f64; 6] = [
    0.047_175_336_386_511_83,
    0.106_939_325_995_318_4,
    0.160_078_328_543_346_2,
    0.203_167_426_723_065_9,
    0.233_492_536_538_354_8,
    0.249_147_045_813_402_8,
];

const XLEGQ: [f64; 8] = [
    0.989_400_934_991_649_9,
    0.944_575_023_073_232_6,
    0.865_631_202_387_831_7,
    0.755_404_408_355_003,
    0.617_876_244_402_643_7,
    0.458_016_777_657_227_4,
    0.281_603_550_779_258_9,
    0.095_012_509_837_637_44,
];

const ALEGQ: [f64; 8] = [
    0.027_152_459_411_754_09,
    0.062_253_523_938_647_89,
    0.095_158_511_682_492_78,
    0.124_628_971_255_533_9,
    0.149_595_988_816_576_7,
    0.169_156_519_395_002_5,
    0.182_603_415_044_923_6,
    0.189_450_610_455_068_5,
];

/// Probability that the range of `cc` standard normals is below `w`,
/// raised to `rr` (the number of independent ranges)
fn wprob(w: f64, rr: f64, cc: f64) -> f64 {
    const NLEG: usize = 12;
    const IHALF: usize = 6;
    const C1: f64 = -30.0;
    const C3: f64 = 60.0;
    const BB: f64 = 8.0;
    const WLAR: f64 = 3.0;

    let qsqz = w * 0.5;
    if qsqz >= BB {
        return 1.0;
    }

    let mut pr_w = 2.0 * phi(qsqz) - 1.0;
    pr_w = if pr_w >= 1.0 { 1.0 } else { pr_w.powf(cc) };

    let wincr = if w > WLAR { 2 } else { 3 };
    let mut blb = qsqz;
    let binc = (BB - qsqz) / wincr as f64;
    let mut bub = blb + binc;
    let mut einsum = 0.0;
    let cc1 = cc - 1.0;

    for _ in 0..wincr {
        let mut elsum = 0.0;
        let a = 0.5 * (bub + blb);
        let b = 0.5 * (bub - blb);

        for jj in 1..=NLEG {
            let (j, xx) = if IHALF < jj {
                let j = NLEG - jj;
                (j, XLEG[j])
            } else {
                (jj - 1, -XLEG[jj - 1])
            };
            let ac = a + b * xx;
            let qexpo = ac * ac;
            if qexpo > C3 {
                break;
            }
            let pplus = 2.0 * phi(ac);
            let pminus = 2.0 * phi(ac - w);
            let rinsum = pplus * 0.5 - pminus * 0.5;
            if rinsum >= (C1 / cc1).exp() {
                elsum += ALEG[j] * (-(0.5 * qexpo)).exp() * rinsum.powf(cc1);
            }
        }
        elsum *= (2.0 * b) * cc / (2.0 * PI).sqrt();
        einsum += elsum;
        blb = bub;
        bub += binc;
    }

    pr_w += einsum;
    if pr_w <= (C1 / rr).exp() {
        return 0.0;
    }
    pr_w = pr_w.powf(rr);
    pr_w.min(1.0)
}

/// CDF of the studentized range for `nmeans` groups and `df` error degrees
/// of freedom
pub fn ptukey(q: f64, nmeans: usize, df: f64) -> Result<f64> {
    const NLEGQ: usize = 16;
    const IHALFQ: usize = 8;
    const EPS1: f64 = -30.0;
    const EPS2: f64 = 1.0e-14;
    const DLARG: f64 = 25000.0;

    if nmeans < 2 || df.is_nan() || df < 2.0 {
        return Err(Error::InvalidParameter(format!(
            "studentized range needs at least 2 means and 2 degrees of freedom (got {nmeans}, {df})"
        )));
    }
    if q.is_nan() {
        return Err(Error::non_finite("studentized range statistic"));
    }
    if q <= 0.0 {
        return Ok(0.0);
    }
    if q.is_infinite() {
        return Ok(1.0);
    }

    let rr = 1.0;
    let cc = nmeans as f64;
    if df > DLARG {
        return Ok(wprob(q, rr, cc));
    }

    let f2 = df * 0.5;
    let f21 = f2 - 1.0;
    let ff4 = df * 0.25;
    let ulen: f64 = if df <= 100.0 {
        1.0
    } else if df <= 800.0 {
        0.5
    } else if df <= 5000.0 {
        0.25
    } else {
        0.125
    };
    let f2lf = f2 * df.ln() - df * 2f64.ln() - ln_gamma(f2) + ulen.ln();

    let mut ans = 0.0;
    for i in 1..=50 {
        let mut otsum = 0.0;
        let twa1 = (2 * i - 1) as f64 * ulen;

        for jj in 1..=NLEGQ {
            let (j, upper) = if IHALFQ < jj {
                (jj - IHALFQ - 1, true)
            } else {
                (jj - 1, false)
            };
            let offset = XLEGQ[j] * ulen;
            let t1 = if upper {
                f2lf + f21 * (twa1 + offset).ln() - (offset + twa1) * ff4
            } else {
                f2lf + f21 * (twa1 - offset).ln() + (offset - twa1) * ff4
            };
            if t1 >= EPS1 {
                let qsqz = if upper {
                    q * ((offset + twa1) * 0.5).sqrt()
                } else {
                    q * ((twa1 - offset) * 0.5).sqrt()
                };
                otsum += wprob(qsqz, rr, cc) * ALEGQ[j] * t1.exp();
            }
        }

        if i as f64 * ulen >= 1.0 && otsum <= EPS2 {
            break;
        }
        ans += otsum;
    }

    Ok(ans.min(1.0))
}

/// Upper tail of the studentized range
pub fn tukey_sf(q: f64, nmeans: usize, df: f64) -> Result<f64> {
    Ok((1.0 - ptukey(q, nmeans, df)?).clamp(0.0, 1.0))
}

/// Quantile of the studentized range, by bisection on [`ptukey`]
pub fn qtukey(p: f64, nmeans: usize, df: f64) -> Result<f64> {
    if !(0.0..1.0).contains(&p) {
        return Err(Error::InvalidParameter(format!("probability must be in [0, 1), got {p}")));
    }
    let mut lo = 0.0;
    let mut hi = 8.0;
    while ptukey(hi, nmeans, df)? < p {
        lo = hi;
        hi *= 2.0;
        if hi > 1.0e4 {
            return Err(Error::Computation("studentized range quantile did not bracket".into()));
        }
    }
    for _ in 0..100 {
        let mid = 0.5 * (lo + hi);
        if ptukey(mid, nmeans, df)? < p {
            lo = mid;
        } else {
            hi = mid;
        }
        if hi - lo < 1.0e-9 {
            break;
        }
    }
    Ok(0.5 * (lo + hi))
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_ptukey_reference_values() {
        // with two means the range statistic is sqrt(2) * |t|
        let t: f64 = 2.5;
        let expected = 1.0 - student_t_two_sided(t, 10.0).unwrap();
        assert_relative_eq!(ptukey(t * 2f64.sqrt(), 2, 10.0).unwrap(), expected, epsilon = 1e-5);
        // R: qtukey(0.95, 3, 12) = 3.772929
        assert_relative_eq!(qtukey(0.95, 3, 12.0).unwrap(), 3.7729, epsilon = 1e-3);
        // R: qtukey(0.95, 2, 10) = 3.151064
        assert_relative_eq!(qtukey(0.95, 2, 10.0).unwrap(), 3.1511, epsilon = 1e-3);
    }

    #[test]
    fn test_ptukey_bounds() {
        assert_eq!(ptukey(0.0, 4, 20.0).unwrap(), 0.0);
        assert_eq!(ptukey(f64::INFINITY, 4, 20.0).unwrap(), 1.0);
        assert!(ptukey(1.0, 1, 20.0).is_err());
        let lo = ptukey(2.0, 4, 20.0).unwrap();
        let hi = ptukey(4.0, 4, 20.0).unwrap();
        assert!(lo < hi);
    }

    #[test]
    fn test_t_two_sided() {
        // t = 2.776 is the 97.5% point for 4 degrees of freedom
        assert_relative_eq!(student_t_two_sided(2.776445, 4.0).unwrap(), 0.05, epsilon = 1e-4);
        assert_relative_eq!(normal_two_sided(1.959964).unwrap(), 0.05, epsilon = 1e-5);
    }
}
