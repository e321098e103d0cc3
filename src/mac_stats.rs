// Descriptive statistics over replication samples
//
// All functions take a slice of defined samples; callers drop undefined values
// (e.g. a collision rate with zero attempts) before getting here. Empty input
// yields `None` rather than a NaN.

/// Percentiles reported when none are requested
pub const DEFAULT_PERCENTILES: [f64; 5] = [2.5, 25.0, 50.0, 75.0, 97.5];

// ============================================================================
// Central Tendency and Spread
// ============================================================================

pub fn mean(data: &[f64]) -> Option<f64> {
    if data.is_empty() {
        return None;
    }
    Some(data.iter().sum::<f64>() / data.len() as f64)
}

/// Population variance (divides by n)
pub fn variance(data: &[f64]) -> Option<f64> {
    let m = mean(data)?;
    Some(data.iter().map(|x| (x - m).powi(2)).sum::<f64>() / data.len() as f64)
}

pub fn std_dev(data: &[f64]) -> Option<f64> {
    variance(data).map(f64::sqrt)
}

/// Sample standard deviation (divides by n - 1)
pub fn sample_std_dev(data: &[f64]) -> Option<f64> {
    if data.len() < 2 {
        return None;
    }
    let m = mean(data)?;
    let ss = data.iter().map(|x| (x - m).powi(2)).sum::<f64>();
    Some((ss / (data.len() - 1) as f64).sqrt())
}

pub fn median(data: &[f64]) -> Option<f64> {
    percentile(data, 50.0)
}

/// Percentile `q` in [0, 100], linear interpolation between closest ranks
pub fn percentile(data: &[f64], q: f64) -> Option<f64> {
    if data.is_empty() || !(0.0..=100.0).contains(&q) {
        return None;
    }
    let sorted = sorted(data);
    Some(interpolate_rank(&sorted, q))
}

pub fn percentiles(data: &[f64], qs: &[f64]) -> Option<Vec<f64>> {
    if data.is_empty() {
        return None;
    }
    let qs = if qs.is_empty() { &DEFAULT_PERCENTILES[..] } else { qs };
    let sorted = sorted(data);
    qs.iter()
        .map(|&q| (0.0..=100.0).contains(&q).then(|| interpolate_rank(&sorted, q)))
        .collect()
}

fn interpolate_rank(sorted: &[f64], q: f64) -> f64 {
    let pos = q / 100.0 * (sorted.len() - 1) as f64;
    let lo = pos.floor() as usize;
    let hi = pos.ceil() as usize;
    let frac = pos - lo as f64;
    sorted[lo] + (sorted[hi] - sorted[lo]) * frac
}

fn sorted(data: &[f64]) -> Vec<f64> {
    let mut v = data.to_vec();
    v.sort_by(|a, b| a.total_cmp(b));
    v
}

// ============================================================================
// Confidence Intervals
// ============================================================================

/// Student-t confidence interval for the mean
pub fn confidence_interval(data: &[f64], confidence: f64) -> Option<(f64, f64)> {
    if !(0.0..1.0).contains(&confidence) || confidence == 0.0 {
        return None;
    }
    let m = mean(data)?;
    let sem = sample_std_dev(data)? / (data.len() as f64).sqrt();
    let t = student_t_quantile(0.5 + confidence / 2.0, (data.len() - 1) as f64);
    Some((m - t * sem, m + t * sem))
}

/// Distribution-free 95% interval for the median.
///
/// Ranks are floor(0.5n - 0.98 sqrt n) and ceil(0.5n + 1 + 0.98 sqrt n); the
/// rule is only accurate for n > 71, smaller samples get the clamped ranks.
pub fn median_confidence_interval(data: &[f64]) -> Option<(f64, f64)> {
    if data.is_empty() {
        return None;
    }
    let n = data.len() as f64;
    let sorted = sorted(data);
    let last = sorted.len() - 1;

    let lower = (0.5 * n - 0.98 * n.sqrt()).floor().max(0.0) as usize;
    let upper = (0.5 * n + 1.0 + 0.98 * n.sqrt()).ceil() as usize;

    Some((sorted[lower.min(last)], sorted[upper.min(last)]))
}

/// Inverse CDF of Student's t with `dof` degrees of freedom.
///
/// Closed form for 1 and 2 degrees of freedom. For 3 and 4 the Cornish-Fisher
/// estimate is refined by Newton steps on the exact CDF. From 5 degrees up the
/// expansion alone is used (error below 2e-3 at 5, shrinking with `dof`).
pub fn student_t_quantile(p: f64, dof: f64) -> f64 {
    if dof <= 1.0 {
        return (std::f64::consts::PI * (p - 0.5)).tan();
    }
    if dof <= 2.0 {
        return (2.0 * p - 1.0) / (2.0 * p * (1.0 - p)).sqrt();
    }

    let estimate = cornish_fisher_t(p, dof);
    if dof > 4.0 || p <= 0.0 || p >= 1.0 {
        return estimate;
    }

    let nu = if dof <= 3.0 { 3 } else { 4 };
    let mut t = estimate;
    for _ in 0..8 {
        let (cdf, pdf) = small_dof_t_cdf_pdf(t, nu);
        let step = (cdf - p) / pdf;
        t -= step;
        if step.abs() < 1e-12 {
            break;
        }
    }
    t
}

/// CDF and density of Student's t for 3 or 4 degrees of freedom
fn small_dof_t_cdf_pdf(t: f64, nu: u32) -> (f64, f64) {
    use std::f64::consts::PI;

    if nu == 3 {
        let x = t / 3f64.sqrt();
        let u = 1.0 + x * x;
        let cdf = 0.5 + (x / u + x.atan()) / PI;
        let pdf = 2.0 / (PI * 3f64.sqrt() * u * u);
        (cdf, pdf)
    } else {
        let u = 1.0 + t * t / 4.0;
        let cdf = 0.5 + 0.375 * (t / u.sqrt()) * (1.0 - t * t / (12.0 * u));
        let pdf = 0.375 * u.powf(-2.5);
        (cdf, pdf)
    }
}

fn cornish_fisher_t(p: f64, dof: f64) -> f64 {
    let z = normal_quantile(p);
    let z3 = z.powi(3);
    let z5 = z.powi(5);
    let z7 = z.powi(7);
    let z9 = z.powi(9);

    let g1 = (z3 + z) / 4.0;
    let g2 = (5.0 * z5 + 16.0 * z3 + 3.0 * z) / 96.0;
    let g3 = (3.0 * z7 + 19.0 * z5 + 17.0 * z3 - 15.0 * z) / 384.0;
    let g4 = (79.0 * z9 + 776.0 * z7 + 1482.0 * z5 - 1920.0 * z3 - 945.0 * z) / 92160.0;

    z + g1 / dof + g2 / dof.powi(2) + g3 / dof.powi(3) + g4 / dof.powi(4)
}

/// Inverse CDF of the standard normal (Acklam's rational approximation)
pub fn normal_quantile(p: f64) -> f64 {
    const A: [f64; 6] = [
        -3.969683028665376e+01,
        2.209460984245205e+02,
        -2.759285104469687e+02,
        1.383577518672690e+02,
        -3.066479806614716e+01,
        2.506628277459239e+00,
    ];
    const B: [f64; 5] = [
        -5.447609879822406e+01,
        1.615858368580409e+02,
        -1.556989798598866e+02,
        6.680131188771972e+01,
        -1.328068155288572e+01,
    ];
    const C: [f64; 6] = [
        -7.784894002430293e-03,
        -3.223964580411365e-01,
        -2.400758277161838e+00,
        -2.549732539343734e+00,
        4.374664141464968e+00,
        2.938163982698783e+00,
    ];
    const D: [f64; 4] = [
        7.784695709041462e-03,
        3.224671290700398e-01,
        2.445134137142996e+00,
        3.754408661907416e+00,
    ];
    const P_LOW: f64 = 0.02425;

    if p <= 0.0 {
        return f64::NEG_INFINITY;
    }
    if p >= 1.0 {
        return f64::INFINITY;
    }

    let tail = |q: f64| {
        (((((C[0] * q + C[1]) * q + C[2]) * q + C[3]) * q + C[4]) * q + C[5])
            / ((((D[0] * q + D[1]) * q + D[2]) * q + D[3]) * q + 1.0)
    };

    if p < P_LOW {
        tail((-2.0 * p.ln()).sqrt())
    } else if p > 1.0 - P_LOW {
        -tail((-2.0 * (1.0 - p).ln()).sqrt())
    } else {
        let q = p - 0.5;
        let r = q * q;
        (((((A[0] * r + A[1]) * r + A[2]) * r + A[3]) * r + A[4]) * r + A[5]) * q
            / (((((B[0] * r + B[1]) * r + B[2]) * r + B[3]) * r + B[4]) * r + 1.0)
    }
}

// ============================================================================
// Dispersion
// ============================================================================

/// Mean absolute deviation around the mean
pub fn mean_absolute_deviation(data: &[f64]) -> Option<f64> {
    let m = mean(data)?;
    Some(data.iter().map(|x| (x - m).abs()).sum::<f64>() / data.len() as f64)
}

pub fn coefficient_of_variation(data: &[f64]) -> Option<f64> {
    let m = mean(data)?;
    if m == 0.0 {
        return None;
    }
    Some(std_dev(data)? / m)
}

/// Half the relative mean absolute difference over all ordered pairs
pub fn gini_coefficient(data: &[f64]) -> Option<f64> {
    let m = mean(data)?;
    if m == 0.0 {
        return None;
    }
    let n = data.len() as f64;
    let mut total = 0.0;
    for x in data {
        for y in data {
            total += (x - y).abs();
        }
    }
    let mean_difference = total / (n * n);
    Some(0.5 * mean_difference / m)
}

/// Mean absolute deviation rescaled by twice the mean
pub fn lorenz_curve_gap(data: &[f64]) -> Option<f64> {
    let m = mean(data)?;
    if m == 0.0 {
        return None;
    }
    Some(mean_absolute_deviation(data)? / (2.0 * m))
}

/// Cumulative share of the total held by the smallest 1..=n samples
pub fn lorenz_curve(data: &[f64]) -> Option<Vec<f64>> {
    let total: f64 = data.iter().sum();
    if data.is_empty() || total == 0.0 {
        return None;
    }
    let mut acc = 0.0;
    Some(
        sorted(data)
            .into_iter()
            .map(|x| {
                acc += x;
                acc / total
            })
            .collect(),
    )
}

// ============================================================================
// Distribution Data (for external plotting)
// ============================================================================

/// Points of the empirical CDF: (sorted sample, i / n)
pub fn ecdf(data: &[f64]) -> Vec<(f64, f64)> {
    let n = data.len() as f64;
    sorted(data)
        .into_iter()
        .enumerate()
        .map(|(i, x)| (x, (i + 1) as f64 / n))
        .collect()
}

#[derive(Debug, Clone, PartialEq)]
pub struct Histogram {
    /// bins + 1 edges
    pub edges: Vec<f64>,
    pub counts: Vec<usize>,
}

/// Equal-width bins over [min, max]; the last bin is closed on the right
pub fn histogram(data: &[f64], bins: usize) -> Option<Histogram> {
    if data.is_empty() || bins == 0 {
        return None;
    }
    let sorted = sorted(data);
    let (mut lo, mut hi) = (sorted[0], sorted[sorted.len() - 1]);
    if lo == hi {
        lo -= 0.5;
        hi += 0.5;
    }

    let width = (hi - lo) / bins as f64;
    let edges: Vec<f64> = (0..=bins).map(|i| lo + width * i as f64).collect();
    let mut counts = vec![0usize; bins];
    for x in sorted {
        let idx = (((x - lo) / width).floor() as usize).min(bins - 1);
        counts[idx] += 1;
    }

    Some(Histogram { edges, counts })
}

// ============================================================================
// Summary
// ============================================================================

/// The usual descriptive statistics of one metric sample
#[derive(Debug, Clone, PartialEq)]
pub struct Summary {
    pub count: usize,
    pub mean: f64,
    pub std_dev: f64,
    pub variance: f64,
    pub min: f64,
    pub max: f64,
    pub median: f64,
    /// 95% Student-t interval; `None` below two samples
    pub ci95: Option<(f64, f64)>,
    /// (q, value) pairs for [`DEFAULT_PERCENTILES`]
    pub percentiles: Vec<(f64, f64)>,
    pub coefficient_of_variation: Option<f64>,
    pub gini: Option<f64>,
}

impl Summary {
    pub fn from_samples(data: &[f64]) -> Option<Self> {
        let sorted = sorted(data);
        let values = percentiles(&sorted, &DEFAULT_PERCENTILES)?;

        Some(Self {
            count: sorted.len(),
            mean: mean(&sorted)?,
            std_dev: std_dev(&sorted)?,
            variance: variance(&sorted)?,
            min: sorted[0],
            max: sorted[sorted.len() - 1],
            median: median(&sorted)?,
            ci95: confidence_interval(&sorted, 0.95),
            percentiles: DEFAULT_PERCENTILES.iter().copied().zip(values).collect(),
            coefficient_of_variation: coefficient_of_variation(&sorted),
            gini: gini_coefficient(&sorted),
        })
    }
}
