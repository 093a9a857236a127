//! Imperceptibility metrics between an original and a modified stream.
//!
//! All pairwise metrics compare the common prefix of the two inputs.

use serde::{Deserialize, Serialize};

fn common<'a>(a: &'a [i16], b: &'a [i16]) -> (&'a [i16], &'a [i16]) {
    let n = a.len().min(b.len());
    (&a[..n], &b[..n])
}

/// Mean squared error
pub fn mse(original: &[i16], modified: &[i16]) -> f64 {
    let (a, b) = common(original, modified);
    if a.is_empty() {
        return 0.0;
    }
    let sum: f64 = a
        .iter()
        .zip(b)
        .map(|(&x, &y)| {
            let d = x as f64 - y as f64;
            d * d
        })
        .sum();
    sum / a.len() as f64
}

/// Peak signal-to-noise ratio in dB, using the original's largest magnitude
/// as peak. Identical inputs give `f64::INFINITY`.
pub fn psnr(original: &[i16], modified: &[i16]) -> f64 {
    let error = mse(original, modified);
    if error == 0.0 {
        return f64::INFINITY;
    }
    let peak = original
        .iter()
        .map(|&s| (s as f64).abs())
        .fold(0.0, f64::max);
    10.0 * (peak * peak / error).log10()
}

/// Mean absolute sample difference
pub fn mean_abs_distortion(original: &[i16], modified: &[i16]) -> f64 {
    let (a, b) = common(original, modified);
    if a.is_empty() {
        return 0.0;
    }
    let sum: f64 = a
        .iter()
        .zip(b)
        .map(|(&x, &y)| (x as f64 - y as f64).abs())
        .sum();
    sum / a.len() as f64
}

/// Pearson correlation coefficient; 0 when either side has no variance
pub fn cross_correlation(original: &[i16], modified: &[i16]) -> f64 {
    let (a, b) = common(original, modified);
    let ma = component_stats(a).mean;
    let mb = component_stats(b).mean;

    let (mut cov, mut va, mut vb) = (0.0, 0.0, 0.0);
    for (&x, &y) in a.iter().zip(b) {
        let dx = x as f64 - ma;
        let dy = y as f64 - mb;
        cov += dx * dy;
        va += dx * dx;
        vb += dy * dy;
    }
    let denom = (va * vb).sqrt();
    if denom == 0.0 {
        0.0
    } else {
        cov / denom
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ComponentStats {
    pub mean: f64,
    /// Population standard deviation
    pub std: f64,
}

pub fn component_stats(samples: &[i16]) -> ComponentStats {
    if samples.is_empty() {
        return ComponentStats { mean: 0.0, std: 0.0 };
    }
    let n = samples.len() as f64;
    let mean = samples.iter().map(|&s| s as f64).sum::<f64>() / n;
    let var = samples
        .iter()
        .map(|&s| (s as f64 - mean).powi(2))
        .sum::<f64>()
        / n;
    ComponentStats {
        mean,
        std: var.sqrt(),
    }
}

/// Shannon entropy of the sample-value histogram (bits per sample)
pub fn sample_entropy(samples: &[i16]) -> f64 {
    if samples.is_empty() {
        return 0.0;
    }
    let mut freq = vec![0u64; 1 << 16];
    for &s in samples {
        freq[s as u16 as usize] += 1;
    }

    let len = samples.len() as f64;
    let mut entropy = 0.0;
    for &count in &freq {
        if count > 0 {
            let p = count as f64 / len;
            entropy -= p * p.log2();
        }
    }
    entropy
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct KsResult {
    pub d_stat: f64,
    pub p_value: f64,
}

/// Two-sample Kolmogorov-Smirnov test on the sample distributions
pub fn ks_two_sample(original: &[i16], modified: &[i16]) -> KsResult {
    if original.is_empty() || modified.is_empty() {
        return KsResult {
            d_stat: 0.0,
            p_value: 1.0,
        };
    }
    let mut a = original.to_vec();
    let mut b = modified.to_vec();
    a.sort_unstable();
    b.sort_unstable();

    let (n1, n2) = (a.len() as f64, b.len() as f64);
    let (mut i, mut j) = (0, 0);
    let mut d: f64 = 0.0;
    while i < a.len() && j < b.len() {
        // Step past every copy of the smaller value on both sides
        let v = a[i].min(b[j]);
        while i < a.len() && a[i] == v {
            i += 1;
        }
        while j < b.len() && b[j] == v {
            j += 1;
        }
        d = d.max((i as f64 / n1 - j as f64 / n2).abs());
    }

    let effective = n1 * n2 / (n1 + n2);
    KsResult {
        d_stat: d,
        p_value: kolmogorov_p_value(d, effective),
    }
}

fn kolmogorov_p_value(d: f64, n: f64) -> f64 {
    let lambda = n.sqrt() * d;
    if lambda == 0.0 {
        return 1.0;
    }
    let mut sum = 0.0;
    for k in 1..100 {
        let term = (-2.0 * (k as f64).powi(2) * lambda * lambda).exp();
        sum += (-1.0f64).powi(k - 1) * term;
    }
    (2.0 * sum).clamp(0.0, 1.0)
}

/// Width, in sample values, of one chi-square histogram bin
pub const CHI_SQUARE_BIN_WIDTH: i32 = 64;

/// Statistic plus p-value of a two-sample test
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TestResult {
    pub statistic: f64,
    pub p_value: f64,
}

impl TestResult {
    fn indistinguishable() -> Self {
        Self {
            statistic: 0.0,
            p_value: 1.0,
        }
    }
}

fn chi_square_bin(sample: i16) -> usize {
    ((sample as i32 - i16::MIN as i32) / CHI_SQUARE_BIN_WIDTH) as usize
}

/// Chi-square test of homogeneity between the two sample histograms
pub fn chi_square_two_sample(original: &[i16], modified: &[i16]) -> TestResult {
    if original.is_empty() || modified.is_empty() {
        return TestResult::indistinguishable();
    }
    let bins = chi_square_bin(i16::MAX) + 1;
    let mut a = vec![0u64; bins];
    let mut b = vec![0u64; bins];
    for &s in original {
        a[chi_square_bin(s)] += 1;
    }
    for &s in modified {
        b[chi_square_bin(s)] += 1;
    }

    let (na, nb) = (original.len() as f64, modified.len() as f64);
    let (ka, kb) = ((nb / na).sqrt(), (na / nb).sqrt());
    let mut statistic = 0.0;
    let mut occupied = 0usize;
    for (&x, &y) in a.iter().zip(&b) {
        if x + y == 0 {
            continue;
        }
        occupied += 1;
        let diff = x as f64 * ka - y as f64 * kb;
        statistic += diff * diff / (x + y) as f64;
    }

    let df = occupied.saturating_sub(1);
    TestResult {
        statistic,
        p_value: chi_square_p_value(statistic, df),
    }
}

/// Upper tail of the chi-square distribution (Fisher's normal approximation)
fn chi_square_p_value(chi_square: f64, df: usize) -> f64 {
    if df == 0 {
        return 1.0;
    }
    let z = (2.0 * chi_square).sqrt() - (2.0 * df as f64 - 1.0).sqrt();
    (0.5 * (1.0 - erf(z / std::f64::consts::SQRT_2))).clamp(0.0, 1.0)
}

/// Mann-Whitney U test; the statistic is U for `original`, the p-value is
/// two-sided from the tie-corrected normal approximation
pub fn mann_whitney_u(original: &[i16], modified: &[i16]) -> TestResult {
    if original.is_empty() || modified.is_empty() {
        return TestResult::indistinguishable();
    }
    let mut a = vec![0u64; 1 << 16];
    let mut b = vec![0u64; 1 << 16];
    for &s in original {
        a[(s as i32 - i16::MIN as i32) as usize] += 1;
    }
    for &s in modified {
        b[(s as i32 - i16::MIN as i32) as usize] += 1;
    }

    // Walk values in order; tied values share their average rank
    let mut below = 0u64;
    let mut rank_sum = 0.0;
    let mut tie_term = 0.0;
    for (&x, &y) in a.iter().zip(&b) {
        let t = x + y;
        if t == 0 {
            continue;
        }
        let average_rank = below as f64 + (t as f64 + 1.0) / 2.0;
        rank_sum += x as f64 * average_rank;
        tie_term += (t as f64).powi(3) - t as f64;
        below += t;
    }

    let (n1, n2) = (original.len() as f64, modified.len() as f64);
    let n = n1 + n2;
    let u1 = rank_sum - n1 * (n1 + 1.0) / 2.0;
    let mean = n1 * n2 / 2.0;
    let variance = n1 * n2 / 12.0 * ((n + 1.0) - tie_term / (n * (n - 1.0)));
    if variance <= 0.0 {
        return TestResult {
            statistic: u1,
            p_value: 1.0,
        };
    }

    // Continuity-corrected
    let z = ((u1 - mean).abs() - 0.5) / variance.sqrt();
    TestResult {
        statistic: u1,
        p_value: (1.0 - erf(z / std::f64::consts::SQRT_2)).clamp(0.0, 1.0),
    }
}

/// Error function approximation (Abramowitz and Stegun 7.1.26)
fn erf(x: f64) -> f64 {
    let a1 = 0.254829592;
    let a2 = -0.284496736;
    let a3 = 1.421413741;
    let a4 = -1.453152027;
    let a5 = 1.061405429;
    let p = 0.3275911;

    let sign = if x < 0.0 { -1.0 } else { 1.0 };
    let x = x.abs();
    let t = 1.0 / (1.0 + p * x);
    let y = 1.0 - (((((a5 * t + a4) * t) + a3) * t + a2) * t + a1) * t * (-x * x).exp();
    sign * y
}

/// Normalized autocorrelation at lags `1..=max_lag`.
/// A signal without variance has zero autocorrelation at every lag.
pub fn autocorrelation(samples: &[i16], max_lag: usize) -> Vec<f64> {
    let mean = component_stats(samples).mean;
    let centred: Vec<f64> = samples.iter().map(|&s| s as f64 - mean).collect();
    let energy: f64 = centred.iter().map(|x| x * x).sum();

    (1..=max_lag)
        .map(|lag| {
            if energy == 0.0 || lag >= centred.len() {
                return 0.0;
            }
            let sum: f64 = centred
                .iter()
                .zip(&centred[lag..])
                .map(|(x, y)| x * y)
                .sum();
            sum / energy
        })
        .collect()
}

/// Lags reported by [`QualityReport`]
pub const REPORT_LAGS: usize = 4;

/// All metrics for one original/modified pair
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QualityReport {
    pub mse: f64,
    pub psnr: f64,
    pub mean_abs_distortion: f64,
    pub cross_correlation: f64,
    pub original: ComponentStats,
    pub modified: ComponentStats,
    pub entropy_original: f64,
    pub entropy_modified: f64,
    pub ks: KsResult,
    pub chi_square: TestResult,
    pub mann_whitney: TestResult,
    /// Lags `1..=REPORT_LAGS`
    pub autocorrelation_original: Vec<f64>,
    pub autocorrelation_modified: Vec<f64>,
}

impl QualityReport {
    pub fn compare(original: &[i16], modified: &[i16]) -> Self {
        Self {
            mse: mse(original, modified),
            psnr: psnr(original, modified),
            mean_abs_distortion: mean_abs_distortion(original, modified),
            cross_correlation: cross_correlation(original, modified),
            original: component_stats(original),
            modified: component_stats(modified),
            entropy_original: sample_entropy(original),
            entropy_modified: sample_entropy(modified),
            ks: ks_two_sample(original, modified),
            chi_square: chi_square_two_sample(original, modified),
            mann_whitney: mann_whitney_u(original, modified),
            autocorrelation_original: autocorrelation(original, REPORT_LAGS),
            autocorrelation_modified: autocorrelation(modified, REPORT_LAGS),
        }
    }

    pub fn to_text(&self) -> String {
        let mut output = String::new();
        output.push_str("Quality Metrics\n");
        output.push_str("---------------\n");
        output.push_str(&format!("MSE:               {:.4}\n", self.mse));
        output.push_str(&format!("PSNR:              {:.2} dB\n", self.psnr));
        output.push_str(&format!("Mean distortion:   {:.4}\n", self.mean_abs_distortion));
        output.push_str(&format!("Cross-correlation: {:.6}\n", self.cross_correlation));
        output.push_str(&format!(
            "Mean / std:        {:.2} / {:.2} -> {:.2} / {:.2}\n",
            self.original.mean, self.original.std, self.modified.mean, self.modified.std
        ));
        output.push_str(&format!(
            "Entropy:           {:.4} -> {:.4} bits/sample\n",
            self.entropy_original, self.entropy_modified
        ));
        output.push_str(&format!(
            "Kolmogorov-Smirnov: D={:.6}, p-value={:.4}\n",
            self.ks.d_stat, self.ks.p_value
        ));
        output.push_str(&format!(
            "Chi-square:        stat={:.4}, p-value={:.4}\n",
            self.chi_square.statistic, self.chi_square.p_value
        ));
        output.push_str(&format!(
            "Mann-Whitney U:    U={:.1}, p-value={:.4}\n",
            self.mann_whitney.statistic, self.mann_whitney.p_value
        ));
        output.push_str(&format!(
            "Autocorrelation:   {} -> {}\n",
            format_lags(&self.autocorrelation_original),
            format_lags(&self.autocorrelation_modified)
        ));
        output
    }
}

fn format_lags(values: &[f64]) -> String {
    values
        .iter()
        .map(|v| format!("{:.4}", v))
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identical_streams() {
        let a: Vec<i16> = (0..1000).map(|i| (i * 13 % 2001 - 1000) as i16).collect();
        let report = QualityReport::compare(&a, &a);
        assert_eq!(report.mse, 0.0);
        assert!(report.psnr.is_infinite());
        assert_eq!(report.mean_abs_distortion, 0.0);
        assert!((report.cross_correlation - 1.0).abs() < 1e-12);
        assert_eq!(report.ks.d_stat, 0.0);
        assert_eq!(report.ks.p_value, 1.0);
        assert_eq!(report.chi_square.statistic, 0.0);
        assert!(report.chi_square.p_value > 0.5);
        assert_eq!(report.mann_whitney.statistic, 500_000.0);
        assert_eq!(report.mann_whitney.p_value, 1.0);
        assert_eq!(report.autocorrelation_original, report.autocorrelation_modified);
        assert_eq!(report.autocorrelation_original.len(), REPORT_LAGS);
    }

    #[test]
    fn test_mse_and_psnr() {
        let a = [1000i16, -2000, 500, 0];
        let b = [1001i16, -2000, 499, 0];
        assert_eq!(mse(&a, &b), 0.5);
        assert_eq!(mean_abs_distortion(&a, &b), 0.5);
        let expected = 10.0 * (2000.0f64 * 2000.0 / 0.5).log10();
        assert!((psnr(&a, &b) - expected).abs() < 1e-9);
    }

    #[test]
    fn test_correlation_sign() {
        let a: Vec<i16> = (0..100).collect();
        let b: Vec<i16> = a.iter().map(|&x| -x).collect();
        assert!((cross_correlation(&a, &b) + 1.0).abs() < 1e-12);
        assert_eq!(cross_correlation(&[5, 5, 5], &[1, 2, 3]), 0.0);
    }

    #[test]
    fn test_component_stats() {
        let stats = component_stats(&[2, 4, 4, 4, 5, 5, 7, 9]);
        assert_eq!(stats.mean, 5.0);
        assert_eq!(stats.std, 2.0);
    }

    #[test]
    fn test_entropy() {
        assert_eq!(sample_entropy(&[7; 64]), 0.0);
        assert!((sample_entropy(&[0, 1, 2, 3]) - 2.0).abs() < 1e-12);
        assert!((sample_entropy(&[-1, 1]) - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_ks_detects_shift() {
        let a: Vec<i16> = (0..500).collect();
        let b: Vec<i16> = (250..750).collect();
        let ks = ks_two_sample(&a, &b);
        assert!((ks.d_stat - 0.5).abs() < 1e-12);
        assert!(ks.p_value < 1e-6);
    }

    #[test]
    fn test_chi_square_counts_bins() {
        let a = [0i16, 0, 64, 64];
        let b = [0i16, 0, 0, 64];
        let chi = chi_square_two_sample(&a, &b);
        assert!((chi.statistic - (1.0 / 5.0 + 1.0 / 3.0)).abs() < 1e-12);
        assert!(chi.p_value > 0.05 && chi.p_value <= 1.0);

        // Values inside one bin are not told apart
        let same_bin = chi_square_two_sample(&[0, 1, 2], &[3, 4, 5]);
        assert_eq!(same_bin.statistic, 0.0);
        assert_eq!(same_bin.p_value, 1.0);
    }

    #[test]
    fn test_chi_square_detects_shift() {
        let a: Vec<i16> = (0..5000).collect();
        let b: Vec<i16> = (2500..7500).collect();
        let chi = chi_square_two_sample(&a, &b);
        assert!(chi.statistic > 1000.0);
        assert!(chi.p_value < 1e-6);
    }

    #[test]
    fn test_mann_whitney_statistic() {
        assert_eq!(mann_whitney_u(&[1, 2, 3], &[4, 5, 6]).statistic, 0.0);
        assert_eq!(mann_whitney_u(&[4, 5, 6], &[1, 2, 3]).statistic, 9.0);
        // Ties count half
        assert_eq!(mann_whitney_u(&[1, 2], &[2, 3]).statistic, 0.5);
    }

    #[test]
    fn test_mann_whitney_detects_shift() {
        let a: Vec<i16> = (0..500).collect();
        let b: Vec<i16> = (250..750).collect();
        let u = mann_whitney_u(&a, &b);
        assert_eq!(u.statistic, 31_250.0);
        assert!(u.p_value < 1e-3);
    }

    #[test]
    fn test_autocorrelation() {
        let alternating: Vec<i16> = (0..100).map(|i| if i % 2 == 0 { 1 } else { -1 }).collect();
        let acf = autocorrelation(&alternating, 2);
        assert!((acf[0] + 0.99).abs() < 1e-12);
        assert!((acf[1] - 0.98).abs() < 1e-12);

        assert_eq!(autocorrelation(&[3; 10], 3), vec![0.0; 3]);
        assert_eq!(autocorrelation(&[1, 2], 5), vec![-0.5, 0.0, 0.0, 0.0, 0.0]);
    }

    #[test]
    fn test_report_text() {
        let text = QualityReport::compare(&[1, 2, 3], &[1, 2, 2]).to_text();
        assert!(text.contains("PSNR"));
        assert!(text.contains("Kolmogorov-Smirnov"));
        assert!(text.contains("Chi-square"));
        assert!(text.contains("Mann-Whitney U"));
        assert!(text.contains("Autocorrelation"));
    }
}
