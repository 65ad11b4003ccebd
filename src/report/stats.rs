use serde::{Deserialize, Serialize};
use statrs::statistics::Statistics;

/// Pearson correlation of two equal-length samples.
/// None when there are fewer than two pairs or either sample has no spread.
pub fn pearson_correlation(xs: &[f64], ys: &[f64]) -> Option<f64> {
    if xs.len() != ys.len() || xs.len() < 2 {
        return None;
    }
    let sx = xs.std_dev();
    let sy = ys.std_dev();
    if !(sx > 0.0 && sy > 0.0) {
        return None;
    }
    let r = xs.covariance(ys) / (sx * sy);
    r.is_finite().then(|| r.clamp(-1.0, 1.0))
}

/// Wording for a correlation coefficient
pub fn interpret_correlation(r: f64) -> &'static str {
    if r > 0.7 {
        "Strong positive"
    } else if r > 0.3 {
        "Moderate positive"
    } else if r > -0.3 {
        "Weak"
    } else {
        "Negative"
    }
}

/// Least-squares line `y = slope * x + intercept`
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq)]
pub struct TrendLine {
    pub slope: f64,
    pub intercept: f64,
}

impl TrendLine {
    pub fn fit(xs: &[f64], ys: &[f64]) -> Option<Self> {
        if xs.len() != ys.len() || xs.len() < 2 {
            return None;
        }
        let var_x = xs.variance();
        if !(var_x > 0.0) {
            return None;
        }
        let slope = xs.covariance(ys) / var_x;
        let intercept = ys.mean() - slope * xs.mean();
        (slope.is_finite() && intercept.is_finite()).then_some(TrendLine { slope, intercept })
    }

    pub fn at(&self, x: f64) -> f64 {
        self.slope * x + self.intercept
    }
}

impl std::fmt::Display for TrendLine {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "y={:.2}x+{:.2}", self.slope, self.intercept)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_perfect_correlations() {
        let xs = [1.0, 2.0, 3.0, 4.0];
        let up = [2.0, 4.0, 6.0, 8.0];
        let down = [8.0, 6.0, 4.0, 2.0];
        assert!((pearson_correlation(&xs, &up).unwrap() - 1.0).abs() < 1e-12);
        assert!((pearson_correlation(&xs, &down).unwrap() + 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_undefined_correlation() {
        assert_eq!(pearson_correlation(&[1.0], &[2.0]), None);
        assert_eq!(pearson_correlation(&[1.0, 1.0, 1.0], &[1.0, 2.0, 3.0]), None);
        assert_eq!(pearson_correlation(&[1.0, 2.0], &[1.0]), None);
    }

    #[test]
    fn test_interpretation_bands() {
        assert_eq!(interpret_correlation(0.9), "Strong positive");
        assert_eq!(interpret_correlation(0.5), "Moderate positive");
        assert_eq!(interpret_correlation(0.0), "Weak");
        assert_eq!(interpret_correlation(-0.8), "Negative");
    }

    #[test]
    fn test_trend_line_fit() {
        let xs = [0.0, 1.0, 2.0, 3.0];
        let ys = [1.0, 3.0, 5.0, 7.0];
        let line = TrendLine::fit(&xs, &ys).unwrap();
        assert!((line.slope - 2.0).abs() < 1e-12);
        assert!((line.intercept - 1.0).abs() < 1e-12);
        assert!((line.at(10.0) - 21.0).abs() < 1e-9);
        assert_eq!(line.to_string(), "y=2.00x+1.00");

        assert_eq!(TrendLine::fit(&[1.0, 1.0], &[0.0, 5.0]), None);
    }
}
