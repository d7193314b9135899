//! Additive-model analysis of variance for one or two categorical factors.
//!
//! The model is `response ~ factor_a (+ factor_b)` with no interaction term:
//! each factor contributes an additive shift per level. The fit uses dummy
//! coding (first level as baseline) solved by least squares, and each factor
//! is tested with a sequential (Type I) omnibus F-test against the residual
//! mean square of the full additive model.

use std::collections::BTreeSet;

use statrs::distribution::{ContinuousCDF, FisherSnedecor};

/// Pivot threshold below which the normal equations are treated as singular.
const SINGULAR_EPS: f64 = 1e-10;

/// One categorical factor: a name plus the per-row level labels.
#[derive(Debug, Clone)]
pub struct Factor {
    /// Factor name used in reporting.
    pub name: String,
    /// Level label for each observation row, parallel to the response.
    pub levels: Vec<String>,
}

/// Omnibus test result for a single factor.
#[derive(Debug, Clone, PartialEq)]
pub struct FactorEffect {
    /// Factor name.
    pub name: String,
    /// Numerator degrees of freedom (distinct levels minus one).
    pub degrees_of_freedom: usize,
    /// Sequential sum of squares attributed to this factor.
    pub sum_of_squares: f64,
    /// F-statistic against the residual mean square.
    pub f_statistic: f64,
    /// Upper-tail p-value of the F-statistic.
    pub p_value: f64,
}

/// A fitted additive ANOVA model.
#[derive(Debug, Clone, PartialEq)]
pub struct AnovaFit {
    /// Per-factor omnibus tests, in input factor order.
    pub effects: Vec<FactorEffect>,
    /// Residual degrees of freedom of the full additive model.
    pub residual_degrees_of_freedom: usize,
    /// Residual sum of squares of the full additive model.
    pub residual_sum_of_squares: f64,
    /// Residual mean square (pooled error variance).
    pub residual_mean_square: f64,
}

/// Fits `response ~ factor_a (+ factor_b)` and runs per-factor F-tests.
///
/// Returns `None` when the design cannot support the tests: an empty
/// response, a factor with a single level, a collinear (aliased) design, or
/// no residual degrees of freedom left to estimate the error variance.
///
/// # Panics
///
/// Panics if `factors` is empty or longer than two, or if any factor's level
/// column length differs from the response length.
///
/// # Examples
///
/// ```
/// # use cohort_stats::anova::{Factor, additive_anova};
/// let response = [1.0, 2.0, 3.0, 7.0, 8.0, 9.0];
/// let factor = Factor {
///     name: "treatment".to_owned(),
///     levels: ["a", "a", "a", "b", "b", "b"]
///         .map(str::to_owned)
///         .to_vec(),
/// };
/// let fit = additive_anova(&response, &[factor]).unwrap();
/// assert_eq!(fit.effects[0].degrees_of_freedom, 1);
/// assert!(fit.effects[0].p_value < 0.01);
/// ```
#[expect(clippy::cast_precision_loss)]
#[must_use]
pub fn additive_anova(response: &[f64], factors: &[Factor]) -> Option<AnovaFit> {
    assert!(
        (1..=2).contains(&factors.len()),
        "the additive model supports one or two factors"
    );
    for factor in factors {
        assert_eq!(
            factor.levels.len(),
            response.len(),
            "factor '{}' must have one level per observation",
            factor.name
        );
    }
    if response.is_empty() {
        return None;
    }

    let n = response.len();
    let mean = response.iter().sum::<f64>() / n as f64;
    let total_ss = response.iter().map(|y| (y - mean).powi(2)).sum::<f64>();

    // Sequential sums of squares: fit the model one factor at a time and
    // attribute the drop in residual sum of squares to the added factor.
    let mut columns: Vec<Vec<f64>> = vec![];
    let mut previous_rss = total_ss;
    let mut model_df = 0;
    let mut partial_effects = vec![];

    for factor in factors {
        let factor_df = append_dummy_columns(&mut columns, &factor.levels);
        if factor_df == 0 {
            return None;
        }
        let rss = fit_rss(&columns, response)?;
        let sum_of_squares = (previous_rss - rss).max(0.0);
        partial_effects.push((factor.name.clone(), factor_df, sum_of_squares));
        previous_rss = rss;
        model_df += factor_df;
    }

    let residual_degrees_of_freedom = n.checked_sub(1 + model_df).filter(|df| *df >= 1)?;
    let residual_sum_of_squares = previous_rss;
    let residual_mean_square = residual_sum_of_squares / residual_degrees_of_freedom as f64;

    let effects = partial_effects
        .into_iter()
        .map(|(name, degrees_of_freedom, sum_of_squares)| {
            let (f_statistic, p_value) = f_test(
                sum_of_squares,
                degrees_of_freedom,
                residual_mean_square,
                residual_degrees_of_freedom,
            );
            FactorEffect {
                name,
                degrees_of_freedom,
                sum_of_squares,
                f_statistic,
                p_value,
            }
        })
        .collect();

    Some(AnovaFit {
        effects,
        residual_degrees_of_freedom,
        residual_sum_of_squares,
        residual_mean_square,
    })
}

/// Appends dummy columns for a factor (first level as baseline) and returns
/// the factor's degrees of freedom (distinct levels minus one).
fn append_dummy_columns(columns: &mut Vec<Vec<f64>>, levels: &[String]) -> usize {
    let distinct = levels.iter().collect::<BTreeSet<_>>();
    for level in distinct.iter().skip(1) {
        let column = levels
            .iter()
            .map(|l| if l == *level { 1.0 } else { 0.0 })
            .collect();
        columns.push(column);
    }
    distinct.len().saturating_sub(1)
}

#[expect(clippy::cast_precision_loss)]
fn f_test(
    sum_of_squares: f64,
    df: usize,
    residual_mean_square: f64,
    residual_df: usize,
) -> (f64, f64) {
    if residual_mean_square > 0.0 {
        let f = (sum_of_squares / df as f64) / residual_mean_square;
        let dist = FisherSnedecor::new(df as f64, residual_df as f64)
            .expect("degrees of freedom are positive");
        (f, 1.0 - dist.cdf(f))
    } else if sum_of_squares > 0.0 {
        // Perfect fit with a non-zero effect: unbounded evidence.
        (f64::INFINITY, 0.0)
    } else {
        (0.0, 1.0)
    }
}

/// Residual sum of squares of the least-squares fit over an intercept plus
/// the given columns. Returns `None` for a singular (collinear) design.
fn fit_rss(columns: &[Vec<f64>], response: &[f64]) -> Option<f64> {
    let n = response.len();
    let p = columns.len() + 1;
    let x = |row: usize, col: usize| {
        if col == 0 { 1.0 } else { columns[col - 1][row] }
    };

    // Normal equations: (X'X) beta = X'y
    let mut xtx = vec![vec![0.0; p]; p];
    let mut xty = vec![0.0; p];
    for row in 0..n {
        for (a, xty_a) in xty.iter_mut().enumerate() {
            let xa = x(row, a);
            *xty_a += xa * response[row];
            for (b, xtx_ab) in xtx[a].iter_mut().enumerate() {
                *xtx_ab += xa * x(row, b);
            }
        }
    }

    let beta = solve_symmetric(xtx, xty)?;

    let rss = (0..n)
        .map(|row| {
            let fitted = beta
                .iter()
                .enumerate()
                .map(|(col, b)| b * x(row, col))
                .sum::<f64>();
            (response[row] - fitted).powi(2)
        })
        .sum();
    Some(rss)
}

/// Gaussian elimination with partial pivoting. Returns `None` when a pivot
/// falls below [`SINGULAR_EPS`].
fn solve_symmetric(mut a: Vec<Vec<f64>>, mut b: Vec<f64>) -> Option<Vec<f64>> {
    let p = b.len();
    for col in 0..p {
        let pivot_row = (col..p)
            .max_by(|&r1, &r2| a[r1][col].abs().total_cmp(&a[r2][col].abs()))?;
        if a[pivot_row][col].abs() < SINGULAR_EPS {
            return None;
        }
        a.swap(col, pivot_row);
        b.swap(col, pivot_row);

        for row in (col + 1)..p {
            let ratio = a[row][col] / a[col][col];
            for k in col..p {
                a[row][k] -= ratio * a[col][k];
            }
            b[row] -= ratio * b[col];
        }
    }

    let mut beta = vec![0.0; p];
    for col in (0..p).rev() {
        let tail = ((col + 1)..p).map(|k| a[col][k] * beta[k]).sum::<f64>();
        beta[col] = (b[col] - tail) / a[col][col];
    }
    Some(beta)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn factor(name: &str, levels: &[&str]) -> Factor {
        Factor {
            name: name.to_owned(),
            levels: levels.iter().map(|l| (*l).to_owned()).collect(),
        }
    }

    #[test]
    fn test_one_way_exact_f() {
        // Group means 2 and 8, within-group SS 4 over 4 df: F = 54 / 1
        let response = [1.0, 2.0, 3.0, 7.0, 8.0, 9.0];
        let fit = additive_anova(
            &response,
            &[factor("treatment", &["a", "a", "a", "b", "b", "b"])],
        )
        .unwrap();

        assert_eq!(fit.residual_degrees_of_freedom, 4);
        assert!((fit.residual_mean_square - 1.0).abs() < 1e-9);
        let effect = &fit.effects[0];
        assert_eq!(effect.degrees_of_freedom, 1);
        assert!((effect.sum_of_squares - 54.0).abs() < 1e-9);
        assert!((effect.f_statistic - 54.0).abs() < 1e-6);
        assert!(effect.p_value < 0.01);
    }

    #[test]
    fn test_two_way_balanced_sequential_ss() {
        let response = [1.0, 1.2, 2.0, 2.2, 11.0, 11.2, 12.0, 12.2];
        let strain = factor("strain", &["lo", "lo", "lo", "lo", "hi", "hi", "hi", "hi"]);
        let sex = factor("sex", &["x", "x", "y", "y", "x", "x", "y", "y"]);
        let fit = additive_anova(&response, &[strain, sex]).unwrap();

        assert_eq!(fit.residual_degrees_of_freedom, 5);
        assert!((fit.residual_sum_of_squares - 0.08).abs() < 1e-9);
        assert!((fit.effects[0].sum_of_squares - 200.0).abs() < 1e-9);
        assert!((fit.effects[1].sum_of_squares - 2.0).abs() < 1e-9);
        assert!((fit.effects[0].f_statistic / 12_500.0 - 1.0).abs() < 1e-6);
        assert!((fit.effects[1].f_statistic / 125.0 - 1.0).abs() < 1e-6);
        assert!(fit.effects[0].p_value < 1e-6);
        assert!(fit.effects[1].p_value < 0.01);
    }

    #[test]
    fn test_single_level_factor_is_degenerate() {
        let response = [1.0, 2.0, 3.0];
        assert!(additive_anova(&response, &[factor("only", &["a", "a", "a"])]).is_none());
    }

    #[test]
    fn test_no_residual_degrees_of_freedom() {
        let response = [1.0, 2.0];
        assert!(additive_anova(&response, &[factor("pair", &["a", "b"])]).is_none());
    }

    #[test]
    fn test_aliased_factors_are_singular() {
        // The second factor is a relabeling of the first: collinear design.
        let response = [1.0, 2.0, 3.0, 4.0, 5.0, 6.0];
        let a = factor("a", &["u", "u", "u", "v", "v", "v"]);
        let b = factor("b", &["x", "x", "x", "y", "y", "y"]);
        assert!(additive_anova(&response, &[a, b]).is_none());
    }

    #[test]
    fn test_empty_response() {
        assert!(additive_anova(&[], &[factor("t", &[])]).is_none());
    }
}
