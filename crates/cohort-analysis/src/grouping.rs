//! Factorial grouping: additive ANOVA plus letter-coded homogeneous subsets.
//!
//! Input is a flat table of one numeric response and one or two categorical
//! factors, each row one biological unit or one replicate-level aggregate
//! (the caller decides the unit of analysis). The engine fits
//! `response ~ factor_a (+ factor_b)` without interaction, reports the
//! omnibus F-test per factor, and compares every observed factor-level
//! combination pairwise to produce letter-coded homogeneous subsets:
//! combinations sharing a letter are statistically indistinguishable at the
//! configured family-wise error rate.

use std::collections::BTreeMap;

use cohort_stats::anova::{Factor, additive_anova};
use cohort_stats::posthoc::{CellMean, letter_grouping};
use serde::{Deserialize, Serialize};

/// Raised when the design cannot support the post-hoc comparison.
#[derive(Debug, Clone, PartialEq, Eq, derive_more::Display, derive_more::Error)]
pub enum DegenerateDesignError {
    /// A factor-level combination has too few observations to carry
    /// variance information.
    #[display("factor-level combination '{combination}' has {observations} observation(s); at least 2 are required")]
    UndersizedCell {
        /// Label of the offending combination.
        combination: String,
        /// Number of observations in the cell.
        observations: usize,
    },
    /// The model leaves no residual degrees of freedom (or the design is
    /// aliased), so the error variance cannot be estimated.
    #[display("model leaves no residual degrees of freedom to estimate variance")]
    NoResidualVariance,
    /// Some rows carry a second factor and others do not.
    #[display("rows disagree on the presence of the second factor")]
    InconsistentFactors,
}

/// Engine configuration.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GroupingConfig {
    /// Family-wise error rate for the post-hoc pairwise comparison.
    pub family_wise_alpha: f64,
}

impl Default for GroupingConfig {
    fn default() -> Self {
        Self {
            family_wise_alpha: 0.05,
        }
    }
}

/// One input row: a numeric response with its factor levels.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MeasurementRow {
    /// Numeric response (e.g. a CFU count or a coupling count).
    pub response: f64,
    /// First factor level.
    pub factor_a: String,
    /// Second factor level, when the design has two factors.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub factor_b: Option<String>,
}

/// Omnibus test of one factor.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FactorTest {
    /// Factor name (`factor_a` or `factor_b`).
    pub factor: String,
    /// Numerator degrees of freedom.
    pub degrees_of_freedom: usize,
    /// F-statistic.
    pub f_statistic: f64,
    /// Upper-tail p-value.
    pub p_value: f64,
}

/// One letter-coded factor-level combination.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GroupedCellRow {
    /// Combination label (`a` or `a:b`).
    pub combination: String,
    /// Observed mean of the cell.
    pub mean: f64,
    /// Number of observations underlying the mean.
    pub n: usize,
    /// Homogeneous-subset letters.
    pub letters: String,
}

/// The full grouping result.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FactorialGrouping {
    /// Per-factor omnibus tests.
    pub factors: Vec<FactorTest>,
    /// Residual degrees of freedom of the additive fit.
    pub residual_degrees_of_freedom: usize,
    /// Letter-coded combinations, means descending (ties by label).
    pub cells: Vec<GroupedCellRow>,
}

/// Fits the additive model and produces the letter-coded grouping table.
///
/// # Errors
///
/// Returns [`DegenerateDesignError`] when a combination has fewer than two
/// observations, when the rows disagree on the presence of the second
/// factor, or when the fit leaves no residual variance.
///
/// # Examples
///
/// ```
/// # use cohort_analysis::grouping::{GroupingConfig, MeasurementRow, factorial_grouping};
/// let rows: Vec<MeasurementRow> = [
///     (10.0, "control"), (10.2, "control"), (10.4, "control"),
///     (1.0, "treated"), (1.2, "treated"), (1.4, "treated"),
/// ]
/// .map(|(response, level)| MeasurementRow {
///     response,
///     factor_a: level.to_owned(),
///     factor_b: None,
/// })
/// .to_vec();
///
/// let grouping = factorial_grouping(&rows, GroupingConfig::default()).unwrap();
/// assert!(grouping.factors[0].p_value < 0.001);
/// assert_eq!(grouping.cells[0].combination, "control");
/// assert_ne!(grouping.cells[0].letters, grouping.cells[1].letters);
/// ```
pub fn factorial_grouping(
    rows: &[MeasurementRow],
    config: GroupingConfig,
) -> Result<FactorialGrouping, DegenerateDesignError> {
    if rows.is_empty() {
        return Err(DegenerateDesignError::NoResidualVariance);
    }

    let with_second = rows.iter().filter(|row| row.factor_b.is_some()).count();
    if with_second != 0 && with_second != rows.len() {
        return Err(DegenerateDesignError::InconsistentFactors);
    }
    let two_factor = with_second == rows.len();

    let combination_label = |row: &MeasurementRow| match &row.factor_b {
        Some(b) => format!("{}:{}", row.factor_a, b),
        None => row.factor_a.clone(),
    };

    let mut cells: BTreeMap<String, Vec<f64>> = BTreeMap::new();
    for row in rows {
        cells
            .entry(combination_label(row))
            .or_default()
            .push(row.response);
    }
    for (combination, responses) in &cells {
        if responses.len() < 2 {
            return Err(DegenerateDesignError::UndersizedCell {
                combination: combination.clone(),
                observations: responses.len(),
            });
        }
    }

    let response: Vec<f64> = rows.iter().map(|row| row.response).collect();
    let mut factors = vec![Factor {
        name: "factor_a".to_owned(),
        levels: rows.iter().map(|row| row.factor_a.clone()).collect(),
    }];
    if two_factor {
        factors.push(Factor {
            name: "factor_b".to_owned(),
            levels: rows
                .iter()
                .map(|row| row.factor_b.clone().unwrap_or_default())
                .collect(),
        });
    }

    let fit = additive_anova(&response, &factors)
        .ok_or(DegenerateDesignError::NoResidualVariance)?;

    #[expect(clippy::cast_precision_loss)]
    let cell_means: Vec<CellMean> = cells
        .iter()
        .map(|(combination, responses)| CellMean {
            label: combination.clone(),
            mean: responses.iter().sum::<f64>() / responses.len() as f64,
            n: responses.len(),
        })
        .collect();

    let lettered = letter_grouping(
        &cell_means,
        fit.residual_mean_square,
        fit.residual_degrees_of_freedom,
        config.family_wise_alpha,
    );

    Ok(FactorialGrouping {
        factors: fit
            .effects
            .into_iter()
            .map(|effect| FactorTest {
                factor: effect.name,
                degrees_of_freedom: effect.degrees_of_freedom,
                f_statistic: effect.f_statistic,
                p_value: effect.p_value,
            })
            .collect(),
        residual_degrees_of_freedom: fit.residual_degrees_of_freedom,
        cells: lettered
            .into_iter()
            .map(|cell| GroupedCellRow {
                combination: cell.label,
                mean: cell.mean,
                n: cell.n,
                letters: cell.letters,
            })
            .collect(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(response: f64, a: &str, b: Option<&str>) -> MeasurementRow {
        MeasurementRow {
            response,
            factor_a: a.to_owned(),
            factor_b: b.map(str::to_owned),
        }
    }

    #[test]
    fn test_one_factor_letters() {
        let rows = vec![
            row(10.0, "control", None),
            row(10.2, "control", None),
            row(10.4, "control", None),
            row(1.0, "t1", None),
            row(1.2, "t1", None),
            row(1.4, "t1", None),
            row(1.0, "t2", None),
            row(1.2, "t2", None),
            row(1.4, "t2", None),
        ];
        let grouping = factorial_grouping(&rows, GroupingConfig::default()).unwrap();

        assert_eq!(grouping.factors.len(), 1);
        assert_eq!(grouping.factors[0].degrees_of_freedom, 2);
        assert!(grouping.factors[0].p_value < 1e-6);
        assert_eq!(grouping.residual_degrees_of_freedom, 6);

        // Means descending; the exact t1/t2 tie breaks by label.
        let combos: Vec<_> = grouping.cells.iter().map(|c| c.combination.as_str()).collect();
        assert_eq!(combos, vec!["control", "t1", "t2"]);
        assert_eq!(grouping.cells[0].letters, "a");
        assert_eq!(grouping.cells[1].letters, "b");
        assert_eq!(grouping.cells[2].letters, "b");
        assert_eq!(grouping.cells[0].n, 3);
    }

    #[test]
    fn test_two_factor_all_distinct() {
        let rows = vec![
            row(1.0, "lo", Some("x")),
            row(1.2, "lo", Some("x")),
            row(2.0, "lo", Some("y")),
            row(2.2, "lo", Some("y")),
            row(11.0, "hi", Some("x")),
            row(11.2, "hi", Some("x")),
            row(12.0, "hi", Some("y")),
            row(12.2, "hi", Some("y")),
        ];
        let grouping = factorial_grouping(&rows, GroupingConfig::default()).unwrap();

        assert_eq!(grouping.factors.len(), 2);
        assert!(grouping.factors.iter().all(|f| f.p_value < 0.01));
        assert_eq!(grouping.residual_degrees_of_freedom, 5);

        let combos: Vec<_> = grouping.cells.iter().map(|c| c.combination.as_str()).collect();
        assert_eq!(combos, vec!["hi:y", "hi:x", "lo:y", "lo:x"]);
        let letters: Vec<_> = grouping.cells.iter().map(|c| c.letters.as_str()).collect();
        assert_eq!(letters, vec!["a", "b", "c", "d"]);
    }

    #[test]
    fn test_single_observation_cell_is_degenerate() {
        let rows = vec![
            row(1.0, "a", None),
            row(2.0, "a", None),
            row(9.0, "b", None),
        ];
        assert_eq!(
            factorial_grouping(&rows, GroupingConfig::default()),
            Err(DegenerateDesignError::UndersizedCell {
                combination: "b".to_owned(),
                observations: 1,
            })
        );
    }

    #[test]
    fn test_mixed_factor_presence_is_rejected() {
        let rows = vec![row(1.0, "a", Some("x")), row(2.0, "a", None)];
        assert_eq!(
            factorial_grouping(&rows, GroupingConfig::default()),
            Err(DegenerateDesignError::InconsistentFactors)
        );
    }

    #[test]
    fn test_empty_table_is_degenerate() {
        assert_eq!(
            factorial_grouping(&[], GroupingConfig::default()),
            Err(DegenerateDesignError::NoResidualVariance)
        );
    }

    #[test]
    fn test_indistinguishable_groups_share_one_letter() {
        // High within-cell noise relative to the between-cell spread.
        let rows = vec![
            row(10.0, "a", None),
            row(30.0, "a", None),
            row(12.0, "b", None),
            row(28.0, "b", None),
        ];
        let grouping = factorial_grouping(&rows, GroupingConfig::default()).unwrap();
        assert!(grouping.factors[0].p_value > 0.05);
        assert!(grouping.cells.iter().all(|c| c.letters == "a"));
    }
}
