//! Post-hoc all-pairs comparison and homogeneous-subset letters.
//!
//! After an omnibus ANOVA, every pair of factor-level combinations is
//! compared with a two-sided t-test on the pooled residual variance, with a
//! Bonferroni family-wise adjustment. Cells that cannot be distinguished at
//! the configured family-wise rate share a letter; cells sharing no letter
//! are significantly different.
//!
//! Letters are assigned by insert-and-absorb: start with a single letter
//! covering every cell, split any letter containing both ends of a
//! significant pair, then drop letters absorbed by a superset. Output order
//! is deterministic: means descending, ties broken by label sort order, with
//! letter `a` attached to the subset containing the largest mean.

use statrs::distribution::{ContinuousCDF, StudentsT};

/// An observed factor-level combination entering the comparison.
#[derive(Debug, Clone, PartialEq)]
pub struct CellMean {
    /// Combination label (used for deterministic tie-breaking).
    pub label: String,
    /// Observed mean of the cell.
    pub mean: f64,
    /// Number of observations underlying the mean.
    pub n: usize,
}

/// A cell annotated with its homogeneous-subset letters.
#[derive(Debug, Clone, PartialEq)]
pub struct LetteredCell {
    /// Combination label.
    pub label: String,
    /// Observed mean of the cell.
    pub mean: f64,
    /// Number of observations underlying the mean.
    pub n: usize,
    /// Concatenated subset letters, e.g. `"a"` or `"ab"`.
    pub letters: String,
}

/// Bonferroni-adjusted p-value for the difference of two cell means under
/// the pooled residual variance.
#[expect(clippy::cast_precision_loss)]
fn adjusted_pair_p(
    a: &CellMean,
    b: &CellMean,
    residual_mean_square: f64,
    residual_df: usize,
    comparisons: usize,
) -> f64 {
    let se = (residual_mean_square * (1.0 / a.n as f64 + 1.0 / b.n as f64)).sqrt();
    let raw = if se > 0.0 {
        let t = (a.mean - b.mean).abs() / se;
        let dist = StudentsT::new(0.0, 1.0, residual_df as f64)
            .expect("residual degrees of freedom are positive");
        2.0 * (1.0 - dist.cdf(t))
    } else if (a.mean - b.mean).abs() > 0.0 {
        0.0
    } else {
        1.0
    };
    (raw * comparisons as f64).min(1.0)
}

/// Assigns homogeneous-subset letters to every cell.
///
/// `residual_mean_square` and `residual_df` come from the fitted additive
/// model; `family_wise_alpha` is the family-wise error rate controlling the
/// Bonferroni-adjusted pairwise tests.
///
/// Returned cells are sorted by mean descending (ties by label ascending).
///
/// # Examples
///
/// ```
/// # use cohort_stats::posthoc::{CellMean, letter_grouping};
/// let cells = [
///     CellMean { label: "control".into(), mean: 10.0, n: 5 },
///     CellMean { label: "treated".into(), mean: 0.2, n: 5 },
///     CellMean { label: "sham".into(), mean: 0.1, n: 5 },
/// ];
/// let lettered = letter_grouping(&cells, 0.01, 12, 0.05);
/// assert_eq!(lettered[0].label, "control");
/// assert_eq!(lettered[0].letters, "a");
/// assert_eq!(lettered[1].letters, lettered[2].letters);
/// ```
#[must_use]
pub fn letter_grouping(
    cells: &[CellMean],
    residual_mean_square: f64,
    residual_df: usize,
    family_wise_alpha: f64,
) -> Vec<LetteredCell> {
    if cells.is_empty() {
        return vec![];
    }

    let mut order: Vec<usize> = (0..cells.len()).collect();
    order.sort_by(|&i, &j| {
        cells[j]
            .mean
            .total_cmp(&cells[i].mean)
            .then_with(|| cells[i].label.cmp(&cells[j].label))
    });
    let sorted: Vec<&CellMean> = order.iter().map(|&i| &cells[i]).collect();

    let k = sorted.len();
    let comparisons = k * (k - 1) / 2;
    let significant_pairs: Vec<(usize, usize)> = (0..k)
        .flat_map(|i| ((i + 1)..k).map(move |j| (i, j)))
        .filter(|&(i, j)| {
            adjusted_pair_p(
                sorted[i],
                sorted[j],
                residual_mean_square,
                residual_df,
                comparisons,
            ) < family_wise_alpha
        })
        .collect();

    let subsets = insert_and_absorb(k, &significant_pairs);

    sorted
        .iter()
        .enumerate()
        .map(|(position, cell)| {
            let letters = subsets
                .iter()
                .enumerate()
                .filter(|(_, subset)| subset.contains(&position))
                .map(|(subset_index, _)| letter_label(subset_index))
                .collect::<String>();
            LetteredCell {
                label: cell.label.clone(),
                mean: cell.mean,
                n: cell.n,
                letters,
            }
        })
        .collect()
}

/// Insert-and-absorb over cell positions `0..k` (sorted by mean descending).
///
/// Maintains the invariant that every pair not declared significant shares
/// at least one subset, while no significant pair ever does.
fn insert_and_absorb(k: usize, significant_pairs: &[(usize, usize)]) -> Vec<Vec<usize>> {
    let mut subsets: Vec<Vec<usize>> = vec![(0..k).collect()];

    for &(i, j) in significant_pairs {
        let mut next: Vec<Vec<usize>> = vec![];
        for subset in subsets {
            if subset.contains(&i) && subset.contains(&j) {
                let without = |drop: usize| {
                    subset
                        .iter()
                        .copied()
                        .filter(|&m| m != drop)
                        .collect::<Vec<_>>()
                };
                next.push(without(i));
                next.push(without(j));
            } else {
                next.push(subset);
            }
        }
        // Absorb: drop subsets contained in another subset, and duplicates.
        next.sort();
        next.dedup();
        subsets = next
            .iter()
            .filter(|candidate| {
                !next.iter().any(|other| {
                    other.len() > candidate.len()
                        && candidate.iter().all(|m| other.contains(m))
                })
            })
            .cloned()
            .collect();
    }

    // Letter order: the subset containing the largest mean first.
    subsets.sort();
    subsets
}

/// Spreadsheet-style letter label: `a..z`, then `aa`, `ab`, ...
fn letter_label(index: usize) -> String {
    let mut i = index;
    let mut label = String::new();
    loop {
        let offset = u8::try_from(i % 26).expect("modulo 26 fits in u8");
        label.insert(0, char::from(b'a' + offset));
        if i < 26 {
            break;
        }
        i = i / 26 - 1;
    }
    label
}
