/// Summary statistics for a set of replicate measurements.
///
/// This structure contains the measures of central tendency and spread
/// reported for each group/time cell of a cross-replicate summary.
#[derive(Debug, Clone, PartialEq)]
pub struct SummaryStats {
    /// The minimum value in the dataset.
    pub min: f64,
    /// The maximum value in the dataset.
    pub max: f64,
    /// The arithmetic mean (average) of the dataset.
    pub mean: f64,
    /// The median value of the dataset (midpoint average for even sizes).
    pub median: f64,
    /// The sample standard deviation of the dataset (zero for a single value).
    pub std_dev: f64,
    /// The standard error of the mean (`std_dev / sqrt(n)`).
    pub std_err: f64,
    /// The number of values in the dataset.
    pub n: usize,
}

impl SummaryStats {
    /// Computes summary statistics from unsorted values.
    ///
    /// This method will sort the values internally before computing statistics.
    ///
    /// # Returns
    ///
    /// * `Some(SummaryStats)` - if the dataset contains at least one value
    /// * `None` - if the dataset is empty
    ///
    /// # Examples
    ///
    /// ```
    /// # use cohort_stats::descriptive::SummaryStats;
    /// let stats = SummaryStats::new([5.0, 2.0, 4.0, 1.0, 3.0]).unwrap();
    /// assert_eq!(stats.min, 1.0);
    /// assert_eq!(stats.max, 5.0);
    /// assert_eq!(stats.mean, 3.0);
    /// assert_eq!(stats.median, 3.0);
    /// assert_eq!(stats.n, 5);
    /// ```
    #[must_use]
    pub fn new<I>(values: I) -> Option<Self>
    where
        I: IntoIterator<Item = f64>,
    {
        let mut values = values.into_iter().collect::<Vec<_>>();
        values.sort_by(f64::total_cmp);
        Self::from_sorted(&values)
    }

    /// Computes summary statistics from pre-sorted values.
    ///
    /// Use this when you already have sorted data to avoid a second sort.
    ///
    /// # Panics
    ///
    /// Panics if `sorted_values` is not sorted in ascending order.
    ///
    /// # Examples
    ///
    /// ```
    /// # use cohort_stats::descriptive::SummaryStats;
    /// let stats = SummaryStats::from_sorted(&[1.0, 2.0, 3.0, 4.0]).unwrap();
    /// assert_eq!(stats.median, 2.5);
    /// ```
    #[expect(clippy::cast_precision_loss)]
    #[must_use]
    pub fn from_sorted(sorted_values: &[f64]) -> Option<Self> {
        assert!(
            sorted_values.is_sorted_by(|a, b| a <= b),
            "values must be sorted in ascending order"
        );

        let min = *sorted_values.first()?;
        let max = *sorted_values.last()?;
        let count = sorted_values.len();
        let n = count as f64;
        let mean = sorted_values.iter().copied().sum::<f64>() / n;
        let median = if count % 2 == 0 {
            (sorted_values[count / 2 - 1] + sorted_values[count / 2]) / 2.0
        } else {
            sorted_values[count / 2]
        };
        let std_dev = if count < 2 {
            0.0
        } else {
            let sum_sq = sorted_values.iter().map(|v| (v - mean).powi(2)).sum::<f64>();
            (sum_sq / (n - 1.0)).sqrt()
        };
        let std_err = std_dev / n.sqrt();

        Some(Self {
            min,
            max,
            mean,
            median,
            std_dev,
            std_err,
            n: count,
        })
    }
}
