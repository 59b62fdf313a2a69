mod error;
mod median;

use log::{debug, warn};

use crate::config::FilterConfig;
use crate::table::SampleTable;

pub use error::FilterError;
pub use median::median_filter;

#[derive(Debug, Clone, Default)]
pub struct OutlierFilter {
    config: FilterConfig,
}

impl OutlierFilter {
    pub fn new(config: FilterConfig) -> Self {
        Self { config }
    }

    /// Returns a copy of `table`, sorted by timestamp, with the selected
    /// features despiked.
    ///
    /// `features` defaults to every numeric column. `kernel_sizes`, when
    /// given, pairs up with `features` by position; otherwise each feature
    /// takes its configured kernel.
    pub fn apply(
        &self,
        table: &SampleTable,
        features: Option<&[&str]>,
        kernel_sizes: Option<&[usize]>,
    ) -> Result<SampleTable, FilterError> {
        let features: Vec<String> = match features {
            Some(f) => f.iter().map(|s| s.to_string()).collect(),
            None => table.numeric_columns(),
        };
        if features.is_empty() {
            warn!("no numeric feature to filter");
        }

        let kernels: Vec<usize> = match kernel_sizes {
            Some(k) if k.len() != features.len() => {
                return Err(FilterError::KernelCountMismatch {
                    features: features.len(),
                    kernels: k.len(),
                })
            }
            Some(k) => k.to_vec(),
            None => features
                .iter()
                .map(|f| self.config.kernel_for(f))
                .collect(),
        };

        let mut out = table.sort_by_timestamp()?;
        for (feature, kernel) in features.iter().zip(kernels) {
            let filtered = filter_column(&out.floats(feature)?, feature, kernel)?;
            out.set_floats(feature, filtered)?;
        }
        Ok(out)
    }
}

/// Despikes the non-null values of a column and writes them back in place.
fn filter_column(
    column: &[Option<f64>],
    feature: &str,
    kernel: usize,
) -> Result<Vec<Option<f64>>, FilterError> {
    if kernel == 0 || kernel % 2 == 0 {
        return Err(FilterError::InvalidKernel {
            feature: feature.to_string(),
            kernel,
        });
    }

    let known: Vec<f64> = column.iter().flatten().copied().collect();
    if kernel > known.len() {
        return Err(FilterError::KernelTooLarge {
            feature: feature.to_string(),
            kernel,
            available: known.len(),
        });
    }

    let (despiked, clamped) = despike(&known, kernel);
    debug!(
        "{}: clamped {} of {} samples (kernel {})",
        feature,
        clamped,
        known.len(),
        kernel
    );

    let mut values = despiked.into_iter();
    Ok(column
        .iter()
        .map(|v| v.and_then(|_| values.next()))
        .collect())
}

/// Runs the despiking pass over a dense signal. Also returns how many
/// points were moved.
pub fn despike(y: &[f64], kernel: usize) -> (Vec<f64>, usize) {
    if y.is_empty() {
        return (Vec::new(), 0);
    }

    let y_m = median_filter(y, kernel);
    let epsilon2: Vec<f64> = y.iter().zip(&y_m).map(|(a, b)| (a - b).powi(2)).collect();
    let sigma: Vec<f64> = median_filter(&epsilon2, kernel)
        .into_iter()
        .map(f64::sqrt)
        .collect();
    let mean_epsilon2 = epsilon2.iter().sum::<f64>() / epsilon2.len() as f64;

    let mut clamped = 0;
    let values = (0..y.len())
        .map(|i| {
            if epsilon2[i] <= mean_epsilon2 {
                return y[i];
            }
            let lower = y_m[i] - sigma[i];
            let upper = y_m[i] + sigma[i];
            if y[i] < lower {
                clamped += 1;
                lower
            } else if y[i] > upper {
                clamped += 1;
                upper
            } else {
                y[i]
            }
        })
        .collect();

    (values, clamped)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::table::TableError;
    use chrono::{DateTime, Duration, TimeZone, Utc};

    fn times(n: usize) -> Vec<DateTime<Utc>> {
        let t0 = Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap();
        (0..n).map(|i| t0 + Duration::seconds(i as i64)).collect()
    }

    #[test]
    fn test_spike_is_pulled_to_baseline() {
        let y = [1000.0, 1000.0, 1000.0, 9999.0, 1000.0, 1000.0, 1000.0];
        let (out, clamped) = despike(&y, 5);
        assert_eq!(out, vec![1000.0; 7]);
        assert_eq!(clamped, 1);
    }

    #[test]
    fn test_constant_signal_untouched() {
        let y = [5.0; 9];
        assert_eq!(despike(&y, 3).0, y.to_vec());
    }

    #[test]
    fn test_clamped_values_stay_in_band() {
        let y = [0.0, 1.0, 0.5, 40.0, 1.5, 2.0, -30.0, 2.5, 3.0, 3.5, 4.0];
        let kernel = 5;
        let y_m = median_filter(&y, kernel);
        let eps: Vec<f64> = y.iter().zip(&y_m).map(|(a, b)| (a - b).powi(2)).collect();
        let sigma: Vec<f64> = median_filter(&eps, kernel).into_iter().map(f64::sqrt).collect();
        let (out, _) = despike(&y, kernel);
        for i in 0..y.len() {
            let lo = y[i].min(y_m[i] - sigma[i]);
            let hi = y[i].max(y_m[i] + sigma[i]);
            assert!(out[i] >= lo - 1e-9 && out[i] <= hi + 1e-9, "row {i}");
        }
    }

    #[test]
    fn test_nulls_are_preserved() {
        let table = SampleTable::new(times(6))
            .unwrap()
            .with_floats(
                "altitude",
                vec![Some(10.0), None, Some(10.0), Some(500.0), Some(10.0), Some(10.0)],
            )
            .unwrap();
        let out = OutlierFilter::default()
            .apply(&table, Some(&["altitude"][..]), Some(&[3][..]))
            .unwrap();
        let alt = out.floats("altitude").unwrap();
        assert_eq!(alt[1], None);
        assert_eq!(alt[3], Some(10.0));
    }

    #[test]
    fn test_kernel_errors() {
        let table = SampleTable::new(times(3))
            .unwrap()
            .with_floats("track", vec![Some(1.0), Some(2.0), Some(3.0)])
            .unwrap();
        let filter = OutlierFilter::default();

        // track defaults to a kernel of 5, more than the three samples
        assert!(matches!(
            filter.apply(&table, None, None),
            Err(FilterError::KernelTooLarge { kernel: 5, available: 3, .. })
        ));
        assert!(matches!(
            filter.apply(&table, Some(&["track"][..]), Some(&[2][..])),
            Err(FilterError::InvalidKernel { kernel: 2, .. })
        ));
        assert!(matches!(
            filter.apply(&table, Some(&["track"][..]), Some(&[3, 3][..])),
            Err(FilterError::KernelCountMismatch { .. })
        ));
        assert!(matches!(
            filter.apply(&table, Some(&["gs"][..]), Some(&[3][..])),
            Err(FilterError::Table(TableError::ColumnNotFound(ref n))) if n == "gs"
        ));
    }

    #[test]
    fn test_output_is_time_sorted() {
        let mut t = times(3);
        t.swap(0, 2);
        let table = SampleTable::new(t)
            .unwrap()
            .with_floats("cas", vec![Some(3.0), Some(2.0), Some(1.0)])
            .unwrap();
        let out = OutlierFilter::default()
            .apply(&table, None, Some(&[1][..]))
            .unwrap();
        assert_eq!(out.floats("cas").unwrap(), vec![Some(1.0), Some(2.0), Some(3.0)]);
        assert_eq!(out.timestamps(), times(3));
    }
}
