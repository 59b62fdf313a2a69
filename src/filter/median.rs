/// Sliding-window median of `signal` with an odd window of `kernel` values.
///
/// The window is centred on each point and truncated at both ends of the
/// series, so it narrows near the boundaries. Windows holding an even number
/// of values take the mean of the two middle ones.
pub fn median_filter(signal: &[f64], kernel: usize) -> Vec<f64> {
    let half = kernel / 2;
    let mut window = Vec::with_capacity(kernel);

    (0..signal.len())
        .map(|i| {
            let lo = i.saturating_sub(half);
            let hi = (i + half + 1).min(signal.len());
            window.clear();
            window.extend_from_slice(&signal[lo..hi]);
            window.sort_by(|a, b| a.total_cmp(b));
            median_of_sorted(&window)
        })
        .collect()
}

fn median_of_sorted(values: &[f64]) -> f64 {
    let mid = values.len() / 2;
    if values.len() % 2 == 1 {
        values[mid]
    } else {
        (values[mid - 1] + values[mid]) / 2.0
    }
}
