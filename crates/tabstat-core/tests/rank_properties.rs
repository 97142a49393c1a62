//! Property tests for ranking and dataset row selection

use proptest::prelude::*;
use tabstat_core::describe::{average_ranks, tie_term};
use tabstat_core::{Column, Dataset};

proptest! {
    #[test]
    fn ranks_sum_to_triangular_number(data in prop::collection::vec(-50i32..50, 1..60)) {
        let values: Vec<f64> = data.iter().map(|&v| v as f64).collect();
        let ranks = average_ranks(&values);
        let n = values.len() as f64;
        let total: f64 = ranks.iter().sum();
        prop_assert!((total - n * (n + 1.0) / 2.0).abs() < 1e-9);
    }

    #[test]
    fn tie_term_zero_for_distinct_values(n in 1usize..40) {
        let values: Vec<f64> = (0..n).map(|i| i as f64 * 0.5).collect();
        prop_assert_eq!(tie_term(&values), 0.0);
    }

    #[test]
    fn filter_rows_never_grows(mask in prop::collection::vec(any::<bool>(), 0..50)) {
        let n = mask.len();
        let ds = Dataset::from_columns(vec![
            Column::numeric("value", (0..n).map(|i| i as f64).collect()),
        ]).unwrap();
        let kept = ds.filter_rows(&mask).unwrap();
        prop_assert_eq!(kept.n_rows(), mask.iter().filter(|&&k| k).count());
    }
}
