use approx::assert_relative_eq;
use proptest::prelude::*;
use tabstat_core::{Column, Dataset};
use tabstat_preprocess::{
    preprocess, Encoding, MissingValues, Normalization, OutlierMethod, PreprocessingConfig,
    Transform,
};

fn mixed() -> Dataset {
    Dataset::from_columns(vec![
        Column::text("group", vec!["b", "a", "b", "a", "a"]),
        Column::numeric_opt("value", vec![Some(1.0), Some(3.0), None, Some(5.0), Some(7.0)]),
    ])
    .unwrap()
}

#[test]
fn empty_config_is_identity() {
    let ds = mixed();
    let out = preprocess(&ds, &PreprocessingConfig::default()).unwrap();
    assert_eq!(out, ds);
}

#[test]
fn steps_run_in_fixed_order() {
    // normalization happens before imputation, so the fill value is the
    // mean of the already rescaled column
    let config = PreprocessingConfig::new()
        .with_normalization(Normalization::MinMax)
        .with_missing(MissingValues::Mean)
        .with_encoding(Encoding::Label);
    let out = preprocess(&mixed(), &config).unwrap();

    let values = out.numeric_values("value").unwrap();
    assert_eq!(values.len(), 5);
    assert_relative_eq!(values[0], 0.0);
    assert_relative_eq!(values[2], (0.0 + 1.0 / 3.0 + 2.0 / 3.0 + 1.0) / 4.0);
    assert_eq!(out.numeric_values("group").unwrap(), vec![1.0, 0.0, 1.0, 0.0, 0.0]);
}

#[test]
fn transform_applies_to_encoded_columns() {
    let config = PreprocessingConfig::new()
        .with_missing(MissingValues::Drop)
        .with_encoding(Encoding::OneHot)
        .with_transform(Transform::Sqrt);
    let out = preprocess(&mixed(), &config).unwrap();
    assert_eq!(out.column_names(), vec!["value", "group_a", "group_b"]);
    assert_eq!(out.n_rows(), 4);
    assert_relative_eq!(out.numeric_values("value").unwrap()[1], 3.0_f64.sqrt());
}

#[test]
fn invalid_threshold_is_rejected() {
    let config = PreprocessingConfig::new()
        .with_outliers(OutlierMethod::ZScore)
        .with_threshold(0.0);
    assert!(preprocess(&mixed(), &config).is_err());
}

proptest! {
    #[test]
    fn zscore_never_adds_rows(data in prop::collection::vec(-1e3f64..1e3, 1..80), t in 0.5f64..4.0) {
        let ds = Dataset::from_columns(vec![Column::numeric("value", data.clone())]).unwrap();
        let config = PreprocessingConfig::new()
            .with_outliers(OutlierMethod::ZScore)
            .with_threshold(t);
        let out = preprocess(&ds, &config).unwrap();
        prop_assert!(out.n_rows() <= data.len());
    }

    #[test]
    fn minmax_stays_in_unit_interval(data in prop::collection::vec(-1e3f64..1e3, 1..80)) {
        let ds = Dataset::from_columns(vec![Column::numeric("value", data)]).unwrap();
        let config = PreprocessingConfig::new().with_normalization(Normalization::MinMax);
        let out = preprocess(&ds, &config).unwrap();
        for v in out.numeric_values("value").unwrap() {
            prop_assert!((-1e-12..=1.0 + 1e-12).contains(&v));
        }
    }
}
