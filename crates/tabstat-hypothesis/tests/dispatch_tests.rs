use proptest::prelude::*;
use tabstat_core::{Column, Dataset, Error};
use tabstat_hypothesis::{
    run_post_hoc, run_test, PostHoc, PostHocSelection, StatTest, TestSelection,
    POST_HOC_NOT_IMPLEMENTED, TEST_NOT_IMPLEMENTED,
};

fn two_groups() -> Dataset {
    Dataset::from_columns(vec![
        Column::text("group", vec!["A", "A", "A", "B", "B", "B"]),
        Column::numeric("value", vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0]),
    ])
    .unwrap()
}

fn three_groups() -> Dataset {
    Dataset::from_columns(vec![
        Column::text(
            "group",
            vec!["C", "A", "B", "C", "A", "B", "C", "A", "B", "C", "A", "B"],
        ),
        Column::numeric(
            "value",
            vec![9.0, 1.0, 3.0, 10.0, 2.0, 4.0, 8.0, 3.0, 2.0, 9.5, 2.5, 3.5],
        ),
    ])
    .unwrap()
}

fn known(test: StatTest) -> TestSelection {
    TestSelection::Known(test)
}

#[test]
fn independent_t_scenario() {
    let result = run_test(&known(StatTest::IndependentT), &two_groups()).unwrap();
    assert_eq!(result.summary, "t統計量: -3.6742\np値: 0.0213");
    assert!(result.significant);
}

#[test]
fn two_sample_tests_use_first_two_levels() {
    // "C" appears first, then "A"; "B" is ignored
    let result = run_test(&known(StatTest::MannWhitneyU), &three_groups()).unwrap();
    assert!(result.summary.starts_with("U統計量: 16.0000"));
    assert!(result.significant);
}

#[test]
fn unsupported_selection_falls_back() {
    let selection: TestSelection = "カイ二乗検定".parse().unwrap();
    for data in [Dataset::new(), two_groups()] {
        let result = run_test(&selection, &data).unwrap();
        assert_eq!(result.summary, TEST_NOT_IMPLEMENTED);
        assert!(!result.significant);
    }

    let post_hoc: PostHocSelection = "Dunn検定".parse().unwrap();
    assert_eq!(run_post_hoc(&post_hoc, &Dataset::new()).unwrap(), POST_HOC_NOT_IMPLEMENTED);
}

#[test]
fn missing_column_is_an_error() {
    let ds = Dataset::from_columns(vec![Column::numeric("value", vec![1.0, 2.0])]).unwrap();
    let err = run_test(&known(StatTest::IndependentT), &ds).unwrap_err();
    assert!(matches!(err, Error::MissingColumn(ref c) if c == "group"));

    let err = run_test(&known(StatTest::Spearman), &two_groups()).unwrap_err();
    assert!(matches!(err, Error::MissingColumn(ref c) if c == "x"));
}

#[test]
fn single_group_is_an_error() {
    let ds = Dataset::from_columns(vec![
        Column::text("group", vec!["A", "A", "A"]),
        Column::numeric("value", vec![1.0, 2.0, 3.0]),
    ])
    .unwrap();
    for test in [StatTest::IndependentT, StatTest::OneWayAnova, StatTest::KruskalWallis] {
        assert!(matches!(
            run_test(&known(test), &ds),
            Err(Error::InsufficientGroups { .. })
        ));
    }
}

#[test]
fn omnibus_tests_on_three_groups() {
    let data = three_groups();
    for test in [StatTest::OneWayAnova, StatTest::KruskalWallis, StatTest::Friedman] {
        let result = run_test(&known(test), &data).unwrap();
        assert!(result.summary.contains("p値: "), "{test}: {}", result.summary);
        assert!(result.significant, "{test}");
    }
}

#[test]
fn paired_tests_reject_unequal_groups() {
    let ds = Dataset::from_columns(vec![
        Column::text("group", vec!["A", "A", "A", "B", "B"]),
        Column::numeric("value", vec![1.0, 2.0, 3.0, 4.0, 5.0]),
    ])
    .unwrap();
    assert!(run_test(&known(StatTest::PairedT), &ds).is_err());
    assert!(run_test(&known(StatTest::WilcoxonSignedRank), &ds).is_err());
}

fn with_gaps(group: Vec<&str>, value: Vec<Option<f64>>) -> Dataset {
    Dataset::from_columns(vec![
        Column::text("group", group),
        Column::numeric_opt("value", value),
    ])
    .unwrap()
}

#[test]
fn paired_tests_drop_incomplete_pairs_without_shifting() {
    // A = [1, -, 3, 4], B = [2, 30, -, 5.5]: only positions 0 and 3 are complete
    let gapped = with_gaps(
        vec!["A", "A", "A", "A", "B", "B", "B", "B"],
        vec![Some(1.0), None, Some(3.0), Some(4.0), Some(2.0), Some(30.0), None, Some(5.5)],
    );
    let result = run_test(&known(StatTest::PairedT), &gapped).unwrap();
    assert_eq!(result.summary, "t統計量: -5.0000\np値: 0.1257");

    let complete = with_gaps(
        vec!["A", "A", "B", "B"],
        vec![Some(1.0), Some(4.0), Some(2.0), Some(5.5)],
    );
    assert_eq!(
        run_test(&known(StatTest::WilcoxonSignedRank), &gapped).unwrap(),
        run_test(&known(StatTest::WilcoxonSignedRank), &complete).unwrap()
    );
}

#[test]
fn friedman_drops_incomplete_blocks() {
    let value = |v: [f64; 5]| v.map(Some).to_vec();
    let mut gapped_values = Vec::new();
    gapped_values.extend(value([1.0, 2.0, 3.0, 4.0, 5.0]));
    gapped_values.extend(value([2.0, 3.5, 4.0, 5.5, 6.0]));
    gapped_values.extend(value([3.0, 5.0, 5.0, 7.0, 8.0]));
    gapped_values[6] = None;
    let groups: Vec<&str> = ["A", "B", "C"]
        .iter()
        .flat_map(|g| std::iter::repeat(*g).take(5))
        .collect();
    let gapped = with_gaps(groups, gapped_values.clone());

    // Same data with block 1 removed from every group
    let keep: Vec<usize> = (0..15).filter(|i| i % 5 != 1).collect();
    let complete = gapped.take_rows(&keep);

    assert_eq!(
        run_test(&known(StatTest::Friedman), &gapped).unwrap(),
        run_test(&known(StatTest::Friedman), &complete).unwrap()
    );
}

#[test]
fn spearman_reads_x_and_y() {
    let ds = Dataset::from_columns(vec![
        Column::numeric_opt(
            "x",
            vec![Some(1.0), Some(2.0), Some(3.0), None, Some(5.0), Some(6.0)],
        ),
        Column::numeric("y", vec![2.0, 4.0, 5.0, 100.0, 7.0, 9.0]),
    ])
    .unwrap();
    let result = run_test(&known(StatTest::Spearman), &ds).unwrap();
    assert!(result.summary.starts_with("Spearman相関係数: 1.0000"));
    assert!(result.significant);
}

#[test]
fn repeated_measures_reads_time_row() {
    let ds = Dataset::from_columns(vec![
        Column::text("subject", vec!["s1", "s1", "s1", "s2", "s2", "s2", "s3", "s3", "s3"]),
        Column::numeric("time", vec![1.0, 2.0, 3.0, 1.0, 2.0, 3.0, 1.0, 2.0, 3.0]),
        Column::numeric("value", vec![1.0, 2.0, 4.0, 2.0, 3.0, 4.0, 3.0, 5.0, 6.0]),
    ])
    .unwrap();
    let result = run_test(&known(StatTest::RepeatedMeasuresAnova), &ds).unwrap();
    assert!(result.summary.contains("Anova"));
    assert!(result.summary.contains("32.0000"));
    assert!(result.significant);
}

#[test]
fn every_post_hoc_runs_on_three_groups() {
    let data = three_groups();
    for procedure in PostHoc::ALL {
        let text = run_post_hoc(&PostHocSelection::Known(procedure), &data).unwrap();
        assert!(text.contains("group1"), "{procedure}");
        // A vs C is the clearest difference in every table
        assert!(text.lines().any(|l| l.contains('A') && l.contains('C') && l.ends_with("True")));
    }
}

#[test]
fn dunnett_reports_tukey_table() {
    let data = three_groups();
    let tukey = run_post_hoc(&PostHoc::TukeyHsd.into(), &data).unwrap();
    let dunnett = run_post_hoc(&PostHoc::Dunnett.into(), &data).unwrap();
    assert_eq!(tukey, dunnett);
}

fn shuffled(order: &[usize]) -> Dataset {
    let base = Dataset::from_columns(vec![
        Column::text("group", vec!["A", "A", "A", "A", "B", "B", "B", "B"]),
        Column::numeric("value", vec![1.2, 3.4, 2.2, 5.1, 4.4, 6.0, 5.5, 7.3]),
    ])
    .unwrap();
    base.take_rows(order)
}

proptest! {
    #[test]
    fn two_sample_summaries_are_order_invariant(order in Just((0..8).collect::<Vec<usize>>()).prop_shuffle()) {
        // both groups must still be discovered in the same order
        let a_first = order.iter().position(|&i| i < 4) < order.iter().position(|&i| i >= 4);
        prop_assume!(a_first);
        let reference = shuffled(&(0..8).collect::<Vec<_>>());
        let permuted = shuffled(&order);
        for test in [StatTest::IndependentT, StatTest::MannWhitneyU] {
            let expected = run_test(&known(test), &reference).unwrap();
            let actual = run_test(&known(test), &permuted).unwrap();
            prop_assert_eq!(expected, actual);
        }
    }
}
