use std::collections::{BTreeMap, BTreeSet};

use noisefilters::quark::StringTable;
use noisefilters::{Column, Dataset, Error, FilterResult};

fn five_rows() -> Dataset {
    Dataset::new(vec![
        Column::numeric("x", vec![0.0, 1.0, 2.0, 3.0, 4.0]),
        Column::categorical("class", &["a", "b", "a", "b", "a"]),
    ])
    .expect("valid dataset")
}

fn result(
    ds: &Dataset,
    removed: &[usize],
    repaired: &[(usize, usize)],
) -> Result<FilterResult, Error> {
    FilterResult::new(
        ds,
        1,
        removed.iter().copied().collect(),
        repaired.iter().copied().collect(),
        serde_json::json!({ "label_column": 1 }),
        "hand-built".to_string(),
        vec!["test fixture".to_string()],
    )
}

#[test]
fn removed_repaired_retained_partition_rows() {
    let ds = five_rows();
    let r = result(&ds, &[2, 5], &[(3, 1)]).expect("valid result");
    let retained = r.retained(&ds);
    assert_eq!(retained, vec![1, 3, 4]);
    let mut seen = BTreeSet::new();
    for idx in r.removed().iter().chain(retained.iter()) {
        assert!(seen.insert(*idx), "row {} appears twice", idx);
    }
    assert_eq!(seen.len(), ds.len());
    for idx in r.repaired().keys() {
        assert!(!r.removed().contains(idx), "repaired row {} also removed", idx);
    }
}

#[test]
fn reconstruction_is_reproducible() {
    let ds = five_rows();
    let r = result(&ds, &[2, 5], &[(3, 1)]).expect("valid result");
    let once = r.clean_data(&ds).expect("first reconstruction");
    let twice = r.clean_data(&ds).expect("second reconstruction");
    assert_eq!(once, twice);
    assert_eq!(
        serde_json::to_string(&once).expect("serialize"),
        serde_json::to_string(&twice).expect("serialize")
    );
    assert_eq!(once.len(), ds.len() - r.removed().len());
}

#[test]
fn repairs_are_applied_to_clean_data() {
    let ds = five_rows();
    let r = result(&ds, &[2], &[(3, 1)]).expect("valid result");
    let clean = r.clean_data(&ds).expect("reconstruction");
    // Retained rows are 1, 3, 4, 5; original row 3 is the second of them.
    assert_eq!(clean.len(), 4);
    assert_eq!(clean.class_of(1, 1), 1, "repaired label must be overwritten");
    assert_eq!(clean.class_names(1).to_str(1), Some("b"));
    assert_eq!(ds.class_of(2, 1), 0, "original dataset untouched");
}

#[test]
fn overlapping_removed_and_repaired_rejected() {
    let ds = five_rows();
    match result(&ds, &[2], &[(2, 0)]) {
        Err(Error::InvalidInput(..)) => {}
        other => panic!("expected InvalidInput, got {:?}", other),
    }
}

#[test]
fn out_of_range_indices_rejected() {
    let ds = five_rows();
    match result(&ds, &[6], &[]) {
        Err(Error::InvalidInput(..)) => {}
        other => panic!("expected InvalidInput, got {:?}", other),
    }
    match result(&ds, &[0], &[]) {
        Err(Error::InvalidInput(..)) => {}
        other => panic!("expected InvalidInput, got {:?}", other),
    }
}

#[test]
fn repair_code_outside_vocabulary_rejected() {
    let ds = five_rows();
    match result(&ds, &[], &[(1, 9)]) {
        Err(Error::InvalidInput(..)) => {}
        other => panic!("expected InvalidInput, got {:?}", other),
    }
}

#[test]
fn accessors_expose_invocation_context() {
    let ds = five_rows();
    let r = result(&ds, &[1], &[]).expect("valid result");
    assert_eq!(r.provenance(), "hand-built");
    assert_eq!(r.notes(), ["test fixture".to_string()]);
    assert_eq!(r.parameters()["label_column"], 1);
    let empty: BTreeMap<usize, usize> = BTreeMap::new();
    assert_eq!(r.repaired(), &empty);
}
