use super::TagTable;

#[test]
fn interning_is_idempotent() {
    let mut table = TagTable::new();
    let a = table.intern(b"level=boss");
    let b = table.intern(b"level=boss");
    assert_eq!(a, b);
    assert_eq!(table.len(), 1);
}

#[test]
fn distinct_tags_get_distinct_fingerprints() {
    let mut table = TagTable::new();
    let a = table.intern(b"level=boss");
    let b = table.intern(b"level=tutorial");
    assert_ne!(a, b);
    assert_eq!(table.len(), 2);
}

#[test]
fn records_are_sorted_by_fingerprint() {
    let mut table = TagTable::new();
    table.intern(b"zzz");
    table.intern(b"aaa");
    let records = table.into_sorted_records();
    assert_eq!(records.len(), 2);
    assert!(records[0].0 < records[1].0);
}
