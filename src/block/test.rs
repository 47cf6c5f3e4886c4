use crate::fingerprint::crc32;
use crate::fingerprinted_str;

#[test]
fn fingerprint_matches_runtime_crc() {
    let fp = fingerprinted_str!("update_physics");
    assert_eq!(fp.crc, crc32(b"update_physics"));
    assert_eq!(fp.str.to_bytes(), b"update_physics");
}

#[test]
fn equality_and_ordering_are_on_crc_only() {
    let a = fingerprinted_str!("alpha");
    let b = fingerprinted_str!("beta");
    assert_ne!(a, b);
    assert_eq!(a.cmp(&a), std::cmp::Ordering::Equal);
}

#[test]
fn open_block_has_zero_end() {
    let label = fingerprinted_str!("fn");
    let location = fingerprinted_str!("f:1");
    let block = super::Block::open(label, location, -1, 42);
    assert!(block.is_open());
    assert_eq!(block.end, 0);
    assert_eq!(block.parent, -1);
}
