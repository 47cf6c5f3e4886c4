use super::{crc32, crc32_const};

#[test]
fn matches_known_vector() {
    // Standard CRC-32/ISO-HDLC check value for ASCII "123456789".
    assert_eq!(crc32(b"123456789"), 0xCBF4_3926);
}

#[test]
fn const_and_runtime_agree() {
    const LABEL: &[u8] = b"update_physics";
    const FP: u32 = crc32_const(LABEL);
    assert_eq!(FP, crc32(LABEL));
}

#[test]
fn empty_input() {
    assert_eq!(crc32(b""), 0);
    assert_eq!(crc32_const(b""), 0);
}

#[test]
fn distinct_strings_differ() {
    assert_ne!(crc32(b"net"), crc32(b"disk"));
}
