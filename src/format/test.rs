use std::io::Cursor;

use super::{BlockRecord, Header, StackFrameRecord, MAGIC, VERSION_V2};

#[test]
fn header_round_trips() {
    let header = Header {
        magic: MAGIC,
        version: VERSION_V2,
        num_stacks: 3,
        num_tags: 2,
        num_blocks: 10,
        num_index_blocks: 4,
        max_parents: 5,
        stack_ofs: 100,
        tag_ofs: 200,
        index_ofs: 300,
        micro_start: 1000,
        micro_end: 2000,
        timebase: super::TIMEBASE_MICROS,
    };
    let mut buf = Vec::new();
    header.write_to(&mut buf).unwrap();
    assert_eq!(buf.len(), super::HEADER_SIZE);
    let parsed = Header::read_from(&mut Cursor::new(&buf)).unwrap();
    assert_eq!(parsed, header);
}

#[test]
fn block_record_round_trips() {
    let record = BlockRecord {
        start: 10,
        end: 50,
        child_time: 20,
        stackframe: 0xDEAD_BEEF,
        tag: 0,
        parent: -1,
        num_parents: 0,
    };
    let mut buf = Vec::new();
    record.write_to(&mut buf).unwrap();
    assert_eq!(buf.len(), super::BLOCK_RECORD_SIZE);
    let parsed = BlockRecord::read_from(&mut Cursor::new(&buf)).unwrap();
    assert_eq!(parsed, record);
    assert!(!parsed.is_unterminated());
}

#[test]
fn unterminated_block_has_zero_end() {
    let record = BlockRecord { end: 0, ..Default::default() };
    assert!(record.is_unterminated());
}

#[test]
fn stack_frame_record_round_trips() {
    let frame = StackFrameRecord::new(b"update_physics", b"physics.cpp:42");
    let mut buf = Vec::new();
    frame.write_to(&mut buf).unwrap();
    assert_eq!(buf.len(), super::STACK_FRAME_RECORD_SIZE);
    let parsed = StackFrameRecord::read_from(&mut Cursor::new(&buf)).unwrap();
    assert_eq!(parsed, frame);
    assert_eq!(&parsed.label[..14], b"update_physics");
    assert_eq!(parsed.label[14], 0);
}

#[test]
fn nul_pad_truncates_oversized_input() {
    let long = vec![b'a'; 1000];
    let padded = super::nul_pad(&long);
    assert_eq!(padded.len(), super::STRING_FIELD_LEN);
    assert_eq!(padded[super::STRING_FIELD_LEN - 1], 0);
}
