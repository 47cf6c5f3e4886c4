use std::sync::Arc;

use super::{Segment, HANDED_OVER};
use crate::block::Block;
use crate::fingerprinted_str;

#[test]
fn fresh_segment_publishes_zero() {
    let seg = Segment::new(8);
    assert_eq!(seg.load_writeblocks(), 0);
}

#[test]
fn handover_chain_is_followable() {
    let label = fingerprinted_str!("f");
    let location = fingerprinted_str!("f:1");

    let old = Segment::new(2);
    unsafe {
        old.blocks_mut().push(Block::open(label, location, -1, 0));
    }
    old.publish(1);

    let new = Segment::new(4);
    unsafe {
        new.blocks_mut()
            .extend_from_slice(old.blocks());
        old.set_next(Arc::clone(&new));
    }
    old.publish_handover();

    assert_eq!(old.load_writeblocks(), HANDED_OVER);
    let followed = old.next();
    assert_eq!(unsafe { followed.blocks() }.len(), 1);
    assert_eq!(followed.capacity(), 4);
}
