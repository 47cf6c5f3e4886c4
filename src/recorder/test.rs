use std::sync::Arc;

use super::*;
use crate::clock::Clock;
use crate::fingerprinted_str;

fn calibrated_clock() -> Arc<Clock> {
    let clock = Arc::new(Clock::uninit());
    clock.calibrate().unwrap();
    clock
}

#[test]
fn attach_twice_on_the_same_thread_fails() {
    let clock = calibrated_clock();
    let _channel = attach(1, Arc::clone(&clock), 8).unwrap();
    let second = attach(2, clock, 8);
    assert!(matches!(second, Err(Error::ThreadAlreadyAttached)));
    detach().unwrap();
}

#[test]
fn push_pop_nests_and_accumulates_child_time() {
    let clock = calibrated_clock();
    let _channel = attach(1, clock, 8).unwrap();

    push(fingerprinted_str!("outer"), fingerprinted_str!("a.rs:1"));
    push(fingerprinted_str!("inner"), fingerprinted_str!("a.rs:2"));
    pop();
    pop();

    CURRENT.with(|cell| {
        let recorder = cell.borrow();
        let recorder = recorder.as_ref().unwrap();
        let blocks = unsafe { recorder.segment.blocks() };
        assert_eq!(blocks.len(), 2);
        assert!(!blocks[0].is_open());
        assert!(!blocks[1].is_open());
        assert_eq!(blocks[1].parent, 0);
    });

    detach().unwrap();
}

#[test]
fn detach_with_open_block_fails_and_reports_depth() {
    let clock = calibrated_clock();
    let _channel = attach(1, clock, 8).unwrap();
    push(fingerprinted_str!("outer"), fingerprinted_str!("a.rs:1"));
    push(fingerprinted_str!("inner"), fingerprinted_str!("a.rs:2"));

    let result = detach();
    assert!(matches!(result, Err(Error::OpenBlocksOnThreadEnd { open: 2 })));

    pop();
    pop();
    detach().unwrap();
}

#[test]
fn pushing_past_capacity_grows_by_handover() {
    let clock = calibrated_clock();
    let channel = attach(1, clock, 2).unwrap();

    push(fingerprinted_str!("a"), fingerprinted_str!("a.rs:1"));
    pop();
    push(fingerprinted_str!("b"), fingerprinted_str!("b.rs:1"));
    pop();
    push(fingerprinted_str!("c"), fingerprinted_str!("c.rs:1"));
    pop();

    assert_eq!(channel.first_segment.load_writeblocks(), buffer::HANDED_OVER);
    let grown = channel.first_segment.next();
    assert_eq!(grown.capacity(), 4);

    detach().unwrap();
}

#[test]
fn reset_is_a_noop_on_an_empty_stack() {
    let clock = calibrated_clock();
    let _channel = attach(1, clock, 8).unwrap();

    push(fingerprinted_str!("frame"), fingerprinted_str!("a.rs:1"));
    pop();
    reset(1);

    CURRENT.with(|cell| {
        let recorder = cell.borrow();
        let recorder = recorder.as_ref().unwrap();
        assert_eq!(recorder.numblocks, 1);
    });

    detach().unwrap();
}

#[test]
fn reset_truncates_open_blocks_back_to_the_top_of_stack() {
    let clock = calibrated_clock();
    let channel = attach(1, clock, 8).unwrap();

    push(fingerprinted_str!("outer"), fingerprinted_str!("a.rs:1"));
    push(fingerprinted_str!("inner"), fingerprinted_str!("a.rs:2"));
    push(fingerprinted_str!("grandchild"), fingerprinted_str!("a.rs:3"));
    pop(); // closes `grandchild`, attributing its duration to `inner`'s child_time

    CURRENT.with(|cell| {
        let recorder = cell.borrow();
        let recorder = recorder.as_ref().unwrap();
        assert_eq!(recorder.stack, 1, "inner is the open top of stack");
        assert_eq!(recorder.numblocks, 3);
    });

    let start_micros = channel.micro_start();
    reset(1);

    CURRENT.with(|cell| {
        let recorder = cell.borrow();
        let recorder = recorder.as_ref().unwrap();
        // Truncated to stack + 1: `outer` and `inner` survive, `grandchild`
        // (already closed, past the top of stack) is discarded.
        assert_eq!(recorder.numblocks, 2);
        assert_eq!(recorder.stack, 1);
        let blocks = unsafe { recorder.segment.blocks() };
        assert!(blocks[1].is_open());
        assert_eq!(blocks[1].child_time, 0, "top frame's child_time must be zeroed");
    });
    assert!(channel.micro_start() >= start_micros);

    pop();
    pop();
    detach().unwrap();
}

#[test]
fn reset_is_a_noop_once_the_recorder_has_grown() {
    let clock = calibrated_clock();
    let _channel = attach(1, clock, 1).unwrap();

    push(fingerprinted_str!("a"), fingerprinted_str!("a.rs:1"));
    pop();
    push(fingerprinted_str!("b"), fingerprinted_str!("b.rs:1"));

    CURRENT.with(|cell| {
        let recorder = cell.borrow();
        let recorder = recorder.as_ref().unwrap();
        assert!(has_grown(recorder));
    });

    reset(1);

    CURRENT.with(|cell| {
        let recorder = cell.borrow();
        let recorder = recorder.as_ref().unwrap();
        assert_eq!(recorder.numblocks, 2);
    });

    pop();
    detach().unwrap();
}

#[test]
fn reset_is_a_noop_if_already_applied_at_this_generation() {
    let clock = calibrated_clock();
    let _channel = attach(1, clock, 8).unwrap();

    push(fingerprinted_str!("outer"), fingerprinted_str!("a.rs:1"));
    push(fingerprinted_str!("inner"), fingerprinted_str!("a.rs:2"));
    reset(5);
    reset(5);

    CURRENT.with(|cell| {
        let recorder = cell.borrow();
        let recorder = recorder.as_ref().unwrap();
        assert_eq!(recorder.numblocks, 2, "second reset at the same generation must be a no-op");
    });

    pop();
    pop();
    detach().unwrap();
}
