//! The per-thread writer task (spec.md §4.4 "Writer task").
//!
//! One writer thread is spawned per attached recorder thread by
//! [`crate::session`]. It drains the recorder's segment chain, streams
//! block records to a trace file, defers records that are still open when
//! first seen and patches them once closed, and finally emits the
//! stack-frame, tag, and time-bucket tables before patching the header.

mod index;
mod stackframe;
mod tagtable;

use std::collections::HashMap;
use std::fs::File;
use std::io::{Seek, SeekFrom, Write};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use index::TimeIndex;
use stackframe::StackFrameTable;
use tagtable::TagTable;

use crate::block::Block;
use crate::clock::Clock;
use crate::config::Config;
use crate::error::{Error, Result};
use crate::format::{self, BlockRecord, Header};
use crate::recorder::buffer::{Segment, HANDED_OVER};
use crate::recorder::ThreadChannel;

/// How long the writer sleeps between polls once it has drained everything
/// currently published (spec.md §4.4: polling, not signalled wakeups).
const POLL_INTERVAL: Duration = Duration::from_millis(10);

struct PendingBlock {
    file_offset: u64,
}

/// Spawns the writer thread for one newly attached recorder.
pub(crate) fn spawn(
    channel: Arc<ThreadChannel>,
    config: Config,
    thread_name: String,
    thread_id: u64,
) -> JoinHandle<Result<()>> {
    thread::Builder::new()
        .name(format!("scope-trace-writer-{thread_id}"))
        .spawn(move || run(channel, config, thread_name, thread_id))
        .expect("failed to spawn scope-trace writer thread")
}

fn run(
    channel: Arc<ThreadChannel>,
    config: Config,
    thread_name: String,
    thread_id: u64,
) -> Result<()> {
    let path = config.trace_path(&thread_name, thread_id);
    let mut file = File::create(&path).map_err(|source| Error::OpenTraceFile {
        path: path.display().to_string(),
        source,
    })?;
    file.write_all(&[0u8; format::HEADER_SIZE])?;
    let mut pos = format::HEADER_SIZE as u64;

    let mut segment = Arc::clone(&channel.first_segment);
    let mut curblock: usize = 0;
    let mut stackframes = StackFrameTable::new();
    let mut tags = TagTable::new();
    let mut index = TimeIndex::new();
    let mut pending: HashMap<usize, PendingBlock> = HashMap::new();
    let mut max_parents: i32 = 0;

    loop {
        rewrite_pending(
            &mut file,
            &segment,
            &mut pending,
            &mut stackframes,
            &mut tags,
            &mut index,
            &mut max_parents,
            &channel.clock,
        )?;

        let writeblocks = segment.load_writeblocks();
        if writeblocks == HANDED_OVER {
            segment = segment.next();
            continue;
        }

        let target = writeblocks as usize;
        while curblock < target {
            // SAFETY: indices below `writeblocks` as observed by the
            // preceding acquire-load are published (spec.md §5).
            let block = unsafe { segment.blocks() }[curblock].clone();
            let offset = pos;

            if block.is_open() {
                let placeholder = BlockRecord {
                    start: channel.clock.relative_micros(block.start),
                    stackframe: block.location.crc,
                    parent: block.parent as i32,
                    ..Default::default()
                };
                placeholder.write_to(&mut file)?;
                pending.insert(curblock, PendingBlock { file_offset: offset });
            } else {
                let record = finalize_block(curblock, &block, &segment, &mut stackframes, &mut tags, &channel.clock);
                max_parents = max_parents.max(record.num_parents);
                index.observe(record.start, record.end, curblock as u32);
                record.write_to(&mut file)?;
            }
            pos += format::BLOCK_RECORD_SIZE as u64;
            curblock += 1;
        }

        if curblock == target {
            if pending.is_empty() && channel.is_terminated() {
                break;
            }
            thread::sleep(POLL_INTERVAL);
        }
    }

    index.sort();

    let stack_records = stackframes.into_sorted_records();
    let num_stacks = stack_records.len();
    let stack_ofs = pos;
    for (crc, _) in &stack_records {
        file.write_all(&crc.to_le_bytes())?;
        pos += 4;
    }
    for (_, frame) in &stack_records {
        frame.write_to(&mut file)?;
        pos += format::STACK_FRAME_RECORD_SIZE as u64;
    }

    let tag_records = tags.into_sorted_records();
    let num_tags = tag_records.len();
    let tag_ofs = pos;
    for (crc, _) in &tag_records {
        file.write_all(&crc.to_le_bytes())?;
        pos += 4;
    }
    for (_, tag) in &tag_records {
        file.write_all(tag)?;
        pos += format::STRING_FIELD_LEN as u64;
    }

    let index_buckets = index.into_buckets();
    let num_index_blocks = index_buckets.len();
    let index_ofs = pos;
    for bucket in index_buckets {
        file.write_all(&(bucket.len() as i32).to_le_bytes())?;
        pos += 4;
        for block_index in bucket {
            file.write_all(&(block_index as i32).to_le_bytes())?;
            pos += 4;
        }
    }

    let header = Header {
        magic: format::MAGIC,
        version: format::VERSION_V2,
        num_stacks: num_stacks as i32,
        num_tags: num_tags as i32,
        num_blocks: curblock as i32,
        num_index_blocks: num_index_blocks as i32,
        max_parents,
        stack_ofs,
        tag_ofs,
        index_ofs,
        micro_start: channel.micro_start(),
        micro_end: channel.micro_end(),
        timebase: format::TIMEBASE_MICROS,
    };

    file.seek(SeekFrom::Start(0))?;
    header.write_to(&mut file)?;
    file.flush()?;
    Ok(())
}

/// Re-checks every block that was still open when first streamed. Any that
/// have since closed get their record patched in place (spec.md §4.4
/// "Deferred finalization").
fn rewrite_pending(
    file: &mut File,
    segment: &Segment,
    pending: &mut HashMap<usize, PendingBlock>,
    stackframes: &mut StackFrameTable,
    tags: &mut TagTable,
    index: &mut TimeIndex,
    max_parents: &mut i32,
    clock: &Clock,
) -> Result<()> {
    if pending.is_empty() {
        return Ok(());
    }

    let resume_at = file.stream_position()?;
    let mut newly_closed = Vec::new();
    for (&block_index, slot) in pending.iter() {
        // SAFETY: this index was already observed as published; the
        // producer only ever writes `end` once, going from 0 to non-zero.
        let block = unsafe { segment.blocks() }[block_index].clone();
        if block.is_open() {
            continue;
        }
        let record = finalize_block(block_index, &block, segment, stackframes, tags, clock);
        *max_parents = (*max_parents).max(record.num_parents);
        index.observe(record.start, record.end, block_index as u32);
        file.seek(SeekFrom::Start(slot.file_offset))?;
        record.write_to(file)?;
        newly_closed.push(block_index);
    }
    file.seek(SeekFrom::Start(resume_at))?;
    for block_index in newly_closed {
        pending.remove(&block_index);
    }
    Ok(())
}

fn finalize_block(
    index: usize,
    block: &Block,
    segment: &Segment,
    stackframes: &mut StackFrameTable,
    tags: &mut TagTable,
    clock: &Clock,
) -> BlockRecord {
    let start_micros = clock.relative_micros(block.start);
    let end_micros = clock.relative_micros(block.end);
    let wall_time = end_micros.saturating_sub(start_micros);

    stackframes.record_call(
        block.location.crc,
        block.label.str.to_bytes(),
        block.location.str.to_bytes(),
        wall_time,
        block.child_time,
        index as i32,
    );

    let tag = block
        .tag
        .as_ref()
        .map(|tag| tags.intern(tag.as_c_str().to_bytes()))
        .unwrap_or(0);

    BlockRecord {
        start: start_micros,
        end: end_micros,
        child_time: block.child_time,
        stackframe: block.location.crc,
        tag,
        parent: block.parent as i32,
        num_parents: parent_depth(segment, block.parent),
    }
}

fn parent_depth(segment: &Segment, mut parent: i64) -> i32 {
    let mut depth = 0;
    while parent >= 0 {
        depth += 1;
        parent = unsafe { segment.blocks() }[parent as usize].parent;
    }
    depth
}
