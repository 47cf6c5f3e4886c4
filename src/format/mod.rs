//! On-disk trace file format (spec.md §6).
//!
//! Every record is written little-endian regardless of host, so a trace
//! produced on one machine can be parsed on another even though the data
//! model itself does not promise cross-machine wall-clock sync.

use std::io::{self, Read, Write};

pub const MAGIC: u32 = 0x4341_5254; // 'T','R','A','C' packed LSB-first.
pub const VERSION_V1: u32 = 1;
pub const VERSION_V2: u32 = 2;
pub const TIMEBASE_MICROS: u64 = 1_000_000;

/// Label/location strings in the stack-frame and tag tables are NUL-padded
/// fixed buffers of this width, matching `StackFrame_t::label[256]` and
/// `tags[256]` in the original source.
pub const STRING_FIELD_LEN: usize = 256;

pub const HEADER_SIZE: usize = 4 * 8 + 8 * 6; // 7 x i32/u32 + 1 pad + 6 x u64
pub const BLOCK_RECORD_SIZE: usize = 8 * 3 + 4 * 4;
pub const STACK_FRAME_RECORD_SIZE: usize = STRING_FIELD_LEN * 2 + 8 * 5 + 4 * 2;

/// Fixed, file-header placeholder written at offset 0 and patched at close.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Header {
    pub magic: u32,
    pub version: u32,
    pub num_stacks: i32,
    pub num_tags: i32,
    pub num_blocks: i32,
    pub num_index_blocks: i32,
    pub max_parents: i32,
    pub stack_ofs: u64,
    pub tag_ofs: u64,
    pub index_ofs: u64,
    pub micro_start: u64,
    pub micro_end: u64,
    pub timebase: u64,
}

impl Header {
    pub fn zeroed() -> Self {
        Self::default()
    }

    pub fn write_to<W: Write>(&self, w: &mut W) -> io::Result<()> {
        w.write_all(&self.magic.to_le_bytes())?;
        w.write_all(&self.version.to_le_bytes())?;
        w.write_all(&self.num_stacks.to_le_bytes())?;
        w.write_all(&self.num_tags.to_le_bytes())?;
        w.write_all(&self.num_blocks.to_le_bytes())?;
        w.write_all(&self.num_index_blocks.to_le_bytes())?;
        w.write_all(&self.max_parents.to_le_bytes())?;
        w.write_all(&0i32.to_le_bytes())?; // _pad
        w.write_all(&self.stack_ofs.to_le_bytes())?;
        w.write_all(&self.tag_ofs.to_le_bytes())?;
        w.write_all(&self.index_ofs.to_le_bytes())?;
        w.write_all(&self.micro_start.to_le_bytes())?;
        w.write_all(&self.micro_end.to_le_bytes())?;
        w.write_all(&self.timebase.to_le_bytes())?;
        Ok(())
    }

    pub fn read_from<R: Read>(r: &mut R) -> io::Result<Self> {
        let mut buf = [0u8; HEADER_SIZE];
        r.read_exact(&mut buf)?;
        let mut c = Cursor::new(&buf);
        Ok(Self {
            magic: c.read_u32(),
            version: c.read_u32(),
            num_stacks: c.read_i32(),
            num_tags: c.read_i32(),
            num_blocks: c.read_i32(),
            num_index_blocks: c.read_i32(),
            max_parents: {
                let v = c.read_i32();
                c.skip(4); // _pad
                v
            },
            stack_ofs: c.read_u64(),
            tag_ofs: c.read_u64(),
            index_ofs: c.read_u64(),
            micro_start: c.read_u64(),
            micro_end: c.read_u64(),
            timebase: c.read_u64(),
        })
    }
}

/// One block record as it appears on disk (spec.md §6).
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct BlockRecord {
    pub start: u64,
    pub end: u64,
    pub child_time: u64,
    pub stackframe: u32,
    pub tag: u32,
    pub parent: i32,
    pub num_parents: i32,
}

impl BlockRecord {
    pub fn write_to<W: Write>(&self, w: &mut W) -> io::Result<()> {
        w.write_all(&self.start.to_le_bytes())?;
        w.write_all(&self.end.to_le_bytes())?;
        w.write_all(&self.child_time.to_le_bytes())?;
        w.write_all(&self.stackframe.to_le_bytes())?;
        w.write_all(&self.tag.to_le_bytes())?;
        w.write_all(&self.parent.to_le_bytes())?;
        w.write_all(&self.num_parents.to_le_bytes())?;
        Ok(())
    }

    pub fn read_from<R: Read>(r: &mut R) -> io::Result<Self> {
        let mut buf = [0u8; BLOCK_RECORD_SIZE];
        r.read_exact(&mut buf)?;
        let mut c = Cursor::new(&buf);
        Ok(Self {
            start: c.read_u64(),
            end: c.read_u64(),
            child_time: c.read_u64(),
            stackframe: c.read_u32(),
            tag: c.read_u32(),
            parent: c.read_i32(),
            num_parents: c.read_i32(),
        })
    }

    pub fn is_unterminated(&self) -> bool {
        self.end == 0
    }
}

/// One stack-frame aggregate as it appears on disk (spec.md §6).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StackFrameRecord {
    pub label: [u8; STRING_FIELD_LEN],
    pub location: [u8; STRING_FIELD_LEN],
    pub wall_time: u64,
    pub child_time: u64,
    pub call_count: u64,
    pub best_call_time: u64,
    pub worst_call_time: u64,
    pub best_call: i32,
    pub worst_call: i32,
}

impl StackFrameRecord {
    pub fn new(label: &[u8], location: &[u8]) -> Self {
        Self {
            label: nul_pad(label),
            location: nul_pad(location),
            wall_time: 0,
            child_time: 0,
            call_count: 0,
            best_call_time: 0,
            worst_call_time: 0,
            best_call: -1,
            worst_call: -1,
        }
    }

    pub fn write_to<W: Write>(&self, w: &mut W) -> io::Result<()> {
        w.write_all(&self.label)?;
        w.write_all(&self.location)?;
        w.write_all(&self.wall_time.to_le_bytes())?;
        w.write_all(&self.child_time.to_le_bytes())?;
        w.write_all(&self.call_count.to_le_bytes())?;
        w.write_all(&self.best_call_time.to_le_bytes())?;
        w.write_all(&self.worst_call_time.to_le_bytes())?;
        w.write_all(&self.best_call.to_le_bytes())?;
        w.write_all(&self.worst_call.to_le_bytes())?;
        Ok(())
    }

    pub fn read_from<R: Read>(r: &mut R) -> io::Result<Self> {
        let mut label = [0u8; STRING_FIELD_LEN];
        let mut location = [0u8; STRING_FIELD_LEN];
        r.read_exact(&mut label)?;
        r.read_exact(&mut location)?;
        let mut rest = [0u8; 8 * 5 + 4 * 2];
        r.read_exact(&mut rest)?;
        let mut c = Cursor::new(&rest);
        Ok(Self {
            label,
            location,
            wall_time: c.read_u64(),
            child_time: c.read_u64(),
            call_count: c.read_u64(),
            best_call_time: c.read_u64(),
            worst_call_time: c.read_u64(),
            best_call: c.read_i32(),
            worst_call: c.read_i32(),
        })
    }
}

/// NUL-pads (and truncates, if longer than the field) a byte string into a
/// fixed-width buffer, as `strcpy_s(frame.label, ..)` does in the original.
pub fn nul_pad(bytes: &[u8]) -> [u8; STRING_FIELD_LEN] {
    let mut buf = [0u8; STRING_FIELD_LEN];
    let len = bytes.len().min(STRING_FIELD_LEN - 1);
    buf[..len].copy_from_slice(&bytes[..len]);
    buf
}

/// Minimal little-endian byte cursor, generalizing the teacher's
/// `ffi::deref_offset` (which only reads) to both directions.
struct Cursor<'a> {
    buf: &'a [u8],
    pos: usize,
}

impl<'a> Cursor<'a> {
    fn new(buf: &'a [u8]) -> Self {
        Self { buf, pos: 0 }
    }

    fn skip(&mut self, n: usize) {
        self.pos += n;
    }

    fn read_u32(&mut self) -> u32 {
        let v = u32::from_le_bytes(self.buf[self.pos..self.pos + 4].try_into().unwrap());
        self.pos += 4;
        v
    }

    fn read_i32(&mut self) -> i32 {
        let v = i32::from_le_bytes(self.buf[self.pos..self.pos + 4].try_into().unwrap());
        self.pos += 4;
        v
    }

    fn read_u64(&mut self) -> u64 {
        let v = u64::from_le_bytes(self.buf[self.pos..self.pos + 8].try_into().unwrap());
        self.pos += 8;
        v
    }
}

#[cfg(test)]
mod test;
