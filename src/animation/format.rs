//! Binary format definitions for trajectory animation files.

use std::io::{self, Read, Write};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::compute::BoundingBox;
use crate::schema::{EntityId, TidyRecord, TimeWindow};

/// Magic bytes identifying a trajectory animation file.
pub const ANIMATION_MAGIC: &[u8; 4] = b"TRJA";

/// Current format version.
pub const ANIMATION_VERSION: u16 = 1;

/// Compression type for frame data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[repr(u8)]
pub enum CompressionType {
    /// No compression.
    #[default]
    None = 0,
    /// LZ4 fast compression.
    Lz4 = 1,
}

impl CompressionType {
    pub fn from_u8(v: u8) -> Option<Self> {
        match v {
            0 => Some(CompressionType::None),
            1 => Some(CompressionType::Lz4),
            _ => None,
        }
    }
}

/// Animation file header flags.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AnimationFlags {
    /// Compression type (lower 4 bits).
    pub compression: CompressionType,
    /// If true, frames store only points appended since the previous frame.
    pub delta_encoding: bool,
}

impl AnimationFlags {
    pub fn to_u16(self) -> u16 {
        let mut flags = self.compression as u16;
        if self.delta_encoding {
            flags |= 1 << 4;
        }
        flags
    }

    pub fn from_u16(v: u16) -> Self {
        Self {
            compression: CompressionType::from_u8((v & 0x0F) as u8).unwrap_or_default(),
            delta_encoding: (v & (1 << 4)) != 0,
        }
    }
}

/// Convert an instant to on-disk microseconds.
#[inline]
pub fn to_micros(t: DateTime<Utc>) -> i64 {
    t.timestamp_micros()
}

/// Convert on-disk microseconds back to an instant.
pub fn from_micros(micros: i64) -> io::Result<DateTime<Utc>> {
    DateTime::from_timestamp_micros(micros).ok_or_else(|| {
        io::Error::new(
            io::ErrorKind::InvalidData,
            format!("Timestamp out of range: {} us", micros),
        )
    })
}

/// File header for the trajectory animation format.
#[derive(Debug, Clone, PartialEq)]
pub struct AnimationHeader {
    /// Total number of frames.
    pub frame_count: u64,
    /// Playback rate.
    pub fps: u32,
    /// Delay between frames in milliseconds.
    pub delay_ms: u32,
    /// Animated time window.
    pub window: TimeWindow,
    /// Fixed axis ranges.
    pub bounds: BoundingBox,
    /// Animation flags.
    pub flags: AnimationFlags,
}

impl AnimationHeader {
    /// Size of header in bytes.
    /// Magic(4) + Version(2) + Flags(2) + FrameCount(8) + Fps(4) + Delay(4) +
    /// WindowStart(8) + WindowEnd(8) + Bounds(48) + Reserved(8) = 96
    pub const SIZE: usize = 96;

    /// Write header to output.
    pub fn write_to<W: Write>(&self, w: &mut W) -> io::Result<()> {
        w.write_all(ANIMATION_MAGIC)?;
        w.write_all(&ANIMATION_VERSION.to_le_bytes())?;
        w.write_all(&self.flags.to_u16().to_le_bytes())?;
        w.write_all(&self.frame_count.to_le_bytes())?;
        w.write_all(&self.fps.to_le_bytes())?;
        w.write_all(&self.delay_ms.to_le_bytes())?;
        w.write_all(&to_micros(self.window.start).to_le_bytes())?;
        w.write_all(&to_micros(self.window.end).to_le_bytes())?;
        for v in self.bounds.to_array() {
            w.write_all(&v.to_le_bytes())?;
        }
        // Reserved bytes
        w.write_all(&[0u8; 8])?;
        Ok(())
    }

    /// Read header from input.
    pub fn read_from<R: Read>(r: &mut R) -> io::Result<Self> {
        let mut magic = [0u8; 4];
        r.read_exact(&mut magic)?;
        if &magic != ANIMATION_MAGIC {
            return Err(io::Error::new(
                io::ErrorKind::InvalidData,
                "Invalid TRJA magic bytes",
            ));
        }

        let mut buf2 = [0u8; 2];
        let mut buf4 = [0u8; 4];
        let mut buf8 = [0u8; 8];

        r.read_exact(&mut buf2)?;
        let version = u16::from_le_bytes(buf2);
        if version != ANIMATION_VERSION {
            return Err(io::Error::new(
                io::ErrorKind::InvalidData,
                format!("Unsupported TRJA version: {}", version),
            ));
        }

        r.read_exact(&mut buf2)?;
        let flags = AnimationFlags::from_u16(u16::from_le_bytes(buf2));

        r.read_exact(&mut buf8)?;
        let frame_count = u64::from_le_bytes(buf8);

        r.read_exact(&mut buf4)?;
        let fps = u32::from_le_bytes(buf4);

        r.read_exact(&mut buf4)?;
        let delay_ms = u32::from_le_bytes(buf4);

        r.read_exact(&mut buf8)?;
        let start = from_micros(i64::from_le_bytes(buf8))?;

        r.read_exact(&mut buf8)?;
        let end = from_micros(i64::from_le_bytes(buf8))?;

        let mut bounds = [0f64; 6];
        for v in bounds.iter_mut() {
            r.read_exact(&mut buf8)?;
            *v = f64::from_le_bytes(buf8);
        }

        // Skip reserved bytes
        r.read_exact(&mut buf8)?;

        Ok(Self {
            frame_count,
            fps,
            delay_ms,
            window: TimeWindow::new(start, end),
            bounds: BoundingBox::from_array(bounds),
            flags,
        })
    }
}

/// Index entry for a single frame.
#[derive(Debug, Clone, Copy)]
pub struct FrameIndex {
    /// Byte offset from start of file.
    pub offset: u64,
    /// Stored size in bytes (equals uncompressed if no compression).
    pub size: u64,
}

impl FrameIndex {
    /// Size of one index entry in bytes.
    pub const SIZE: usize = 16;

    pub fn write_to<W: Write>(&self, w: &mut W) -> io::Result<()> {
        w.write_all(&self.offset.to_le_bytes())?;
        w.write_all(&self.size.to_le_bytes())?;
        Ok(())
    }

    pub fn read_from<R: Read>(r: &mut R) -> io::Result<Self> {
        let mut buf8 = [0u8; 8];

        r.read_exact(&mut buf8)?;
        let offset = u64::from_le_bytes(buf8);

        r.read_exact(&mut buf8)?;
        let size = u64::from_le_bytes(buf8);

        Ok(Self { offset, size })
    }
}

/// Bytes per stored point: timestamp(8) + x, y, z (24).
pub const POINT_SIZE: usize = 32;

/// Encode one frame payload.
///
/// `points[e]` holds the points stored for entity `e`: the whole trajectory,
/// or only the appended tail when delta encoding.
pub fn encode_frame(timestamp: DateTime<Utc>, points: &[&[TidyRecord]; 3], out: &mut Vec<u8>) {
    out.clear();
    out.extend_from_slice(&to_micros(timestamp).to_le_bytes());
    for entity_points in points {
        out.extend_from_slice(&(entity_points.len() as u32).to_le_bytes());
        for p in entity_points.iter() {
            out.extend_from_slice(&to_micros(p.timestamp).to_le_bytes());
            out.extend_from_slice(&p.x.to_le_bytes());
            out.extend_from_slice(&p.y.to_le_bytes());
            out.extend_from_slice(&p.z.to_le_bytes());
        }
    }
}

/// Decoded frame payload.
#[derive(Debug, Clone, PartialEq)]
pub struct FramePayload {
    pub timestamp: DateTime<Utc>,
    pub points: [Vec<TidyRecord>; 3],
}

/// Little-endian cursor over a payload slice.
struct PayloadReader<'a> {
    bytes: &'a [u8],
    pos: usize,
}

impl<'a> PayloadReader<'a> {
    fn take<const N: usize>(&mut self) -> io::Result<[u8; N]> {
        let end = self.pos + N;
        let slice = self.bytes.get(self.pos..end).ok_or_else(|| {
            io::Error::new(
                io::ErrorKind::UnexpectedEof,
                format!("Frame payload truncated at byte {}", self.pos),
            )
        })?;
        self.pos = end;
        let mut buf = [0u8; N];
        buf.copy_from_slice(slice);
        Ok(buf)
    }

    fn i64(&mut self) -> io::Result<i64> {
        self.take::<8>().map(i64::from_le_bytes)
    }

    fn f64(&mut self) -> io::Result<f64> {
        self.take::<8>().map(f64::from_le_bytes)
    }

    fn u32(&mut self) -> io::Result<u32> {
        self.take::<4>().map(u32::from_le_bytes)
    }
}

/// Decode one frame payload.
pub fn decode_frame(bytes: &[u8]) -> io::Result<FramePayload> {
    let mut r = PayloadReader { bytes, pos: 0 };
    let timestamp = from_micros(r.i64()?)?;

    let mut points: [Vec<TidyRecord>; 3] = Default::default();
    for entity in EntityId::ALL {
        let count = r.u32()? as usize;
        if count * POINT_SIZE > bytes.len() - r.pos {
            return Err(io::Error::new(
                io::ErrorKind::InvalidData,
                format!("Entity {} claims {} points beyond payload end", entity, count),
            ));
        }
        let list = &mut points[entity.index()];
        list.reserve(count);
        for _ in 0..count {
            let t = from_micros(r.i64()?)?;
            list.push(TidyRecord {
                timestamp: t,
                entity_id: entity,
                x: r.f64()?,
                y: r.f64()?,
                z: r.f64()?,
            });
        }
    }

    if r.pos != bytes.len() {
        return Err(io::Error::new(
            io::ErrorKind::InvalidData,
            format!(
                "Frame payload has {} trailing bytes",
                bytes.len() - r.pos
            ),
        ));
    }

    Ok(FramePayload { timestamp, points })
}

/// Compress data using LZ4.
#[cfg(feature = "lz4")]
pub fn compress_lz4(data: &[u8]) -> Vec<u8> {
    lz4_flex::compress_prepend_size(data)
}

/// Decompress LZ4 data.
#[cfg(feature = "lz4")]
pub fn decompress_lz4(data: &[u8]) -> io::Result<Vec<u8>> {
    lz4_flex::decompress_size_prepended(data)
        .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))
}

/// Fallback when LZ4 is not available.
#[cfg(not(feature = "lz4"))]
pub fn compress_lz4(data: &[u8]) -> Vec<u8> {
    data.to_vec()
}

#[cfg(not(feature = "lz4"))]
pub fn decompress_lz4(data: &[u8]) -> io::Result<Vec<u8>> {
    Ok(data.to_vec())
}
