//! Animation player for reading back recorded frame sequences.

use std::fs::File;
use std::io::{self, BufReader, Read, Seek, SeekFrom};
use std::path::Path;

use chrono::{DateTime, Utc};

use super::format::{
    AnimationHeader, CompressionType, FrameIndex, FramePayload, decode_frame, decompress_lz4,
};
use crate::compute::{BoundingBox, FrameMap, FrameState};
use crate::schema::{EntityId, TidyRecord};

/// A frame read back from a recording, owning its trajectories.
#[derive(Debug, Clone, PartialEq)]
pub struct PlaybackFrame {
    pub timestamp: DateTime<Utc>,
    pub trajectories: [Vec<TidyRecord>; 3],
}

impl PlaybackFrame {
    /// Borrow as a frame map, omitting entities without data.
    pub fn states(&self) -> FrameMap<'_> {
        EntityId::ALL
            .iter()
            .filter_map(|&e| {
                FrameState::from_trajectory(&self.trajectories[e.index()]).map(|s| (e, s))
            })
            .collect()
    }
}

/// Animation player for reading recorded animation files.
///
/// Usage:
/// ```ignore
/// let mut player = AnimationPlayer::open("animation.trja")?;
/// println!("Animation has {} frames", player.frame_count());
///
/// // Read specific frame
/// let frame = player.read_frame(100)?;
///
/// // Or iterate through all frames
/// for frame_result in player.frames() {
///     let frame = frame_result?;
///     // Draw frame.states()...
/// }
/// ```
#[derive(Debug)]
pub struct AnimationPlayer {
    reader: BufReader<File>,
    header: AnimationHeader,
    frame_indices: Vec<FrameIndex>,
    /// Last frame reconstructed, for sequential delta decoding.
    cursor: Option<(u64, PlaybackFrame)>,
}

impl AnimationPlayer {
    /// Open an animation file for playback.
    pub fn open<P: AsRef<Path>>(path: P) -> io::Result<Self> {
        let file = File::open(path)?;
        let mut reader = BufReader::new(file);

        // Read header
        let header = AnimationHeader::read_from(&mut reader)?;

        // Seek to end to find index table
        let file_len = reader.seek(SeekFrom::End(0))?;
        let index_start = header
            .frame_count
            .checked_mul(FrameIndex::SIZE as u64)
            .and_then(|index_size| file_len.checked_sub(index_size))
            .filter(|&start| start >= AnimationHeader::SIZE as u64)
            .ok_or_else(|| {
                io::Error::new(
                    io::ErrorKind::InvalidData,
                    format!(
                        "File too short for {} frame index entries",
                        header.frame_count
                    ),
                )
            })?;

        reader.seek(SeekFrom::Start(index_start))?;

        // Read frame indices
        let mut frame_indices = Vec::with_capacity(header.frame_count as usize);
        for _ in 0..header.frame_count {
            frame_indices.push(FrameIndex::read_from(&mut reader)?);
        }

        Ok(Self {
            reader,
            header,
            frame_indices,
            cursor: None,
        })
    }

    /// Get animation header.
    pub fn header(&self) -> &AnimationHeader {
        &self.header
    }

    /// Get total number of frames.
    pub fn frame_count(&self) -> u64 {
        self.header.frame_count
    }

    pub fn bounds(&self) -> &BoundingBox {
        &self.header.bounds
    }

    /// Delay between frames in milliseconds.
    pub fn delay_ms(&self) -> u32 {
        self.header.delay_ms
    }

    /// Read a specific frame by index.
    ///
    /// Delta-encoded files are replayed from the last frame read, or from the
    /// start when seeking backwards.
    pub fn read_frame(&mut self, frame_index: u64) -> io::Result<PlaybackFrame> {
        if frame_index >= self.header.frame_count {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                format!(
                    "Frame index {} out of range ({} frames)",
                    frame_index, self.header.frame_count
                ),
            ));
        }

        if !self.header.flags.delta_encoding {
            let payload = self.read_payload(frame_index)?;
            return Ok(PlaybackFrame {
                timestamp: payload.timestamp,
                trajectories: payload.points,
            });
        }

        let (mut next, mut frame) = match self.cursor.take() {
            Some((i, frame)) if i <= frame_index => (i + 1, frame),
            _ => (
                0,
                PlaybackFrame {
                    timestamp: self.header.window.start,
                    trajectories: Default::default(),
                },
            ),
        };
        while next <= frame_index {
            let payload = self.read_payload(next)?;
            frame.timestamp = payload.timestamp;
            for (trajectory, appended) in frame.trajectories.iter_mut().zip(payload.points) {
                trajectory.extend(appended);
            }
            next += 1;
        }

        self.cursor = Some((frame_index, frame.clone()));
        Ok(frame)
    }

    /// Read and decode one stored payload.
    fn read_payload(&mut self, frame_index: u64) -> io::Result<FramePayload> {
        let index = self.frame_indices[frame_index as usize];
        self.reader.seek(SeekFrom::Start(index.offset))?;

        // Read compressed/raw data
        let mut data = vec![0u8; index.size as usize];
        self.reader.read_exact(&mut data)?;

        // Decompress if needed
        let raw_data = match self.header.flags.compression {
            CompressionType::None => data,
            CompressionType::Lz4 => decompress_lz4(&data)?,
        };

        decode_frame(&raw_data)
    }

    /// Create an iterator over all frames.
    pub fn frames(&mut self) -> FrameIterator<'_> {
        FrameIterator {
            player: self,
            current: 0,
        }
    }
}

/// Iterator over animation frames.
pub struct FrameIterator<'a> {
    player: &'a mut AnimationPlayer,
    current: u64,
}

impl<'a> Iterator for FrameIterator<'a> {
    type Item = io::Result<PlaybackFrame>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.current >= self.player.frame_count() {
            return None;
        }

        let result = self.player.read_frame(self.current);
        self.current += 1;
        Some(result)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = (self.player.frame_count() - self.current) as usize;
        (remaining, Some(remaining))
    }
}

impl<'a> ExactSizeIterator for FrameIterator<'a> {}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::animation::{AnimationRecorder, CompressionType, RecorderConfig};
    use crate::compute::{PlaybackSettings, WindowedAnimator};
    use crate::schema::{TidySet, TimeWindow};
    use chrono::TimeZone;
    use tempfile::tempdir;

    fn at(secs: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(secs, 0).unwrap()
    }

    /// Entity 0 at every second, entity 1 from t=3, entity 2 only at even seconds.
    fn test_animator() -> WindowedAnimator {
        let mut records = Vec::new();
        for t in 0..8i64 {
            records.push(TidyRecord {
                timestamp: at(t),
                entity_id: EntityId::N0,
                x: t as f64,
                y: 0.5,
                z: -1.0,
            });
            if t >= 3 {
                records.push(TidyRecord {
                    timestamp: at(t),
                    entity_id: EntityId::N1,
                    x: 1.0,
                    y: t as f64 * 0.25,
                    z: 2.0,
                });
            }
            if t % 2 == 0 {
                records.push(TidyRecord {
                    timestamp: at(t),
                    entity_id: EntityId::N2,
                    x: -3.0,
                    y: -3.0,
                    z: t as f64,
                });
            }
        }
        let set = TidySet::from_unsorted(records);
        WindowedAnimator::new(&set, TimeWindow::new(at(0), at(7))).unwrap()
    }

    fn roundtrip(config: RecorderConfig) {
        let dir = tempdir().unwrap();
        let path = dir.path().join("roundtrip.trja");
        let animator = test_animator();
        let settings = PlaybackSettings { fps: 12, dpi: 100 };

        {
            let mut recorder =
                AnimationRecorder::new(&path, &animator.plan(&settings), config).unwrap();
            animator.play(&mut recorder, &settings).unwrap();
            recorder.finalize().unwrap();
        }

        let mut player = AnimationPlayer::open(&path).unwrap();
        assert_eq!(player.frame_count(), 8);
        assert_eq!(player.delay_ms(), 83);
        assert_eq!(player.bounds(), animator.bounds());
        assert_eq!(player.header().window, *animator.window());

        let frames: Vec<_> = player.frames().collect::<io::Result<_>>().unwrap();
        for ((t, expected), frame) in animator.frames().zip(&frames) {
            assert_eq!(frame.timestamp, t);
            assert_eq!(frame.states(), expected);
        }

        // Random access, including backwards seeks.
        for i in [5u64, 2, 7, 0] {
            let frame = player.read_frame(i).unwrap();
            assert_eq!(frame.states(), animator.render_frame(i as usize).unwrap());
        }
    }

    #[test]
    fn test_player_roundtrip_full() {
        roundtrip(RecorderConfig::default());
    }

    #[test]
    fn test_player_roundtrip_delta() {
        roundtrip(RecorderConfig {
            delta_encoding: true,
            ..Default::default()
        });
    }

    #[test]
    fn test_player_roundtrip_lz4_delta() {
        roundtrip(RecorderConfig {
            compression: CompressionType::Lz4,
            delta_encoding: true,
            ..Default::default()
        });
    }

    #[test]
    fn test_player_delta_with_frame_skip() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("skip.trja");
        let animator = test_animator();
        let settings = PlaybackSettings::default();
        let config = RecorderConfig {
            delta_encoding: true,
            frame_skip: 3,
            ..Default::default()
        };

        {
            let mut recorder =
                AnimationRecorder::new(&path, &animator.plan(&settings), config).unwrap();
            animator.play(&mut recorder, &settings).unwrap();
            recorder.finalize().unwrap();
        }

        // Frames 2 and 5 (third and sixth) are recorded.
        let mut player = AnimationPlayer::open(&path).unwrap();
        assert_eq!(player.frame_count(), 2);
        let frame = player.read_frame(1).unwrap();
        assert_eq!(frame.states(), animator.render_frame(5).unwrap());
    }

    #[test]
    fn test_player_out_of_range() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("range.trja");
        let animator = test_animator();
        let settings = PlaybackSettings::default();
        {
            let mut recorder = AnimationRecorder::new(
                &path,
                &animator.plan(&settings),
                RecorderConfig::default(),
            )
            .unwrap();
            animator.play(&mut recorder, &settings).unwrap();
            recorder.finalize().unwrap();
        }

        let mut player = AnimationPlayer::open(&path).unwrap();
        let err = player.read_frame(8).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::InvalidInput);
    }

    #[test]
    fn test_player_rejects_non_animation_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("junk.trja");
        std::fs::write(&path, b"Time,N0x\n1,2\n").unwrap();
        assert!(AnimationPlayer::open(&path).is_err());
    }

    #[test]
    fn test_player_rejects_oversized_frame_count() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("corrupt.trja");
        let header = AnimationHeader {
            frame_count: u64::MAX / 8,
            fps: 10,
            delay_ms: 100,
            window: TimeWindow::new(at(0), at(1)),
            bounds: BoundingBox::from_array([0.0; 6]),
            flags: Default::default(),
        };
        let mut bytes = Vec::new();
        header.write_to(&mut bytes).unwrap();
        bytes.extend_from_slice(&[0u8; 64]);
        std::fs::write(&path, &bytes).unwrap();

        let err = AnimationPlayer::open(&path).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::InvalidData);
    }
}
