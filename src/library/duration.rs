//! Playable-duration computation.
//!
//! MPEG audio is measured by decoding its frames with `nanomp3`; every other
//! format gets a size-based estimate from a typical byte rate.

use std::path::Path;

/// Fallback byte rate (~256 kbps) for formats without a table entry.
const DEFAULT_BYTES_PER_SECOND: u64 = 32_000;

/// How the duration of a given format is obtained.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum DurationStrategy {
    /// Sum the duration of every complete MPEG frame.
    MpegFrames,
    /// `file_size / bytes_per_second`.
    Estimate { bytes_per_second: u64 },
}

const STRATEGIES: &[(&str, DurationStrategy)] = &[
    (".mp3", DurationStrategy::MpegFrames),
    // ~1000 kbps
    (
        ".flac",
        DurationStrategy::Estimate {
            bytes_per_second: 125_000,
        },
    ),
    // 16 bit, 44.1 kHz, stereo
    (
        ".wav",
        DurationStrategy::Estimate {
            bytes_per_second: 176_400,
        },
    ),
    // ~192 kbps
    (
        ".m4a",
        DurationStrategy::Estimate {
            bytes_per_second: 24_000,
        },
    ),
    (
        ".aac",
        DurationStrategy::Estimate {
            bytes_per_second: 24_000,
        },
    ),
    // ~200 kbps
    (
        ".ogg",
        DurationStrategy::Estimate {
            bytes_per_second: 25_000,
        },
    ),
];

/// Strategy for a lowercased extension including its leading dot.
pub fn strategy_for(format: &str) -> DurationStrategy {
    STRATEGIES
        .iter()
        .find(|(ext, _)| *ext == format)
        .map(|(_, s)| *s)
        .unwrap_or(DurationStrategy::Estimate {
            bytes_per_second: DEFAULT_BYTES_PER_SECOND,
        })
}

/// Best-effort duration in whole seconds. Unreadable files yield 0.
pub fn duration_secs(path: &Path, format: &str, file_size: u64) -> u64 {
    match strategy_for(format) {
        DurationStrategy::MpegFrames => match std::fs::read(path) {
            Ok(data) => mpeg_duration_secs(&data),
            Err(_) => 0,
        },
        DurationStrategy::Estimate { bytes_per_second } => {
            estimate_secs(file_size, bytes_per_second)
        }
    }
}

pub fn estimate_secs(file_size: u64, bytes_per_second: u64) -> u64 {
    if file_size == 0 || bytes_per_second == 0 {
        return 0;
    }
    file_size / bytes_per_second
}

/// Format seconds as `M:SS`, or `H:MM:SS` from one hour on.
pub fn format_duration(seconds: i64) -> String {
    if seconds <= 0 {
        return "0:00".to_string();
    }

    let minutes = seconds / 60;
    let secs = seconds % 60;
    if minutes >= 60 {
        return format!("{}:{:02}:{:02}", minutes / 60, minutes % 60, secs);
    }
    format!("{minutes}:{secs:02}")
}

/// Sum the duration of every decodable frame in an MPEG audio stream.
///
/// The decoder skips leading junk such as an ID3v2 tag and resyncs over
/// damaged spans; a frame running past the end of `data` ends the walk with
/// the total accumulated so far.
pub fn mpeg_duration_secs(data: &[u8]) -> u64 {
    let mut decoder = nanomp3::Decoder::new();
    let mut pcm = [0.0f32; nanomp3::MAX_SAMPLES_PER_FRAME];
    let mut total_nanos: u128 = 0;
    let mut pos = 0;

    while pos < data.len() {
        let (consumed, info) = decoder.decode(&data[pos..], &mut pcm);
        if let Some(info) = info.filter(|i| i.sample_rate > 0) {
            // samples_produced counts samples per channel
            total_nanos +=
                info.samples_produced as u128 * 1_000_000_000 / u128::from(info.sample_rate);
        }
        if consumed == 0 {
            break;
        }
        pos += consumed;
    }

    (total_nanos / 1_000_000_000) as u64
}

#[cfg(test)]
mod tests {
    use super::*;

    // MPEG-1 Layer III, 32 kbps, 48 kHz, mono, no padding: 96-byte frames of
    // 1152 samples (24 ms).
    const HEADER_32K_48K: [u8; 4] = [0xFF, 0xFB, 0x14, 0xC0];

    fn frames(count: usize) -> Vec<u8> {
        let mut out = Vec::with_capacity(count * 96);
        for _ in 0..count {
            out.extend_from_slice(&HEADER_32K_48K);
            out.extend_from_slice(&[0u8; 92]);
        }
        out
    }

    #[test]
    fn format_duration_uses_minutes_then_hours() {
        assert_eq!(format_duration(0), "0:00");
        assert_eq!(format_duration(-5), "0:00");
        assert_eq!(format_duration(5), "0:05");
        assert_eq!(format_duration(180), "3:00");
        assert_eq!(format_duration(3599), "59:59");
        assert_eq!(format_duration(3600), "1:00:00");
        assert_eq!(format_duration(3725), "1:02:05");
    }

    #[test]
    fn strategy_table_falls_back_to_generic_lossy_rate() {
        assert_eq!(strategy_for(".mp3"), DurationStrategy::MpegFrames);
        assert_eq!(
            strategy_for(".flac"),
            DurationStrategy::Estimate {
                bytes_per_second: 125_000
            }
        );
        assert_eq!(
            strategy_for(".opus"),
            DurationStrategy::Estimate {
                bytes_per_second: DEFAULT_BYTES_PER_SECOND
            }
        );
    }

    #[test]
    fn estimate_divides_size_by_byte_rate() {
        assert_eq!(estimate_secs(0, 125_000), 0);
        assert_eq!(estimate_secs(1_250_000, 125_000), 10);
        assert_eq!(estimate_secs(31_999, 32_000), 0);
    }

    #[test]
    fn frame_walk_sums_complete_frames() {
        assert_eq!(mpeg_duration_secs(&frames(7500)), 180);
    }

    #[test]
    fn frame_walk_keeps_total_on_trailing_garbage() {
        let mut data = frames(2500);
        data.extend_from_slice(&HEADER_32K_48K);
        data.extend_from_slice(&[0xAB; 40]);
        assert_eq!(mpeg_duration_secs(&data), 60);
    }

    #[test]
    fn frame_walk_skips_leading_id3v2_tag() {
        let mut data = b"ID3\x04\x00\x00\x00\x00\x00\x14".to_vec();
        data.extend_from_slice(&[0u8; 20]);
        data.extend_from_slice(&frames(1250));
        assert_eq!(mpeg_duration_secs(&data), 30);
    }

    #[test]
    fn frame_walk_on_non_mpeg_data_is_zero() {
        assert_eq!(mpeg_duration_secs(b"definitely not an mp3 stream"), 0);
        assert_eq!(mpeg_duration_secs(&[]), 0);
    }

    #[test]
    fn unreadable_mp3_has_zero_duration() {
        let dir = tempfile::tempdir().unwrap();
        assert_eq!(duration_secs(&dir.path().join("gone.mp3"), ".mp3", 0), 0);
    }
}
