use anyhow::{Context, Result};
use std::path::Path;
use symphonia::core::audio::{AudioBufferRef, Signal};
use symphonia::core::codecs::{DecoderOptions, CODEC_TYPE_NULL};
use symphonia::core::formats::FormatOptions;
use symphonia::core::io::MediaSourceStream;
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;

/// Decode an audio file to mono f32 samples
///
/// Returns `(samples, sample_rate)`; multi-channel audio is mixed down
/// by averaging.
pub fn read_audio_mono(path: &Path) -> Result<(Vec<f32>, u32)> {
    let file = std::fs::File::open(path).context("Failed to open audio file")?;
    let mss = MediaSourceStream::new(Box::new(file), Default::default());

    let mut hint = Hint::new();
    if let Some(ext) = path.extension().and_then(|e| e.to_str()) {
        hint.with_extension(ext);
    }

    let probed = symphonia::default::get_probe()
        .format(
            &hint,
            mss,
            &FormatOptions::default(),
            &MetadataOptions::default(),
        )
        .context("Unsupported audio format")?;
    let mut format = probed.format;

    let track = format
        .tracks()
        .iter()
        .find(|t| t.codec_params.codec != CODEC_TYPE_NULL)
        .context("No audio track found")?;

    let track_id = track.id;
    let sample_rate = track
        .codec_params
        .sample_rate
        .context("Unknown sample rate")?;
    let channels = track
        .codec_params
        .channels
        .context("Unknown channel count")?
        .count();

    let mut decoder = symphonia::default::get_codecs()
        .make(&track.codec_params, &DecoderOptions::default())
        .context("Failed to create decoder")?;

    let mut samples = Vec::new();

    loop {
        let packet = match format.next_packet() {
            Ok(packet) => packet,
            Err(symphonia::core::errors::Error::IoError(e))
                if e.kind() == std::io::ErrorKind::UnexpectedEof =>
            {
                break
            }
            Err(e) => return Err(e).context("Error reading packet"),
        };

        if packet.track_id() != track_id {
            continue;
        }

        let decoded = match decoder.decode(&packet) {
            Ok(decoded) => decoded,
            Err(symphonia::core::errors::Error::DecodeError(_)) => continue,
            Err(e) => return Err(e).context("Error decoding packet"),
        };

        append_mono(&decoded, &mut samples, channels);
    }

    Ok((samples, sample_rate))
}

fn append_mono(buffer: &AudioBufferRef, samples: &mut Vec<f32>, channels: usize) {
    let scale_inv = 1.0 / channels as f32;
    match buffer {
        AudioBufferRef::F32(buf) => {
            for frame in 0..buf.frames() {
                let mut acc = 0.0;
                for ch in 0..channels {
                    acc += buf.chan(ch)[frame];
                }
                samples.push(acc * scale_inv);
            }
        }
        AudioBufferRef::S16(buf) => {
            let scale = 1.0 / 32768.0;
            for frame in 0..buf.frames() {
                let mut acc = 0.0;
                for ch in 0..channels {
                    acc += buf.chan(ch)[frame] as f32 * scale;
                }
                samples.push(acc * scale_inv);
            }
        }
        AudioBufferRef::S32(buf) => {
            let scale = 1.0 / 2147483648.0;
            for frame in 0..buf.frames() {
                let mut acc = 0.0;
                for ch in 0..channels {
                    acc += buf.chan(ch)[frame] as f32 * scale;
                }
                samples.push(acc * scale_inv);
            }
        }
        AudioBufferRef::U8(buf) => {
            for frame in 0..buf.frames() {
                let mut acc = 0.0;
                for ch in 0..channels {
                    acc += (buf.chan(ch)[frame] as f32 - 128.0) / 128.0;
                }
                samples.push(acc * scale_inv);
            }
        }
        _ => {
            log::warn!("unsupported sample format, skipping packet");
        }
    }
}
