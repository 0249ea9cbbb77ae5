//! # Audio Capture Module
//!
//! Opens the default input device with CPAL and streams fixed-size frames of
//! mono samples to the host over a channel. The host drains the channel into
//! the exercise's sample ring once per tick.
//!
//! ## Stream setup
//! - Default input device
//! - 32-bit float, preferring mono; multi-channel input is averaged down
//! - Sample rate as close to the requested one as the device allows

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::SupportedStreamConfigRange;
use crossbeam_channel::Sender;
use anyhow::{Result, anyhow};

/// Sample rate requested from the device.
pub const PREFERRED_SAMPLE_RATE: u32 = 44100;

/// Starts audio capture from the default input device.
///
/// Frames of `frame_size` mono samples are sent on `sender`; frames are
/// dropped rather than blocking the audio callback when the channel is full.
///
/// # Returns
/// * `Ok((stream, sample_rate))` - Stream handle (keep it alive) and the actual sample rate
/// * `Err(e)` - No device, no usable f32 format, or the stream failed to start
pub fn start_audio_capture(sender: Sender<Vec<f32>>, frame_size: usize) -> Result<(cpal::Stream, u32)> {
    let host = cpal::default_host();
    let device = host.default_input_device()
        .ok_or_else(|| anyhow!("No input device available"))?;

    log::info!("Using audio input device: {}", device.name()?);

    let configs = device.supported_input_configs()?.collect::<Vec<_>>();
    let supported_config = find_supported_config(configs, PREFERRED_SAMPLE_RATE)
        .ok_or_else(|| anyhow!("No suitable f32 input format found"))?;

    let rate = PREFERRED_SAMPLE_RATE
        .clamp(supported_config.min_sample_rate().0, supported_config.max_sample_rate().0);
    let config = supported_config.with_sample_rate(cpal::SampleRate(rate));

    let sample_rate_val = config.sample_rate().0;
    let channels = config.channels().max(1) as usize;
    let config: cpal::StreamConfig = config.into();

    log::info!("Capturing {} channel(s) at {} Hz", channels, sample_rate_val);

    let err_fn = |err| log::error!("An error occurred on the audio stream: {}", err);

    // Accumulates mono samples from the callback until a frame is full.
    let mut audio_buffer = Vec::with_capacity(frame_size * 2);

    let stream = device.build_input_stream(
        &config,
        move |data: &[f32], _: &cpal::InputCallbackInfo| {
            audio_buffer.extend(downmix(data, channels));

            while audio_buffer.len() >= frame_size {
                let frame: Vec<f32> = audio_buffer.drain(..frame_size).collect();
                // Drop the frame if the host is behind.
                let _ = sender.try_send(frame);
            }
        },
        err_fn,
        None
    )?;

    stream.play()?;

    Ok((stream, sample_rate_val))
}

/// Averages interleaved channels into mono.
fn downmix(data: &[f32], channels: usize) -> impl Iterator<Item = f32> + '_ {
    data.chunks(channels)
        .map(move |frame| frame.iter().sum::<f32>() / frame.len() as f32)
}

/// Picks the f32 input config closest to `target_rate`, mono first.
fn find_supported_config(
    configs: Vec<SupportedStreamConfigRange>,
    target_rate: u32,
) -> Option<SupportedStreamConfigRange> {
    configs
        .into_iter()
        .filter(|c| c.sample_format() == cpal::SampleFormat::F32)
        .min_by_key(|c| {
            let rate_distance = if (c.min_sample_rate().0..=c.max_sample_rate().0).contains(&target_rate) {
                0
            } else {
                let min_diff = (c.min_sample_rate().0 as i64 - target_rate as i64).abs();
                let max_diff = (c.max_sample_rate().0 as i64 - target_rate as i64).abs();
                min_diff.min(max_diff)
            };
            (c.channels() != 1, rate_distance)
        })
}
