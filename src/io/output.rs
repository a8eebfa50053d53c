//! Live output through cpal.
//!
//! The engine moves into the device callback; the caller keeps the
//! `VoiceController` and a telemetry consumer. The stream stops when the
//! `AudioOutput` is dropped.

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use rtrb::Consumer;

use crate::{
    config::EngineConfig, engine::SynthEngine, synth::message::VoiceSnapshot, Error, Result,
    VoiceController,
};

const TELEMETRY_CAPACITY: usize = 32;

pub struct AudioOutput {
    _stream: cpal::Stream,
    device_name: String,
    sample_rate: f32,
    channels: usize,
}

impl AudioOutput {
    /// Open the configured (or default) output device and start playing.
    ///
    /// The engine runs at the device's sample rate; `config.sample_rate` is
    /// only used for offline rendering.
    pub fn open(
        config: &EngineConfig,
    ) -> Result<(AudioOutput, VoiceController, Consumer<VoiceSnapshot>)> {
        let host = cpal::default_host();
        let device = find_output_device(&host, config.device.as_deref())?;
        let device_name = device.name().unwrap_or_else(|_| String::from("<unnamed>"));

        let supported = device
            .default_output_config()
            .map_err(|e| Error::Stream(e.to_string()))?;
        if supported.sample_format() != cpal::SampleFormat::F32 {
            return Err(Error::UnsupportedFormat(format!(
                "{device_name} wants {:?}, need f32",
                supported.sample_format()
            )));
        }

        let sample_rate = supported.sample_rate().0 as f32;
        let channels = supported.channels() as usize;
        let stream_config: cpal::StreamConfig = supported.into();

        let engine_config = config.clone().with_sample_rate(sample_rate);
        engine_config.validate()?;
        let (engine, controller) = SynthEngine::new(&engine_config);
        let (mut engine, telemetry) = engine.with_telemetry(TELEMETRY_CAPACITY);

        let stream = device
            .build_output_stream(
                &stream_config,
                move |data: &mut [f32], _: &cpal::OutputCallbackInfo| {
                    engine.render_interleaved(data, channels);
                },
                |err| tracing::error!(%err, "output stream error"),
                None,
            )
            .map_err(|e| Error::Stream(e.to_string()))?;
        stream.play().map_err(|e| Error::Stream(e.to_string()))?;

        tracing::info!(
            device = %device_name,
            sample_rate,
            channels,
            "output stream started"
        );

        let output = AudioOutput {
            _stream: stream,
            device_name,
            sample_rate,
            channels,
        };
        Ok((output, controller, telemetry))
    }

    pub fn device_name(&self) -> &str {
        &self.device_name
    }

    pub fn sample_rate(&self) -> f32 {
        self.sample_rate
    }

    pub fn channels(&self) -> usize {
        self.channels
    }
}

/// Case-insensitive substring match on device names, or the host default.
fn find_output_device(host: &cpal::Host, name: Option<&str>) -> Result<cpal::Device> {
    let Some(search) = name else {
        return host.default_output_device().ok_or(Error::NoDevice);
    };

    let search_lower = search.to_lowercase();
    let devices = host
        .output_devices()
        .map_err(|e| Error::Stream(e.to_string()))?;
    for device in devices {
        let matches = device
            .name()
            .map(|n| n.to_lowercase().contains(&search_lower))
            .unwrap_or(false);
        if matches {
            return Ok(device);
        }
    }
    Err(Error::DeviceNotFound(format!(
        "no output device matching '{search}'"
    )))
}

/// Names of the host's output devices, for `--list-devices`.
pub fn output_device_names() -> Result<Vec<String>> {
    let host = cpal::default_host();
    let devices = host
        .output_devices()
        .map_err(|e| Error::Stream(e.to_string()))?;
    Ok(devices.filter_map(|d| d.name().ok()).collect())
}
