//! Hardware output: one device, one realtime callback, N live graphs mixed.
//!
//! Device access goes through cpal and is compiled in with the `device`
//! feature. Without it the engine still manages format, transport and the
//! live list, and [`AudioOutputEngine::mixer`] can render offline.

use crate::callback::{InstanceList, LiveGraph, LiveInstances, Mixer};
use crate::config::EngineConfig;
use crate::transport::Transport;
use crate::Result;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

#[cfg(feature = "device")]
use crate::Error;
#[cfg(feature = "device")]
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};

/// Wrapper to hold `cpal::Stream` in a `Send` context.
///
/// # Safety
/// `cpal::Stream` is `!Send` due to platform internals. The engine is owned
/// by one control thread and only creates and drops the stream there.
#[cfg(feature = "device")]
struct StreamHandle(#[allow(dead_code)] cpal::Stream);

#[cfg(feature = "device")]
unsafe impl Send for StreamHandle {}

pub struct AudioOutputEngine {
    config: EngineConfig,
    transport: Arc<Transport>,
    instances: Arc<LiveInstances>,
    sample_rate: f64,
    block_size: usize,
    channels: usize,
    initialised: bool,
    stream_error: Arc<AtomicBool>,
    #[cfg(feature = "device")]
    stream: Option<StreamHandle>,
}

impl AudioOutputEngine {
    pub fn new(config: EngineConfig, transport: Arc<Transport>) -> Self {
        Self {
            sample_rate: config.sample_rate,
            block_size: config.block_size,
            channels: config.output_channels,
            config,
            transport,
            instances: Arc::new(LiveInstances::new()),
            initialised: false,
            stream_error: Arc::new(AtomicBool::new(false)),
            #[cfg(feature = "device")]
            stream: None,
        }
    }

    /// Open the configured device and start the realtime callback.
    ///
    /// On failure the error is logged, the engine stays uninitialised and the
    /// error is returned.
    pub fn initialise(&mut self) -> Result<()> {
        if self.initialised {
            return Ok(());
        }
        match self.open_device() {
            Ok(()) => {
                self.initialised = true;
                tracing::info!(
                    sample_rate = self.sample_rate,
                    block_size = self.block_size,
                    channels = self.channels,
                    "Audio output started"
                );
                Ok(())
            }
            Err(e) => {
                tracing::error!("Failed to initialise audio output: {e}");
                Err(e)
            }
        }
    }

    pub fn shutdown(&mut self) {
        #[cfg(feature = "device")]
        {
            self.stream = None;
        }
        if self.initialised {
            tracing::info!("Audio output stopped");
        }
        self.initialised = false;
    }

    pub fn is_initialised(&self) -> bool {
        self.initialised
    }

    /// Push a (new) audio format into the transport and every live graph.
    pub fn audio_device_about_to_start(&mut self, sample_rate: f64, block_size: usize) {
        self.sample_rate = sample_rate;
        self.block_size = block_size;

        if self.transport.prepare(sample_rate, block_size).is_err() {
            tracing::warn!("Audio format changed while playing; keeping playhead");
            self.transport.set_audio_format(sample_rate, block_size);
        }
        for instance in self.instances.snapshot().iter() {
            instance.prepare_to_play(sample_rate, block_size);
        }
    }

    /// Prepare `instances` for the current format and publish them as the live set.
    pub fn set_instances(&self, instances: InstanceList) {
        for instance in &instances {
            instance.prepare_to_play(self.sample_rate, self.block_size);
        }
        tracing::debug!("Publishing {} live graph(s)", instances.len());
        self.instances.publish(instances);
    }

    pub fn add_instance(&self, instance: Arc<dyn LiveGraph>) {
        let mut list: InstanceList = self.instances.snapshot().iter().cloned().collect();
        list.push(instance);
        self.set_instances(list);
    }

    /// A mixer bound to this engine's transport and live list.
    pub fn mixer(&self) -> Mixer {
        Mixer::new(
            self.transport.clone(),
            self.instances.clone(),
            self.channels,
            self.block_size,
        )
    }

    pub fn transport(&self) -> &Arc<Transport> {
        &self.transport
    }

    pub fn instances(&self) -> &Arc<LiveInstances> {
        &self.instances
    }

    pub fn sample_rate(&self) -> f64 {
        self.sample_rate
    }

    pub fn block_size(&self) -> usize {
        self.block_size
    }

    pub fn channels(&self) -> usize {
        self.channels
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Whether the device reported a stream error since the last call.
    pub fn take_stream_error(&self) -> bool {
        self.stream_error.swap(false, Ordering::AcqRel)
    }

    #[cfg(not(feature = "device"))]
    fn open_device(&mut self) -> Result<()> {
        Err(crate::Error::DeviceSupportDisabled)
    }

    #[cfg(feature = "device")]
    fn open_device(&mut self) -> Result<()> {
        let device = get_device(self.config.output_device_index)?;
        let supported = device.default_output_config()?;
        let sample_format = supported.sample_format();
        let stream_config: cpal::StreamConfig = supported.into();

        self.channels = stream_config.channels as usize;
        self.audio_device_about_to_start(
            stream_config.sample_rate.0 as f64,
            self.config.block_size,
        );
        tracing::debug!("Opening output device: {}", device.name()?);

        let mixer = self.mixer();
        let errors = self.stream_error.clone();
        let stream = match sample_format {
            cpal::SampleFormat::F32 => build_stream::<f32>(&device, &stream_config, mixer, errors)?,
            cpal::SampleFormat::I16 => build_stream::<i16>(&device, &stream_config, mixer, errors)?,
            cpal::SampleFormat::U16 => build_stream::<u16>(&device, &stream_config, mixer, errors)?,
            format => {
                return Err(Error::InvalidConfig(format!(
                    "Unsupported sample format: {format:?}"
                )));
            }
        };

        stream.play()?;
        self.stream = Some(StreamHandle(stream));
        Ok(())
    }

    #[cfg(feature = "device")]
    pub fn list_output_devices() -> Result<Vec<String>> {
        cpal::default_host()
            .output_devices()?
            .enumerate()
            .map(|(i, d)| Ok(format!("{i}: {}", d.name()?)))
            .collect()
    }
}

impl Drop for AudioOutputEngine {
    fn drop(&mut self) {
        self.shutdown();
    }
}

#[cfg(feature = "device")]
fn get_device(index: Option<usize>) -> Result<cpal::Device> {
    let host = cpal::default_host();

    match index {
        Some(i) => {
            let devices: Vec<_> = host.output_devices()?.collect();
            let count = devices.len();
            devices.into_iter().nth(i).ok_or_else(|| {
                Error::InvalidDevice(format!("Device index {i} out of range ({count} available)"))
            })
        }
        None => host
            .default_output_device()
            .ok_or_else(|| Error::InvalidDevice("No output device available".into())),
    }
}

#[cfg(feature = "device")]
fn build_stream<T>(
    device: &cpal::Device,
    config: &cpal::StreamConfig,
    mut mixer: Mixer,
    errors: Arc<AtomicBool>,
) -> Result<cpal::Stream>
where
    T: cpal::SizedSample + cpal::FromSample<f32>,
{
    let channels = config.channels as usize;

    let stream = device.build_output_stream(
        config,
        move |data: &mut [T], _: &cpal::OutputCallbackInfo| {
            let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
                render_device_block(&mut mixer, data, channels);
            }));

            if result.is_err() {
                output_silence(data);
            }
        },
        move |_err| errors.store(true, Ordering::Release),
        None,
    )?;

    Ok(stream)
}

/// Render the device buffer in block-sized chunks and convert to the device format.
#[cfg(feature = "device")]
#[inline]
fn render_device_block<T: cpal::SizedSample + cpal::FromSample<f32>>(
    mixer: &mut Mixer,
    data: &mut [T],
    channels: usize,
) {
    if channels == 0 {
        return;
    }
    let block = mixer.block_size().max(1);
    for chunk in data.chunks_mut(block * channels) {
        let frames = chunk.len() / channels;
        let mix = mixer.render_chunk(frames);
        for (frame, out) in chunk.chunks_exact_mut(channels).enumerate() {
            for (ch, sample) in out.iter_mut().enumerate() {
                let value = if ch < mix.channels() {
                    mix.channel(ch)[frame]
                } else {
                    0.0
                };
                *sample = T::from_sample(value);
            }
        }
    }
}

#[cfg(feature = "device")]
#[inline]
fn output_silence<T: cpal::SizedSample + cpal::FromSample<f32>>(data: &mut [T]) {
    for sample in data.iter_mut() {
        *sample = T::from_sample(0.0);
    }
}
