//! Test helpers and fixtures for Ensemble integration tests
//!
//! A scripted stereo plugin stands in for a native plugin: two audio inputs,
//! two audio outputs and one gain control, with an optional worker that
//! records when each response is applied.

#![allow(dead_code)]

pub mod tolerances;

use ensemble::core::uri::WORKER_INTERFACE;
use ensemble::core::PortData;
use ensemble::plugin::{
    ExtensionData, HostFeatures, NativeInstance, PluginMetadata, PluginProvider, PortInfo,
    WorkerInterface, WorkerSchedule,
};
use ensemble::prelude::*;
use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

/// Default test sample rate (matches common hardware)
pub const TEST_SAMPLE_RATE: f64 = 48000.0;

/// Standard buffer size for deterministic testing
pub const TEST_BUFFER_SIZE: usize = 512;

/// Port layout of [`StereoGainProvider`].
pub const IN_L: u32 = 0;
pub const IN_R: u32 = 1;
pub const OUT_L: u32 = 2;
pub const OUT_R: u32 = 3;
pub const GAIN: u32 = 4;

/// Observations shared between the test and the plugin it loaded.
#[derive(Default)]
pub struct Probe {
    /// Completed `run` calls, across instances.
    pub runs: AtomicUsize,
    pub activations: AtomicUsize,
    pub instantiated_at: Mutex<Vec<f64>>,
    /// Jobs the worker thread has finished.
    pub worked: AtomicUsize,
    /// `(run that scheduled the job, run count when the response was applied)`.
    pub applied_at: Mutex<Vec<(usize, usize)>>,
    /// Jobs the plugin could not queue.
    pub rejected: AtomicUsize,
    /// While set, the worker thread sits on each job.
    pub stall: AtomicBool,
}

/// Background half of the stereo plugin.
pub struct StereoWorker {
    probe: Arc<Probe>,
}

impl WorkerInterface for StereoWorker {
    fn work(&self, request: &[u8], respond: &mut dyn FnMut(&[u8]) -> bool) {
        while self.probe.stall.load(Ordering::SeqCst) {
            thread::sleep(Duration::from_millis(1));
        }
        respond(request);
        self.probe.worked.fetch_add(1, Ordering::SeqCst);
    }

    fn work_response(&self, response: &[u8]) {
        let mut bytes = [0u8; 8];
        bytes.copy_from_slice(&response[..8]);
        let scheduled = u64::from_le_bytes(bytes) as usize;
        let now = self.probe.runs.load(Ordering::SeqCst);
        self.probe.applied_at.lock().push((scheduled, now));
    }
}

/// `out = in * gain` on both channels. With a worker, every run schedules
/// jobs carrying the index of the run that queued them.
pub struct StereoGainInstance {
    probe: Arc<Probe>,
    audio: [*mut f32; 4],
    gain: *mut f32,
    schedule: Option<WorkerSchedule>,
    worker: Option<Arc<StereoWorker>>,
    jobs_per_run: usize,
}

// SAFETY: pointers come from the owning module's buffers.
unsafe impl Send for StereoGainInstance {}

impl NativeInstance for StereoGainInstance {
    fn activate(&mut self) {
        self.probe.activations.fetch_add(1, Ordering::SeqCst);
    }

    fn connect_port(&mut self, port: u32, data: PortData) {
        match (port, data) {
            (IN_L..=OUT_R, PortData::Audio(ptr)) => self.audio[port as usize] = ptr,
            (IN_L..=OUT_R, _) => self.audio[port as usize] = std::ptr::null_mut(),
            (GAIN, PortData::Scalar(ptr)) => self.gain = ptr,
            _ => {}
        }
    }

    fn run(&mut self, frames: u32) {
        let run = self.probe.runs.load(Ordering::SeqCst);
        // SAFETY: every port is connected for this block; null audio is skipped.
        unsafe {
            let gain = *self.gain;
            for channel in 0..2 {
                let (input, output) = (self.audio[channel], self.audio[channel + 2]);
                if input.is_null() || output.is_null() {
                    continue;
                }
                for i in 0..frames as usize {
                    *output.add(i) = *input.add(i) * gain;
                }
            }
        }
        if let Some(schedule) = self.schedule.as_mut() {
            let job = (run as u64).to_le_bytes();
            for _ in 0..self.jobs_per_run {
                if !schedule.schedule(&job) {
                    self.probe.rejected.fetch_add(1, Ordering::SeqCst);
                }
            }
        }
        self.probe.runs.fetch_add(1, Ordering::SeqCst);
    }

    fn extension_data(&self, uri: &str) -> Option<ExtensionData> {
        if uri != WORKER_INTERFACE {
            return None;
        }
        let worker: Arc<dyn WorkerInterface> = self.worker.clone()?;
        Some(ExtensionData::Worker(worker))
    }
}

pub struct StereoGainProvider {
    metadata: PluginMetadata,
    ports: Vec<PortInfo>,
    pub probe: Arc<Probe>,
    with_worker: bool,
    jobs_per_run: usize,
}

impl StereoGainProvider {
    pub fn new() -> Self {
        Self {
            metadata: PluginMetadata::new("urn:ensemble:test:stereo-gain", "Stereo Gain")
                .author("Ensemble")
                .class_label("Utility"),
            ports: vec![
                PortInfo::audio("in_l", "In L", true),
                PortInfo::audio("in_r", "In R", true),
                PortInfo::audio("out_l", "Out L", false),
                PortInfo::audio("out_r", "Out R", false),
                PortInfo::control("gain", "Gain", true, 0.0, 1.0, 1.0),
            ],
            probe: Arc::new(Probe::default()),
            with_worker: false,
            jobs_per_run: 0,
        }
    }

    /// Declare the worker extension and queue `jobs_per_run` jobs each run.
    pub fn with_worker(mut self, jobs_per_run: usize) -> Self {
        self.with_worker = true;
        self.jobs_per_run = jobs_per_run;
        self
    }
}

impl PluginProvider for StereoGainProvider {
    fn metadata(&self) -> &PluginMetadata {
        &self.metadata
    }

    fn ports(&self) -> &[PortInfo] {
        &self.ports
    }

    fn has_extension(&self, uri: &str) -> bool {
        self.with_worker && uri == WORKER_INTERFACE
    }

    fn instantiate(
        &self,
        sample_rate: f64,
        mut features: HostFeatures,
    ) -> Option<Box<dyn NativeInstance>> {
        self.probe.instantiated_at.lock().push(sample_rate);
        let schedule = features.take_worker();
        let worker = self.with_worker.then(|| {
            Arc::new(StereoWorker {
                probe: self.probe.clone(),
            })
        });
        Some(Box::new(StereoGainInstance {
            probe: self.probe.clone(),
            audio: [std::ptr::null_mut(); 4],
            gain: std::ptr::null_mut(),
            schedule,
            worker,
            jobs_per_run: self.jobs_per_run,
        }))
    }
}

/// Load `provider` into a module instantiated at [`TEST_SAMPLE_RATE`].
pub fn instantiated_module(provider: StereoGainProvider) -> (Module, Arc<Probe>) {
    instantiated_module_with(provider, ModuleConfig::default())
}

pub fn instantiated_module_with(
    provider: StereoGainProvider,
    config: ModuleConfig,
) -> (Module, Arc<Probe>) {
    let probe = provider.probe.clone();
    let mut module = Module::new(Arc::new(provider), config).expect("valid module config");
    module
        .instantiate(TEST_SAMPLE_RATE)
        .expect("stereo gain instantiates");
    (module, probe)
}

/// Host-side audio for the module's four audio ports.
pub struct StereoIo {
    pub channels: [Vec<f32>; 4],
}

impl StereoIo {
    pub fn new(num_samples: usize, input: f32) -> Self {
        Self {
            channels: [
                vec![input; num_samples],
                vec![input; num_samples],
                vec![0.0; num_samples],
                vec![0.0; num_samples],
            ],
        }
    }

    /// Point every audio port at this storage for the next `run`.
    pub fn bind(&mut self, module: &mut Module) {
        for (index, channel) in self.channels.iter_mut().enumerate() {
            let is_input = index < 2;
            let assigned =
                module.connect_channel(PortType::Audio, index as u32 % 2, is_input, channel.as_mut_ptr());
            assert!(assigned, "audio channel {} missing", index);
        }
    }
}

/// Spin until `condition` holds or five seconds pass.
pub fn wait_for(mut condition: impl FnMut() -> bool) -> bool {
    let deadline = Instant::now() + Duration::from_secs(5);
    while Instant::now() < deadline {
        if condition() {
            return true;
        }
        thread::sleep(Duration::from_millis(1));
    }
    false
}

/// Audio buffer of `num_channels` channels holding a constant value.
pub fn dc_buffer(num_channels: usize, num_samples: usize, value: f32) -> AudioBuffer {
    AudioBuffer::from_channels(vec![vec![value; num_samples]; num_channels])
}
