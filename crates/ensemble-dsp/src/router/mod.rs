//! Patch-matrix audio router.
//!
//! # Architecture
//!
//! ```text
//! UI Thread                               Audio Thread
//!     │                                        │
//!     ▼                                        ▼
//! ┌───────────────────┐   try_lock + copy  ┌──────────────────┐
//! │ RouterHandle      │───────────────────▶│ RouterNode       │
//! │  (Mutex)          │                    │  ToggleGrid      │
//! │ - pending matrix  │                    │  (one fade/cell) │
//! │ - size, programs  │                    └──────────────────┘
//! └───────────────────┘
//! ```
//!
//! Every source/destination pair has its own [`LinearFade`], so toggling a
//! patch point ramps the gain instead of switching it.
//!
//! Resizing changes the port topology and is deferred until the next
//! [`refresh_ports`](Node::refresh_ports); an in-flight block keeps using the
//! old channel map.
//!
//! [`LinearFade`]: ensemble_core::LinearFade

mod config;
mod grid;
mod handle;
mod matrix;

pub use config::{RouterConfig, MAX_ROUTER_CHANNELS};
pub use handle::{Program, RouterHandle};
pub use matrix::MatrixState;

use config::validate_size;
use ensemble_core::{
    AudioBuffer, ChannelConfig, Error, MidiMessage, MidiPipe, Node, NodePorts, PortList,
    PortType, Result,
};
use grid::ToggleGrid;
use handle::{RouterControl, RouterShared};
use serde::{Deserialize, Serialize};
use std::sync::atomic::Ordering;
use std::sync::Arc;

const DEFAULT_SAMPLE_RATE: f64 = 44100.0;

#[derive(Debug, Serialize, Deserialize)]
struct RouterState {
    sources: u32,
    destinations: u32,
    fade_length_secs: f64,
    matrix: MatrixState,
    programs: Vec<Program>,
    current_program: Option<u32>,
}

pub struct RouterNode {
    shared: Arc<RouterShared>,
    ports: NodePorts,
    /// Applied patch state with its ramps. Render-thread only.
    grid: ToggleGrid,
    /// Pending matrix as of the last successful sync.
    synced: MatrixState,
    /// `set_without_locking` edits not yet folded into the pending matrix.
    render_edits: bool,
    /// Last MIDI program change not yet applied under the lock.
    pending_program: Option<u8>,
    /// Copy of the inputs so outputs can be written in place.
    inputs: AudioBuffer,
    sample_rate: f64,
    max_block_size: usize,
}

impl RouterNode {
    pub fn new(config: RouterConfig) -> Result<Self> {
        config.validate()?;

        let control = RouterControl::new(config.sources, config.destinations, config.fade_length_secs);
        let mut node = Self {
            shared: Arc::new(RouterShared::new(control)),
            ports: NodePorts::default(),
            grid: ToggleGrid::new(
                config.sources,
                config.destinations,
                config.fade_length_secs,
                DEFAULT_SAMPLE_RATE,
            ),
            synced: MatrixState::new(config.sources, config.destinations),
            render_edits: false,
            pending_program: None,
            inputs: AudioBuffer::new(config.sources, 0),
            sample_rate: DEFAULT_SAMPLE_RATE,
            max_block_size: 0,
        };
        node.refresh_ports();
        Ok(node)
    }

    pub fn handle(&self) -> RouterHandle {
        RouterHandle::new(Arc::clone(&self.shared))
    }

    pub fn sample_rate(&self) -> f64 {
        self.sample_rate
    }

    pub fn num_sources(&self) -> usize {
        self.grid.sources()
    }

    pub fn num_destinations(&self) -> usize {
        self.grid.destinations()
    }

    /// Whether `(src, dst)` is patched in the applied grid.
    pub fn is_patched(&self, src: usize, dst: usize) -> bool {
        self.grid.is_patched(src, dst)
    }

    /// Patch directly into the applied grid. Only for code already running
    /// on the render thread; everything else goes through [`RouterHandle`].
    ///
    /// The edit reaches the pending matrix, and so the handle and saved
    /// state, on the next block that gets the lock.
    pub fn set_without_locking(&mut self, src: usize, dst: usize, patched: bool) -> bool {
        let applied = self.grid.set(src, dst, patched);
        self.render_edits |= applied;
        applied
    }

    /// Whether a resize is waiting for the next port refresh.
    pub fn needs_port_rebuild(&self) -> bool {
        self.shared.rebuild_ports.load(Ordering::Acquire)
    }

    /// Exchange edits with the pending side, if the lock is free.
    ///
    /// A program change seen while the lock is held is kept until a later
    /// block gets it.
    fn sync_pending(&mut self, midi: &MidiPipe) {
        if let Some(program) = midi.iter().filter_map(MidiMessage::program).last() {
            self.pending_program = Some(program);
        }

        let Some(mut control) = self.shared.control.try_lock() else {
            return;
        };

        if let Some(program) = self.pending_program.take() {
            if let Some(index) = control.program_for_midi(program) {
                control.select_program(index);
            }
        }

        if control.fade_changed {
            self.grid.set_fade_length(control.fade_length_secs);
            control.fade_changed = false;
        }
        if self.render_edits {
            fold_render_edits(&self.grid, &self.synced, &mut control.matrix);
            self.render_edits = false;
            control.matrix_changed = true;
        }
        if control.matrix_changed {
            self.grid.apply(&control.matrix);
            self.synced.copy_overlapping(&control.matrix);
            control.matrix_changed = false;
        }
    }

    fn mix(&mut self, audio: &mut AudioBuffer, frames: usize) {
        let sources = self.grid.sources();
        let destinations = self.grid.destinations();

        for src in 0..sources {
            if src < audio.num_channels() {
                self.inputs.channel_mut(src)[..frames].copy_from_slice(&audio.channel(src)[..frames]);
            } else {
                self.inputs.clear_channel(src);
            }
        }
        // Only routed signal reaches the output, including past `frames`.
        for channel in 0..audio.num_channels() {
            audio.clear_channel(channel);
        }

        for dst in 0..destinations {
            let has_output = dst < audio.num_channels();
            for src in 0..sources {
                let Some(cell) = self.grid.cell_mut(src, dst) else {
                    continue;
                };
                if !cell.is_active() && cell.gain() == 0.0 {
                    continue;
                }
                let input = &self.inputs.channel(src)[..frames];
                if has_output {
                    let output = &mut audio.channel_mut(dst)[..frames];
                    for (out, sample) in output.iter_mut().zip(input) {
                        *out += *sample * cell.next_sample();
                    }
                } else {
                    for _ in 0..frames {
                        cell.next_sample();
                    }
                }
            }
        }
    }
}

/// Copy render-side patches into `pending`, skipping cells the pending side
/// changed since `synced`. Does not allocate.
fn fold_render_edits(grid: &ToggleGrid, synced: &MatrixState, pending: &mut MatrixState) {
    for src in 0..grid.sources() {
        for dst in 0..grid.destinations() {
            let was = synced.is_connected(src, dst);
            let applied = grid.is_patched(src, dst);
            if applied != was && pending.is_connected(src, dst) == was {
                pending.set(src, dst, applied);
            }
        }
    }
}

impl Node for RouterNode {
    fn name(&self) -> &str {
        "Audio Router"
    }

    fn refresh_ports(&mut self) {
        if !self.ports.ports().is_empty() && !self.needs_port_rebuild() {
            return;
        }

        let (sources, destinations) = {
            let mut control = self.shared.control.lock();
            if let Some((sources, destinations)) = control.next_size.take() {
                control.sources = sources;
                control.destinations = destinations;
                control.matrix.resize(sources, destinations);
                control.matrix_changed = true;
            }
            (control.sources, control.destinations)
        };

        if sources != self.grid.sources() || destinations != self.grid.destinations() {
            self.grid.resize(sources, destinations);
            self.synced.resize(sources, destinations);
            self.inputs.set_size(sources, self.max_block_size);
            tracing::info!(sources, destinations, "audio router resized");
        }

        let mut ports = PortList::with_capacity(sources + destinations + 1);
        let mut index = 0u32;
        for channel in 0..sources {
            ports.add(
                PortType::Audio,
                index,
                channel as u32,
                format!("audio_in_{}", channel),
                format!("Input {}", channel + 1),
                true,
            );
            index += 1;
        }
        for channel in 0..destinations {
            ports.add(
                PortType::Audio,
                index,
                channel as u32,
                format!("audio_out_{}", channel),
                format!("Output {}", channel + 1),
                false,
            );
            index += 1;
        }
        ports.add(PortType::Midi, index, 0, "midi_in", "MIDI In", true);

        self.shared.rebuild_ports.store(false, Ordering::Release);
        self.ports.set(ports);
    }

    fn ports(&self) -> &PortList {
        self.ports.ports()
    }

    fn channels(&self) -> &Arc<ChannelConfig> {
        self.ports.channels()
    }

    fn prepare_to_render(&mut self, sample_rate: f64, max_block_size: usize) {
        self.refresh_ports();
        self.sample_rate = sample_rate;
        self.max_block_size = max_block_size;
        self.grid.set_sample_rate(sample_rate);
        self.inputs.set_size(self.grid.sources(), max_block_size);
    }

    fn render(&mut self, audio: &mut AudioBuffer, midi: &mut MidiPipe) {
        self.sync_pending(midi);
        let frames = audio.num_samples().min(self.inputs.num_samples());
        self.mix(audio, frames);
    }

    fn get_state(&self) -> Result<Vec<u8>> {
        let control = self.shared.control.lock();
        let (sources, destinations) = control.next_size.unwrap_or((control.sources, control.destinations));
        let state = RouterState {
            sources: sources as u32,
            destinations: destinations as u32,
            fade_length_secs: control.fade_length_secs,
            matrix: control.matrix.clone(),
            programs: control.programs.clone(),
            current_program: control.current_program.map(|index| index as u32),
        };
        Ok(bincode::serialize(&state)?)
    }

    fn set_state(&mut self, data: &[u8]) -> Result<()> {
        let state: RouterState = bincode::deserialize(data)?;
        let (sources, destinations) = (state.sources as usize, state.destinations as usize);
        validate_size(sources, destinations)?;
        if state.matrix.num_rows() != sources || state.matrix.num_columns() != destinations {
            return Err(Error::State(format!(
                "matrix is {}x{} but router is {}x{}",
                state.matrix.num_rows(),
                state.matrix.num_columns(),
                sources,
                destinations
            )));
        }

        {
            let mut control = self.shared.control.lock();
            if sources != control.sources || destinations != control.destinations {
                control.next_size = Some((sources, destinations));
                self.shared.rebuild_ports.store(true, Ordering::Release);
            } else {
                control.next_size = None;
            }
            control.matrix = state.matrix;
            control.matrix_changed = true;
            self.render_edits = false;
            control.fade_length_secs = state.fade_length_secs.clamp(
                ensemble_core::MIN_FADE_SECS,
                ensemble_core::MAX_FADE_SECS,
            );
            control.fade_changed = true;
            control.programs = state.programs;
            control.current_program = state
                .current_program
                .map(|index| index as usize)
                .filter(|index| *index < control.programs.len());
        }

        self.refresh_ports();
        Ok(())
    }
}
