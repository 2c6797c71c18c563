//! Locked, non-real-time side of the router.
//!
//! Every edit made through a [`RouterHandle`] lands in the pending
//! [`RouterControl`] under a mutex. The render path only ever `try_lock`s
//! that mutex to copy pending changes into the applied grid, so a busy UI
//! delays a patch change by a block instead of blocking audio.

use super::config::validate_size;
use super::matrix::MatrixState;
use ensemble_core::{Result, MAX_FADE_SECS, MIN_FADE_SECS};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// A named, recallable patch matrix.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Program {
    pub name: String,
    /// MIDI program number that recalls this program.
    pub midi_program: Option<u8>,
    pub matrix: MatrixState,
}

pub(crate) struct RouterControl {
    /// Desired patch state. Not read by render directly.
    pub matrix: MatrixState,
    pub matrix_changed: bool,
    /// Size of the current port topology.
    pub sources: usize,
    pub destinations: usize,
    pub next_size: Option<(usize, usize)>,
    pub fade_length_secs: f64,
    pub fade_changed: bool,
    pub programs: Vec<Program>,
    pub current_program: Option<usize>,
}

impl RouterControl {
    pub fn new(sources: usize, destinations: usize, fade_length_secs: f64) -> Self {
        Self {
            matrix: MatrixState::new(sources, destinations),
            matrix_changed: false,
            sources,
            destinations,
            next_size: None,
            fade_length_secs,
            fade_changed: false,
            programs: Vec::new(),
            current_program: None,
        }
    }

    /// Recall a program into the pending matrix. Does not allocate.
    pub fn select_program(&mut self, index: usize) -> bool {
        let Self {
            matrix,
            programs,
            current_program,
            matrix_changed,
            ..
        } = self;
        let Some(program) = programs.get(index) else {
            return false;
        };
        matrix.copy_overlapping(&program.matrix);
        *current_program = Some(index);
        *matrix_changed = true;
        true
    }

    /// Program recalled by a MIDI program change: an explicit mapping wins,
    /// otherwise the program number is the index.
    pub fn program_for_midi(&self, midi_program: u8) -> Option<usize> {
        self.programs
            .iter()
            .position(|program| program.midi_program == Some(midi_program))
            .or_else(|| {
                let index = midi_program as usize;
                (index < self.programs.len()).then_some(index)
            })
    }
}

pub(crate) struct RouterShared {
    pub control: Mutex<RouterControl>,
    pub rebuild_ports: AtomicBool,
}

impl RouterShared {
    pub fn new(control: RouterControl) -> Self {
        Self {
            control: Mutex::new(control),
            rebuild_ports: AtomicBool::new(true),
        }
    }
}

/// Cloneable handle for editing a router from non-real-time threads.
#[derive(Clone)]
pub struct RouterHandle {
    shared: Arc<RouterShared>,
}

impl RouterHandle {
    pub(crate) fn new(shared: Arc<RouterShared>) -> Self {
        Self { shared }
    }

    /// Patch or unpatch `src` → `dst`. Applied with a crossfade on the next block.
    pub fn set(&self, src: usize, dst: usize, patched: bool) -> bool {
        let mut control = self.shared.control.lock();
        if !control.matrix.set(src, dst, patched) {
            return false;
        }
        control.matrix_changed = true;
        true
    }

    pub fn toggle(&self, src: usize, dst: usize) -> bool {
        let mut control = self.shared.control.lock();
        if !control.matrix.toggle(src, dst) {
            return false;
        }
        control.matrix_changed = true;
        true
    }

    pub fn is_connected(&self, src: usize, dst: usize) -> bool {
        self.shared.control.lock().matrix.is_connected(src, dst)
    }

    pub fn matrix_state(&self) -> MatrixState {
        self.shared.control.lock().matrix.clone()
    }

    /// Replace the patch state. Cells outside the current size are ignored.
    pub fn set_matrix_state(&self, state: &MatrixState) {
        let mut control = self.shared.control.lock();
        control.matrix.copy_overlapping(state);
        control.matrix_changed = true;
    }

    pub fn clear_patches(&self) {
        let mut control = self.shared.control.lock();
        control.matrix.clear();
        control.matrix_changed = true;
    }

    /// Request a new size. Ports change the next time the node refreshes
    /// its ports, never during a block.
    pub fn set_size(&self, sources: usize, destinations: usize) -> Result<()> {
        validate_size(sources, destinations)?;
        let mut control = self.shared.control.lock();
        if control.next_size.is_none()
            && control.sources == sources
            && control.destinations == destinations
        {
            return Ok(());
        }
        control.next_size = Some((sources, destinations));
        control.matrix.resize(sources, destinations);
        control.matrix_changed = true;
        self.shared.rebuild_ports.store(true, Ordering::Release);
        Ok(())
    }

    /// `(sources, destinations)` of the current port topology.
    pub fn size(&self) -> (usize, usize) {
        let control = self.shared.control.lock();
        (control.sources, control.destinations)
    }

    pub fn pending_size(&self) -> Option<(usize, usize)> {
        self.shared.control.lock().next_size
    }

    pub fn size_string(&self) -> String {
        let (sources, destinations) = self.size();
        format!("{}x{}", sources, destinations)
    }

    /// Clamped to 1 ms .. 5 s.
    pub fn set_fade_length(&self, seconds: f64) {
        let seconds = seconds.clamp(MIN_FADE_SECS, MAX_FADE_SECS);
        let mut control = self.shared.control.lock();
        control.fade_length_secs = seconds;
        control.fade_changed = true;
    }

    pub fn fade_length(&self) -> f64 {
        self.shared.control.lock().fade_length_secs
    }

    // ========================================================================
    // Programs
    // ========================================================================

    /// Store the current matrix as a new program. Returns its index.
    pub fn add_program(&self, name: impl Into<String>, midi_program: Option<u8>) -> usize {
        let mut control = self.shared.control.lock();
        let program = Program {
            name: name.into(),
            midi_program,
            matrix: control.matrix.clone(),
        };
        control.programs.push(program);
        control.programs.len() - 1
    }

    pub fn set_current_program(&self, index: usize) -> bool {
        self.shared.control.lock().select_program(index)
    }

    pub fn current_program(&self) -> Option<usize> {
        self.shared.control.lock().current_program
    }

    pub fn num_programs(&self) -> usize {
        self.shared.control.lock().programs.len().max(1)
    }

    pub fn program_name(&self, index: usize) -> String {
        match self.shared.control.lock().programs.get(index) {
            Some(program) => program.name.clone(),
            None => format!("Audio Router {}", index + 1),
        }
    }

    pub fn programs(&self) -> Vec<Program> {
        self.shared.control.lock().programs.clone()
    }
}
