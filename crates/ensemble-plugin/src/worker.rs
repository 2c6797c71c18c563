//! Worker offload for plugins that need non-real-time work.
//!
//! Plugin (RT) → request ring → worker thread → response ring → plugin (RT).
//!
//! The real-time side never blocks: scheduling is a ring write, and the
//! worker is woken with a non-blocking signal once per `run`.

use crate::error::{PluginError, Result};
use crate::provider::WorkerInterface;
use crossbeam_channel::{Receiver, Sender};
use ensemble_core::{event_ring, EventReader, EventWriter};
use std::sync::Arc;
use std::thread;

const WORK_PROTOCOL: u32 = 0;

/// Handed to the plugin through host features.
pub struct WorkerSchedule {
    requests: EventWriter,
}

impl WorkerSchedule {
    /// Queue a job. Returns false when the request queue is full.
    pub fn schedule(&mut self, job: &[u8]) -> bool {
        self.requests.write(0, WORK_PROTOCOL, job)
    }
}

struct WorkerThread {
    requests: EventReader,
    responses: EventWriter,
    wake: Receiver<()>,
}

/// Owns the worker thread for one module instance. Drops gracefully.
pub struct WorkerBridge {
    responses: EventReader,
    interface: Option<Arc<dyn WorkerInterface>>,
    pending: Option<WorkerThread>,
    wake: Option<Sender<()>>,
    thread_handle: Option<thread::JoinHandle<()>>,
}

impl WorkerBridge {
    /// Create the request/response rings. The thread starts once the plugin
    /// hands over its worker interface.
    pub fn new(queue_size: usize) -> (Self, WorkerSchedule) {
        let (request_writer, request_reader) = event_ring(queue_size);
        let (response_writer, response_reader) = event_ring(queue_size);
        let (wake_tx, wake_rx) = crossbeam_channel::bounded(1);

        let bridge = Self {
            responses: response_reader,
            interface: None,
            pending: Some(WorkerThread {
                requests: request_reader,
                responses: response_writer,
                wake: wake_rx,
            }),
            wake: Some(wake_tx),
            thread_handle: None,
        };

        (
            bridge,
            WorkerSchedule {
                requests: request_writer,
            },
        )
    }

    pub fn set_interface(&mut self, interface: Arc<dyn WorkerInterface>) -> Result<()> {
        let Some(worker) = self.pending.take() else {
            return Err(PluginError::Worker("worker thread already running".into()));
        };

        let thread_interface = Arc::clone(&interface);
        let handle = thread::Builder::new()
            .name("plugin-worker".to_string())
            .spawn(move || Self::worker_main(worker, thread_interface))?;

        self.interface = Some(interface);
        self.thread_handle = Some(handle);
        tracing::debug!("worker thread started");
        Ok(())
    }

    pub fn is_running(&self) -> bool {
        self.thread_handle.is_some()
    }

    fn worker_main(mut worker: WorkerThread, interface: Arc<dyn WorkerInterface>) {
        let WorkerThread {
            requests,
            responses,
            wake,
        } = &mut worker;

        // Exits once the bridge drops its sender.
        while wake.recv().is_ok() {
            requests.drain(|_, job| {
                interface.work(job, &mut |response: &[u8]| {
                    responses.write(0, WORK_PROTOCOL, response)
                });
            });
        }
    }

    /// Deliver queued responses to the plugin. RT-safe.
    pub fn process_work_responses(&mut self) {
        let Some(interface) = self.interface.as_ref() else {
            return;
        };
        self.responses.drain(|_, response| interface.work_response(response));
    }

    /// Call the plugin's end-of-run hook and wake the worker. RT-safe.
    pub fn end_run(&mut self) {
        let Some(interface) = self.interface.as_ref() else {
            return;
        };
        interface.end_run();

        if let Some(wake) = self.wake.as_ref() {
            // Full means a wake-up is already pending.
            let _ = wake.try_send(());
        }
    }

    pub fn shutdown(&mut self) {
        self.wake = None;
        if let Some(handle) = self.thread_handle.take() {
            let _ = handle.join();
            tracing::debug!("worker thread stopped");
        }
    }
}

impl Drop for WorkerBridge {
    fn drop(&mut self) {
        self.shutdown();
    }
}
