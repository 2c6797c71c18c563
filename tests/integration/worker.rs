//! Worker offload through a running module

use crate::helpers::*;
use ensemble::prelude::*;
use std::sync::atomic::Ordering;
use std::time::{Duration, Instant};

#[test]
fn test_worker_attached_when_declared() {
    let (module, _probe) = instantiated_module(StereoGainProvider::new().with_worker(1));
    assert!(module.has_worker());

    let (module, _probe) = instantiated_module(StereoGainProvider::new());
    assert!(!module.has_worker());
}

#[test]
fn test_response_applied_on_next_run() {
    let (mut module, probe) = instantiated_module(StereoGainProvider::new().with_worker(1));
    module.activate();
    let mut io = StereoIo::new(64, 0.0);
    io.bind(&mut module);

    module.run(64);
    assert!(wait_for(|| probe.worked.load(Ordering::SeqCst) >= 1));
    // Finished on the worker, but not delivered until the next block
    assert!(probe.applied_at.lock().is_empty());

    module.run(64);
    assert_eq!(*probe.applied_at.lock(), vec![(0, 1)]);

    assert!(wait_for(|| probe.worked.load(Ordering::SeqCst) >= 2));
    module.run(64);
    let applied = probe.applied_at.lock().clone();
    assert_eq!(applied, vec![(0, 1), (1, 2)]);
    assert!(applied.iter().all(|(scheduled, at)| at > scheduled));
}

#[test]
fn test_run_bounded_with_full_queue() {
    let config = ModuleConfig {
        worker_queue_size: 64,
        ..Default::default()
    };
    let (mut module, probe) =
        instantiated_module_with(StereoGainProvider::new().with_worker(8), config);
    module.activate();
    probe.stall.store(true, Ordering::SeqCst);

    let mut io = StereoIo::new(TEST_BUFFER_SIZE, 1.0);
    io.bind(&mut module);

    for _ in 0..20 {
        let started = Instant::now();
        module.run(TEST_BUFFER_SIZE as u32);
        assert!(started.elapsed() < Duration::from_millis(100));
    }
    assert!(probe.rejected.load(Ordering::SeqCst) > 0);
    assert_eq!(probe.runs.load(Ordering::SeqCst), 20);

    probe.stall.store(false, Ordering::SeqCst);
    drop(module);
}
