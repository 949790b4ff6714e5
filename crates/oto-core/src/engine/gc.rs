//! Deferred deallocation for data released by the render thread
//!
//! Decoded tracks and their titles are wrapped in `basedrop::Shared`. When a
//! deck swaps or unloads a track on the audio thread, dropping the last
//! `Shared` only pushes a pointer onto a lock-free queue; the memory itself is
//! freed by a background collector thread.
//!
//! ```ignore
//! use basedrop::Shared;
//! use oto_core::engine::gc_handle;
//!
//! let frames = Shared::new(&gc_handle(), vec![0.0f32; 44_100]);
//! drop(frames); // queued, freed on the "audio-gc" thread
//! ```

use std::sync::mpsc;
use std::sync::OnceLock;
use std::thread;
use std::time::Duration;

use basedrop::{Collector, Handle};

/// How often the collector drains the drop queue
const COLLECT_INTERVAL: Duration = Duration::from_millis(100);

static GC_HANDLE: OnceLock<Handle> = OnceLock::new();

fn spawn_collector() -> Handle {
    let (tx, rx) = mpsc::channel();

    thread::Builder::new()
        .name("audio-gc".to_string())
        .spawn(move || {
            // Collector is !Sync, so it is created on the thread that owns it
            let mut collector = Collector::new();
            tx.send(collector.handle()).expect("GC handle receiver dropped");
            log::info!("Audio GC thread started");

            loop {
                collector.collect();
                thread::sleep(COLLECT_INTERVAL);
            }
        })
        .expect("Failed to spawn audio GC thread");

    rx.recv().expect("Audio GC thread exited before sending its handle")
}

/// Handle for allocating `Shared<T>` values
///
/// The collector thread is started on first use and lives for the rest of
/// the process.
pub fn gc_handle() -> Handle {
    GC_HANDLE.get_or_init(spawn_collector).clone()
}
