use std::sync::Arc;

use log::debug;
use parking_lot::Mutex;

use crate::models::error::RecorderError;
use crate::traits::capture_source::{CaptureSource, ChunkCallback};

/// Capture source driven by hand.
///
/// Bridges any audio backend whose callback you own: hand one clone to the
/// recorder and call [`deliver`](Self::deliver) from the audio callback.
/// Also the test double for recorder tests.
#[derive(Clone)]
pub struct ManualSource {
    sample_rate: u32,
    callback: Arc<Mutex<Option<ChunkCallback>>>,
}

impl ManualSource {
    pub fn new(sample_rate: u32) -> Self {
        Self {
            sample_rate,
            callback: Arc::new(Mutex::new(None)),
        }
    }

    /// Push one capture period. Returns `false` if the source is not started.
    pub fn deliver(&self, chunks: Vec<Vec<f32>>) -> bool {
        let callback = self.callback.lock().clone();
        match callback {
            Some(callback) => {
                callback(chunks);
                true
            }
            None => false,
        }
    }

    pub fn is_started(&self) -> bool {
        self.callback.lock().is_some()
    }
}

impl CaptureSource for ManualSource {
    fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    fn start(&mut self, callback: ChunkCallback) -> Result<(), RecorderError> {
        let mut slot = self.callback.lock();
        if slot.is_some() {
            return Err(RecorderError::ConfigurationFailed("manual source already started".into()));
        }
        debug!("Manual source started at {} Hz", self.sample_rate);
        *slot = Some(callback);
        Ok(())
    }

    fn stop(&mut self) -> Result<(), RecorderError> {
        self.callback.lock().take();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn delivers_only_while_started() {
        let mut source = ManualSource::new(8000);
        assert!(!source.deliver(vec![vec![0.0]]));

        let seen = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&seen);
        source
            .start(Arc::new(move |chunks: Vec<Vec<f32>>| {
                counter.fetch_add(chunks.len(), Ordering::SeqCst);
            }))
            .unwrap();

        let handle = source.clone();
        assert!(handle.is_started());
        assert!(handle.deliver(vec![vec![0.0], vec![0.0]]));
        assert_eq!(seen.load(Ordering::SeqCst), 2);

        source.stop().unwrap();
        assert!(!handle.deliver(vec![vec![0.0]]));
        assert_eq!(seen.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn double_start_rejected() {
        let mut source = ManualSource::new(8000);
        source.start(Arc::new(|_| {})).unwrap();
        assert!(source.start(Arc::new(|_| {})).is_err());
    }
}
