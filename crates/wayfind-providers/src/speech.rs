use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use log::debug;
use thiserror::Error;

#[derive(Debug, Error)]
#[error("speech backend failure: {0}")]
pub struct SpeechError(pub String);

/// External text-to-speech collaborator. Implementations are expected to
/// interrupt: `stop` cancels whatever is currently being spoken.
pub trait SpeechSynthesizer {
    fn speak(&mut self, text: &str) -> Result<(), SpeechError>;
    fn stop(&mut self);
}

/// Discards every announcement. Useful for headless embedders.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullSpeech;

impl SpeechSynthesizer for NullSpeech {
    fn speak(&mut self, text: &str) -> Result<(), SpeechError> {
        debug!(target: "wayfind_providers::speech", "Dropping announcement: {text}");
        Ok(())
    }

    fn stop(&mut self) {}
}

/// Test double that records every spoken phrase and interrupt. Cloning
/// shares the transcript, so a test can hand one clone to the engine and
/// keep another for assertions.
#[derive(Debug, Default, Clone)]
pub struct RecordingSpeech {
    transcript: Arc<Mutex<Vec<String>>>,
    interrupts: Arc<AtomicUsize>,
    fail_next: Arc<AtomicBool>,
}

impl RecordingSpeech {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn transcript(&self) -> Vec<String> {
        self.transcript.lock().expect("transcript poisoned").clone()
    }

    pub fn interrupt_count(&self) -> usize {
        self.interrupts.load(Ordering::SeqCst)
    }

    /// Makes the next `speak` call fail, to exercise error swallowing.
    pub fn fail_next(&self) {
        self.fail_next.store(true, Ordering::SeqCst);
    }
}

impl SpeechSynthesizer for RecordingSpeech {
    fn speak(&mut self, text: &str) -> Result<(), SpeechError> {
        if self.fail_next.swap(false, Ordering::SeqCst) {
            return Err(SpeechError("injected failure".to_string()));
        }
        self.transcript
            .lock()
            .expect("transcript poisoned")
            .push(text.to_string());
        Ok(())
    }

    fn stop(&mut self) {
        self.interrupts.fetch_add(1, Ordering::SeqCst);
    }
}
