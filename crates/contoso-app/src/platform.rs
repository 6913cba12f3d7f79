//! Terminal stand-ins for the platform speech services.
//!
//! Narration is printed instead of played, and "listening" means the next
//! line typed is taken as the spoken transcript. Playback events flow back
//! to the main loop over a channel.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tokio::sync::mpsc::UnboundedSender;

use contoso_chat::{
    CaptureEvent, ChatError, PlaybackEvent, SpeechCapture, SpeechPlayback, UtteranceId,
};

/// Prints narrated text and reports it finished straight away.
pub struct ConsoleNarrator {
    events: UnboundedSender<PlaybackEvent>,
}

impl ConsoleNarrator {
    pub fn new(events: UnboundedSender<PlaybackEvent>) -> Self {
        Self { events }
    }

    fn emit(&self, event: PlaybackEvent) -> Result<(), ChatError> {
        self.events
            .send(event)
            .map_err(|e| ChatError::VoiceError(format!("voice event channel closed: {}", e)))
    }
}

impl SpeechPlayback for ConsoleNarrator {
    fn is_supported(&self) -> bool {
        true
    }

    fn speak(&mut self, utterance: UtteranceId, text: &str) -> Result<(), ChatError> {
        self.emit(PlaybackEvent::Started(utterance))?;
        println!("  (speaking) {}", text);
        self.emit(PlaybackEvent::Finished(utterance))
    }

    fn cancel(&mut self) {
        tracing::trace!("Narration cancelled");
    }
}

/// Dictation by keyboard: while armed, the next input line is the transcript.
#[derive(Clone, Default)]
pub struct KeyboardCapture {
    armed: Arc<AtomicBool>,
}

impl KeyboardCapture {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_armed(&self) -> bool {
        self.armed.load(Ordering::SeqCst)
    }

    /// Turn a typed line into the capture result and disarm.
    pub fn take_line(&self, line: &str) -> CaptureEvent {
        self.armed.store(false, Ordering::SeqCst);
        let line = line.trim();
        if line.is_empty() {
            CaptureEvent::Error("no-speech".to_string())
        } else {
            CaptureEvent::Transcript(line.to_string())
        }
    }
}

impl SpeechCapture for KeyboardCapture {
    fn is_supported(&self) -> bool {
        true
    }

    fn start(&mut self) -> Result<(), ChatError> {
        self.armed.store(true, Ordering::SeqCst);
        Ok(())
    }

    fn stop(&mut self) {
        self.armed.store(false, Ordering::SeqCst);
    }
}
