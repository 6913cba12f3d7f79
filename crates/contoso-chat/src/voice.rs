//! Voice capture and narration state.
//!
//! Two independent state machines share one enable switch:
//! - Capture: Idle -> Listening (start), Listening -> Idle (transcript, error, stop)
//! - Playback: Idle -> Speaking (speak), Speaking -> Idle (finished, failed, cancel)
//!
//! The platform speech services are reached through [`SpeechCapture`] and
//! [`SpeechPlayback`]. Support is checked once at construction; without it
//! every operation is a silent no-op.

use std::fmt;

use crate::error::ChatError;
use crate::types::VoiceState;

/// Identifies one narration request. Increases with every `speak`.
pub type UtteranceId = u64;

/// Outcome reported by the speech-to-text platform for one capture.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum CaptureEvent {
    Transcript(String),
    Error(String),
}

/// Progress reported by the text-to-speech platform.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum PlaybackEvent {
    Started(UtteranceId),
    Finished(UtteranceId),
    Failed(UtteranceId, String),
}

/// Platform speech-to-text service. Delivers exactly one [`CaptureEvent`]
/// per successful `start`, back through the owner of the controller.
pub trait SpeechCapture: Send {
    fn is_supported(&self) -> bool;
    fn start(&mut self) -> Result<(), ChatError>;
    fn stop(&mut self);
}

/// Platform text-to-speech service.
pub trait SpeechPlayback: Send {
    fn is_supported(&self) -> bool;
    fn speak(&mut self, utterance: UtteranceId, text: &str) -> Result<(), ChatError>;
    /// Drop the current utterance and anything queued behind it.
    fn cancel(&mut self);
}

/// Stand-in for platforms without speech services.
pub struct UnsupportedSpeech;

impl SpeechCapture for UnsupportedSpeech {
    fn is_supported(&self) -> bool {
        false
    }

    fn start(&mut self) -> Result<(), ChatError> {
        Err(ChatError::VoiceError("speech capture not supported".to_string()))
    }

    fn stop(&mut self) {}
}

impl SpeechPlayback for UnsupportedSpeech {
    fn is_supported(&self) -> bool {
        false
    }

    fn speak(&mut self, _utterance: UtteranceId, _text: &str) -> Result<(), ChatError> {
        Err(ChatError::VoiceError("speech playback not supported".to_string()))
    }

    fn cancel(&mut self) {}
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CaptureState {
    Idle,
    Listening,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PlaybackState {
    Idle,
    Speaking(UtteranceId),
}

impl fmt::Display for CaptureState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CaptureState::Idle => write!(f, "Idle"),
            CaptureState::Listening => write!(f, "Listening"),
        }
    }
}

impl fmt::Display for PlaybackState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PlaybackState::Idle => write!(f, "Idle"),
            PlaybackState::Speaking(id) => write!(f, "Speaking({})", id),
        }
    }
}

/// Voice capture/playback controller.
pub struct VoiceController {
    capture: Box<dyn SpeechCapture>,
    playback: Box<dyn SpeechPlayback>,
    supported: bool,
    enabled: bool,
    capture_state: CaptureState,
    playback_state: PlaybackState,
    last_utterance: UtteranceId,
}

impl VoiceController {
    /// Create a controller over the given platform services.
    ///
    /// Voice counts as supported only when both capture and playback are.
    pub fn new(
        capture: Box<dyn SpeechCapture>,
        playback: Box<dyn SpeechPlayback>,
        enabled: bool,
    ) -> Self {
        let supported = capture.is_supported() && playback.is_supported();
        if !supported {
            tracing::info!("Speech services unavailable; voice features disabled");
        }
        Self {
            capture,
            playback,
            supported,
            enabled,
            capture_state: CaptureState::Idle,
            playback_state: PlaybackState::Idle,
            last_utterance: 0,
        }
    }

    /// Controller for a platform with no speech services.
    pub fn unsupported() -> Self {
        Self::new(Box::new(UnsupportedSpeech), Box::new(UnsupportedSpeech), false)
    }

    pub fn state(&self) -> VoiceState {
        VoiceState {
            listening: self.is_listening(),
            speaking: self.is_speaking(),
            supported: self.supported,
            enabled: self.enabled,
        }
    }

    pub fn is_listening(&self) -> bool {
        self.capture_state == CaptureState::Listening
    }

    pub fn is_speaking(&self) -> bool {
        matches!(self.playback_state, PlaybackState::Speaking(_))
    }

    // -- Capture --

    /// Begin capturing speech. Returns `false` when nothing was started.
    ///
    /// Ongoing narration is cancelled first so the bot does not hear itself.
    pub fn start_listening(&mut self) -> bool {
        if !self.supported || self.is_listening() {
            return false;
        }
        if self.is_speaking() {
            self.cancel_playback();
        }
        match self.capture.start() {
            Ok(()) => {
                self.set_capture(CaptureState::Listening);
                true
            }
            Err(e) => {
                tracing::warn!(error = %e, "Speech capture failed to start");
                false
            }
        }
    }

    /// Abort an ongoing capture. No transcript is delivered.
    pub fn stop_listening(&mut self) {
        if !self.is_listening() {
            return;
        }
        self.capture.stop();
        self.set_capture(CaptureState::Idle);
    }

    /// Apply a capture result. Returns the transcript to place in the input
    /// buffer, if any. Events arriving while not listening are stale and dropped.
    pub fn handle_capture_event(&mut self, event: CaptureEvent) -> Option<String> {
        if !self.is_listening() {
            tracing::debug!(event = ?event, "Ignoring capture event while idle");
            return None;
        }
        self.set_capture(CaptureState::Idle);
        match event {
            CaptureEvent::Transcript(text) => Some(text),
            CaptureEvent::Error(err) => {
                tracing::warn!(error = %err, "Speech capture error");
                None
            }
        }
    }

    // -- Playback --

    /// Narrate `text`, interrupting whatever is being spoken.
    ///
    /// Returns the id of the new utterance, or `None` when narration is
    /// disabled, unsupported, or the microphone is open.
    pub fn speak(&mut self, text: &str) -> Option<UtteranceId> {
        if !self.supported || !self.enabled || text.trim().is_empty() {
            return None;
        }
        if self.is_listening() {
            tracing::debug!("Skipping narration while listening");
            return None;
        }
        if self.is_speaking() {
            self.cancel_playback();
        }

        self.last_utterance += 1;
        let id = self.last_utterance;
        match self.playback.speak(id, text) {
            Ok(()) => {
                self.set_playback(PlaybackState::Speaking(id));
                Some(id)
            }
            Err(e) => {
                tracing::warn!(error = %e, utterance = id, "Narration failed to start");
                None
            }
        }
    }

    /// Apply a playback event. Events for superseded utterances are dropped.
    pub fn handle_playback_event(&mut self, event: PlaybackEvent) {
        let current = match self.playback_state {
            PlaybackState::Speaking(id) => id,
            PlaybackState::Idle => return,
        };
        match event {
            PlaybackEvent::Started(id) => {
                tracing::trace!(utterance = id, "Narration started");
            }
            PlaybackEvent::Finished(id) if id == current => {
                self.set_playback(PlaybackState::Idle);
            }
            PlaybackEvent::Failed(id, err) if id == current => {
                tracing::warn!(error = %err, utterance = id, "Narration error");
                self.set_playback(PlaybackState::Idle);
            }
            stale => {
                tracing::debug!(event = ?stale, current, "Ignoring stale playback event");
            }
        }
    }

    /// Flip the narration switch. Turning it off silences current speech.
    /// Returns the new setting.
    pub fn toggle_voice(&mut self) -> bool {
        if !self.supported {
            return self.enabled;
        }
        self.enabled = !self.enabled;
        if !self.enabled && self.is_speaking() {
            self.cancel_playback();
        }
        tracing::info!(enabled = self.enabled, "Voice narration toggled");
        self.enabled
    }

    fn cancel_playback(&mut self) {
        self.playback.cancel();
        self.set_playback(PlaybackState::Idle);
    }

    fn set_capture(&mut self, target: CaptureState) {
        tracing::debug!("Capture state: {} -> {}", self.capture_state, target);
        self.capture_state = target;
    }

    fn set_playback(&mut self, target: PlaybackState) {
        tracing::debug!("Playback state: {} -> {}", self.playback_state, target);
        self.playback_state = target;
    }
}

/// Recording fakes for the platform services.
#[cfg(test)]
pub(crate) mod testing {
    use std::sync::{Arc, Mutex};

    use super::*;

    /// Shared call log: one line per platform call.
    #[derive(Clone, Default)]
    pub(crate) struct CallLog(Arc<Mutex<Vec<String>>>);

    impl CallLog {
        pub(crate) fn push(&self, entry: String) {
            self.0.lock().unwrap().push(entry);
        }

        pub(crate) fn entries(&self) -> Vec<String> {
            self.0.lock().unwrap().clone()
        }
    }

    pub(crate) struct FakeCapture {
        pub(crate) log: CallLog,
        pub(crate) fail_start: bool,
    }

    impl SpeechCapture for FakeCapture {
        fn is_supported(&self) -> bool {
            true
        }

        fn start(&mut self) -> Result<(), ChatError> {
            if self.fail_start {
                return Err(ChatError::VoiceError("mic busy".to_string()));
            }
            self.log.push("capture.start".to_string());
            Ok(())
        }

        fn stop(&mut self) {
            self.log.push("capture.stop".to_string());
        }
    }

    pub(crate) struct FakePlayback {
        pub(crate) log: CallLog,
    }

    impl SpeechPlayback for FakePlayback {
        fn is_supported(&self) -> bool {
            true
        }

        fn speak(&mut self, utterance: UtteranceId, text: &str) -> Result<(), ChatError> {
            self.log.push(format!("speak {} {}", utterance, text));
            Ok(())
        }

        fn cancel(&mut self) {
            self.log.push("cancel".to_string());
        }
    }

    /// A supported controller whose platform calls land in the returned log.
    pub(crate) fn recording_voice(enabled: bool) -> (VoiceController, CallLog) {
        let log = CallLog::default();
        let voice = VoiceController::new(
            Box::new(FakeCapture {
                log: log.clone(),
                fail_start: false,
            }),
            Box::new(FakePlayback { log: log.clone() }),
            enabled,
        );
        (voice, log)
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::testing::*;
    use super::*;

    #[test]
    fn test_unsupported_is_permanent_noop() {
        let mut voice = VoiceController::unsupported();
        assert!(!voice.state().supported);
        assert!(!voice.start_listening());
        assert!(voice.speak("hello").is_none());
        assert!(!voice.toggle_voice());
        assert_eq!(
            voice.state(),
            VoiceState {
                listening: false,
                speaking: false,
                supported: false,
                enabled: false,
            }
        );
    }

    #[test]
    fn test_start_listening_once() {
        let (mut voice, log) = recording_voice(true);
        assert!(voice.start_listening());
        assert!(!voice.start_listening());
        assert!(voice.is_listening());
        assert_eq!(log.entries(), vec!["capture.start"]);
    }

    #[test]
    fn test_transcript_returns_to_idle() {
        let (mut voice, _) = recording_voice(true);
        voice.start_listening();
        let text = voice.handle_capture_event(CaptureEvent::Transcript("show me phones".into()));
        assert_eq!(text.as_deref(), Some("show me phones"));
        assert!(!voice.is_listening());
    }

    #[test]
    fn test_capture_error_is_swallowed() {
        let (mut voice, _) = recording_voice(true);
        voice.start_listening();
        let text = voice.handle_capture_event(CaptureEvent::Error("no-speech".into()));
        assert!(text.is_none());
        assert!(!voice.is_listening());
    }

    #[test]
    fn test_stop_listening_drops_late_transcript() {
        let (mut voice, log) = recording_voice(true);
        voice.start_listening();
        voice.stop_listening();
        assert!(!voice.is_listening());
        assert!(voice
            .handle_capture_event(CaptureEvent::Transcript("late".into()))
            .is_none());
        assert_eq!(log.entries(), vec!["capture.start", "capture.stop"]);
    }

    #[test]
    fn test_failed_capture_start_stays_idle() {
        let log = CallLog::default();
        let mut voice = VoiceController::new(
            Box::new(FakeCapture {
                log: log.clone(),
                fail_start: true,
            }),
            Box::new(FakePlayback { log }),
            true,
        );
        assert!(!voice.start_listening());
        assert!(!voice.is_listening());
    }

    #[test]
    fn test_speak_disabled_is_noop() {
        let (mut voice, log) = recording_voice(false);
        assert!(voice.speak("hello").is_none());
        assert!(!voice.is_speaking());
        assert!(log.entries().is_empty());
    }

    #[test]
    fn test_speak_then_finish() {
        let (mut voice, _) = recording_voice(true);
        let id = voice.speak("hello").unwrap();
        assert!(voice.is_speaking());
        voice.handle_playback_event(PlaybackEvent::Started(id));
        assert!(voice.is_speaking());
        voice.handle_playback_event(PlaybackEvent::Finished(id));
        assert!(!voice.is_speaking());
    }

    #[test]
    fn test_playback_error_returns_to_idle() {
        let (mut voice, _) = recording_voice(true);
        let id = voice.speak("hello").unwrap();
        voice.handle_playback_event(PlaybackEvent::Failed(id, "audio-busy".into()));
        assert!(!voice.is_speaking());
    }

    #[test]
    fn test_second_speak_interrupts_first() {
        let (mut voice, log) = recording_voice(true);
        let first = voice.speak("first").unwrap();
        let second = voice.speak("second").unwrap();
        assert!(second > first);
        assert_eq!(
            log.entries(),
            vec!["speak 1 first", "cancel", "speak 2 second"]
        );

        // The interrupted utterance's end event must not end the new one.
        voice.handle_playback_event(PlaybackEvent::Finished(first));
        assert!(voice.is_speaking());
        voice.handle_playback_event(PlaybackEvent::Finished(second));
        assert!(!voice.is_speaking());
    }

    #[test]
    fn test_toggle_off_cancels_speech() {
        let (mut voice, log) = recording_voice(true);
        voice.speak("hello");
        assert!(!voice.toggle_voice());
        assert!(!voice.is_speaking());
        assert_eq!(log.entries().last().map(String::as_str), Some("cancel"));
        assert!(voice.speak("again").is_none());
        assert!(voice.toggle_voice());
    }

    #[test]
    fn test_listening_and_speaking_exclusive() {
        let (mut voice, log) = recording_voice(true);
        voice.speak("hello");
        assert!(voice.start_listening());
        assert!(voice.is_listening());
        assert!(!voice.is_speaking());
        assert!(voice.speak("while listening").is_none());
        assert_eq!(
            log.entries(),
            vec!["speak 1 hello", "cancel", "capture.start"]
        );
    }

    #[test]
    fn test_blank_text_not_spoken() {
        let (mut voice, _) = recording_voice(true);
        assert!(voice.speak("   ").is_none());
    }
}
