use log::{info, warn};
use wayfind_core::session::Mode;
use wayfind_providers::SpeechSynthesizer;

/// Spoken when a path carries no guidance text of its own.
pub const DEFAULT_START_GUIDANCE: &str = "Navigation started. Start walking.";

/// State transitions and milestones that produce exactly one spoken
/// message each.
#[derive(Debug, Clone, PartialEq)]
pub enum GuidanceEvent<'a> {
    SessionStarted { guidance_text: &'a str },
    Paused,
    Resumed,
    Stopped,
    Arrived { title: &'a str },
    ModeChanged(Mode),
    Milestone { meters_covered: f64 },
}

impl GuidanceEvent<'_> {
    fn phrase(&self) -> String {
        match self {
            GuidanceEvent::SessionStarted { guidance_text } => {
                if guidance_text.trim().is_empty() {
                    DEFAULT_START_GUIDANCE.to_string()
                } else {
                    (*guidance_text).to_string()
                }
            }
            GuidanceEvent::Paused => "Navigation paused".to_string(),
            GuidanceEvent::Resumed => "Navigation resumed".to_string(),
            GuidanceEvent::Stopped => "Navigation stopped".to_string(),
            GuidanceEvent::Arrived { title } => format!("You have arrived at {title}"),
            GuidanceEvent::ModeChanged(Mode::Manual) => "Switched to manual step mode".to_string(),
            GuidanceEvent::ModeChanged(Mode::Auto) => {
                "Switched to automatic step detection".to_string()
            }
            GuidanceEvent::Milestone { meters_covered } => {
                format!("You have covered {meters_covered:.0} meters so far")
            }
        }
    }
}

/// Pushes announcements to the speech collaborator. The shared speech
/// resource is interrupted before every new phrase so announcements never
/// overlap or queue behind each other; backend failures are logged and
/// never disturb navigation state.
pub struct GuidanceEmitter<S: SpeechSynthesizer> {
    speech: S,
}

impl<S: SpeechSynthesizer> GuidanceEmitter<S> {
    pub fn new(speech: S) -> Self {
        Self { speech }
    }

    pub fn announce(&mut self, event: GuidanceEvent<'_>) {
        let phrase = event.phrase();
        self.speech.stop();
        match self.speech.speak(&phrase) {
            Ok(()) => {
                info!(target: "wayfind_engine::guidance", "Announced: {phrase}")
            }
            Err(err) => {
                warn!(target: "wayfind_engine::guidance",
                    "Speech backend rejected announcement ({phrase:?}): {err}")
            }
        }
    }

    /// Cancels any in-flight announcement without speaking a new one.
    pub fn cancel(&mut self) {
        self.speech.stop();
    }
}
