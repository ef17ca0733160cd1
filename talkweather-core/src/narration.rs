//! Speech output and the voice settings it is driven by.
//!
//! Settings live in a [`VoiceProfile`] owned by the caller and handed to
//! every [`Speaker::speak`] call, so backends hold no user state.

use serde::{Deserialize, Serialize};

use crate::Config;

pub mod espeak;
#[cfg(feature = "native-tts")]
pub mod native;

pub use espeak::EspeakSpeaker;
#[cfg(feature = "native-tts")]
pub use native::NativeSpeaker;

/// Which speech engine the app should drive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SpeechBackend {
    /// The `espeak-ng` executable.
    #[default]
    Espeak,
    /// Platform engine via the `tts` crate (`native-tts` feature).
    Native,
    /// Print only.
    Muted,
}

/// A voice installed on the host.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Voice {
    pub id: String,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct VoiceProfile {
    volume: f32,
    voice_id: Option<String>,
}

impl Default for VoiceProfile {
    fn default() -> Self {
        Self {
            volume: 1.0,
            voice_id: None,
        }
    }
}

impl VoiceProfile {
    pub fn volume(&self) -> f32 {
        self.volume
    }

    /// `None` means the engine's default voice.
    pub fn voice_id(&self) -> Option<&str> {
        self.voice_id.as_deref()
    }

    /// Store `volume` clamped to `[0.0, 1.0]` and return the stored value.
    pub fn set_volume(&mut self, volume: f32) -> f32 {
        self.volume = volume.clamp(0.0, 1.0);
        self.volume
    }

    pub fn set_voice(&mut self, voice: &Voice) {
        self.voice_id = Some(voice.id.clone());
    }
}

/// Rejected input in the voice settings menu. Never changes the profile.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum VoiceSettingError {
    #[error("Invalid volume. Please enter a number between 0.0 and 1.0.")]
    InvalidVolume(String),

    #[error("Invalid input. Please enter a number.")]
    NotANumber(String),

    #[error("Invalid choice. Please select a valid voice number.")]
    OutOfRange { choice: usize, available: usize },
}

pub fn parse_volume(input: &str) -> Result<f32, VoiceSettingError> {
    let input = input.trim();
    input
        .parse::<f32>()
        .ok()
        .filter(|volume| volume.is_finite())
        .ok_or_else(|| VoiceSettingError::InvalidVolume(input.to_string()))
}

/// Resolve a 1-based menu index into `voices`.
pub fn choose_voice<'a>(
    voices: &'a [Voice],
    input: &str,
) -> Result<&'a Voice, VoiceSettingError> {
    let input = input.trim();
    if input.is_empty() || !input.chars().all(|c| c.is_ascii_digit()) {
        return Err(VoiceSettingError::NotANumber(input.to_string()));
    }

    let out_of_range = || VoiceSettingError::OutOfRange {
        choice: input.parse().unwrap_or(usize::MAX),
        available: voices.len(),
    };

    let choice: usize = input.parse().map_err(|_| out_of_range())?;
    choice
        .checked_sub(1)
        .and_then(|index| voices.get(index))
        .ok_or_else(out_of_range)
}

/// A speech engine.
pub trait Speaker {
    /// Short backend name for diagnostics.
    fn name(&self) -> &'static str;

    fn voices(&self) -> anyhow::Result<Vec<Voice>>;

    /// Speak `text` with the given settings, returning once playback has finished.
    fn speak(&mut self, text: &str, profile: &VoiceProfile) -> anyhow::Result<()>;
}

/// Speaks nothing; the session still prints every line.
#[derive(Debug, Clone, Copy, Default)]
pub struct MutedSpeaker;

impl Speaker for MutedSpeaker {
    fn name(&self) -> &'static str {
        "muted"
    }

    fn voices(&self) -> anyhow::Result<Vec<Voice>> {
        Ok(Vec::new())
    }

    fn speak(&mut self, _text: &str, _profile: &VoiceProfile) -> anyhow::Result<()> {
        Ok(())
    }
}

/// Build the configured speaker, falling back to [`MutedSpeaker`] when the engine is missing.
pub fn speaker_from_config(config: &Config) -> Box<dyn Speaker> {
    match config.speech {
        SpeechBackend::Espeak => {
            let speaker = EspeakSpeaker::new(&config.espeak_bin);
            if speaker.is_available() {
                Box::new(speaker)
            } else {
                tracing::warn!(
                    bin = %config.espeak_bin,
                    "espeak executable not found, speech muted"
                );
                Box::new(MutedSpeaker)
            }
        }
        SpeechBackend::Native => native_speaker(),
        SpeechBackend::Muted => Box::new(MutedSpeaker),
    }
}

#[cfg(feature = "native-tts")]
fn native_speaker() -> Box<dyn Speaker> {
    match NativeSpeaker::new() {
        Ok(speaker) => Box::new(speaker),
        Err(err) => {
            tracing::warn!("platform speech engine unavailable, speech muted: {err:#}");
            Box::new(MutedSpeaker)
        }
    }
}

#[cfg(not(feature = "native-tts"))]
fn native_speaker() -> Box<dyn Speaker> {
    tracing::warn!("built without the `native-tts` feature, speech muted");
    Box::new(MutedSpeaker)
}
