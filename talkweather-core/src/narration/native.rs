use anyhow::{Context, Result};
use std::{thread, time::Duration};
use tts::Tts;

use super::{Speaker, Voice, VoiceProfile};

const POLL_INTERVAL: Duration = Duration::from_millis(50);

/// The platform speech engine (SAPI / WinRT, AVFoundation, speech-dispatcher).
pub struct NativeSpeaker {
    tts: Tts,
}

impl NativeSpeaker {
    pub fn new() -> Result<Self> {
        let tts = Tts::default().context("Failed to initialise the platform speech engine")?;
        Ok(Self { tts })
    }

    fn apply(&mut self, profile: &VoiceProfile) -> Result<()> {
        let (min, max) = (self.tts.min_volume(), self.tts.max_volume());
        self.tts
            .set_volume(min + (max - min) * profile.volume())
            .context("Failed to set speech volume")?;

        if let Some(id) = profile.voice_id() {
            let voices = self.tts.voices().context("Failed to list voices")?;
            if let Some(voice) = voices.iter().find(|voice| voice.id() == id) {
                self.tts.set_voice(voice).context("Failed to set voice")?;
            }
        }

        Ok(())
    }
}

impl Speaker for NativeSpeaker {
    fn name(&self) -> &'static str {
        "native"
    }

    fn voices(&self) -> Result<Vec<Voice>> {
        let voices = self.tts.voices().context("Failed to list voices")?;
        Ok(voices
            .into_iter()
            .map(|voice| Voice {
                id: voice.id(),
                name: voice.name(),
            })
            .collect())
    }

    fn speak(&mut self, text: &str, profile: &VoiceProfile) -> Result<()> {
        self.apply(profile)?;
        self.tts.speak(text, false).context("Failed to speak")?;

        if self.tts.supported_features().is_speaking {
            while self.tts.is_speaking().context("Failed to query speech state")? {
                thread::sleep(POLL_INTERVAL);
            }
        }

        Ok(())
    }
}
