use anyhow::{Context, Result, bail};
use std::{
    io::Write,
    process::{Command, Stdio},
};

use super::{Speaker, Voice, VoiceProfile};

/// Drives the `espeak-ng` command-line synthesizer.
///
/// Text goes in on stdin; the call returns when the process exits, i.e.
/// after playback has finished.
#[derive(Debug, Clone)]
pub struct EspeakSpeaker {
    bin: String,
}

impl EspeakSpeaker {
    pub fn new(bin: &str) -> Self {
        Self {
            bin: bin.to_string(),
        }
    }

    /// Whether the executable can be launched at all.
    pub fn is_available(&self) -> bool {
        Command::new(&self.bin)
            .arg("--version")
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .map(|status| status.success())
            .unwrap_or(false)
    }
}

impl Speaker for EspeakSpeaker {
    fn name(&self) -> &'static str {
        "espeak"
    }

    fn voices(&self) -> Result<Vec<Voice>> {
        let output = Command::new(&self.bin)
            .arg("--voices")
            .output()
            .with_context(|| format!("Failed to run `{} --voices`", self.bin))?;

        if !output.status.success() {
            bail!("`{} --voices` exited with {}", self.bin, output.status);
        }

        Ok(parse_voice_list(&String::from_utf8_lossy(&output.stdout)))
    }

    fn speak(&mut self, text: &str, profile: &VoiceProfile) -> Result<()> {
        let mut cmd = Command::new(&self.bin);
        cmd.arg("--stdin")
            .arg("-a")
            .arg(amplitude(profile.volume()).to_string());
        if let Some(voice) = profile.voice_id() {
            cmd.arg("-v").arg(voice);
        }

        let mut child = cmd
            .stdin(Stdio::piped())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .spawn()
            .with_context(|| format!("Failed to start {}", self.bin))?;

        // Dropping stdin closes it, which is what starts playback.
        if let Some(mut stdin) = child.stdin.take() {
            stdin
                .write_all(text.as_bytes())
                .with_context(|| format!("Failed to send text to {}", self.bin))?;
        }

        let output = child
            .wait_with_output()
            .with_context(|| format!("Failed to wait for {}", self.bin))?;

        if !output.status.success() {
            bail!(
                "{} exited with {}: {}",
                self.bin,
                output.status,
                String::from_utf8_lossy(&output.stderr).trim()
            );
        }

        Ok(())
    }
}

/// espeak amplitude runs 0..=200 with 100 as the default; full volume maps to the default.
fn amplitude(volume: f32) -> u32 {
    (volume.clamp(0.0, 1.0) * 100.0).round() as u32
}

/// Parse the table printed by `espeak-ng --voices`:
///
/// ```text
/// Pty Language       Age/Gender VoiceName          File                 Other Languages
///  5  af              --/M      Afrikaans          gmw/af
///  2  en-us           --/M      English_(America)  gmw/en-US            (en 2)
/// ```
fn parse_voice_list(output: &str) -> Vec<Voice> {
    output
        .lines()
        .skip(1)
        .filter_map(|line| {
            let mut columns = line.split_whitespace();
            let _priority = columns.next()?;
            let language = columns.next()?;
            let _age_gender = columns.next()?;
            let name = columns.next()?;

            Some(Voice {
                id: language.to_string(),
                name: name.replace('_', " "),
            })
        })
        .collect()
}
