//! The interactive query loop.

use anyhow::Result;
use std::path::PathBuf;
use talkweather_core::{
    Speaker, TemperatureUnit, VoiceProfile, WeatherProvider,
    narration::{choose_voice, parse_volume},
    report,
};

use crate::console::Console;

const WELCOME: &str = "Welcome to the weather app!";
const FAREWELL: &str = "Thank you for using the weather app!";
const NOTHING_TO_SAVE: &str = "There is no weather information to save.";
const SAVE_FAILED: &str = "Could not save the weather information.";
const INVALID_UNIT: &str =
    "Invalid choice. Please choose either 'C' for Celsius or 'F' for Fahrenheit.";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Flow {
    Continue,
    Quit,
}

/// Unwrap an answer, or end the session when the console was closed.
macro_rules! or_quit {
    ($answer:expr) => {
        match $answer {
            Some(answer) => answer,
            None => return Ok(Flow::Quit),
        }
    };
}

fn is_affirmative(answer: &str) -> bool {
    answer.trim().eq_ignore_ascii_case("yes")
}

/// One user's run of the app: query, narrate, optionally save, repeat.
pub struct Session<'a> {
    console: &'a mut dyn Console,
    provider: &'a dyn WeatherProvider,
    speaker: &'a mut dyn Speaker,
    profile: VoiceProfile,
    reports_dir: PathBuf,
    forecast_days: u8,
}

impl<'a> Session<'a> {
    pub fn new(
        console: &'a mut dyn Console,
        provider: &'a dyn WeatherProvider,
        speaker: &'a mut dyn Speaker,
        reports_dir: PathBuf,
        forecast_days: u8,
    ) -> Self {
        Self {
            console,
            provider,
            speaker,
            profile: VoiceProfile::default(),
            reports_dir,
            forecast_days,
        }
    }

    pub fn profile(&self) -> &VoiceProfile {
        &self.profile
    }

    /// Loop until the user asks to stop or closes the console.
    pub async fn run(&mut self) -> Result<()> {
        while self.query().await? == Flow::Continue {}

        self.announce(FAREWELL);
        Ok(())
    }

    async fn query(&mut self) -> Result<Flow> {
        self.announce(WELCOME);

        let city = or_quit!(self.ask_city()?);
        let unit = or_quit!(self.ask_unit()?);

        // Only this iteration's successful fetch may be saved.
        let summary = match self.provider.current(&city, unit).await {
            Ok(snapshot) => {
                let summary = snapshot.summary();
                self.announce(&summary);
                Some(summary)
            }
            Err(err) => {
                self.announce(&err.user_message(&city));
                None
            }
        };

        let save = "Would you like to save the weather information? (yes or no): ";
        if or_quit!(self.confirm(save)?) {
            self.save(summary.as_deref(), &city, unit);
        }

        let question = format!(
            "Do you want the {}-day weather forecast? (yes or no): ",
            self.forecast_days
        );
        if or_quit!(self.confirm(&question)?) {
            match self.provider.forecast(&city, unit, self.forecast_days).await {
                Ok(forecast) => self.announce(&format!("Weather forecast:\n{}", forecast.report())),
                Err(err) => self.announce(&err.user_message(&city)),
            }
        }

        if or_quit!(self.confirm("Do you want to exit the app? (yes or no): ")?) {
            return Ok(Flow::Quit);
        }

        if !or_quit!(self.confirm("Do you want to make another query? (yes or no): ")?) {
            return Ok(Flow::Quit);
        }

        self.change_speech_properties()
    }

    fn ask_city(&mut self) -> Result<Option<String>> {
        loop {
            let Some(answer) = self.ask("Enter the name of the city: ")? else {
                return Ok(None);
            };
            let city = answer.trim();
            if !city.is_empty() {
                return Ok(Some(city.to_string()));
            }
        }
    }

    fn ask_unit(&mut self) -> Result<Option<TemperatureUnit>> {
        loop {
            let Some(answer) =
                self.ask("Choose unit for temperature (C for Celsius, F for Fahrenheit): ")?
            else {
                return Ok(None);
            };
            match answer.parse::<TemperatureUnit>() {
                Ok(unit) => return Ok(Some(unit)),
                Err(_) => self.console.print(INVALID_UNIT),
            }
        }
    }

    fn save(&mut self, summary: Option<&str>, city: &str, unit: TemperatureUnit) {
        let Some(summary) = summary else {
            self.announce(NOTHING_TO_SAVE);
            return;
        };

        match report::save_report(&self.reports_dir, summary, city, unit) {
            Ok(path) => {
                let name = path
                    .file_name()
                    .map(|name| name.to_string_lossy().into_owned())
                    .unwrap_or_else(|| path.display().to_string());
                self.announce(&format!("Weather information saved to {name}"));
            }
            Err(err) => {
                tracing::error!(city, "Failed to save weather information: {err:#}");
                self.announce(SAVE_FAILED);
            }
        }
    }

    fn change_speech_properties(&mut self) -> Result<Flow> {
        self.console.print("");
        self.console.print("Change Speech Properties:");
        self.console.print("1. Change volume");
        self.console.print("2. Change voice");

        let choice = or_quit!(self.ask("Choose an option (1 or 2): ")?);
        match choice.trim() {
            "1" => {
                let input = or_quit!(self.ask("Enter volume level (0.0 to 1.0): ")?);
                match parse_volume(&input) {
                    Ok(volume) => {
                        let volume = self.profile.set_volume(volume);
                        self.console.print(&format!("Volume set to {volume}"));
                    }
                    Err(err) => self.console.print(&err.to_string()),
                }
            }
            "2" => {
                let voices = match self.speaker.voices() {
                    Ok(voices) if !voices.is_empty() => voices,
                    Ok(_) => {
                        self.console.print("No voices are available.");
                        return Ok(Flow::Continue);
                    }
                    Err(err) => {
                        tracing::warn!("Failed to list voices: {err:#}");
                        self.console.print("Could not list the available voices.");
                        return Ok(Flow::Continue);
                    }
                };

                self.console.print("");
                self.console.print("Available Voices:");
                for (number, voice) in voices.iter().enumerate() {
                    self.console.print(&format!("{}. {}", number + 1, voice.name));
                }

                let input = or_quit!(self.ask("Choose a voice number: ")?);
                match choose_voice(&voices, &input) {
                    Ok(voice) => {
                        self.profile.set_voice(voice);
                        self.console.print(&format!("Voice set to {}", voice.name));
                    }
                    Err(err) => self.console.print(&err.to_string()),
                }
            }
            _ => self.console.print("Invalid choice. Please choose 1 or 2."),
        }

        Ok(Flow::Continue)
    }

    /// Speak the prompt, then read the answer.
    fn ask(&mut self, prompt: &str) -> Result<Option<String>> {
        self.speak(prompt);
        self.console.ask(prompt)
    }

    fn confirm(&mut self, prompt: &str) -> Result<Option<bool>> {
        Ok(self.ask(prompt)?.map(|answer| is_affirmative(&answer)))
    }

    /// Print and speak.
    fn announce(&mut self, text: &str) {
        self.console.print(text);
        self.speak(text);
    }

    fn speak(&mut self, text: &str) {
        if let Err(err) = self.speaker.speak(text, &self.profile) {
            tracing::warn!(backend = self.speaker.name(), "Speech failed: {err:#}");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use chrono::{Local, NaiveDate, TimeZone};
    use std::collections::VecDeque;
    use talkweather_core::{
        Endpoint, Forecast, ForecastDay, Voice, WeatherError, WeatherSnapshot,
    };
    use tempfile::TempDir;

    #[derive(Debug, Default)]
    struct ScriptedConsole {
        answers: VecDeque<String>,
        asked: Vec<String>,
        printed: Vec<String>,
    }

    impl ScriptedConsole {
        fn new(answers: &[&str]) -> Self {
            Self {
                answers: answers.iter().map(|a| a.to_string()).collect(),
                ..Self::default()
            }
        }

        fn printed(&self, line: &str) -> bool {
            self.printed.iter().any(|p| p == line)
        }
    }

    impl Console for ScriptedConsole {
        fn ask(&mut self, prompt: &str) -> Result<Option<String>> {
            self.asked.push(prompt.to_string());
            Ok(self.answers.pop_front())
        }

        fn print(&mut self, line: &str) {
            self.printed.push(line.to_string());
        }
    }

    #[derive(Debug, Default)]
    struct RecordingSpeaker {
        voices: Vec<Voice>,
        spoken: Vec<String>,
    }

    impl RecordingSpeaker {
        fn with_voices(count: usize) -> Self {
            Self {
                voices: (1..=count)
                    .map(|i| Voice {
                        id: format!("voice-{i}"),
                        name: format!("Voice {i}"),
                    })
                    .collect(),
                ..Self::default()
            }
        }

        fn spoke(&self, text: &str) -> bool {
            self.spoken.iter().any(|s| s == text)
        }

        fn count(&self, text: &str) -> usize {
            self.spoken.iter().filter(|s| *s == text).count()
        }
    }

    impl Speaker for RecordingSpeaker {
        fn name(&self) -> &'static str {
            "recording"
        }

        fn voices(&self) -> anyhow::Result<Vec<Voice>> {
            Ok(self.voices.clone())
        }

        fn speak(&mut self, text: &str, _profile: &VoiceProfile) -> anyhow::Result<()> {
            self.spoken.push(text.to_string());
            Ok(())
        }
    }

    #[derive(Debug, Clone, Copy, PartialEq)]
    enum Outcome {
        Ok,
        Status,
        Schema,
    }

    #[derive(Debug)]
    struct StubProvider {
        outcome: Outcome,
    }

    impl StubProvider {
        fn failure(&self, endpoint: Endpoint) -> WeatherError {
            match self.outcome {
                Outcome::Schema => WeatherError::Schema {
                    endpoint,
                    source: serde_json::from_str::<serde_json::Value>("{").unwrap_err(),
                },
                _ => WeatherError::Status {
                    endpoint,
                    status: reqwest::StatusCode::BAD_REQUEST,
                    body: "No matching location found.".into(),
                },
            }
        }
    }

    #[async_trait]
    impl WeatherProvider for StubProvider {
        async fn current(
            &self,
            city: &str,
            unit: TemperatureUnit,
        ) -> Result<WeatherSnapshot, WeatherError> {
            if self.outcome != Outcome::Ok {
                return Err(self.failure(Endpoint::Current));
            }
            Ok(WeatherSnapshot {
                city: city.to_string(),
                timestamp: Local.with_ymd_and_hms(2024, 11, 20, 9, 30, 0).unwrap(),
                temperature: unit.select(19.2, 66.6),
                unit,
                condition: "Sunny".to_string(),
                humidity_pct: 40,
                wind_kph: 11.2,
            })
        }

        async fn forecast(
            &self,
            city: &str,
            unit: TemperatureUnit,
            days: u8,
        ) -> Result<Forecast, WeatherError> {
            if self.outcome != Outcome::Ok {
                return Err(self.failure(Endpoint::Forecast));
            }
            let days = (0..days)
                .map(|offset| ForecastDay {
                    date: NaiveDate::from_ymd_opt(2024, 11, 20 + u32::from(offset)).unwrap(),
                    max_temp: unit.select(22.0, 71.6),
                    min_temp: unit.select(12.0, 53.6),
                    condition: "Clear".to_string(),
                })
                .collect();
            Ok(Forecast {
                city: city.to_string(),
                unit,
                days,
            })
        }
    }

    struct Run {
        console: ScriptedConsole,
        speaker: RecordingSpeaker,
        profile: VoiceProfile,
        reports: TempDir,
    }

    async fn run(outcome: Outcome, answers: &[&str], speaker: RecordingSpeaker) -> Run {
        let mut console = ScriptedConsole::new(answers);
        let mut speaker = speaker;
        let provider = StubProvider { outcome };
        let reports = TempDir::new().unwrap();

        let profile = {
            let mut session = Session::new(
                &mut console,
                &provider,
                &mut speaker,
                reports.path().to_path_buf(),
                3,
            );
            session.run().await.unwrap();
            session.profile().clone()
        };

        Run {
            console,
            speaker,
            profile,
            reports,
        }
    }

    fn summary(city: &str, unit: TemperatureUnit) -> String {
        WeatherSnapshot {
            city: city.to_string(),
            timestamp: Local.with_ymd_and_hms(2024, 11, 20, 9, 30, 0).unwrap(),
            temperature: unit.select(19.2, 66.6),
            unit,
            condition: "Sunny".to_string(),
            humidity_pct: 40,
            wind_kph: 11.2,
        }
        .summary()
    }

    #[test]
    fn affirmative_answers() {
        assert!(is_affirmative("yes"));
        assert!(is_affirmative(" YES "));
        assert!(!is_affirmative("y"));
        assert!(!is_affirmative("yeah"));
        assert!(!is_affirmative(""));
        assert!(!is_affirmative("no"));
    }

    #[tokio::test]
    async fn query_then_exit() {
        let run = run(
            Outcome::Ok,
            &["Lima", "kelvin", "c", "no", "no", "yes"],
            RecordingSpeaker::default(),
        )
        .await;

        assert!(run.speaker.spoke(WELCOME));
        assert!(run.speaker.spoke(&summary("Lima", TemperatureUnit::Celsius)));
        assert!(run.console.printed(&summary("Lima", TemperatureUnit::Celsius)));
        assert_eq!(run.speaker.count(FAREWELL), 1);

        // Rejections are printed, not spoken.
        assert!(run.console.printed(INVALID_UNIT));
        assert!(!run.speaker.spoke(INVALID_UNIT));

        // Prompts are spoken too.
        assert!(run.speaker.spoke("Enter the name of the city: "));
        assert_eq!(run.console.asked.len(), 6);
    }

    #[tokio::test]
    async fn blank_city_prompts_again() {
        let run = run(
            Outcome::Ok,
            &["   ", "Lima", "F", "no", "no", "yes"],
            RecordingSpeaker::default(),
        )
        .await;

        assert_eq!(
            run.console
                .asked
                .iter()
                .filter(|p| p.starts_with("Enter the name of the city"))
                .count(),
            2
        );
        assert!(run.speaker.spoke(&summary("Lima", TemperatureUnit::Fahrenheit)));
    }

    #[tokio::test]
    async fn save_writes_the_displayed_summary() {
        let run = run(
            Outcome::Ok,
            &["Lima", "F", "yes", "no", "yes"],
            RecordingSpeaker::default(),
        )
        .await;

        let displayed = summary("Lima", TemperatureUnit::Fahrenheit);
        let path = run.reports.path().join("weather_info_Lima_F.txt");

        assert_eq!(std::fs::read_to_string(path).unwrap(), displayed);
        assert!(run.console.printed(&displayed));
        assert!(run.speaker.spoke("Weather information saved to weather_info_Lima_F.txt"));
    }

    #[tokio::test]
    async fn save_after_failed_fetch_is_rejected() {
        let run = run(
            Outcome::Status,
            &["Atlantis", "C", "yes", "no", "yes"],
            RecordingSpeaker::default(),
        )
        .await;

        assert!(
            run.speaker
                .spoke("Failed to retrieve weather data for Atlantis. Please try again.")
        );
        assert!(run.speaker.spoke(NOTHING_TO_SAVE));
        assert_eq!(std::fs::read_dir(run.reports.path()).unwrap().count(), 0);
        assert!(!run.speaker.spoken.iter().any(|s| s.contains("degrees")));
    }

    #[tokio::test]
    async fn failed_save_is_reported_and_session_continues() {
        let mut console = ScriptedConsole::new(&["Lima", "C", "yes", "no", "yes"]);
        let mut speaker = RecordingSpeaker::default();
        let provider = StubProvider {
            outcome: Outcome::Ok,
        };
        let dir = TempDir::new().unwrap();

        Session::new(
            &mut console,
            &provider,
            &mut speaker,
            dir.path().join("missing"),
            3,
        )
        .run()
        .await
        .unwrap();

        assert!(speaker.spoke(SAVE_FAILED));
        assert!(console.printed(SAVE_FAILED));
        assert!(!speaker.spoken.iter().any(|s| s.starts_with("Weather information saved")));

        let save_prompt = console
            .asked
            .iter()
            .position(|p| p.starts_with("Would you like to save"))
            .unwrap();
        assert!(
            console.asked[save_prompt + 1]
                .starts_with("Do you want the 3-day weather forecast")
        );
        assert_eq!(speaker.count(FAREWELL), 1);
    }

    #[tokio::test]
    async fn schema_failure_uses_generic_message() {
        let run = run(
            Outcome::Schema,
            &["Lima", "C", "no", "yes", "yes"],
            RecordingSpeaker::default(),
        )
        .await;

        assert!(run.speaker.spoke("Could not fetch the weather information. Please try again."));
        assert!(run.speaker.spoke("Could not fetch the weather forecast. Please try again."));
    }

    #[tokio::test]
    async fn forecast_is_narrated_with_heading() {
        let run = run(
            Outcome::Ok,
            &["Lima", "C", "no", "yes", "yes"],
            RecordingSpeaker::default(),
        )
        .await;

        let forecast = run
            .speaker
            .spoken
            .iter()
            .find(|s| s.starts_with("Weather forecast:"))
            .unwrap();
        let lines: Vec<&str> = forecast.lines().skip(1).collect();

        assert_eq!(lines.len(), 3);
        assert_eq!(
            lines[0],
            "Date: 2024-11-20, Max Temp: 22.0°C, Min Temp: 12.0°C, Weather: Clear"
        );
        assert!(run.speaker.spoke("Do you want the 3-day weather forecast? (yes or no): "));
    }

    #[tokio::test]
    async fn declining_another_query_ends_session() {
        let run = run(
            Outcome::Ok,
            &["Lima", "C", "no", "no", "no", "maybe"],
            RecordingSpeaker::default(),
        )
        .await;

        assert_eq!(run.speaker.count(WELCOME), 1);
        assert_eq!(run.speaker.count(FAREWELL), 1);
        assert!(!run.console.printed("Change Speech Properties:"));
    }

    #[tokio::test]
    async fn volume_change_keeps_voice_and_loops() {
        let run = run(
            Outcome::Ok,
            &[
                "Lima", "C", "no", "no", "no", "yes", "1", "0.5", //
                "Quito", "F", "no", "no", "yes",
            ],
            RecordingSpeaker::with_voices(2),
        )
        .await;

        assert_eq!(run.profile.volume(), 0.5);
        assert_eq!(run.profile.voice_id(), None);
        assert!(run.console.printed("Volume set to 0.5"));
        assert_eq!(run.speaker.count(WELCOME), 2);
        assert!(run.speaker.spoke(&summary("Quito", TemperatureUnit::Fahrenheit)));
    }

    #[tokio::test]
    async fn volume_is_clamped() {
        let run = run(
            Outcome::Ok,
            &["Lima", "C", "no", "no", "no", "yes", "1", "3"],
            RecordingSpeaker::default(),
        )
        .await;

        assert_eq!(run.profile.volume(), 1.0);
        assert!(run.console.printed("Volume set to 1"));
    }

    #[tokio::test]
    async fn out_of_range_voice_is_rejected() {
        let run = run(
            Outcome::Ok,
            &["Lima", "C", "no", "no", "no", "yes", "2", "99"],
            RecordingSpeaker::with_voices(5),
        )
        .await;

        let rejection = "Invalid choice. Please select a valid voice number.";
        assert_eq!(run.profile, VoiceProfile::default());
        assert!(run.console.printed("5. Voice 5"));
        assert!(run.console.printed(rejection));
        assert!(!run.speaker.spoke(rejection));
    }

    #[tokio::test]
    async fn non_numeric_voice_is_rejected() {
        let run = run(
            Outcome::Ok,
            &["Lima", "C", "no", "no", "no", "yes", "2", "two"],
            RecordingSpeaker::with_voices(2),
        )
        .await;

        assert_eq!(run.profile, VoiceProfile::default());
        assert!(run.console.printed("Invalid input. Please enter a number."));
    }

    #[tokio::test]
    async fn voice_selection_sets_voice() {
        let run = run(
            Outcome::Ok,
            &["Lima", "C", "no", "no", "no", "yes", "2", "2"],
            RecordingSpeaker::with_voices(3),
        )
        .await;

        assert_eq!(run.profile.voice_id(), Some("voice-2"));
        assert_eq!(run.profile.volume(), 1.0);
        assert!(run.console.printed("Voice set to Voice 2"));
    }

    #[tokio::test]
    async fn unknown_menu_option_is_rejected() {
        let run = run(
            Outcome::Ok,
            &["Lima", "C", "no", "no", "no", "yes", "3"],
            RecordingSpeaker::default(),
        )
        .await;

        assert!(run.console.printed("Invalid choice. Please choose 1 or 2."));
        assert_eq!(run.profile, VoiceProfile::default());
    }

    #[tokio::test]
    async fn closed_input_ends_with_farewell() {
        let run = run(Outcome::Ok, &["Lima"], RecordingSpeaker::default()).await;

        assert_eq!(run.speaker.count(FAREWELL), 1);
        assert!(!run.speaker.spoken.iter().any(|s| s.contains("degrees")));
    }
}
