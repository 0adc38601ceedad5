pub mod bucket;
pub mod mapper;
pub mod session;
pub mod smoothing;
pub mod speech;
pub mod stats;

use crate::audio::features::AnalysisRecord;
use crate::config::Config;
use crate::error::SketchError;
use crate::render::scene::Scene;
use crate::render::surface::DrawSurface;
use mapper::{VisualParameterMapper, VisualParameters, REQUIRED_FEATURES};
use session::Session;
use speech::{Command, SpeechCommandInterpreter};
use stats::SessionSummary;

/// Inputs delivered to the sketch, one at a time.
#[derive(Clone, Debug)]
pub enum Event {
    PlaybackStarted,
    Analysis(AnalysisRecord),
    /// A (possibly interim) recognised transcript.
    Speech(String),
    Render,
    PlaybackEnded,
}

/// Single-threaded dispatcher holding all sketch state.
///
/// Each event is applied completely before the next one is read, so a render
/// always sees the parameters of the latest analysis callback.
pub struct Sketch {
    config: Config,
    mapper: VisualParameterMapper,
    session: Session,
    speech: SpeechCommandInterpreter,
    scene: Scene,
    background: u8,
    speed_multiplier: f32,
    frame_count: u64,
    has_features: bool,
}

impl Sketch {
    pub fn new(config: Config) -> Result<Self, SketchError> {
        config.validate()?;
        let features = config.feature_set();
        let missing = features.missing(&REQUIRED_FEATURES);
        if !missing.is_empty() {
            let names: Vec<&str> = missing.iter().map(|f| f.as_str()).collect();
            log::warn!(
                "Features not extracted, their visuals will hold still: {}",
                names.join(", ")
            );
        }

        Ok(Self {
            mapper: VisualParameterMapper::new(&config)?,
            session: Session::new(features),
            speech: SpeechCommandInterpreter::new(),
            scene: Scene::new(),
            background: config.speech.initial_background,
            speed_multiplier: 1.0,
            frame_count: 0,
            has_features: false,
            config,
        })
    }

    pub fn frame_count(&self) -> u64 {
        self.frame_count
    }

    /// Parameters drawn by the next render, once an analysis callback has arrived.
    pub fn params(&self) -> Option<&VisualParameters> {
        self.has_features.then(|| self.mapper.params())
    }

    /// Apply one event. Playback end yields the session summary.
    pub fn dispatch(&mut self, event: Event, surface: &mut dyn DrawSurface) -> Option<SessionSummary> {
        match event {
            Event::PlaybackStarted => {
                log::debug!("Playback started");
                self.session.start();
                self.mapper.reset();
                self.has_features = false;
            }
            Event::Analysis(record) => {
                self.mapper.update(&record, self.speed_multiplier);
                self.has_features = true;
                self.session.push(record);
            }
            Event::Speech(transcript) => {
                if let Some(command) = self.speech.interpret(&transcript) {
                    self.apply(command);
                }
            }
            Event::Render => {
                self.scene.draw_frame(
                    surface,
                    &self.config,
                    self.background,
                    self.frame_count,
                    self.has_features.then(|| self.mapper.params()),
                );
                self.frame_count += 1;
            }
            Event::PlaybackEnded => {
                log::debug!(
                    "Playback ended after {} frames, {} analysis records",
                    self.frame_count,
                    self.session.len()
                );
                return self.session.finish().map(|grouped| stats::summarize(&grouped));
            }
        }
        None
    }

    fn apply(&mut self, command: Command) {
        match command {
            Command::White => self.background = 255,
            Command::Black => self.background = 0,
            Command::Faster => self.speed_multiplier += self.config.speech.speed_step,
            Command::Slower => self.speed_multiplier -= self.config.speech.speed_step,
        }
        log::info!(
            "Voice command '{}': background {}, speed x{}",
            command,
            self.background,
            self.speed_multiplier
        );
    }
}
