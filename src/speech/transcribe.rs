use anyhow::{Context, Result};
use std::path::Path;
use whisper_rs::{FullParams, SamplingStrategy, WhisperContext, WhisperContextParameters};

use super::transcript::TimedWord;

const WHISPER_RATE: u32 = 16_000;
/// Whisper token timestamps are in centiseconds.
const TICKS_PER_SECOND: f32 = 100.0;

/// Offline stand-in for the browser's continuous speech recognition.
pub struct Recognizer {
    ctx: WhisperContext,
    language: Option<String>,
}

impl Recognizer {
    pub fn new(model_path: &Path, language: Option<&str>) -> Result<Self> {
        let path = model_path
            .to_str()
            .context("Model path is not valid UTF-8")?;
        let ctx = WhisperContext::new_with_params(path, WhisperContextParameters::default())
            .map_err(|e| anyhow::anyhow!("Failed to load speech model: {}", e))?;
        Ok(Self {
            ctx,
            language: language.map(String::from),
        })
    }

    /// Recognise mono samples into words with track-relative timing.
    pub fn recognize(&self, samples: &[f32], sample_rate: u32) -> Result<Vec<TimedWord>> {
        let resampled;
        let input = if sample_rate == WHISPER_RATE {
            samples
        } else {
            resampled = resample(samples, sample_rate, WHISPER_RATE)?;
            &resampled[..]
        };

        let mut params = FullParams::new(SamplingStrategy::Greedy { best_of: 1 });
        params.set_token_timestamps(true);
        params.set_print_special(false);
        params.set_print_progress(false);
        params.set_print_realtime(false);
        params.set_print_timestamps(false);
        if let Some(lang) = self.language.as_deref() {
            params.set_language(Some(lang));
        }

        let mut state = self
            .ctx
            .create_state()
            .map_err(|e| anyhow::anyhow!("Failed to create recognizer state: {}", e))?;
        state
            .full(params, input)
            .map_err(|e| anyhow::anyhow!("Speech recognition failed: {}", e))?;

        let mut words = WordBuilder::default();
        for i in 0..state.full_n_segments() {
            let segment = state
                .get_segment(i)
                .ok_or_else(|| anyhow::anyhow!("Segment {} out of bounds", i))?;
            for j in 0..segment.n_tokens() {
                let Some(token) = segment.get_token(j) else {
                    continue;
                };
                let data = token.token_data();
                if data.id < 0 {
                    continue;
                }
                if let Ok(bytes) = token.to_bytes() {
                    words.push_token(bytes, data.t0, data.t1);
                }
            }
            // words never span segments
            words.flush();
        }

        let words = words.finish();
        log::debug!("Recognised {} words", words.len());
        Ok(words)
    }
}

/// Joins BPE tokens into whole words. A leading space starts a new word.
#[derive(Default)]
struct WordBuilder {
    words: Vec<TimedWord>,
    bytes: Vec<u8>,
    start: i64,
    end: i64,
}

impl WordBuilder {
    fn push_token(&mut self, bytes: &[u8], t0: i64, t1: i64) {
        // control tokens such as [_BEG_] or [_TT_42]
        if bytes.is_empty() || (bytes.starts_with(b"[_") && bytes.ends_with(b"]")) {
            return;
        }
        let boundary = bytes.starts_with(b" ") || bytes.starts_with(&[0xC4, 0xA0]);
        if boundary {
            self.flush();
        }
        if self.bytes.is_empty() {
            self.start = t0;
        }
        self.end = t1;
        self.bytes.extend_from_slice(bytes);
    }

    fn flush(&mut self) {
        if self.bytes.is_empty() {
            return;
        }
        let text = String::from_utf8_lossy(&self.bytes).trim().to_string();
        self.bytes.clear();
        if !text.is_empty() {
            self.words.push(TimedWord {
                text,
                start_time: self.start as f32 / TICKS_PER_SECOND,
                end_time: self.end as f32 / TICKS_PER_SECOND,
            });
        }
    }

    fn finish(mut self) -> Vec<TimedWord> {
        self.flush();
        self.words
    }
}

fn resample(samples: &[f32], from: u32, to: u32) -> Result<Vec<f32>> {
    use rubato::{
        Resampler, SincFixedIn, SincInterpolationParameters, SincInterpolationType, WindowFunction,
    };

    let params = SincInterpolationParameters {
        sinc_len: 256,
        f_cutoff: 0.95,
        interpolation: SincInterpolationType::Linear,
        oversampling_factor: 256,
        window: WindowFunction::BlackmanHarris2,
    };
    let ratio = f64::from(to) / f64::from(from);
    let mut resampler = SincFixedIn::<f32>::new(ratio, 2.0, params, samples.len(), 1)
        .context("Failed to create resampler")?;
    let output = resampler
        .process(&[samples], None)
        .context("Resampling failed")?;
    Ok(output.into_iter().next().unwrap_or_default())
}
