use crate::audio::features::AnalysisRecord;
use crate::sketch::Event;
use crate::speech::transcript::Utterance;

/// An event and the playback position, in seconds, it is delivered at.
#[derive(Clone, Debug)]
pub struct TimedEvent {
    pub time: f32,
    pub event: Event,
}

/// Simulated playback of a decoded track.
#[derive(Clone, Copy, Debug)]
pub struct Playback {
    pub sample_rate: u32,
    pub buffer_size: usize,
    pub fps: u32,
    pub duration: f32,
}

impl Playback {
    /// The analyzer fires once buffer `k` has been completely played.
    pub fn analysis_time(&self, k: usize) -> f32 {
        ((k + 1) * self.buffer_size) as f32 / self.sample_rate as f32
    }

    /// Render ticks that fit in the track.
    pub fn frame_count(&self) -> usize {
        if self.fps == 0 || self.duration <= 0.0 {
            return 0;
        }
        (self.duration * self.fps as f32).ceil() as usize
    }

    /// Every event of one playback, ordered by time.
    ///
    /// Simultaneous events keep the order start, analysis, speech, render, end.
    pub fn timeline(&self, records: Vec<AnalysisRecord>, utterances: Vec<Utterance>) -> Vec<TimedEvent> {
        let frames = self.frame_count();
        let mut events = Vec::with_capacity(records.len() + utterances.len() + frames + 2);

        events.push(TimedEvent { time: 0.0, event: Event::PlaybackStarted });
        events.extend(records.into_iter().enumerate().map(|(k, record)| TimedEvent {
            time: self.analysis_time(k),
            event: Event::Analysis(record),
        }));
        events.extend(utterances.into_iter().map(|u| TimedEvent {
            time: u.time,
            event: Event::Speech(u.text),
        }));
        events.extend((0..frames).map(|n| TimedEvent {
            time: n as f32 / self.fps as f32,
            event: Event::Render,
        }));
        events.push(TimedEvent { time: self.duration, event: Event::PlaybackEnded });

        // stable: ties keep insertion order
        events.sort_by(|a, b| a.time.total_cmp(&b.time));
        events
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(events: &[TimedEvent]) -> Vec<&'static str> {
        events
            .iter()
            .map(|e| match e.event {
                Event::PlaybackStarted => "start",
                Event::Analysis(_) => "analysis",
                Event::Speech(_) => "speech",
                Event::Render => "render",
                Event::PlaybackEnded => "end",
            })
            .collect()
    }

    fn playback() -> Playback {
        // 4 buffers of 0.25s, 4 frames of 0.25s
        Playback { sample_rate: 2048, buffer_size: 512, fps: 4, duration: 1.0 }
    }

    #[test]
    fn interleaves_by_time() {
        let records = vec![AnalysisRecord::new(); 4];
        let utterances = vec![Utterance { time: 0.6, text: "black".into() }];
        let events = playback().timeline(records, utterances);

        assert_eq!(
            kinds(&events),
            vec![
                "start", "render", "analysis", "render", "analysis", "render", "speech",
                "analysis", "render", "analysis", "end",
            ]
        );
        assert_eq!(events.last().map(|e| e.time), Some(1.0));
    }

    #[test]
    fn analysis_after_full_buffer() {
        let p = playback();
        assert_eq!(p.analysis_time(0), 0.25);
        assert_eq!(p.analysis_time(3), 1.0);
    }

    #[test]
    fn frame_count_rounds_up() {
        let p = Playback { sample_rate: 44100, buffer_size: 512, fps: 60, duration: 0.51 };
        assert_eq!(p.frame_count(), 31);
        let silent = Playback { duration: 0.0, ..p };
        assert_eq!(silent.frame_count(), 0);
        assert_eq!(kinds(&silent.timeline(Vec::new(), Vec::new())), vec!["start", "end"]);
    }

    #[test]
    fn speech_at_zero_follows_start() {
        let utterances = vec![Utterance { time: 0.0, text: "white".into() }];
        let events = playback().timeline(Vec::new(), utterances);
        assert_eq!(&kinds(&events)[..3], &["start", "speech", "render"]);
    }
}
