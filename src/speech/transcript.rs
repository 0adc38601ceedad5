use crate::error::SketchError;

/// A recognised word with its position in the track, in seconds.
#[cfg_attr(not(feature = "speech"), allow(dead_code))]
#[derive(Clone, Debug, PartialEq)]
pub struct TimedWord {
    pub text: String,
    pub start_time: f32,
    pub end_time: f32,
}

/// A transcript as the recognizer reports it at `time`.
#[derive(Clone, Debug, PartialEq)]
pub struct Utterance {
    pub time: f32,
    pub text: String,
}

/// Replay timed words the way a streaming recognizer reports them.
///
/// Every word emits the phrase heard so far, so a phrase of three words yields
/// three growing interim results. A silence longer than `phrase_gap` closes
/// the phrase.
#[cfg_attr(not(feature = "speech"), allow(dead_code))]
pub fn interim_utterances(words: &[TimedWord], phrase_gap: f32) -> Vec<Utterance> {
    let mut utterances = Vec::with_capacity(words.len());
    let mut phrase = String::new();
    let mut phrase_end = f32::NEG_INFINITY;

    for word in words {
        let text = word.text.trim();
        if text.is_empty() {
            continue;
        }
        if word.start_time - phrase_end > phrase_gap {
            phrase.clear();
        }
        if !phrase.is_empty() {
            phrase.push(' ');
        }
        phrase.push_str(text);
        phrase_end = word.end_time;

        utterances.push(Utterance {
            time: word.end_time,
            text: phrase.clone(),
        });
    }
    utterances
}

/// Parse a scripted `TIME:TEXT` utterance, TIME in seconds.
pub fn parse_utterance(input: &str) -> Result<Utterance, SketchError> {
    let malformed = || SketchError::MalformedUtterance(input.to_string());

    let (time, text) = input.split_once(':').ok_or_else(malformed)?;
    let time: f32 = time.trim().parse().map_err(|_| malformed())?;
    let text = text.trim();
    if !time.is_finite() || time < 0.0 || text.is_empty() {
        return Err(malformed());
    }
    Ok(Utterance {
        time,
        text: text.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn word(text: &str, start: f32, end: f32) -> TimedWord {
        TimedWord {
            text: text.to_string(),
            start_time: start,
            end_time: end,
        }
    }

    #[test]
    fn interim_results_grow_within_a_phrase() {
        let words = vec![
            word("make", 0.0, 0.2),
            word("it", 0.3, 0.4),
            word(" black", 0.5, 0.8),
            word("faster", 2.0, 2.3),
        ];
        let utterances = interim_utterances(&words, 0.5);
        let texts: Vec<(f32, &str)> = utterances
            .iter()
            .map(|u| (u.time, u.text.as_str()))
            .collect();
        assert_eq!(
            texts,
            vec![
                (0.2, "make"),
                (0.4, "make it"),
                (0.8, "make it black"),
                (2.3, "faster"),
            ]
        );
    }

    #[test]
    fn blank_words_are_skipped() {
        let words = vec![word(" ", 0.0, 0.1), word("white", 0.1, 0.3)];
        let utterances = interim_utterances(&words, 0.5);
        assert_eq!(utterances.len(), 1);
        assert_eq!(utterances[0].text, "white");
        assert!(interim_utterances(&[], 0.5).is_empty());
    }

    #[test]
    fn parses_scripted_utterance() {
        let u = parse_utterance("12.5: turn it black").unwrap();
        assert_eq!(u.time, 12.5);
        assert_eq!(u.text, "turn it black");

        let u = parse_utterance("3:time: colon kept").unwrap();
        assert_eq!(u.text, "time: colon kept");
    }

    #[test]
    fn rejects_malformed_utterances() {
        for input in ["no time", "abc:white", "-1:white", "2:", "inf:white"] {
            assert_eq!(
                parse_utterance(input),
                Err(SketchError::MalformedUtterance(input.to_string()))
            );
        }
    }
}
