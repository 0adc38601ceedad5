use std::fmt;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Command {
    White,
    Black,
    Faster,
    Slower,
}

impl Command {
    /// Checked in this order; the first keyword found in the word wins.
    const ALL: [Command; 4] = [Command::White, Command::Black, Command::Faster, Command::Slower];

    pub fn keyword(self) -> &'static str {
        match self {
            Command::White => "white",
            Command::Black => "black",
            Command::Faster => "faster",
            Command::Slower => "slower",
        }
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.keyword())
    }
}

/// Edge-triggered voice commands: a command fires only when it differs from the last one.
#[derive(Debug, Default)]
pub struct SpeechCommandInterpreter {
    last: Option<Command>,
}

impl SpeechCommandInterpreter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inspect the trailing word of a (possibly interim) transcript.
    pub fn interpret(&mut self, utterance: &str) -> Option<Command> {
        let word = utterance.split_whitespace().last()?.to_lowercase();
        let command = Command::ALL
            .into_iter()
            .find(|c| word.contains(c.keyword()) && self.last != Some(*c))?;
        self.last = Some(command);
        Some(command)
    }
}
