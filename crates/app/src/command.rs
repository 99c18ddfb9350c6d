use std::fmt;
use std::path::PathBuf;

use quiz_core::model::ChapterId;

/// One line typed at the prompt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Chapters,
    Chapter(ChapterId),
    /// Zero-based option index.
    Pick(usize),
    Next,
    Prev,
    Stats,
    Export(Option<PathBuf>),
    Import(PathBuf),
    Reset,
    Help,
    Quit,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommandError {
    Unknown(String),
    MissingArgument { command: &'static str },
    InvalidChapter { raw: String },
    InvalidOption { raw: String },
}

impl fmt::Display for CommandError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CommandError::Unknown(word) => write!(f, "unknown command: {word} (try `help`)"),
            CommandError::MissingArgument { command } => {
                write!(f, "{command} needs an argument (try `help`)")
            }
            CommandError::InvalidChapter { raw } => write!(f, "not a chapter number: {raw}"),
            CommandError::InvalidOption { raw } => {
                write!(f, "not an option: {raw} (use a letter like A or a number like 1)")
            }
        }
    }
}

impl std::error::Error for CommandError {}

impl Command {
    /// Parse a prompt line. Blank lines yield `Ok(None)`.
    pub fn parse(line: &str) -> Result<Option<Self>, CommandError> {
        let mut words = line.split_whitespace();
        let Some(word) = words.next() else {
            return Ok(None);
        };
        let rest = words.collect::<Vec<_>>().join(" ");
        let arg = Some(rest.as_str()).filter(|rest| !rest.is_empty());

        let command = match word.to_ascii_lowercase().as_str() {
            "chapters" | "ls" => Command::Chapters,
            "chapter" | "ch" => {
                let raw = arg.ok_or(CommandError::MissingArgument { command: "chapter" })?;
                let id = raw
                    .parse::<ChapterId>()
                    .map_err(|_| CommandError::InvalidChapter { raw: raw.to_owned() })?;
                Command::Chapter(id)
            }
            "pick" => {
                let raw = arg.ok_or(CommandError::MissingArgument { command: "pick" })?;
                Command::Pick(parse_option(raw)?)
            }
            "next" => Command::Next,
            "prev" | "back" => Command::Prev,
            "stats" => Command::Stats,
            "export" => Command::Export(arg.map(PathBuf::from)),
            "import" => {
                let raw = arg.ok_or(CommandError::MissingArgument { command: "import" })?;
                Command::Import(PathBuf::from(raw))
            }
            "reset" => Command::Reset,
            "help" | "?" => Command::Help,
            "quit" | "exit" => Command::Quit,
            // A bare option letter or number is a pick.
            other => match parse_option(other) {
                Ok(index) if arg.is_none() => Command::Pick(index),
                _ => return Err(CommandError::Unknown(word.to_owned())),
            },
        };
        Ok(Some(command))
    }
}

/// `A`/`a` and `1` both mean the first option.
fn parse_option(raw: &str) -> Result<usize, CommandError> {
    let invalid = || CommandError::InvalidOption { raw: raw.to_owned() };
    let mut chars = raw.chars();
    if let (Some(letter), None) = (chars.next(), chars.next()) {
        if letter.is_ascii_alphabetic() {
            let offset = letter.to_ascii_uppercase() as usize - 'A' as usize;
            return Ok(offset);
        }
    }
    match raw.parse::<usize>() {
        Ok(number) if number > 0 => Ok(number - 1),
        _ => Err(invalid()),
    }
}

/// Display label for a zero-based option index: `A`, `B`, ...
#[must_use]
pub fn option_label(index: usize) -> String {
    u8::try_from(index)
        .ok()
        .filter(|offset| *offset < 26)
        .map_or_else(|| (index + 1).to_string(), |offset| char::from(b'A' + offset).to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_lines_are_ignored() {
        assert_eq!(Command::parse("   ").unwrap(), None);
    }

    #[test]
    fn parses_navigation_words() {
        assert_eq!(Command::parse("next").unwrap(), Some(Command::Next));
        assert_eq!(Command::parse(" PREV ").unwrap(), Some(Command::Prev));
        assert_eq!(
            Command::parse("chapter 2").unwrap(),
            Some(Command::Chapter(ChapterId::new(2)))
        );
    }

    #[test]
    fn picks_accept_letters_and_numbers() {
        assert_eq!(Command::parse("pick b").unwrap(), Some(Command::Pick(1)));
        assert_eq!(Command::parse("pick 3").unwrap(), Some(Command::Pick(2)));
        assert_eq!(Command::parse("C").unwrap(), Some(Command::Pick(2)));
        assert_eq!(Command::parse("4").unwrap(), Some(Command::Pick(3)));
        assert_eq!(Command::parse("b").unwrap(), Some(Command::Pick(1)));
    }

    #[test]
    fn rejects_bad_arguments() {
        assert_eq!(
            Command::parse("pick 0"),
            Err(CommandError::InvalidOption { raw: "0".into() })
        );
        assert_eq!(
            Command::parse("chapter zero"),
            Err(CommandError::InvalidChapter {
                raw: "zero".into()
            })
        );
        assert_eq!(
            Command::parse("import"),
            Err(CommandError::MissingArgument { command: "import" })
        );
        assert_eq!(
            Command::parse("dance"),
            Err(CommandError::Unknown("dance".into()))
        );
    }

    #[test]
    fn export_path_is_optional() {
        assert_eq!(Command::parse("export").unwrap(), Some(Command::Export(None)));
        assert_eq!(
            Command::parse("export backup.json").unwrap(),
            Some(Command::Export(Some(PathBuf::from("backup.json"))))
        );
    }

    #[test]
    fn labels_options_with_letters() {
        assert_eq!(option_label(0), "A");
        assert_eq!(option_label(3), "D");
        assert_eq!(option_label(26), "27");
    }
}
