/// Parser for the line-oriented command front end
use crate::span::{Span, Spanned};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Pick,
    Reset,
    AddIdea(String),
    DeleteIdea(usize),
    AddPlace { idea: usize, text: String },
    DeletePlace { idea: usize, place: usize },
    List,
    Lists,
    CreateList(String),
    DeleteList(String),
    SwitchList(String),
    Help,
    Quit,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CommandError {
    #[error("empty command")]
    Empty,
    #[error("unknown command '{name}'")]
    UnknownCommand { name: String, span: Span },
    #[error("missing {what}")]
    MissingArgument { what: &'static str, span: Span },
    #[error("'{text}' is not a valid number")]
    InvalidNumber { text: String, span: Span },
    #[error("unexpected argument '{text}'")]
    UnexpectedArgument { text: String, span: Span },
}

impl CommandError {
    /// Get the span associated with this error
    pub fn span(&self) -> Span {
        match self {
            CommandError::Empty => Span::at(0),
            CommandError::UnknownCommand { span, .. } => *span,
            CommandError::MissingArgument { span, .. } => *span,
            CommandError::InvalidNumber { span, .. } => *span,
            CommandError::UnexpectedArgument { span, .. } => *span,
        }
    }
}

/// Usage text listing every command
pub const HELP: &str = "\
Commands:
  pick                    Show an idea that has not come up yet
  reset                   Forget which ideas have been shown
  add <text>              Add an idea
  delete <idea>           Delete an idea by number
  place <idea> <text>     Add a place to an idea
  unplace <idea> <place>  Delete a place by number
  list                    Show every idea in the active list
  lists                   Show all lists
  new <name>              Create a list and switch to it
  drop <list>             Delete a list (key or name)
  switch <list>           Switch to another list (key or name)
  help                    Show this message
  quit                    Exit";

/// Cursor over the whitespace-separated words of a line
struct Words<'a> {
    line: &'a str,
    pos: usize,
}

impl<'a> Words<'a> {
    fn new(line: &'a str) -> Self {
        Words { line, pos: 0 }
    }

    fn skip_whitespace(&mut self) {
        let rest = &self.line[self.pos..];
        self.pos += rest.len() - rest.trim_start().len();
    }

    fn next_word(&mut self) -> Option<Spanned<&'a str>> {
        self.skip_whitespace();
        let rest = &self.line[self.pos..];
        if rest.is_empty() {
            return None;
        }
        let len = rest.find(char::is_whitespace).unwrap_or(rest.len());
        let start = self.pos;
        self.pos += len;
        Some(Spanned::new(&rest[..len], Span::new(start, self.pos)))
    }

    /// Everything left on the line, trimmed
    fn rest(&mut self) -> Option<Spanned<&'a str>> {
        self.skip_whitespace();
        let text = self.line[self.pos..].trim_end();
        if text.is_empty() {
            return None;
        }
        let start = self.pos;
        self.pos = self.line.len();
        Some(Spanned::new(text, Span::new(start, start + text.len())))
    }

    fn end(&self) -> Span {
        Span::at(self.line.trim_end().len())
    }

    fn number(&mut self, what: &'static str) -> Result<usize, CommandError> {
        let word = self.next_word().ok_or(CommandError::MissingArgument {
            what,
            span: self.end(),
        })?;
        word.value
            .parse::<usize>()
            .map_err(|_| CommandError::InvalidNumber {
                text: word.value.to_string(),
                span: word.span,
            })
    }

    fn text(&mut self, what: &'static str) -> Result<String, CommandError> {
        self.rest()
            .map(|text| text.value.to_string())
            .ok_or(CommandError::MissingArgument {
                what,
                span: self.end(),
            })
    }

    fn finish(&mut self) -> Result<(), CommandError> {
        match self.rest() {
            None => Ok(()),
            Some(extra) => Err(CommandError::UnexpectedArgument {
                text: extra.value.to_string(),
                span: extra.span,
            }),
        }
    }
}

/// Parse one input line into a command
///
/// # Example
/// ```
/// use idea_roulette::command::{parse, Command};
///
/// let command = parse("place 3 Park Skazka").unwrap();
/// assert_eq!(command, Command::AddPlace { idea: 3, text: "Park Skazka".to_string() });
/// ```
pub fn parse(line: &str) -> Result<Command, CommandError> {
    let mut words = Words::new(line);
    let name = words.next_word().ok_or(CommandError::Empty)?;

    let command = match name.value.to_lowercase().as_str() {
        "pick" | "next" => Command::Pick,
        "reset" => Command::Reset,
        "add" => return Ok(Command::AddIdea(words.text("idea text")?)),
        "delete" => Command::DeleteIdea(words.number("idea number")?),
        "place" => {
            let idea = words.number("idea number")?;
            let text = words.text("place text")?;
            return Ok(Command::AddPlace { idea, text });
        }
        "unplace" => {
            let idea = words.number("idea number")?;
            let place = words.number("place number")?;
            Command::DeletePlace { idea, place }
        }
        "list" => Command::List,
        "lists" => Command::Lists,
        "new" => return Ok(Command::CreateList(words.text("list name")?)),
        "drop" => Command::DeleteList(words.text("list name")?),
        "switch" => Command::SwitchList(words.text("list name")?),
        "help" | "?" => Command::Help,
        "quit" | "exit" => Command::Quit,
        other => {
            return Err(CommandError::UnknownCommand {
                name: other.to_string(),
                span: name.span,
            })
        }
    };

    words.finish()?;
    Ok(command)
}
