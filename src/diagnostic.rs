/// Diagnostic reporting using ariadne for readable command errors
use crate::command::CommandError;
use crate::span::Span;
use ariadne::{Color, Config, Label, Report, ReportKind, Source};
use std::ops::Range;

/// Number of characters before a byte offset
fn char_offset(source: &str, byte: usize) -> usize {
    let byte = byte.min(source.len());
    source
        .char_indices()
        .take_while(|(idx, _)| *idx < byte)
        .count()
}

/// Convert a byte span to the character range ariadne expects
fn span_to_range(span: Span, source: &str) -> Range<usize> {
    let start = char_offset(source, span.start);
    // ariadne needs at least one character to point at
    if span.is_empty() {
        let last = source.chars().count().saturating_sub(1);
        let start = start.min(last);
        start..start + 1
    } else {
        start..char_offset(source, span.end)
    }
}

/// Report a command error against the line that produced it
pub fn report_command_error(
    source_name: &str,
    source: &str,
    error: &CommandError,
    color: bool,
) -> String {
    // Pad so a zero-width span at the end of the line still has something under it
    let padded = format!("{} ", source);
    let range = span_to_range(error.span(), &padded);
    let mut output = Vec::new();

    let builder = Report::build(ReportKind::Error, source_name, range.start)
        .with_config(Config::default().with_color(color));

    let report = match error {
        CommandError::Empty => builder
            .with_message("Empty command")
            .with_help("Type 'help' to see the commands")
            .finish(),
        CommandError::UnknownCommand { name, .. } => builder
            .with_message(format!("Unknown command: '{}'", name))
            .with_label(
                Label::new((source_name, range))
                    .with_message("not a command")
                    .with_color(Color::Red),
            )
            .with_help("Type 'help' to see the commands")
            .finish(),
        CommandError::MissingArgument { what, .. } => builder
            .with_message(format!("Missing {}", what))
            .with_label(
                Label::new((source_name, range))
                    .with_message(format!("expected {} here", what))
                    .with_color(Color::Red),
            )
            .finish(),
        CommandError::InvalidNumber { text, .. } => builder
            .with_message(format!("Invalid number: '{}'", text))
            .with_label(
                Label::new((source_name, range))
                    .with_message("expected a positive whole number")
                    .with_color(Color::Red),
            )
            .with_note("Ideas and places are numbered as shown by 'list'")
            .finish(),
        CommandError::UnexpectedArgument { text, .. } => builder
            .with_message(format!("Unexpected argument: '{}'", text))
            .with_label(
                Label::new((source_name, range))
                    .with_message("this command takes no more arguments")
                    .with_color(Color::Yellow),
            )
            .finish(),
    };

    if report
        .write((source_name, Source::from(padded.as_str())), &mut output)
        .is_err()
    {
        return format!("Error: {}\n", error);
    }

    String::from_utf8_lossy(&output).into_owned()
}
