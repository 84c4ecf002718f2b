//! Lexer/parser for the annotation DSL.

use super::{Annotation, AnnotationError, Attributes, POSITIONAL};

/// Scans documentation text line by line and parses every line whose
/// trimmed form starts with `@`.
///
/// Returns [`AnnotationError::NoComments`] when nothing parses, which the
/// route builder treats as "use the convention path".
pub fn parse_doc(doc: &str) -> Result<Vec<Annotation>, AnnotationError> {
    let annotations: Vec<Annotation> = doc
        .lines()
        .map(str::trim)
        .filter_map(|line| line.strip_prefix('@'))
        .filter_map(parse_line)
        .collect();

    if annotations.is_empty() {
        Err(AnnotationError::NoComments)
    } else {
        Ok(annotations)
    }
}

/// Parses one directive with the leading `@` already removed.
///
/// Returns `None` when the line does not start with a directive name.
pub fn parse_line(text: &str) -> Option<Annotation> {
    let name_len = directive_name_len(text)?;
    let (name, rest) = text.split_at(name_len);

    let mut annotation = Annotation::new(name);

    let remainder = if let Some(group) = rest.strip_prefix('(') {
        match closing_paren(group) {
            Some(end) => {
                annotation.attributes = parse_arguments(&group[..end]);
                &group[end + 1..]
            }
            // Unterminated group: everything after `(` is arguments.
            None => {
                annotation.attributes = parse_arguments(group);
                ""
            }
        }
    } else {
        rest
    };

    annotation.description = remainder.split_whitespace().map(str::to_string).collect();
    Some(annotation)
}

/// Length of a leading `[A-Za-z_][A-Za-z0-9_]+` match.
fn directive_name_len(text: &str) -> Option<usize> {
    let mut chars = text.char_indices();
    match chars.next() {
        Some((_, c)) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return None,
    }
    let end = chars
        .find(|(_, c)| !(c.is_ascii_alphanumeric() || *c == '_'))
        .map(|(i, _)| i)
        .unwrap_or(text.len());
    // The name needs at least two characters.
    if end < 2 {
        None
    } else {
        Some(end)
    }
}

/// Byte index of the first `)` outside double quotes.
fn closing_paren(text: &str) -> Option<usize> {
    let mut quoted = false;
    for (i, c) in text.char_indices() {
        match c {
            '"' => quoted = !quoted,
            ')' if !quoted => return Some(i),
            _ => {}
        }
    }
    None
}

fn parse_arguments(arguments: &str) -> Attributes {
    let mut attributes = Attributes::new();
    for argument in split_outside_quotes(arguments, ',') {
        let argument = argument.trim();
        if argument.is_empty() {
            continue;
        }
        match find_outside_quotes(argument, '=') {
            Some(eq) => {
                let key = argument[..eq].trim();
                let value = argument[eq + 1..].trim();
                attributes.insert(key.to_string(), value.to_string());
            }
            None => {
                attributes.insert(POSITIONAL.to_string(), argument.to_string());
            }
        }
    }
    attributes
}

fn split_outside_quotes(text: &str, separator: char) -> Vec<&str> {
    let mut pieces = Vec::new();
    let mut quoted = false;
    let mut start = 0;
    for (i, c) in text.char_indices() {
        if c == '"' {
            quoted = !quoted;
        } else if c == separator && !quoted {
            pieces.push(&text[start..i]);
            start = i + c.len_utf8();
        }
    }
    pieces.push(&text[start..]);
    pieces
}

fn find_outside_quotes(text: &str, needle: char) -> Option<usize> {
    let mut quoted = false;
    for (i, c) in text.char_indices() {
        if c == '"' {
            quoted = !quoted;
        } else if c == needle && !quoted {
            return Some(i);
        }
    }
    None
}
