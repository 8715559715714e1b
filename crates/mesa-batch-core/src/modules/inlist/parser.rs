use super::model::{Assignment, Inlist, InlistLine, Namelist};
use crate::domain::{BatchError, BatchResult};

const COMMENT_MARKER: char = '!';
const NAMELIST_OPEN: char = '&';
const NAMELIST_CLOSE: char = '/';

pub fn parse_inlist(source: &str) -> BatchResult<Inlist> {
    let mut inlist = Inlist {
        trailing_newline: source.ends_with('\n'),
        ..Inlist::default()
    };
    let mut open: Option<(Namelist, usize)> = None;

    for (index, raw) in source.lines().enumerate() {
        let line_number = index + 1;
        let trimmed = raw.trim();

        if let Some((namelist, opened_at)) = open.as_mut() {
            if trimmed.starts_with(NAMELIST_CLOSE) {
                namelist.footer = raw.to_string();
                if let Some((closed, _)) = open.take() {
                    inlist.namelists.push(closed);
                }
                continue;
            }
            if trimmed.starts_with(NAMELIST_OPEN) {
                return Err(unclosed_namelist(&namelist.name, *opened_at, Some(line_number)));
            }
            namelist.lines.push(classify_line(raw));
            continue;
        }

        if let Some(name) = namelist_header(trimmed) {
            let mut namelist = Namelist::new(&name);
            namelist.header = raw.to_string();
            namelist.trailing.clear();
            open = Some((namelist, line_number));
            continue;
        }

        let line = classify_outside(raw);
        match inlist.namelists.last_mut() {
            Some(namelist) => namelist.trailing.push(line),
            None => inlist.leading.push(line),
        }
    }

    if let Some((namelist, opened_at)) = open {
        return Err(unclosed_namelist(&namelist.name, opened_at, None));
    }

    Ok(inlist)
}

fn unclosed_namelist(name: &str, opened_at: usize, next_at: Option<usize>) -> BatchError {
    let message = match next_at {
        Some(line) => format!(
            "namelist '&{}' opened at line {} is not closed before line {}",
            name, opened_at, line
        ),
        None => format!("namelist '&{}' opened at line {} is never closed", name, opened_at),
    };
    BatchError::parse("PARSE.INLIST_UNCLOSED", message)
}

fn namelist_header(trimmed: &str) -> Option<String> {
    let rest = trimmed.strip_prefix(NAMELIST_OPEN)?;
    let name: String = rest
        .chars()
        .take_while(|ch| ch.is_ascii_alphanumeric() || *ch == '_')
        .collect();
    if name.is_empty() {
        return None;
    }
    Some(name.to_ascii_lowercase())
}

fn classify_outside(raw: &str) -> InlistLine {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        InlistLine::Blank(raw.to_string())
    } else if trimmed.starts_with(COMMENT_MARKER) {
        InlistLine::Comment(raw.to_string())
    } else {
        InlistLine::Other(raw.to_string())
    }
}

fn classify_line(raw: &str) -> InlistLine {
    if let Some(assignment) = parse_assignment(raw) {
        return InlistLine::Assignment(assignment);
    }
    classify_outside(raw)
}

/// Recognizes `key = value [! comment]`, optionally disabled by one or more leading `!`.
fn parse_assignment(raw: &str) -> Option<Assignment> {
    let body = raw.trim_start();
    let mut indent = raw[..raw.len() - body.len()].to_string();
    let mut rest = body;
    let mut enabled = true;

    if rest.starts_with(COMMENT_MARKER) {
        enabled = false;
        rest = rest.trim_start_matches(COMMENT_MARKER);
        let after_marker = rest.trim_start();
        let gap = &rest[..rest.len() - after_marker.len()];
        // one space after `!` belongs to the marker, the rest to the indent
        indent.push_str(gap.strip_prefix(' ').unwrap_or(gap));
        rest = after_marker;
    }

    let key_len = scan_key(rest)?;
    let key = rest[..key_len].trim_end().to_string();
    let after_key = rest[key_len..].trim_start();
    let value_part = after_key.strip_prefix('=')?;
    if value_part.starts_with('=') {
        return None;
    }

    let (value, comment) = split_comment(value_part);
    let value = value.trim();
    if value.is_empty() {
        return None;
    }

    Some(Assignment {
        indent,
        key,
        value: value.to_string(),
        enabled,
        comment: comment.map(|text| text.trim_end().to_string()),
        raw: Some(raw.to_string()),
    })
}

/// Length of an identifier with an optional `( ... )` index.
fn scan_key(text: &str) -> Option<usize> {
    let mut chars = text.char_indices().peekable();
    match chars.peek() {
        Some((_, ch)) if ch.is_ascii_alphabetic() => {}
        _ => return None,
    }

    let mut end = 0;
    while let Some(&(index, ch)) = chars.peek() {
        if ch.is_ascii_alphanumeric() || ch == '_' || ch == '%' {
            end = index + ch.len_utf8();
            chars.next();
        } else {
            break;
        }
    }

    let after_name = &text[end..];
    let spaced = after_name.trim_start();
    if let Some(inner) = spaced.strip_prefix('(') {
        let close = inner.find(')')?;
        let consumed = after_name.len() - spaced.len() + 1 + close + 1;
        end += consumed;
    }
    Some(end)
}

/// Splits at the first `!` that is not inside a quoted string.
fn split_comment(text: &str) -> (&str, Option<&str>) {
    let mut quote: Option<char> = None;
    for (index, ch) in text.char_indices() {
        match quote {
            Some(open) if ch == open => quote = None,
            Some(_) => {}
            None if ch == '\'' || ch == '"' => quote = Some(ch),
            None if ch == COMMENT_MARKER => return (&text[..index], Some(&text[index..])),
            None => {}
        }
    }
    (text, None)
}
