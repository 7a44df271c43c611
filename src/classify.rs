//! Per-line heuristics for spotting namespace and type declarations.
//!
//! Everything here works on a single normalized line and keeps no state;
//! `probe` drives it across a file.

use serde::Serialize;

pub const ATTRIBUTE_MARKER: &str = "#[";

/// The keyword that opened a declaration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DeclarationKind {
    Class,
    Interface,
    Trait,
    Enum,
}

impl DeclarationKind {
    pub fn keyword(self) -> &'static str {
        match self {
            Self::Class => "class",
            Self::Interface => "interface",
            Self::Trait => "trait",
            Self::Enum => "enum",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LineKind {
    Continue,
    Namespace(String),
    Declaration {
        kind: DeclarationKind,
        basename: String,
    },
    StopFile,
}

// Most specific first: a line is attributed to the first prefix it matches.
const DECLARATION_PREFIXES: &[(&str, DeclarationKind)] = &[
    ("final readonly class ", DeclarationKind::Class),
    ("readonly final class ", DeclarationKind::Class),
    ("abstract readonly class ", DeclarationKind::Class),
    ("readonly abstract class ", DeclarationKind::Class),
    ("final abstract class ", DeclarationKind::Class),
    ("abstract final class ", DeclarationKind::Class),
    ("final class ", DeclarationKind::Class),
    ("abstract class ", DeclarationKind::Class),
    ("readonly class ", DeclarationKind::Class),
    ("class ", DeclarationKind::Class),
    ("interface ", DeclarationKind::Interface),
    ("trait ", DeclarationKind::Trait),
    ("enum ", DeclarationKind::Enum),
];

const NAMESPACE_PREFIX: &str = "namespace ";
const OPEN_TAG: &str = "<?php";

/// Collapses whitespace runs, trims, drops a leading `<?php` open tag, and
/// rewrites a spaced-out leading attribute marker (`#  [`) to `#[`.
pub fn normalize_line(raw: &str) -> String {
    let collapsed = raw.split_whitespace().collect::<Vec<_>>().join(" ");
    let line = match collapsed.strip_prefix(OPEN_TAG) {
        Some("") => "",
        Some(rest) if rest.starts_with(' ') => &rest[1..],
        _ => collapsed.as_str(),
    };
    match line.strip_prefix("# [") {
        Some(rest) => format!("{ATTRIBUTE_MARKER}{rest}"),
        None => line.to_string(),
    }
}

/// Classifies one line already passed through [`normalize_line`].
pub fn classify_line<S: AsRef<str>>(line: &str, stop_tokens: &[S]) -> LineKind {
    let line = strip_leading_attributes(line);
    if line.is_empty() {
        return LineKind::Continue;
    }

    if let Some(rest) = line.strip_prefix(NAMESPACE_PREFIX) {
        return LineKind::Namespace(namespace_name(rest));
    }
    if line == "namespace{" || line == "namespace {" {
        return LineKind::Namespace(String::new());
    }

    for (prefix, kind) in DECLARATION_PREFIXES {
        if let Some(rest) = line.strip_prefix(prefix) {
            return match declared_name(rest) {
                Some(basename) => LineKind::Declaration {
                    kind: *kind,
                    basename,
                },
                None => LineKind::Continue,
            };
        }
    }

    if stop_tokens
        .iter()
        .any(|token| starts_with_token(line, token.as_ref()))
    {
        return LineKind::StopFile;
    }

    LineKind::Continue
}

fn namespace_name(rest: &str) -> String {
    let end = rest.find([';', '{']).unwrap_or(rest.len());
    rest[..end].trim().trim_end_matches('\\').to_string()
}

fn declared_name(rest: &str) -> Option<String> {
    let end = rest
        .find(|c: char| c.is_whitespace() || matches!(c, '{' | ':' | '(' | ';'))
        .unwrap_or(rest.len());
    let token = &rest[..end];
    let valid = token
        .chars()
        .next()
        .is_some_and(|c| c.is_alphabetic() || c == '_' || !c.is_ascii())
        && token
            .chars()
            .all(|c| c.is_alphanumeric() || c == '_' || !c.is_ascii());
    valid.then(|| token.to_string())
}

fn starts_with_token(line: &str, token: &str) -> bool {
    match line.strip_prefix(token) {
        Some(rest) => !rest
            .chars()
            .next()
            .is_some_and(|c| c.is_alphanumeric() || c == '_'),
        None => false,
    }
}

/// Drops closed `#[...]` groups at the start of a line so that
/// `#[Entity] final class User` still reads as a declaration. Brackets inside
/// quoted arguments do not count. An unclosed group leaves nothing to
/// classify.
fn strip_leading_attributes(mut line: &str) -> &str {
    while let Some(rest) = line.strip_prefix(ATTRIBUTE_MARKER) {
        let mut depth = 1usize;
        let mut close = None;
        let mut quote: Option<char> = None;
        let mut escaped = false;
        for (idx, c) in rest.char_indices() {
            if let Some(q) = quote {
                if escaped {
                    escaped = false;
                } else if c == '\\' {
                    escaped = true;
                } else if c == q {
                    quote = None;
                }
                continue;
            }
            match c {
                '\'' | '"' => quote = Some(c),
                '[' => depth += 1,
                ']' => {
                    depth -= 1;
                    if depth == 0 {
                        close = Some(idx);
                        break;
                    }
                }
                _ => {}
            }
        }
        match close {
            Some(idx) => line = rest[idx + 1..].trim_start(),
            None => return "",
        }
    }
    line
}
