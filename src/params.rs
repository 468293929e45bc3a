//! Static discovery of a script's declared parameters.
//!
//! Scripts opt in by assigning a literal list of `[type_tag, "name"]` pairs
//! to a top-level `REQUIRED_PARAMS` variable, for example:
//!
//! ```python
//! REQUIRED_PARAMS = [
//!     [int, "count"],
//!     [str, "input_file"],
//! ]
//! ```
//!
//! This module reads that restricted literal grammar directly from the
//! source text, rather than parsing the full scripting language. Anything
//! outside the expected shape degrades to "no parameters" so that listing a
//! directory never fails because of one unrelated script.

use std::fmt::{self, Display};

use lazy_regex::regex;

/// Declared type of a single script parameter.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum TypeTag {
    Int,
    Float,
    Str,
    Bool,
    /// Any other identifier in tag position. Preserved rather than dropped,
    /// so that the collection step can surface it visibly.
    Other(String),
}

impl TypeTag {
    fn from_identifier(ident: &str) -> Self {
        match ident {
            "int" => TypeTag::Int,
            "float" => TypeTag::Float,
            "str" => TypeTag::Str,
            "bool" => TypeTag::Bool,
            other => TypeTag::Other(other.to_owned()),
        }
    }

    /// Returns true if values of this type can be collected and coerced.
    pub fn is_supported(&self) -> bool {
        !matches!(self, TypeTag::Other(_))
    }
}

impl Display for TypeTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TypeTag::Int => f.write_str("int"),
            TypeTag::Float => f.write_str("float"),
            TypeTag::Str => f.write_str("str"),
            TypeTag::Bool => f.write_str("bool"),
            TypeTag::Other(ident) => f.write_str(ident),
        }
    }
}

/// A single declared parameter. Order within the declaring list is
/// significant: it fixes the positional argument order at invocation.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ParamSpec {
    pub type_tag: TypeTag,
    pub name: String,
}

impl ParamSpec {
    #[cfg(test)]
    pub fn new(type_tag: TypeTag, name: &str) -> Self {
        Self {
            type_tag,
            name: name.to_owned(),
        }
    }
}

impl Display for ParamSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.name, self.type_tag)
    }
}

/// Extracts the ordered parameter declarations from script source text.
///
/// Returns an empty sequence if the script declares no parameters or if the
/// declaration as a whole is not in the expected shape. Individual elements
/// of unexpected shape are skipped.
pub fn extract_params(source: &str) -> Vec<ParamSpec> {
    // Only a column-zero assignment counts as a declaration.
    let assign = regex!(r"(?m)^REQUIRED_PARAMS\s*=\s*\[");
    let found = match assign.find(source) {
        Some(found) => found,
        None => return Vec::new(),
    };

    // Re-parse from the opening bracket.
    let mut scanner = Scanner {
        rest: &source[found.end() - 1..],
    };
    let elements = match scanner.parse_value() {
        Some(Literal::List(elements)) => elements,
        _ => return Vec::new(),
    };

    elements.into_iter().filter_map(spec_from_literal).collect()
}

fn spec_from_literal(literal: Literal) -> Option<ParamSpec> {
    let Literal::List(elements) = literal else {
        return None;
    };
    // The tag may be written as a bare identifier (`int`) or quoted
    // (`"int"`); both forms occur in practice.
    match <[Literal; 2]>::try_from(elements) {
        Ok([Literal::Ident(tag) | Literal::Str(tag), Literal::Str(name)]) => Some(ParamSpec {
            type_tag: TypeTag::from_identifier(&tag),
            name,
        }),
        _ => None,
    }
}

/// Parsed literal value within a declaration.
#[derive(Debug)]
enum Literal {
    Ident(String),
    Str(String),
    List(Vec<Literal>),
    /// A literal of a kind the declaration grammar does not use, such as a
    /// number. Consumed without interpretation.
    Opaque,
}

/// Minimal scanner over the declaration's literal grammar. All parse
/// methods return [None] on running out of input, which callers treat as a
/// malformed declaration.
struct Scanner<'a> {
    rest: &'a str,
}

impl Scanner<'_> {
    /// Skips whitespace and `#` comments.
    fn skip_trivia(&mut self) {
        loop {
            let trimmed = self.rest.trim_start();
            match trimmed.strip_prefix('#') {
                Some(comment) => {
                    self.rest = match comment.find('\n') {
                        Some(end) => &comment[end + 1..],
                        None => "",
                    };
                }
                None => {
                    self.rest = trimmed;
                    return;
                }
            }
        }
    }

    fn peek(&self) -> Option<char> {
        self.rest.chars().next()
    }

    fn bump(&mut self) -> Option<char> {
        let mut chars = self.rest.chars();
        let c = chars.next()?;
        self.rest = chars.as_str();
        Some(c)
    }

    fn parse_value(&mut self) -> Option<Literal> {
        self.skip_trivia();
        match self.peek()? {
            '[' => self.parse_list(),
            '"' | '\'' => self.parse_string(),
            c if c.is_ascii_alphabetic() || c == '_' => Some(self.parse_identifier()),
            _ => self.parse_opaque(),
        }
    }

    fn parse_list(&mut self) -> Option<Literal> {
        self.bump();
        let mut elements = Vec::new();
        loop {
            self.skip_trivia();
            match self.peek()? {
                ']' => {
                    self.bump();
                    return Some(Literal::List(elements));
                }
                ',' => {
                    self.bump();
                }
                _ => elements.push(self.parse_value()?),
            }
        }
    }

    fn parse_string(&mut self) -> Option<Literal> {
        let quote = self.bump()?;
        let mut text = String::new();
        loop {
            match self.bump()? {
                '\\' => {
                    let escaped = self.bump()?;
                    text.push(match escaped {
                        'n' => '\n',
                        'r' => '\r',
                        't' => '\t',
                        other => other,
                    });
                }
                c if c == quote => return Some(Literal::Str(text)),
                c => text.push(c),
            }
        }
    }

    fn parse_identifier(&mut self) -> Literal {
        let end = self
            .rest
            .find(|c: char| !(c.is_ascii_alphanumeric() || c == '_'))
            .unwrap_or(self.rest.len());
        let (ident, rest) = self.rest.split_at(end);
        self.rest = rest;
        Literal::Ident(ident.to_owned())
    }

    fn parse_opaque(&mut self) -> Option<Literal> {
        let end = self
            .rest
            .find([',', ']', '\n', '#'])
            .unwrap_or(self.rest.len());
        if end == 0 {
            return None;
        }
        self.rest = &self.rest[end..];
        Some(Literal::Opaque)
    }
}
