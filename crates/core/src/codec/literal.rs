//! Parser for the array/record literal syntax of the tracks and nodes files.
//!
//! Grammar, with `//` and `/* */` comments allowed between tokens and
//! trailing commas accepted:
//!
//! ```text
//! value  := integer | string | ident | array | record
//! array  := '[' (value (',' value)* ','?)? ']'
//! record := '{' (key ':' value (',' key ':' value)* ','?)? '}'
//! key    := ident | string
//! ```
//!
//! Integers are decimal or `0x` hexadecimal with an optional sign. Input is
//! never evaluated, only parsed.

use crate::{PathMusicError, Result};

use super::source_line;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Literal {
    Number(i64),
    Str(String),
    Ident(String),
    Array(Vec<Literal>),
    Record(Vec<(String, Literal)>),
}

impl Literal {
    pub fn describe(&self) -> &'static str {
        match self {
            Self::Number(_) => "number",
            Self::Str(_) => "string",
            Self::Ident(_) => "identifier",
            Self::Array(_) => "array",
            Self::Record(_) => "record",
        }
    }
}

/// A top-level element together with the 1-based line it starts on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Element {
    pub line: usize,
    pub value: Literal,
}

/// Parses a document consisting of a single bracketed list and returns its
/// elements with their line numbers.
pub fn parse_list(source: &str) -> Result<Vec<Element>> {
    let mut parser = Parser::new(source);
    parser.skip_trivia()?;
    parser.expect('[')?;

    let mut elements = Vec::new();
    loop {
        parser.skip_trivia()?;
        if parser.eat(']') {
            break;
        }
        let line = parser.line;
        let value = parser.value()?;
        elements.push(Element { line, value });
        parser.skip_trivia()?;
        if parser.eat(',') {
            continue;
        }
        parser.expect(']')?;
        break;
    }

    parser.skip_trivia()?;
    parser.eat(';');
    parser.skip_trivia()?;
    if parser.peek().is_some() {
        return Err(parser.error("unexpected content after closing ']'"));
    }
    Ok(elements)
}

/// Field-by-field reader over a record literal. Every field has to be
/// consumed; leftovers are reported by [`RecordFields::finish`].
#[derive(Debug)]
pub struct RecordFields<'a> {
    source: &'a str,
    line: usize,
    fields: Vec<(String, Literal)>,
}

impl<'a> RecordFields<'a> {
    pub fn new(source: &'a str, element: Element) -> Result<Self> {
        match element.value {
            Literal::Record(fields) => Ok(Self {
                source,
                line: element.line,
                fields,
            }),
            other => Err(PathMusicError::parse(
                element.line,
                source_line(source, element.line),
                format!("expected a record, found {}", other.describe()),
            )),
        }
    }

    pub fn from_fields(source: &'a str, line: usize, fields: Vec<(String, Literal)>) -> Self {
        Self {
            source,
            line,
            fields,
        }
    }

    pub fn has(&self, name: &str) -> bool {
        self.fields.iter().any(|(key, _)| key == name)
    }

    pub fn int(&mut self, name: &str) -> Result<i64> {
        match self.take(name)? {
            Literal::Number(value) => Ok(value),
            other => Err(self.error(format!(
                "field `{name}` must be a number, found {}",
                other.describe()
            ))),
        }
    }

    pub fn string(&mut self, name: &str) -> Result<String> {
        match self.take(name)? {
            Literal::Str(value) => Ok(value),
            other => Err(self.error(format!(
                "field `{name}` must be a string, found {}",
                other.describe()
            ))),
        }
    }

    pub fn finish(self) -> Result<()> {
        match self.fields.first() {
            Some((key, _)) => Err(self.error(format!("unexpected field `{key}`"))),
            None => Ok(()),
        }
    }

    pub fn error(&self, message: impl Into<String>) -> PathMusicError {
        PathMusicError::parse(self.line, source_line(self.source, self.line), message)
    }

    fn take(&mut self, name: &str) -> Result<Literal> {
        let position = self
            .fields
            .iter()
            .position(|(key, _)| key == name)
            .ok_or_else(|| self.error(format!("missing field `{name}`")))?;
        let (_, value) = self.fields.remove(position);
        if self.has(name) {
            return Err(self.error(format!("duplicate field `{name}`")));
        }
        Ok(value)
    }
}

struct Parser<'a> {
    source: &'a str,
    pos: usize,
    line: usize,
}

impl<'a> Parser<'a> {
    fn new(source: &'a str) -> Self {
        Self {
            source,
            pos: 0,
            line: 1,
        }
    }

    fn rest(&self) -> &'a str {
        &self.source[self.pos..]
    }

    fn peek(&self) -> Option<char> {
        self.rest().chars().next()
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.pos += c.len_utf8();
        if c == '\n' {
            self.line += 1;
        }
        Some(c)
    }

    fn eat(&mut self, expected: char) -> bool {
        if self.peek() == Some(expected) {
            self.bump();
            true
        } else {
            false
        }
    }

    fn expect(&mut self, expected: char) -> Result<()> {
        if self.eat(expected) {
            return Ok(());
        }
        Err(match self.peek() {
            Some(found) => self.error(format!("expected '{expected}', found '{found}'")),
            None => self.error(format!("expected '{expected}', found end of input")),
        })
    }

    fn error(&self, message: impl Into<String>) -> PathMusicError {
        PathMusicError::parse(self.line, source_line(self.source, self.line), message)
    }

    fn skip_trivia(&mut self) -> Result<()> {
        loop {
            let rest = self.rest();
            if rest.starts_with("//") {
                while !matches!(self.peek(), None | Some('\n')) {
                    self.bump();
                }
            } else if rest.starts_with("/*") {
                let start = self.line;
                self.pos += 2;
                loop {
                    if self.rest().starts_with("*/") {
                        self.pos += 2;
                        break;
                    }
                    if self.bump().is_none() {
                        return Err(PathMusicError::parse(
                            start,
                            source_line(self.source, start),
                            "unterminated block comment",
                        ));
                    }
                }
            } else if self.peek().is_some_and(char::is_whitespace) {
                self.bump();
            } else {
                return Ok(());
            }
        }
    }

    fn value(&mut self) -> Result<Literal> {
        match self.peek() {
            Some('[') => self.array(),
            Some('{') => self.record(),
            Some(quote @ ('"' | '\'')) => self.string(quote).map(Literal::Str),
            Some(c) if c == '-' || c == '+' || c.is_ascii_digit() => self.number(),
            Some(c) if is_ident_start(c) => Ok(Literal::Ident(self.ident())),
            Some(c) => Err(self.error(format!("unexpected character '{c}'"))),
            None => Err(self.error("unexpected end of input")),
        }
    }

    fn array(&mut self) -> Result<Literal> {
        self.expect('[')?;
        let mut items = Vec::new();
        loop {
            self.skip_trivia()?;
            if self.eat(']') {
                break;
            }
            items.push(self.value()?);
            self.skip_trivia()?;
            if self.eat(',') {
                continue;
            }
            self.expect(']')?;
            break;
        }
        Ok(Literal::Array(items))
    }

    fn record(&mut self) -> Result<Literal> {
        self.expect('{')?;
        let mut fields = Vec::new();
        loop {
            self.skip_trivia()?;
            if self.eat('}') {
                break;
            }
            let key = match self.peek() {
                Some(quote @ ('"' | '\'')) => self.string(quote)?,
                Some(c) if is_ident_start(c) => self.ident(),
                _ => return Err(self.error("expected a field name")),
            };
            self.skip_trivia()?;
            self.expect(':')?;
            self.skip_trivia()?;
            let value = self.value()?;
            fields.push((key, value));
            self.skip_trivia()?;
            if self.eat(',') {
                continue;
            }
            self.expect('}')?;
            break;
        }
        Ok(Literal::Record(fields))
    }

    fn ident(&mut self) -> String {
        let start = self.pos;
        while self.peek().is_some_and(is_ident_continue) {
            self.bump();
        }
        self.source[start..self.pos].to_string()
    }

    fn number(&mut self) -> Result<Literal> {
        let negative = match self.peek() {
            Some('-') => {
                self.bump();
                true
            }
            Some('+') => {
                self.bump();
                false
            }
            _ => false,
        };
        let rest = self.rest();
        let radix = if rest.starts_with("0x") || rest.starts_with("0X") {
            self.pos += 2;
            16
        } else {
            10
        };
        let start = self.pos;
        while self.peek().is_some_and(|c| c.is_digit(radix)) {
            self.bump();
        }
        let digits = &self.source[start..self.pos];
        if digits.is_empty() {
            return Err(self.error("expected digits"));
        }
        if matches!(self.peek(), Some('.' | 'e' | 'E'))
            || self.peek().is_some_and(is_ident_continue)
        {
            return Err(self.error(format!(
                "unsupported number after `{digits}`, only integers are allowed"
            )));
        }
        let magnitude = i64::from_str_radix(digits, radix)
            .map_err(|err| self.error(format!("invalid integer `{digits}`: {err}")))?;
        Ok(Literal::Number(if negative { -magnitude } else { magnitude }))
    }

    fn string(&mut self, quote: char) -> Result<String> {
        let start_line = self.line;
        self.bump();
        let mut out = String::new();
        loop {
            match self.bump() {
                None | Some('\n') => {
                    return Err(PathMusicError::parse(
                        start_line,
                        source_line(self.source, start_line),
                        "unterminated string",
                    ))
                }
                Some(c) if c == quote => return Ok(out),
                Some('\\') => out.push(self.escape()?),
                Some(c) => out.push(c),
            }
        }
    }

    fn escape(&mut self) -> Result<char> {
        let c = match self.bump() {
            Some('n') => '\n',
            Some('t') => '\t',
            Some('r') => '\r',
            Some('b') => '\u{8}',
            Some('f') => '\u{c}',
            Some('0') => '\0',
            Some('u') => return self.unicode_escape(),
            Some(c @ ('"' | '\'' | '\\' | '/')) => c,
            Some(c) => return Err(self.error(format!("unknown escape '\\{c}'"))),
            None => return Err(self.error("unterminated escape")),
        };
        Ok(c)
    }

    fn unicode_escape(&mut self) -> Result<char> {
        let high = self.hex4()?;
        if (0xD800..0xDC00).contains(&high) {
            if !self.rest().starts_with("\\u") {
                return Err(self.error("unpaired surrogate in string"));
            }
            self.pos += 2;
            let low = self.hex4()?;
            if !(0xDC00..0xE000).contains(&low) {
                return Err(self.error("invalid low surrogate in string"));
            }
            let code = 0x10000 + ((high - 0xD800) << 10) + (low - 0xDC00);
            return char::from_u32(code).ok_or_else(|| self.error("invalid unicode escape"));
        }
        char::from_u32(high).ok_or_else(|| self.error("invalid unicode escape"))
    }

    fn hex4(&mut self) -> Result<u32> {
        let digits = self.rest().get(..4).unwrap_or("");
        if digits.len() != 4 || !digits.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(self.error("expected four hex digits after \\u"));
        }
        self.pos += 4;
        u32::from_str_radix(digits, 16).map_err(|err| self.error(err.to_string()))
    }
}

fn is_ident_start(c: char) -> bool {
    c.is_ascii_alphabetic() || c == '_' || c == '$'
}

fn is_ident_continue(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_' || c == '$'
}
