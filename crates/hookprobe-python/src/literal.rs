//! Decoding Python literal syntax
//!
//! Child queries print `repr()` of their answer. [`PyLiteral::parse`]
//! accepts the literal subset that `repr` produces for plain data: `None`,
//! booleans, numbers, strings and bytes (with prefixes, triple quotes and
//! escapes), lists, tuples, sets and dicts. Nothing is ever evaluated.

use crate::errors::ProbeError;
use serde_json::Value;

const MAX_DEPTH: usize = 256;

#[derive(Debug, Clone, PartialEq)]
pub enum PyLiteral {
    None,
    Bool(bool),
    Int(i64),
    /// An integer outside `i64`, kept as its literal text without underscores
    BigInt(String),
    Float(f64),
    Str(String),
    Bytes(Vec<u8>),
    List(Vec<PyLiteral>),
    Tuple(Vec<PyLiteral>),
    Set(Vec<PyLiteral>),
    Dict(Vec<(PyLiteral, PyLiteral)>),
}

impl PyLiteral {
    pub fn parse(text: &str) -> Result<Self, ProbeError> {
        let mut parser = Parser::new(text);
        parser.skip_whitespace();
        let value = parser.value(0)?;
        parser.skip_whitespace();
        if parser.pos < text.len() {
            return Err(parser.error("unexpected trailing characters"));
        }
        Ok(value)
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            PyLiteral::None => "None",
            PyLiteral::Bool(_) => "bool",
            PyLiteral::Int(_) | PyLiteral::BigInt(_) => "int",
            PyLiteral::Float(_) => "float",
            PyLiteral::Str(_) => "str",
            PyLiteral::Bytes(_) => "bytes",
            PyLiteral::List(_) => "list",
            PyLiteral::Tuple(_) => "tuple",
            PyLiteral::Set(_) => "set",
            PyLiteral::Dict(_) => "dict",
        }
    }

    pub fn is_none(&self) -> bool {
        matches!(self, PyLiteral::None)
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            PyLiteral::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            PyLiteral::Str(s) => Some(s),
            _ => None,
        }
    }

    /// The string value, or a decode error naming what was found instead
    pub fn into_string(self) -> Result<String, ProbeError> {
        match self {
            PyLiteral::Str(s) => Ok(s),
            other => Err(ProbeError::decode(
                &other.to_json().to_string(),
                0,
                format!("expected str, found {}", other.type_name()),
            )),
        }
    }

    /// Items of a list, tuple or set of strings
    pub fn into_string_list(self) -> Result<Vec<String>, ProbeError> {
        match self {
            PyLiteral::List(items) | PyLiteral::Tuple(items) | PyLiteral::Set(items) => {
                items.into_iter().map(PyLiteral::into_string).collect()
            }
            other => Err(ProbeError::decode(
                &other.to_json().to_string(),
                0,
                format!("expected a sequence of str, found {}", other.type_name()),
            )),
        }
    }

    /// JSON rendering for reports; dict keys are stringified
    pub fn to_json(&self) -> Value {
        match self {
            PyLiteral::None => Value::Null,
            PyLiteral::Bool(b) => Value::Bool(*b),
            PyLiteral::Int(i) => Value::from(*i),
            PyLiteral::BigInt(text) => Value::String(text.clone()),
            PyLiteral::Float(f) => Value::from(*f),
            PyLiteral::Str(s) => Value::String(s.clone()),
            PyLiteral::Bytes(b) => Value::String(String::from_utf8_lossy(b).into_owned()),
            PyLiteral::List(items) | PyLiteral::Tuple(items) | PyLiteral::Set(items) => {
                Value::Array(items.iter().map(PyLiteral::to_json).collect())
            }
            PyLiteral::Dict(entries) => Value::Object(
                entries
                    .iter()
                    .map(|(k, v)| {
                        let key = match k {
                            PyLiteral::Str(s) => s.clone(),
                            other => other.to_json().to_string(),
                        };
                        (key, v.to_json())
                    })
                    .collect(),
            ),
        }
    }
}

struct Parser<'a> {
    text: &'a str,
    pos: usize,
}

impl<'a> Parser<'a> {
    fn new(text: &'a str) -> Self {
        Parser { text, pos: 0 }
    }

    fn error(&self, reason: impl Into<String>) -> ProbeError {
        ProbeError::decode(self.text, self.pos, reason)
    }

    fn rest(&self) -> &'a str {
        &self.text[self.pos..]
    }

    fn peek(&self) -> Option<char> {
        self.rest().chars().next()
    }

    fn peek_at(&self, n: usize) -> Option<char> {
        self.rest().chars().nth(n)
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.pos += c.len_utf8();
        Some(c)
    }

    fn eat(&mut self, expected: char) -> bool {
        if self.peek() == Some(expected) {
            self.pos += expected.len_utf8();
            true
        } else {
            false
        }
    }

    fn skip_whitespace(&mut self) {
        while let Some(c) = self.peek() {
            if c.is_whitespace() {
                self.pos += c.len_utf8();
            } else {
                break;
            }
        }
    }

    fn value(&mut self, depth: usize) -> Result<PyLiteral, ProbeError> {
        if depth > MAX_DEPTH {
            return Err(self.error("nesting too deep"));
        }
        match self.peek() {
            None => Err(self.error("unexpected end of input")),
            Some('[') => {
                self.bump();
                let (items, _) = self.sequence(']', depth)?;
                Ok(PyLiteral::List(items))
            }
            Some('(') => {
                self.bump();
                let (mut items, trailing_comma) = self.sequence(')', depth)?;
                if items.len() == 1 && !trailing_comma {
                    Ok(items.remove(0))
                } else {
                    Ok(PyLiteral::Tuple(items))
                }
            }
            Some('{') => {
                self.bump();
                self.braces(depth)
            }
            Some('\'' | '"') => self.string(),
            Some(c) if c.is_ascii_digit() || matches!(c, '-' | '+' | '.') => self.number(),
            Some(c) if c.is_alphabetic() || c == '_' => {
                if self.is_string_prefix() {
                    self.string()
                } else {
                    self.name()
                }
            }
            Some(c) => Err(self.error(format!("unexpected character '{}'", c))),
        }
    }

    /// Items up to `close`, and whether the last item had a trailing comma
    fn sequence(&mut self, close: char, depth: usize) -> Result<(Vec<PyLiteral>, bool), ProbeError> {
        let mut items = Vec::new();
        let mut trailing_comma = false;
        loop {
            self.skip_whitespace();
            if self.eat(close) {
                return Ok((items, trailing_comma));
            }
            items.push(self.value(depth + 1)?);
            self.skip_whitespace();
            if self.eat(',') {
                trailing_comma = true;
            } else if self.eat(close) {
                return Ok((items, false));
            } else {
                return Err(self.error(format!("expected ',' or '{}'", close)));
            }
        }
    }

    fn braces(&mut self, depth: usize) -> Result<PyLiteral, ProbeError> {
        self.skip_whitespace();
        if self.eat('}') {
            return Ok(PyLiteral::Dict(Vec::new()));
        }
        let first = self.value(depth + 1)?;
        self.skip_whitespace();

        if !self.eat(':') {
            let mut items = vec![first];
            if self.eat(',') {
                let (rest, _) = self.sequence('}', depth)?;
                items.extend(rest);
            } else if !self.eat('}') {
                return Err(self.error("expected ',' or '}'"));
            }
            return Ok(PyLiteral::Set(items));
        }

        let mut entries = Vec::new();
        let mut key = first;
        loop {
            self.skip_whitespace();
            let value = self.value(depth + 1)?;
            entries.push((key, value));
            self.skip_whitespace();
            if self.eat('}') {
                return Ok(PyLiteral::Dict(entries));
            }
            if !self.eat(',') {
                return Err(self.error("expected ',' or '}'"));
            }
            self.skip_whitespace();
            if self.eat('}') {
                return Ok(PyLiteral::Dict(entries));
            }
            key = self.value(depth + 1)?;
            self.skip_whitespace();
            if !self.eat(':') {
                return Err(self.error("expected ':'"));
            }
        }
    }

    fn name(&mut self) -> Result<PyLiteral, ProbeError> {
        let start = self.pos;
        while let Some(c) = self.peek() {
            if c.is_alphanumeric() || c == '_' {
                self.bump();
            } else {
                break;
            }
        }
        match &self.text[start..self.pos] {
            "None" => Ok(PyLiteral::None),
            "True" => Ok(PyLiteral::Bool(true)),
            "False" => Ok(PyLiteral::Bool(false)),
            // repr of an empty set
            "set" if self.rest().starts_with("()") => {
                self.pos += 2;
                Ok(PyLiteral::Set(Vec::new()))
            }
            other => {
                self.pos = start;
                Err(self.error(format!("unsupported name '{}'", other)))
            }
        }
    }

    fn number(&mut self) -> Result<PyLiteral, ProbeError> {
        let start = self.pos;
        if matches!(self.peek(), Some('-' | '+')) {
            self.bump();
        }
        let mut is_float = false;
        let mut radix = 10;
        if self.peek() == Some('0') && matches!(self.peek_at(1), Some('x' | 'X' | 'o' | 'O' | 'b' | 'B')) {
            radix = match self.peek_at(1) {
                Some('x' | 'X') => 16,
                Some('o' | 'O') => 8,
                _ => 2,
            };
            self.pos += 2;
        }
        while let Some(c) = self.peek() {
            let exponent_sign = matches!(c, '+' | '-')
                && matches!(self.text[..self.pos].chars().last(), Some('e' | 'E'))
                && radix == 10;
            if c.is_ascii_digit() || c == '_' || (radix == 16 && c.is_ascii_hexdigit()) {
                self.bump();
            } else if radix == 10 && matches!(c, '.' | 'e' | 'E') {
                is_float = true;
                self.bump();
            } else if exponent_sign {
                self.bump();
            } else {
                break;
            }
        }

        let raw: String = self.text[start..self.pos].chars().filter(|&c| c != '_').collect();
        if raw.is_empty() || raw == "-" || raw == "+" {
            self.pos = start;
            return Err(self.error("expected a number"));
        }

        if is_float {
            return raw
                .parse::<f64>()
                .map(PyLiteral::Float)
                .map_err(|e| ProbeError::decode(self.text, start, format!("invalid float: {}", e)));
        }

        let (negative, digits) = match raw.strip_prefix('-') {
            Some(d) => (true, d),
            None => (false, raw.trim_start_matches('+')),
        };
        let digits = if radix == 10 { digits } else { &digits[2..] };
        if digits.is_empty() || !digits.chars().all(|c| c.is_digit(radix)) {
            return Err(ProbeError::decode(self.text, start, "invalid integer digits"));
        }
        let value = i128::from_str_radix(digits, radix)
            .ok()
            .map(|magnitude| if negative { -magnitude } else { magnitude })
            .and_then(|value| i64::try_from(value).ok());
        Ok(match value {
            Some(value) => PyLiteral::Int(value),
            None => PyLiteral::BigInt(raw.trim_start_matches('+').to_string()),
        })
    }

    fn is_string_prefix(&self) -> bool {
        let rest = self.rest();
        let prefix_len = rest
            .chars()
            .take(3)
            .take_while(|c| matches!(c, 'r' | 'R' | 'u' | 'U' | 'b' | 'B' | 'f' | 'F'))
            .count();
        prefix_len > 0 && prefix_len <= 2 && matches!(rest[prefix_len..].chars().next(), Some('\'' | '"'))
    }

    fn string(&mut self) -> Result<PyLiteral, ProbeError> {
        let start = self.pos;
        let mut raw = false;
        let mut bytes = false;
        while let Some(c) = self.peek() {
            match c {
                'r' | 'R' => raw = true,
                'b' | 'B' => bytes = true,
                'u' | 'U' => {}
                'f' | 'F' => return Err(self.error("formatted strings are not literals")),
                _ => break,
            }
            self.bump();
        }

        let Some(quote) = self.bump() else {
            return Err(self.error("unexpected end of input"));
        };
        let triple = self.rest().starts_with(&format!("{quote}{quote}"));
        if triple {
            self.pos += 2;
        }

        let mut out: Vec<u8> = Vec::new();
        loop {
            let Some(c) = self.bump() else {
                self.pos = start;
                return Err(self.error("unterminated string"));
            };
            if c == quote {
                if !triple {
                    break;
                }
                if self.rest().starts_with(&format!("{quote}{quote}")) {
                    self.pos += 2;
                    break;
                }
                push_char(&mut out, c);
                continue;
            }
            if (c == '\n' || c == '\r') && !triple {
                return Err(self.error("newline in single-quoted string"));
            }
            if c != '\\' {
                push_char(&mut out, c);
                continue;
            }
            if raw {
                out.push(b'\\');
                if let Some(next) = self.bump() {
                    push_char(&mut out, next);
                }
                continue;
            }
            self.escape(&mut out, bytes)?;
        }

        if bytes {
            Ok(PyLiteral::Bytes(out))
        } else {
            String::from_utf8(out)
                .map(PyLiteral::Str)
                .map_err(|_| ProbeError::decode(self.text, start, "invalid UTF-8 in string"))
        }
    }

    fn escape(&mut self, out: &mut Vec<u8>, bytes: bool) -> Result<(), ProbeError> {
        let Some(c) = self.bump() else {
            return Err(self.error("unterminated escape"));
        };
        match c {
            '\n' => {}
            '\\' | '\'' | '"' => push_char(out, c),
            'a' => out.push(0x07),
            'b' => out.push(0x08),
            'f' => out.push(0x0c),
            'n' => out.push(b'\n'),
            'r' => out.push(b'\r'),
            't' => out.push(b'\t'),
            'v' => out.push(0x0b),
            '0'..='7' => {
                let mut value = c.to_digit(8).unwrap_or(0);
                for _ in 0..2 {
                    match self.peek().and_then(|d| d.to_digit(8)) {
                        Some(d) => {
                            value = value * 8 + d;
                            self.bump();
                        }
                        None => break,
                    }
                }
                self.push_code(out, value, bytes)?;
            }
            'x' => {
                let value = self.hex_digits(2)?;
                self.push_code(out, value, bytes)?;
            }
            'u' if !bytes => {
                let value = self.hex_digits(4)?;
                self.push_code(out, value, bytes)?;
            }
            'U' if !bytes => {
                let value = self.hex_digits(8)?;
                self.push_code(out, value, bytes)?;
            }
            'N' if !bytes => return Err(self.error("named unicode escapes are not supported")),
            other => {
                out.push(b'\\');
                push_char(out, other);
            }
        }
        Ok(())
    }

    fn hex_digits(&mut self, count: usize) -> Result<u32, ProbeError> {
        let digits = self.rest().get(..count).unwrap_or("");
        if digits.len() != count || !digits.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(self.error(format!("expected {} hex digits", count)));
        }
        self.pos += count;
        u32::from_str_radix(digits, 16).map_err(|e| self.error(e.to_string()))
    }

    fn push_code(&self, out: &mut Vec<u8>, value: u32, bytes: bool) -> Result<(), ProbeError> {
        if bytes {
            let byte = u8::try_from(value).map_err(|_| self.error("byte escape out of range"))?;
            out.push(byte);
            return Ok(());
        }
        let c = char::from_u32(value).ok_or_else(|| self.error("invalid code point"))?;
        push_char(out, c);
        Ok(())
    }
}

fn push_char(out: &mut Vec<u8>, c: char) {
    let mut buf = [0u8; 4];
    out.extend_from_slice(c.encode_utf8(&mut buf).as_bytes());
}
