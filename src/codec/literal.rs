//! # Mapping Literal Format
//!
//! Text form of sensor payloads inside the durable log.
//!
//! The format is a small literal language for nested values:
//!
//! | Value | Written as | Also accepted |
//! |-------|------------|---------------|
//! | null | `None` | `null` |
//! | boolean | `True` / `False` | `true` / `false` |
//! | integer | `42`, `-7` | |
//! | float | `1.0`, `2.5e-7` | `1e+20` |
//! | string | `'text'` (or `"it's"`) | either quote style |
//! | list | `[1, 2]` | `(1, 2)` |
//! | mapping | `{'key': value}` | `{"key": value}` |
//!
//! Floats always carry a fraction or exponent so they decode back to floats;
//! integers never do.

use serde_json::{Map, Number, Value};

use crate::error::{Result, RoverError};

/// Maximum nesting of mappings and sequences, matching `serde_json`
pub const MAX_DEPTH: usize = 128;

/// Write a value in literal form
pub fn write_value(out: &mut String, value: &Value) {
    match value {
        Value::Null => out.push_str("None"),
        Value::Bool(true) => out.push_str("True"),
        Value::Bool(false) => out.push_str("False"),
        Value::Number(n) => write_number(out, n),
        Value::String(s) => write_string(out, s),
        Value::Array(items) => {
            out.push('[');
            for (i, item) in items.iter().enumerate() {
                if i > 0 {
                    out.push_str(", ");
                }
                write_value(out, item);
            }
            out.push(']');
        }
        Value::Object(map) => write_mapping(out, map),
    }
}

/// Write a mapping in literal form, preserving key order
pub fn write_mapping(out: &mut String, map: &Map<String, Value>) {
    out.push('{');
    for (i, (key, value)) in map.iter().enumerate() {
        if i > 0 {
            out.push_str(", ");
        }
        write_string(out, key);
        out.push_str(": ");
        write_value(out, value);
    }
    out.push('}');
}

fn write_number(out: &mut String, n: &Number) {
    if let Some(i) = n.as_i64() {
        out.push_str(&i.to_string());
    } else if let Some(u) = n.as_u64() {
        out.push_str(&u.to_string());
    } else if let Some(f) = n.as_f64() {
        // Debug keeps a trailing `.0` on integral floats
        out.push_str(&format!("{:?}", f));
    }
}

fn write_string(out: &mut String, s: &str) {
    let quote = if s.contains('\'') && !s.contains('"') { '"' } else { '\'' };

    out.push(quote);
    for c in s.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            c if c == quote => {
                out.push('\\');
                out.push(c);
            }
            c if c.is_control() => {
                let code = c as u32;
                if code <= 0xFF {
                    out.push_str(&format!("\\x{:02x}", code));
                } else if code <= 0xFFFF {
                    out.push_str(&format!("\\u{:04x}", code));
                } else {
                    out.push_str(&format!("\\U{:08x}", code));
                }
            }
            c => out.push(c),
        }
    }
    out.push(quote);
}

/// Parse a complete literal; trailing non-whitespace is an error
pub fn parse_value(text: &str) -> Result<Value> {
    let mut parser = Parser::new(text);
    let value = parser.value()?;
    parser.skip_whitespace();
    if !parser.at_end() {
        return Err(parser.error("unexpected trailing characters"));
    }
    Ok(value)
}

/// Parse a complete literal that must be a mapping
pub fn parse_mapping(text: &str) -> Result<Map<String, Value>> {
    match parse_value(text)? {
        Value::Object(map) => Ok(map),
        other => Err(RoverError::MalformedLogLine(format!(
            "expected a mapping, found {}",
            kind_name(&other)
        ))),
    }
}

fn kind_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "sequence",
        Value::Object(_) => "mapping",
    }
}

/// Recursive-descent parser over the literal grammar
struct Parser<'a> {
    src: &'a str,
    pos: usize,
    depth: usize,
}

impl<'a> Parser<'a> {
    fn new(src: &'a str) -> Self {
        Self { src, pos: 0, depth: 0 }
    }

    fn error(&self, msg: &str) -> RoverError {
        RoverError::MalformedLogLine(format!("{} at offset {}", msg, self.pos))
    }

    fn at_end(&self) -> bool {
        self.pos >= self.src.len()
    }

    fn peek(&self) -> Option<char> {
        self.src[self.pos..].chars().next()
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.pos += c.len_utf8();
        Some(c)
    }

    fn skip_whitespace(&mut self) {
        while let Some(c) = self.peek().filter(|c| c.is_whitespace()) {
            self.pos += c.len_utf8();
        }
    }

    fn expect(&mut self, expected: char) -> Result<()> {
        self.skip_whitespace();
        match self.bump() {
            Some(c) if c == expected => Ok(()),
            _ => Err(self.error(&format!("expected '{}'", expected))),
        }
    }

    fn value(&mut self) -> Result<Value> {
        self.skip_whitespace();
        match self.peek() {
            Some('{') | Some('[') | Some('(') => self.container(),
            Some('\'') | Some('"') => self.string().map(Value::String),
            Some(c) if c == '-' || c == '+' || c == '.' || c.is_ascii_digit() => self.number(),
            Some(c) if c.is_ascii_alphabetic() => self.keyword(),
            Some(_) => Err(self.error("unexpected character")),
            None => Err(self.error("unexpected end of input")),
        }
    }

    /// Parse a mapping or sequence, bounding recursion depth
    fn container(&mut self) -> Result<Value> {
        if self.depth >= MAX_DEPTH {
            return Err(self.error("nesting too deep"));
        }

        self.depth += 1;
        let value = match self.peek() {
            Some('{') => self.mapping().map(Value::Object),
            Some('[') => self.sequence(']').map(Value::Array),
            _ => self.sequence(')').map(Value::Array),
        };
        self.depth -= 1;
        value
    }

    fn mapping(&mut self) -> Result<Map<String, Value>> {
        self.expect('{')?;
        let mut map = Map::new();

        self.skip_whitespace();
        if self.peek() == Some('}') {
            self.bump();
            return Ok(map);
        }

        loop {
            self.skip_whitespace();
            let key = match self.peek() {
                Some('\'') | Some('"') => self.string()?,
                _ => return Err(self.error("mapping keys must be strings")),
            };
            self.expect(':')?;
            let value = self.value()?;
            map.insert(key, value);

            self.skip_whitespace();
            match self.bump() {
                Some(',') => {
                    // Trailing comma before the closing brace
                    self.skip_whitespace();
                    if self.peek() == Some('}') {
                        self.bump();
                        return Ok(map);
                    }
                }
                Some('}') => return Ok(map),
                _ => return Err(self.error("expected ',' or '}'")),
            }
        }
    }

    fn sequence(&mut self, close: char) -> Result<Vec<Value>> {
        self.bump();
        let mut items = Vec::new();

        self.skip_whitespace();
        if self.peek() == Some(close) {
            self.bump();
            return Ok(items);
        }

        loop {
            items.push(self.value()?);

            self.skip_whitespace();
            match self.bump() {
                Some(',') => {
                    self.skip_whitespace();
                    if self.peek() == Some(close) {
                        self.bump();
                        return Ok(items);
                    }
                }
                Some(c) if c == close => return Ok(items),
                _ => return Err(self.error(&format!("expected ',' or '{}'", close))),
            }
        }
    }

    fn string(&mut self) -> Result<String> {
        let quote = match self.bump() {
            Some(q @ ('\'' | '"')) => q,
            _ => return Err(self.error("expected a quoted string")),
        };

        let mut out = String::new();
        loop {
            match self.bump() {
                None => return Err(self.error("unterminated string")),
                Some(c) if c == quote => return Ok(out),
                Some('\\') => out.push(self.escape()?),
                Some(c) => out.push(c),
            }
        }
    }

    fn escape(&mut self) -> Result<char> {
        let c = match self.bump() {
            Some('\\') => '\\',
            Some('\'') => '\'',
            Some('"') => '"',
            Some('n') => '\n',
            Some('r') => '\r',
            Some('t') => '\t',
            Some('0') => '\0',
            Some('x') => self.hex_escape(2)?,
            Some('u') => self.hex_escape(4)?,
            Some('U') => self.hex_escape(8)?,
            _ => return Err(self.error("invalid escape sequence")),
        };
        Ok(c)
    }

    fn hex_escape(&mut self, digits: usize) -> Result<char> {
        let end = self.pos + digits;
        let hex = self
            .src
            .get(self.pos..end)
            .ok_or_else(|| self.error("truncated escape sequence"))?;
        if !hex.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(self.error("invalid hex escape"));
        }
        let code = u32::from_str_radix(hex, 16)
            .map_err(|_| self.error("invalid hex escape"))?;
        self.pos = end;
        char::from_u32(code).ok_or_else(|| self.error("escape is not a valid character"))
    }

    fn number(&mut self) -> Result<Value> {
        let start = self.pos;
        while matches!(
            self.peek(),
            Some(c) if c.is_ascii_digit() || matches!(c, '+' | '-' | '.' | 'e' | 'E' | '_')
        ) {
            self.pos += 1;
        }

        let text: String = self.src[start..self.pos].chars().filter(|&c| c != '_').collect();
        let is_float = text.contains(['.', 'e', 'E']);

        if !is_float {
            if let Ok(i) = text.parse::<i64>() {
                return Ok(Value::Number(i.into()));
            }
            if let Ok(u) = text.trim_start_matches('+').parse::<u64>() {
                return Ok(Value::Number(u.into()));
            }
        }

        text.parse::<f64>()
            .ok()
            .and_then(Number::from_f64)
            .map(Value::Number)
            .ok_or_else(|| RoverError::MalformedLogLine(format!("invalid number '{}' at offset {}", text, start)))
    }

    fn keyword(&mut self) -> Result<Value> {
        let start = self.pos;
        while matches!(self.peek(), Some(c) if c.is_ascii_alphanumeric() || c == '_') {
            self.pos += 1;
        }

        match &self.src[start..self.pos] {
            "True" | "true" => Ok(Value::Bool(true)),
            "False" | "false" => Ok(Value::Bool(false)),
            "None" | "null" => Ok(Value::Null),
            word => Err(RoverError::MalformedLogLine(format!(
                "unknown literal '{}' at offset {}",
                word, start
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn render(value: &Value) -> String {
        let mut out = String::new();
        write_value(&mut out, value);
        out
    }

    #[test]
    fn test_write_scalars() {
        assert_eq!(render(&Value::Null), "None");
        assert_eq!(render(&json!(true)), "True");
        assert_eq!(render(&json!(false)), "False");
        assert_eq!(render(&json!(42)), "42");
        assert_eq!(render(&json!(-7)), "-7");
        assert_eq!(render(&json!(1.0)), "1.0");
        assert_eq!(render(&json!(0.25)), "0.25");
    }

    #[test]
    fn test_write_nested_mapping() {
        let value = json!({"obstacle": false, "rfid": {"tag_detected": true, "ids": [1, 2]}});
        assert_eq!(
            render(&value),
            "{'obstacle': False, 'rfid': {'tag_detected': True, 'ids': [1, 2]}}"
        );
    }

    #[test]
    fn test_write_string_quoting() {
        assert_eq!(render(&json!("plain")), "'plain'");
        assert_eq!(render(&json!("it's")), "\"it's\"");
        assert_eq!(render(&json!("both ' and \"")), "'both \\' and \"'");
        assert_eq!(render(&json!("line\nbreak\\")), "'line\\nbreak\\\\'");
        assert_eq!(render(&json!("bell\u{7}")), "'bell\\x07'");
    }

    #[test]
    fn test_parse_python_style_mapping() {
        let map = parse_mapping("{'obstacle': True, 'rfid': {'tag_detected': False}, 'temp': 21.5, 'note': None}").unwrap();
        assert_eq!(map["obstacle"], json!(true));
        assert_eq!(map["rfid"], json!({"tag_detected": false}));
        assert_eq!(map["temp"], json!(21.5));
        assert_eq!(map["note"], Value::Null);
    }

    #[test]
    fn test_parse_json_style_mapping() {
        let map = parse_mapping(r#"{"obstacle": true, "rfid": {"tag_detected": null}}"#).unwrap();
        assert_eq!(map["obstacle"], json!(true));
        assert_eq!(map["rfid"]["tag_detected"], Value::Null);
    }

    #[test]
    fn test_parse_preserves_key_order() {
        let map = parse_mapping("{'z': 1, 'a': 2, 'm': 3}").unwrap();
        let keys: Vec<&str> = map.keys().map(String::as_str).collect();
        assert_eq!(keys, vec!["z", "a", "m"]);
    }

    #[test]
    fn test_parse_numbers() {
        assert_eq!(parse_value("0").unwrap(), json!(0));
        assert_eq!(parse_value("-12").unwrap(), json!(-12));
        assert_eq!(parse_value("3.0").unwrap(), json!(3.0));
        assert_eq!(parse_value("1e+20").unwrap(), json!(1e20));
        assert_eq!(parse_value("18446744073709551615").unwrap(), json!(u64::MAX));
        assert!(parse_value("nan").is_err());
        assert!(parse_value("1.2.3").is_err());
    }

    #[test]
    fn test_parse_tuple_as_list() {
        assert_eq!(parse_value("(1, 2.5)").unwrap(), json!([1, 2.5]));
        assert_eq!(parse_value("()").unwrap(), json!([]));
        assert_eq!(parse_value("[1, 2,]").unwrap(), json!([1, 2]));
    }

    #[test]
    fn test_parse_escapes() {
        assert_eq!(parse_value(r"'a\'b'").unwrap(), json!("a'b"));
        assert_eq!(parse_value(r"'tab\there'").unwrap(), json!("tab\there"));
        assert_eq!(parse_value(r"'\x41é'").unwrap(), json!("Aé"));
        assert!(parse_value(r"'\q'").is_err());
        assert!(parse_value(r"'\x4'").is_err());
        assert!(parse_value(r"'\x+4'").is_err());
        assert!(parse_value(r"'\u+041'").is_err());
    }

    #[test]
    fn test_parse_nesting_limit() {
        let at_limit = format!("{}{}", "[".repeat(MAX_DEPTH), "]".repeat(MAX_DEPTH));
        assert!(parse_value(&at_limit).is_ok());

        let too_deep = format!("{}{}", "[".repeat(MAX_DEPTH + 1), "]".repeat(MAX_DEPTH + 1));
        match parse_value(&too_deep).unwrap_err() {
            RoverError::MalformedLogLine(msg) => assert!(msg.contains("nesting too deep")),
            other => panic!("Expected MalformedLogLine, got: {:?}", other),
        }

        // Unterminated and far past the limit: must fail cleanly, not overflow
        let runaway = format!("{{'a': {}", "[".repeat(20_000));
        assert!(parse_mapping(&runaway).is_err());
    }

    #[test]
    fn test_parse_errors() {
        assert!(parse_value("").is_err());
        assert!(parse_value("{'a': 1").is_err());
        assert!(parse_value("{'a' 1}").is_err());
        assert!(parse_value("{1: 'a'}").is_err());
        assert!(parse_value("'unterminated").is_err());
        assert!(parse_value("{} extra").is_err());
        assert!(parse_value("Maybe").is_err());
        assert!(parse_mapping("[1, 2]").is_err());
    }

    #[test]
    fn test_write_then_parse_nested_payload() {
        let value = json!({
            "obstacle": false,
            "rfid": {"tag_detected": true, "tag_id": "A-17", "strength": -42.5},
            "readings": [0, 1.5, "it's", null, {"deep": [true]}],
            "empty": {}
        });
        assert_eq!(parse_value(&render(&value)).unwrap(), value);
    }
}
