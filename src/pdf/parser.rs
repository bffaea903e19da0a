//! Recursive-descent object parser built on top of `lexer::Lexer`.

use super::lexer::{Lexer, Token};
use super::object::{Dict, Object};
use crate::error::{Error, Result};

pub struct Parser<'a> {
    lexer: Lexer<'a>,
    buf: &'a [u8],
    pushback: Vec<Token>,
}

impl<'a> Parser<'a> {
    pub fn new(buf: &'a [u8]) -> Self {
        Self {
            lexer: Lexer::new(buf),
            buf,
            pushback: Vec::new(),
        }
    }

    pub fn at(buf: &'a [u8], pos: usize) -> Self {
        let mut p = Self::new(buf);
        p.lexer.seek(pos);
        p
    }

    pub fn position(&self) -> usize {
        self.lexer.position()
    }

    pub fn seek(&mut self, pos: usize) {
        self.pushback.clear();
        self.lexer.seek(pos);
    }

    fn next(&mut self) -> Option<Token> {
        self.pushback.pop().or_else(|| self.lexer.next_token())
    }

    fn push(&mut self, t: Token) {
        self.pushback.push(t);
    }

    /// Parse a single object at the current position. Handles the
    /// `int int R` indirect-reference lookahead.
    pub fn parse_object(&mut self) -> Result<Object> {
        let tok = self
            .next()
            .ok_or_else(|| Error::ParseError {
                offset: self.position(),
                reason: "unexpected end of input".into(),
            })?;
        self.parse_from(tok)
    }

    fn parse_from(&mut self, tok: Token) -> Result<Object> {
        match tok {
            Token::Int(n) => self.maybe_reference(n),
            Token::Real(r) => Ok(Object::Real(r)),
            Token::Str(s) => Ok(Object::Str(s)),
            Token::Name(n) => Ok(Object::Name(n)),
            Token::ArrayStart => self.parse_array(),
            Token::DictStart => self.parse_dict_or_stream(),
            Token::Keyword(ref k) if k == "true" => Ok(Object::Bool(true)),
            Token::Keyword(ref k) if k == "false" => Ok(Object::Bool(false)),
            Token::Keyword(ref k) if k == "null" => Ok(Object::Null),
            Token::Keyword(k) => Err(Error::ParseError {
                offset: self.position(),
                reason: format!("unexpected keyword `{k}`"),
            }),
            other => Err(Error::ParseError {
                offset: self.position(),
                reason: format!("unexpected token {other:?}"),
            }),
        }
    }

    /// After reading an `Int`, look ahead for `Int R` to form a reference.
    fn maybe_reference(&mut self, n: i64) -> Result<Object> {
        let save = self.pushback.clone();
        let save_pos = self.lexer.position();
        if let Some(Token::Int(gen)) = self.next() {
            if let Some(Token::Keyword(k)) = self.next() {
                if k == "R" {
                    return Ok(Object::Ref(n as u32, gen as u16));
                }
            }
        }
        self.pushback = save;
        self.lexer.seek(save_pos);
        Ok(Object::Int(n))
    }

    fn parse_array(&mut self) -> Result<Object> {
        let mut items = Vec::new();
        loop {
            match self.next() {
                Some(Token::ArrayEnd) | None => break,
                Some(tok) => items.push(self.parse_from(tok)?),
            }
        }
        Ok(Object::Array(items))
    }

    fn parse_dict_or_stream(&mut self) -> Result<Object> {
        let mut dict = Dict::new();
        loop {
            match self.next() {
                Some(Token::DictEnd) | None => break,
                Some(Token::Name(key)) => {
                    let value = self.parse_object()?;
                    dict.insert(key, value);
                }
                Some(_) => continue,
            }
        }
        // Peek for `stream` keyword.
        let save = self.pushback.clone();
        let save_pos = self.lexer.position();
        if let Some(Token::Keyword(k)) = self.next() {
            if k == "stream" {
                let data = self.read_stream_body(&dict)?;
                return Ok(Object::Stream(dict, data));
            }
        }
        self.pushback = save;
        self.lexer.seek(save_pos);
        Ok(Object::Dict(dict))
    }

    /// Stream bodies follow `stream\r\n` (or `stream\n`) and end at
    /// `endstream`; length comes from `/Length` when it is a direct
    /// integer, otherwise we scan for the literal `endstream` keyword.
    fn read_stream_body(&mut self, dict: &Dict) -> Result<Vec<u8>> {
        let mut pos = self.lexer.position();
        if self.buf.get(pos) == Some(&b'\r') {
            pos += 1;
        }
        if self.buf.get(pos) == Some(&b'\n') {
            pos += 1;
        }
        let start = pos;
        let end = match dict.get("Length").and_then(|o| match o {
            Object::Int(n) => Some(*n as usize),
            _ => None,
        }) {
            Some(len) if start + len <= self.buf.len() => start + len,
            _ => find_subsequence(&self.buf[start..], b"endstream")
                .map(|rel| start + rel)
                .unwrap_or(self.buf.len()),
        };
        let data = self.buf[start..end.min(self.buf.len())].to_vec();
        let after = find_subsequence(&self.buf[end.min(self.buf.len())..], b"endstream")
            .map(|rel| end + rel + "endstream".len())
            .unwrap_or(self.buf.len());
        self.seek(after);
        Ok(data)
    }
}

fn find_subsequence(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    haystack
        .windows(needle.len())
        .position(|window| window == needle)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_reference() {
        let mut p = Parser::new(b"12 0 R");
        assert_eq!(p.parse_object().unwrap(), Object::Ref(12, 0));
    }

    #[test]
    fn parses_plain_int_when_no_reference_follows() {
        let mut p = Parser::new(b"12 /Foo");
        assert_eq!(p.parse_object().unwrap(), Object::Int(12));
        assert_eq!(p.parse_object().unwrap(), Object::Name("Foo".into()));
    }

    #[test]
    fn parses_nested_dict_and_array() {
        let mut p = Parser::new(b"<< /Kids [1 0 R 2 0 R] /Count 2 >>");
        let obj = p.parse_object().unwrap();
        let dict = obj.as_dict().unwrap();
        assert_eq!(dict.get("Count"), Some(&Object::Int(2)));
        let kids = dict.get("Kids").unwrap().as_array().unwrap();
        assert_eq!(kids, &[Object::Ref(1, 0), Object::Ref(2, 0)]);
    }

    #[test]
    fn parses_stream_with_declared_length() {
        let input = b"<< /Length 5 >>\nstream\r\nhello\r\nendstream";
        let mut p = Parser::new(input);
        let obj = p.parse_object().unwrap();
        let (_, data) = obj.as_stream().unwrap();
        assert_eq!(data, b"hello");
    }
}
