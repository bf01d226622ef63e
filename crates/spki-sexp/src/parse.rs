//! S-expression reader.
//!
//! Accepts both the canonical encoding and the advanced transport syntax:
//! - Verbatim atoms: `5:hello`
//! - Tokens: `public-key`, `sha256`
//! - Quoted strings: `"hello\n"`, optionally length-prefixed (`6"hello\n"`)
//! - Hexadecimal: `#00ff#`
//! - Base64: `|AP8=|`
//! - Display hints: `[text/plain]hello`
//! - Transport blocks: `{KDQ6aGFzaCk=}` (base64 of a canonical expression)

use base64::engine::general_purpose::{STANDARD, STANDARD_NO_PAD};
use base64::Engine;

use crate::error::SexpError;
use crate::sexp::{is_token_byte, Atom, Sexp};

/// Lists and transport blocks nest at most this deep.
pub const MAX_DEPTH: usize = 256;

/// Parse exactly one expression; only whitespace may follow it.
pub fn parse(input: &[u8]) -> Result<Sexp, SexpError> {
    parse_nested(input, 0)
}

fn parse_nested(input: &[u8], depth: usize) -> Result<Sexp, SexpError> {
    let (sexp, rest) = prefix_at(input, depth)?;
    if let Some(offset) = rest.iter().position(|b| !b.is_ascii_whitespace()) {
        return Err(SexpError::TrailingBytes(input.len() - rest.len() + offset));
    }
    Ok(sexp)
}

/// Parse one expression, returning it with the unconsumed remainder.
pub fn parse_prefix(input: &[u8]) -> Result<(Sexp, &[u8]), SexpError> {
    prefix_at(input, 0)
}

fn prefix_at(input: &[u8], depth: usize) -> Result<(Sexp, &[u8]), SexpError> {
    let mut reader = Reader::new(input, depth);
    let sexp = reader.value()?;
    Ok((sexp, &input[reader.pos..]))
}

struct Reader<'a> {
    input: &'a [u8],
    pos: usize,
    /// Enclosing lists and transport blocks.
    depth: usize,
}

impl<'a> Reader<'a> {
    fn new(input: &'a [u8], depth: usize) -> Self {
        Self {
            input,
            pos: 0,
            depth,
        }
    }

    fn descend(&mut self) -> Result<(), SexpError> {
        if self.depth >= MAX_DEPTH {
            return Err(SexpError::TooDeep { offset: self.pos });
        }
        self.depth += 1;
        Ok(())
    }

    fn peek(&self) -> Option<u8> {
        self.input.get(self.pos).copied()
    }

    fn next(&mut self) -> Result<u8, SexpError> {
        let b = self.peek().ok_or(SexpError::UnexpectedEof)?;
        self.pos += 1;
        Ok(b)
    }

    fn unexpected(&self, byte: u8) -> SexpError {
        SexpError::UnexpectedByte {
            byte,
            offset: self.pos,
        }
    }

    fn expect(&mut self, want: u8) -> Result<(), SexpError> {
        match self.peek() {
            Some(b) if b == want => {
                self.pos += 1;
                Ok(())
            }
            Some(b) => Err(self.unexpected(b)),
            None => Err(SexpError::UnexpectedEof),
        }
    }

    fn skip_whitespace(&mut self) {
        while matches!(self.peek(), Some(b) if b.is_ascii_whitespace()) {
            self.pos += 1;
        }
    }

    fn value(&mut self) -> Result<Sexp, SexpError> {
        self.skip_whitespace();
        match self.peek() {
            None => Err(SexpError::UnexpectedEof),
            Some(b'(') => {
                self.descend()?;
                self.pos += 1;
                let mut items = Vec::new();
                loop {
                    self.skip_whitespace();
                    match self.peek() {
                        Some(b')') => {
                            self.pos += 1;
                            self.depth -= 1;
                            return Ok(Sexp::List(items));
                        }
                        None => return Err(SexpError::UnexpectedEof),
                        Some(_) => items.push(self.value()?),
                    }
                }
            }
            Some(b'{') => self.transport(),
            Some(b'[') => {
                self.pos += 1;
                self.skip_whitespace();
                let hint = self.octets()?;
                self.skip_whitespace();
                self.expect(b']')?;
                self.skip_whitespace();
                let value = self.octets()?;
                Ok(Sexp::Atom(Atom::hinted(hint, value)))
            }
            Some(_) => Ok(Sexp::Atom(Atom::new(self.octets()?))),
        }
    }

    /// A `{...}` block holding the base64 of a canonical expression.
    fn transport(&mut self) -> Result<Sexp, SexpError> {
        self.descend()?;
        self.expect(b'{')?;
        let body = self.until(b'}')?;
        let decoded = decode_base64(&body)?;
        let sexp = parse_nested(&decoded, self.depth)?;
        self.depth -= 1;
        Ok(sexp)
    }

    /// Any simple string: verbatim, token, quoted, hex or base64.
    fn octets(&mut self) -> Result<Vec<u8>, SexpError> {
        let b = self.peek().ok_or(SexpError::UnexpectedEof)?;
        if b.is_ascii_digit() {
            let start = self.pos;
            let len = self.decimal()?;
            let bytes = match self.peek() {
                Some(b':') => {
                    self.pos += 1;
                    let end = self
                        .pos
                        .checked_add(len)
                        .filter(|end| *end <= self.input.len())
                        .ok_or(SexpError::UnexpectedEof)?;
                    let bytes = self.input[self.pos..end].to_vec();
                    self.pos = end;
                    return Ok(bytes);
                }
                Some(b'"') => self.quoted()?,
                Some(b'#') => self.hex()?,
                Some(b'|') => self.base64()?,
                Some(other) => return Err(self.unexpected(other)),
                None => return Err(SexpError::UnexpectedEof),
            };
            if bytes.len() != len {
                return Err(SexpError::InvalidLength(start));
            }
            return Ok(bytes);
        }
        match b {
            b'"' => self.quoted(),
            b'#' => self.hex(),
            b'|' => self.base64(),
            _ if is_token_byte(b) => Ok(self.token()),
            _ => Err(self.unexpected(b)),
        }
    }

    fn decimal(&mut self) -> Result<usize, SexpError> {
        let start = self.pos;
        let mut n: usize = 0;
        while let Some(d) = self.peek().filter(u8::is_ascii_digit) {
            n = n
                .checked_mul(10)
                .and_then(|n| n.checked_add((d - b'0') as usize))
                .ok_or(SexpError::InvalidLength(start))?;
            self.pos += 1;
        }
        // Canonical lengths never carry leading zeros.
        if self.pos - start > 1 && self.input[start] == b'0' {
            return Err(SexpError::InvalidLength(start));
        }
        Ok(n)
    }

    fn token(&mut self) -> Vec<u8> {
        let start = self.pos;
        while matches!(self.peek(), Some(b) if is_token_byte(b)) {
            self.pos += 1;
        }
        self.input[start..self.pos].to_vec()
    }

    /// Collect bytes up to (and consuming) `close`.
    fn until(&mut self, close: u8) -> Result<Vec<u8>, SexpError> {
        let start = self.pos;
        let len = self.input[start..]
            .iter()
            .position(|b| *b == close)
            .ok_or(SexpError::UnexpectedEof)?;
        self.pos = start + len + 1;
        Ok(self.input[start..start + len].to_vec())
    }

    fn hex(&mut self) -> Result<Vec<u8>, SexpError> {
        self.expect(b'#')?;
        let body: Vec<u8> = self
            .until(b'#')?
            .into_iter()
            .filter(|b| !b.is_ascii_whitespace())
            .collect();
        hex::decode(&body).map_err(|e| SexpError::InvalidHex(e.to_string()))
    }

    fn base64(&mut self) -> Result<Vec<u8>, SexpError> {
        self.expect(b'|')?;
        let body = self.until(b'|')?;
        decode_base64(&body)
    }

    fn quoted(&mut self) -> Result<Vec<u8>, SexpError> {
        self.expect(b'"')?;
        let mut out = Vec::new();
        loop {
            match self.next()? {
                b'"' => return Ok(out),
                b'\\' => self.escape(&mut out)?,
                b => out.push(b),
            }
        }
    }

    fn escape(&mut self, out: &mut Vec<u8>) -> Result<(), SexpError> {
        let offset = self.pos;
        match self.next()? {
            b'b' => out.push(0x08),
            b't' => out.push(b'\t'),
            b'v' => out.push(0x0b),
            b'n' => out.push(b'\n'),
            b'f' => out.push(0x0c),
            b'r' => out.push(b'\r'),
            b'"' => out.push(b'"'),
            b'\'' => out.push(b'\''),
            b'\\' => out.push(b'\\'),
            b'x' => {
                let digits = [self.next()?, self.next()?];
                let byte = hex::decode(digits)
                    .map_err(|e| SexpError::InvalidHex(e.to_string()))?;
                out.extend_from_slice(&byte);
            }
            d @ b'0'..=b'7' => {
                let mut value = u32::from(d - b'0');
                for _ in 0..2 {
                    match self.next()? {
                        o @ b'0'..=b'7' => value = value * 8 + u32::from(o - b'0'),
                        other => {
                            return Err(SexpError::UnexpectedByte {
                                byte: other,
                                offset: self.pos - 1,
                            })
                        }
                    }
                }
                let byte = u8::try_from(value).map_err(|_| SexpError::UnexpectedByte {
                    byte: d,
                    offset,
                })?;
                out.push(byte);
            }
            // Line continuation: backslash followed by a newline sequence.
            b'\n' => {
                if self.peek() == Some(b'\r') {
                    self.pos += 1;
                }
            }
            b'\r' => {
                if self.peek() == Some(b'\n') {
                    self.pos += 1;
                }
            }
            other => return Err(SexpError::UnexpectedByte { byte: other, offset }),
        }
        Ok(())
    }
}

fn decode_base64(body: &[u8]) -> Result<Vec<u8>, SexpError> {
    let compact: Vec<u8> = body
        .iter()
        .copied()
        .filter(|b| !b.is_ascii_whitespace())
        .collect();
    STANDARD
        .decode(&compact)
        .or_else(|_| STANDARD_NO_PAD.decode(&compact))
        .map_err(|e| SexpError::InvalidBase64(e.to_string()))
}
