//! Event stream header block
//!
//! Each header is `name_len (u8) | name | type (u8) | value`, repeated until
//! the header block is exhausted. All integers are big-endian.

use bytes::Buf;
use std::collections::HashMap;

use super::error::{ParseError, ParseResult};

/// Header value as carried on the wire
#[derive(Debug, Clone, PartialEq)]
pub enum HeaderValue {
    Bool(bool),
    Byte(i8),
    Short(i16),
    Integer(i32),
    Long(i64),
    ByteArray(Vec<u8>),
    String(String),
    Timestamp(i64),
    Uuid([u8; 16]),
}

impl HeaderValue {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            _ => None,
        }
    }
}

/// Decoded header block of one frame
#[derive(Debug, Clone, Default)]
pub struct Headers {
    inner: HashMap<String, HeaderValue>,
}

impl Headers {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: impl Into<String>, value: HeaderValue) {
        self.inner.insert(name.into(), value);
    }

    pub fn get(&self, name: &str) -> Option<&HeaderValue> {
        self.inner.get(name)
    }

    pub fn get_string(&self, name: &str) -> Option<&str> {
        self.get(name).and_then(HeaderValue::as_str)
    }

    /// `:message-type` (`event`, `error` or `exception`)
    pub fn message_type(&self) -> Option<&str> {
        self.get_string(":message-type")
    }

    /// `:event-type`, `chunk` for model output
    pub fn event_type(&self) -> Option<&str> {
        self.get_string(":event-type")
    }

    pub fn exception_type(&self) -> Option<&str> {
        self.get_string(":exception-type")
    }

    pub fn error_code(&self) -> Option<&str> {
        self.get_string(":error-code")
    }

    pub fn error_message(&self) -> Option<&str> {
        self.get_string(":error-message")
    }
}

/// Parse a complete header block
pub fn parse_headers(mut data: &[u8]) -> ParseResult<Headers> {
    let mut headers = Headers::new();

    while data.has_remaining() {
        let name_len = data.get_u8() as usize;
        if name_len == 0 {
            return Err(ParseError::HeaderParseFailed(
                "Header name length cannot be 0".to_string(),
            ));
        }
        require(&data, name_len)?;
        let name = String::from_utf8_lossy(&data[..name_len]).into_owned();
        data.advance(name_len);

        require(&data, 1)?;
        let tag = data[0];
        let value = read_value(&mut data, tag)?;
        headers.insert(name, value);
    }

    Ok(headers)
}

/// Read one typed value; `data` starts at the type tag
fn read_value(data: &mut &[u8], tag: u8) -> ParseResult<HeaderValue> {
    data.advance(1);

    let value = match tag {
        0 => HeaderValue::Bool(true),
        1 => HeaderValue::Bool(false),
        2 => {
            require(data, 1)?;
            HeaderValue::Byte(data.get_i8())
        }
        3 => {
            require(data, 2)?;
            HeaderValue::Short(data.get_i16())
        }
        4 => {
            require(data, 4)?;
            HeaderValue::Integer(data.get_i32())
        }
        5 => {
            require(data, 8)?;
            HeaderValue::Long(data.get_i64())
        }
        6 => HeaderValue::ByteArray(read_prefixed(data)?.to_vec()),
        7 => HeaderValue::String(String::from_utf8_lossy(read_prefixed(data)?).into_owned()),
        8 => {
            require(data, 8)?;
            HeaderValue::Timestamp(data.get_i64())
        }
        9 => {
            require(data, 16)?;
            let mut uuid = [0u8; 16];
            data.copy_to_slice(&mut uuid);
            HeaderValue::Uuid(uuid)
        }
        other => return Err(ParseError::InvalidHeaderType(other)),
    };

    Ok(value)
}

/// Read a u16 length-prefixed byte run
fn read_prefixed<'a>(data: &mut &'a [u8]) -> ParseResult<&'a [u8]> {
    require(data, 2)?;
    let len = data.get_u16() as usize;
    require(data, len)?;
    let slice: &'a [u8] = *data;
    let (value, rest) = slice.split_at(len);
    *data = rest;
    Ok(value)
}

fn require(data: &[u8], needed: usize) -> ParseResult<()> {
    if data.len() < needed {
        Err(ParseError::Truncated {
            needed,
            available: data.len(),
        })
    } else {
        Ok(())
    }
}

/// Encode string headers (test fixtures only)
#[cfg(test)]
pub(crate) fn encode_string_headers(headers: &[(&str, &str)]) -> Vec<u8> {
    let mut out = Vec::new();
    for (name, value) in headers {
        out.push(name.len() as u8);
        out.extend_from_slice(name.as_bytes());
        out.push(7);
        out.extend_from_slice(&(value.len() as u16).to_be_bytes());
        out.extend_from_slice(value.as_bytes());
    }
    out
}
