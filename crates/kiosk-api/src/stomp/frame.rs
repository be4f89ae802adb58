//! STOMP 1.2 text frames.
//!
//! A frame is a command line, header lines, a blank line, the body and a
//! NUL terminator. Over WebSocket one text message may carry several
//! frames as well as bare EOLs (heart-beats), so decoding works on whole
//! messages and yields zero or more frames.

use std::fmt;

use crate::error::Error;

/// Frame commands used by a subscribing client.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Connect,
    Stomp,
    Connected,
    Subscribe,
    Unsubscribe,
    Send,
    Message,
    Receipt,
    Error,
    Disconnect,
}

impl Command {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Connect => "CONNECT",
            Self::Stomp => "STOMP",
            Self::Connected => "CONNECTED",
            Self::Subscribe => "SUBSCRIBE",
            Self::Unsubscribe => "UNSUBSCRIBE",
            Self::Send => "SEND",
            Self::Message => "MESSAGE",
            Self::Receipt => "RECEIPT",
            Self::Error => "ERROR",
            Self::Disconnect => "DISCONNECT",
        }
    }

    fn parse(line: &str) -> Option<Self> {
        Some(match line {
            "CONNECT" => Self::Connect,
            "STOMP" => Self::Stomp,
            "CONNECTED" => Self::Connected,
            "SUBSCRIBE" => Self::Subscribe,
            "UNSUBSCRIBE" => Self::Unsubscribe,
            "SEND" => Self::Send,
            "MESSAGE" => Self::Message,
            "RECEIPT" => Self::Receipt,
            "ERROR" => Self::Error,
            "DISCONNECT" => Self::Disconnect,
            _ => return None,
        })
    }

    /// CONNECT and CONNECTED headers are sent verbatim for 1.0 compatibility.
    fn escapes_headers(self) -> bool {
        !matches!(self, Self::Connect | Self::Connected)
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single STOMP frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    pub command: Command,
    /// Headers in wire order. Repeated names are allowed; the first wins.
    pub headers: Vec<(String, String)>,
    pub body: String,
}

impl Frame {
    pub fn new(command: Command) -> Self {
        Self {
            command,
            headers: Vec::new(),
            body: String::new(),
        }
    }

    /// Builder-style header append.
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    /// Look up a header by name (first occurrence).
    pub fn get(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }

    /// Serialize to wire text, including the trailing NUL.
    pub fn encode(&self) -> String {
        let escape = self.command.escapes_headers();
        let mut out = String::with_capacity(64 + self.body.len());
        out.push_str(self.command.as_str());
        out.push('\n');
        for (name, value) in &self.headers {
            if escape {
                out.push_str(&escape_header(name));
                out.push(':');
                out.push_str(&escape_header(value));
            } else {
                out.push_str(name);
                out.push(':');
                out.push_str(value);
            }
            out.push('\n');
        }
        out.push('\n');
        out.push_str(&self.body);
        out.push('\0');
        out
    }

    /// Parse one frame without its NUL terminator.
    pub fn parse(raw: &str) -> Result<Self, Error> {
        let (head, body) = split_head(raw)
            .ok_or_else(|| Error::Frame("missing blank line after headers".into()))?;

        let mut lines = head.split('\n').map(|l| l.strip_suffix('\r').unwrap_or(l));
        let command_line = lines.next().unwrap_or_default();
        let command = Command::parse(command_line)
            .ok_or_else(|| Error::Frame(format!("unknown command {command_line:?}")))?;

        let escape = command.escapes_headers();
        let mut headers = Vec::new();
        for line in lines {
            let (name, value) = line
                .split_once(':')
                .ok_or_else(|| Error::Frame(format!("header without colon: {line:?}")))?;
            if escape {
                headers.push((unescape_header(name)?, unescape_header(value)?));
            } else {
                headers.push((name.to_owned(), value.to_owned()));
            }
        }

        let mut frame = Self {
            command,
            headers,
            body: body.to_owned(),
        };

        if let Some(len) = frame.get("content-length").and_then(|v| v.parse::<usize>().ok()) {
            if len <= frame.body.len() && frame.body.is_char_boundary(len) {
                frame.body.truncate(len);
            }
        }

        Ok(frame)
    }
}

/// Split a frame into header block and body at the first blank line,
/// whichever line ending it uses.
fn split_head(raw: &str) -> Option<(&str, &str)> {
    let lf = raw.find("\n\n").map(|idx| (idx, 2));
    let crlf = raw.find("\r\n\r\n").map(|idx| (idx, 4));
    let (idx, sep) = [lf, crlf].into_iter().flatten().min_by_key(|&(idx, _)| idx)?;
    Some((&raw[..idx], &raw[idx + sep..]))
}

/// Decode a WebSocket text payload into frames.
///
/// Heart-beats (bare EOLs) are dropped. Text left over after the last NUL
/// that is not whitespace means a frame was cut in half.
pub fn decode_message(payload: &str) -> Result<Vec<Frame>, Error> {
    let mut frames = Vec::new();
    let mut chunks = payload.split('\0').peekable();

    while let Some(chunk) = chunks.next() {
        let chunk = chunk.trim_start_matches(['\r', '\n']);
        let is_last = chunks.peek().is_none();

        if is_last {
            if !chunk.trim().is_empty() {
                return Err(Error::Frame("frame is missing its NUL terminator".into()));
            }
            break;
        }
        if chunk.is_empty() {
            continue;
        }
        frames.push(Frame::parse(chunk)?);
    }

    Ok(frames)
}

fn escape_header(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            ':' => out.push_str("\\c"),
            other => out.push(other),
        }
    }
    out
}

fn unescape_header(value: &str) -> Result<String, Error> {
    let mut out = String::with_capacity(value.len());
    let mut chars = value.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('\\') => out.push('\\'),
            Some('n') => out.push('\n'),
            Some('r') => out.push('\r'),
            Some('c') => out.push(':'),
            other => {
                return Err(Error::Frame(format!("undefined header escape \\{}", other.unwrap_or(' '))));
            }
        }
    }
    Ok(out)
}
