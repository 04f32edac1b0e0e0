//! STOMP 1.2 frame codec.
//!
//! A frame on the wire is a command line, `key:value` header lines, an empty
//! line, the body and a terminating NUL byte. Bare EOLs between frames are
//! heart-beats and are skipped by the reader.

use std::fmt;
use std::io;

use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncReadExt};

/// Largest frame body accepted from the broker, in bytes.
pub const MAX_FRAME_BODY: u64 = 1024 * 1024;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    pub command: String,
    pub headers: Vec<(String, String)>,
    pub body: String,
}

impl Frame {
    pub fn new(command: impl Into<String>) -> Self {
        Self {
            command: command.into(),
            headers: Vec::new(),
            body: String::new(),
        }
    }

    pub fn header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((key.into(), value.into()));
        self
    }

    pub fn with_body(mut self, body: impl Into<String>) -> Self {
        self.body = body.into();
        self
    }

    /// Value of the first header named `key`. Repeated headers keep their first value.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// CONNECT and CONNECTED frames are exempt from header escaping.
    fn escapes_headers(&self) -> bool {
        !matches!(self.command.as_str(), "CONNECT" | "CONNECTED")
    }

    /// Serializes the frame. SEND frames always carry a `content-length`.
    pub fn encode(&self) -> Vec<u8> {
        let escape = self.escapes_headers();
        let mut out = String::with_capacity(self.command.len() + self.body.len() + 64);
        out.push_str(&self.command);
        out.push('\n');
        for (key, value) in &self.headers {
            if escape {
                out.push_str(&escape_header(key));
                out.push(':');
                out.push_str(&escape_header(value));
            } else {
                out.push_str(key);
                out.push(':');
                out.push_str(value);
            }
            out.push('\n');
        }
        if self.command == "SEND" && self.get("content-length").is_none() {
            out.push_str(&format!("content-length:{}\n", self.body.len()));
        }
        out.push('\n');
        out.push_str(&self.body);

        let mut bytes = out.into_bytes();
        bytes.push(0);
        bytes
    }
}

impl fmt::Display for Frame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} [", self.command)?;
        for (i, (key, value)) in self.headers.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{key}: {value}")?;
        }
        write!(f, "]")
    }
}

fn escape_header(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for c in raw.chars() {
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

fn unescape_header(raw: &str) -> io::Result<String> {
    let mut out = String::with_capacity(raw.len());
    let mut chars = raw.chars();
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
                return Err(invalid(format!(
                    "undefined escape sequence \\{}",
                    other.map(String::from).unwrap_or_default()
                )));
            }
        }
    }
    Ok(out)
}

fn invalid(msg: impl Into<String>) -> io::Error {
    io::Error::new(io::ErrorKind::InvalidData, msg.into())
}

/// Reads one line, without its `\n` or `\r\n`. `None` on EOF.
async fn read_line<R: AsyncBufRead + Unpin>(reader: &mut R) -> io::Result<Option<String>> {
    let mut buf = Vec::new();
    if reader.read_until(b'\n', &mut buf).await? == 0 {
        return Ok(None);
    }
    if buf.last() == Some(&b'\n') {
        buf.pop();
    }
    if buf.last() == Some(&b'\r') {
        buf.pop();
    }
    String::from_utf8(buf)
        .map(Some)
        .map_err(|_| invalid("frame line is not valid UTF-8"))
}

/// Reads the next frame from `reader`.
///
/// Returns `Ok(None)` when the peer closed the stream between frames. A stream
/// closed in the middle of a frame is an `UnexpectedEof` error, a malformed
/// frame an `InvalidData` error.
pub async fn read_frame<R: AsyncBufRead + Unpin>(reader: &mut R) -> io::Result<Option<Frame>> {
    let command = loop {
        match read_line(reader).await? {
            None => return Ok(None),
            Some(line) if line.is_empty() => continue,
            Some(line) => break line,
        }
    };

    let escaped = !matches!(command.as_str(), "CONNECT" | "CONNECTED");
    let mut frame = Frame::new(command);
    loop {
        let line = read_line(reader)
            .await?
            .ok_or_else(|| io::Error::from(io::ErrorKind::UnexpectedEof))?;
        if line.is_empty() {
            break;
        }
        let (key, value) = line
            .split_once(':')
            .ok_or_else(|| invalid(format!("malformed header line: {line}")))?;
        if escaped {
            frame.headers.push((unescape_header(key)?, unescape_header(value)?));
        } else {
            frame.headers.push((key.to_string(), value.to_string()));
        }
    }

    let body = match frame.get("content-length") {
        Some(len) => {
            let len: u64 = len
                .trim()
                .parse()
                .map_err(|_| invalid(format!("bad content-length: {len}")))?;
            if len > MAX_FRAME_BODY {
                return Err(invalid(format!(
                    "content-length {len} exceeds the {MAX_FRAME_BODY} byte limit"
                )));
            }
            let mut body = Vec::new();
            (&mut *reader).take(len).read_to_end(&mut body).await?;
            if (body.len() as u64) < len {
                return Err(io::Error::from(io::ErrorKind::UnexpectedEof));
            }
            if reader.read_u8().await? != 0 {
                return Err(invalid("frame body not terminated by NUL"));
            }
            body
        }
        None => {
            let mut body = Vec::new();
            (&mut *reader)
                .take(MAX_FRAME_BODY + 1)
                .read_until(0, &mut body)
                .await?;
            if body.pop() != Some(0) {
                if body.len() as u64 >= MAX_FRAME_BODY {
                    return Err(invalid(format!(
                        "frame body exceeds the {MAX_FRAME_BODY} byte limit"
                    )));
                }
                return Err(io::Error::from(io::ErrorKind::UnexpectedEof));
            }
            body
        }
    };
    frame.body = String::from_utf8_lossy(&body).into_owned();

    Ok(Some(frame))
}
