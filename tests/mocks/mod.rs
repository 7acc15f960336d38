//! Shared helpers for the integration tests: a multipart body parser, a
//! reader that always fails, and context builders pointed at a mock server.

#![allow(dead_code)]

use std::io;
use std::pin::Pin;
use std::task::{Context, Poll};

use model_transform::RequestContext;
use tokio::io::{AsyncRead, ReadBuf};

pub const TEST_TOKEN: &str = "test-token";

/// One decoded part of a `multipart/form-data` body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormPart {
    pub name: String,
    pub filename: Option<String>,
    pub content: Vec<u8>,
}

impl FormPart {
    pub fn text(&self) -> &str {
        std::str::from_utf8(&self.content).expect("part content is not UTF-8")
    }
}

/// Decode a multipart body using the boundary from its content type.
pub fn parse_form(content_type: &str, body: &[u8]) -> Vec<FormPart> {
    let boundary = content_type
        .split("boundary=")
        .nth(1)
        .expect("content type carries no boundary");
    let delimiter = format!("--{}", boundary).into_bytes();

    let mut parts = Vec::new();
    for segment in split_on(body, &delimiter).into_iter().skip(1) {
        if segment.starts_with(b"--") {
            break;
        }
        let segment = segment
            .strip_prefix(b"\r\n")
            .expect("delimiter not followed by CRLF");
        let segment = segment
            .strip_suffix(b"\r\n")
            .expect("part not terminated by CRLF");
        let header_end = find(segment, b"\r\n\r\n").expect("part has no header block");
        let headers = std::str::from_utf8(&segment[..header_end]).expect("headers are not UTF-8");

        parts.push(FormPart {
            name: quoted_param(headers, "; name=\"").expect("part has no name"),
            filename: quoted_param(headers, "; filename=\""),
            content: segment[header_end + 4..].to_vec(),
        });
    }
    parts
}

fn split_on<'a>(haystack: &'a [u8], needle: &[u8]) -> Vec<&'a [u8]> {
    let mut out = Vec::new();
    let mut rest = haystack;
    while let Some(at) = find(rest, needle) {
        out.push(&rest[..at]);
        rest = &rest[at + needle.len()..];
    }
    out.push(rest);
    out
}

fn find(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    haystack.windows(needle.len()).position(|w| w == needle)
}

fn quoted_param(headers: &str, key: &str) -> Option<String> {
    let start = headers.find(key)? + key.len();
    let end = headers[start..].find('"')?;
    Some(headers[start..start + end].to_string())
}

/// Context addressed at a mock server (or any base URL with a scheme).
pub fn context_for(base_url: &str) -> RequestContext {
    RequestContext::new(base_url, TEST_TOKEN)
}

/// Reader that fails on the first poll.
pub struct FailingReader;

impl AsyncRead for FailingReader {
    fn poll_read(
        self: Pin<&mut Self>,
        _cx: &mut Context<'_>,
        _buf: &mut ReadBuf<'_>,
    ) -> Poll<io::Result<()>> {
        Poll::Ready(Err(io::Error::new(
            io::ErrorKind::BrokenPipe,
            "model stream went away",
        )))
    }
}

/// Skip integration tests that require opening localhost sockets when the
/// execution environment forbids binding ports.
pub fn skip_if_localhost_bind_unavailable() -> bool {
    if std::net::TcpListener::bind("127.0.0.1:0").is_ok() {
        return false;
    }

    eprintln!("Skipping test: cannot bind localhost sockets in this environment");
    true
}
