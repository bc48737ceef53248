//! IMAP response parser.
//!
//! A sans-I/O parser for the subset of RFC 9051 responses a login handshake
//! produces: status responses (tagged and untagged), `* CAPABILITY` data and
//! continuation requests. Anything else is preserved as
//! [`UntaggedResponse::Other`] so callers can skip it.
//!
//! # Example
//!
//! ```
//! use mailprobe_imap::parser::{Response, ResponseParser, UntaggedResponse};
//!
//! let response = ResponseParser::parse(b"* OK IMAP4rev2 server ready\r\n").unwrap();
//!
//! match response {
//!     Response::Untagged(UntaggedResponse::Ok { text, .. }) => {
//!         assert!(text.contains("IMAP4rev2"));
//!     }
//!     _ => panic!("Expected untagged OK"),
//! }
//! ```

use crate::types::{Capability, ResponseCode, Status};
use crate::{Error, Result};

/// A parsed IMAP response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Response {
    /// Tagged response (command completion).
    Tagged {
        /// The command tag.
        tag: String,
        /// Response status.
        status: Status,
        /// Optional response code.
        code: Option<ResponseCode>,
        /// Human-readable text.
        text: String,
    },
    /// Untagged response (server data).
    Untagged(UntaggedResponse),
    /// Continuation request.
    Continuation {
        /// Optional text/data.
        text: Option<String>,
    },
}

/// Untagged server responses.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UntaggedResponse {
    /// `* OK`
    Ok {
        /// Optional response code.
        code: Option<ResponseCode>,
        /// Human-readable text.
        text: String,
    },
    /// `* NO`
    No {
        /// Optional response code.
        code: Option<ResponseCode>,
        /// Human-readable text.
        text: String,
    },
    /// `* BAD`
    Bad {
        /// Optional response code.
        code: Option<ResponseCode>,
        /// Human-readable text.
        text: String,
    },
    /// `* PREAUTH`
    PreAuth {
        /// Optional response code.
        code: Option<ResponseCode>,
        /// Human-readable text.
        text: String,
    },
    /// `* BYE`
    Bye {
        /// Optional response code.
        code: Option<ResponseCode>,
        /// Human-readable text.
        text: String,
    },
    /// `* CAPABILITY ...`
    Capability(Vec<Capability>),
    /// Any other untagged data, kept as text.
    Other(String),
}

impl UntaggedResponse {
    /// Returns the capabilities advertised by this response, if any.
    #[must_use]
    pub fn capabilities(&self) -> Option<&[Capability]> {
        match self {
            Self::Capability(caps)
            | Self::Ok {
                code: Some(ResponseCode::Capability(caps)),
                ..
            }
            | Self::PreAuth {
                code: Some(ResponseCode::Capability(caps)),
                ..
            } => Some(caps),
            _ => None,
        }
    }
}

/// Response parser.
pub struct ResponseParser;

impl ResponseParser {
    /// Parses a complete response line (with or without the trailing CRLF).
    ///
    /// # Errors
    ///
    /// Returns [`Error::Parse`] if the line is not a well-formed response.
    pub fn parse(input: &[u8]) -> Result<Response> {
        let line = String::from_utf8_lossy(input);
        let line = line.trim_end_matches(['\r', '\n']);

        if let Some(rest) = line.strip_prefix('+') {
            let text = rest.trim_start();
            return Ok(Response::Continuation {
                text: (!text.is_empty()).then(|| text.to_string()),
            });
        }

        let (first, rest) = line.split_once(' ').ok_or_else(|| Error::Parse {
            position: line.len(),
            message: "expected SP after tag".to_string(),
        })?;

        if first.is_empty() {
            return Err(Error::Parse {
                position: 0,
                message: "empty tag".to_string(),
            });
        }

        if first == "*" {
            return Ok(Response::Untagged(Self::parse_untagged(rest)));
        }

        let (keyword, text) = rest.split_once(' ').unwrap_or((rest, ""));
        let status = Status::parse(keyword).ok_or_else(|| Error::Parse {
            position: first.len() + 1,
            message: format!("expected status keyword, got {keyword:?}"),
        })?;
        let (code, text) = Self::parse_resp_text(text);

        Ok(Response::Tagged {
            tag: first.to_string(),
            status,
            code,
            text,
        })
    }

    /// Parses the part of an untagged response after `* `.
    fn parse_untagged(rest: &str) -> UntaggedResponse {
        let (keyword, tail) = rest.split_once(' ').unwrap_or((rest, ""));

        if keyword.eq_ignore_ascii_case("CAPABILITY") {
            return UntaggedResponse::Capability(Capability::parse_list(tail));
        }

        let Some(status) = Status::parse(keyword) else {
            return UntaggedResponse::Other(rest.to_string());
        };

        let (code, text) = Self::parse_resp_text(tail);
        match status {
            Status::Ok => UntaggedResponse::Ok { code, text },
            Status::No => UntaggedResponse::No { code, text },
            Status::Bad => UntaggedResponse::Bad { code, text },
            Status::PreAuth => UntaggedResponse::PreAuth { code, text },
            Status::Bye => UntaggedResponse::Bye { code, text },
        }
    }

    /// Splits `resp-text` into an optional `[code]` and the human-readable text.
    fn parse_resp_text(input: &str) -> (Option<ResponseCode>, String) {
        if let Some(after_bracket) = input.strip_prefix('[')
            && let Some(end) = after_bracket.find(']')
        {
            let code = ResponseCode::parse(&after_bracket[..end]);
            let text = after_bracket[end + 1..].trim_start();
            return (Some(code), text.to_string());
        }
        (None, input.to_string())
    }
}
