use std::{fmt, str::FromStr};

use super::{EXIT_KEYWORD, FIELD_SEPARATOR, MAX_FRAME_LEN};

const INIT_USAGE_MSG: &str = "INIT|genre|setting";
const CONTINUE_USAGE_MSG: &str = "CONTINUE|genre|text";
const END_USAGE_MSG: &str = "END|genre";
const SUGGEST_USAGE_MSG: &str = "SUGGEST";

// longest unknown tag that is echoed back to the client
const MAX_ECHOED_TAG_LEN: usize = 32;

const OK_STATUS: &str = "OK";
const ERROR_STATUS: &str = "ERROR";

/// A single client request
///
/// the genre never contains a `|`, decoding splits it off at the first separator.
/// only the last field (setting or text) may hold more separators, so a request
/// built by hand with a `|` in its genre does not survive an encode/decode trip.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Request {
    Init { genre: String, setting: String },
    Continue { genre: String, text: String },
    End { genre: String },
    Suggest,
    Exit,
}

#[derive(thiserror::Error, Debug, PartialEq, Eq)]
pub enum RequestErr {
    #[error("the request is empty")]
    Empty,

    #[error("the request is not valid utf-8")]
    NonUtf8,

    #[error("unknown request type: {0}")]
    UnknownTag(String),

    #[error("usage: {0}")]
    BadUsage(&'static str),
}

impl Request {
    /// Decodes a request straight out of a frame payload
    pub fn from_bytes(raw: &[u8]) -> Result<Self, RequestErr> {
        std::str::from_utf8(raw)
            .map_err(|_| RequestErr::NonUtf8)?
            .parse()
    }
}

impl FromStr for Request {
    type Err = RequestErr;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        // an empty payload is how a client says goodbye
        if s.is_empty() || s.trim().eq_ignore_ascii_case(EXIT_KEYWORD) {
            return Ok(Self::Exit);
        }

        if s.trim().is_empty() {
            return Err(RequestErr::Empty);
        }

        // only split off the tag, the payload is handled per request type
        let (tag, payload) = match s.split_once(FIELD_SEPARATOR) {
            Some((tag, payload)) => (tag, Some(payload)),
            None => (s, None),
        };

        match tag {
            "INIT" => {
                let (genre, setting) = split_fields(payload, INIT_USAGE_MSG)?;
                Ok(Self::Init { genre, setting })
            }
            "CONTINUE" => {
                let (genre, text) = split_fields(payload, CONTINUE_USAGE_MSG)?;
                Ok(Self::Continue { genre, text })
            }
            "END" => {
                let genre = payload.ok_or(RequestErr::BadUsage(END_USAGE_MSG))?;
                Ok(Self::End {
                    genre: genre.into(),
                })
            }
            "SUGGEST" => match payload {
                None => Ok(Self::Suggest),
                Some(_) => Err(RequestErr::BadUsage(SUGGEST_USAGE_MSG)),
            },
            tag => Err(RequestErr::UnknownTag(
                tag.chars().take(MAX_ECHOED_TAG_LEN).collect(),
            )),
        }
    }
}

// splits "genre|free text" in two, the free text may contain more separators
fn split_fields(
    payload: Option<&str>,
    usage: &'static str,
) -> Result<(String, String), RequestErr> {
    payload
        .and_then(|payload| payload.split_once(FIELD_SEPARATOR))
        .map(|(genre, text)| (genre.into(), text.into()))
        .ok_or(RequestErr::BadUsage(usage))
}

impl fmt::Display for Request {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sep = FIELD_SEPARATOR;
        match self {
            Self::Init { genre, setting } => write!(f, "INIT{sep}{genre}{sep}{setting}"),
            Self::Continue { genre, text } => write!(f, "CONTINUE{sep}{genre}{sep}{text}"),
            Self::End { genre } => write!(f, "END{sep}{genre}"),
            Self::Suggest => f.write_str("SUGGEST"),
            Self::Exit => f.write_str(EXIT_KEYWORD),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Response {
    Ok(String),
    Error(String),
}

#[derive(thiserror::Error, Debug, PartialEq, Eq)]
pub enum ResponseErr {
    #[error("the response has no status separator")]
    MissingSeparator,

    #[error("unknown response status: {0}")]
    UnknownStatus(String),
}

impl Response {
    pub fn ok(content: impl Into<String>) -> Self {
        Self::Ok(fit_to_frame(content.into(), OK_STATUS))
    }

    pub fn error(reason: impl Into<String>) -> Self {
        Self::Error(fit_to_frame(reason.into(), ERROR_STATUS))
    }

    #[cfg(test)]
    pub fn is_ok(&self) -> bool {
        matches!(self, Self::Ok(_))
    }
}

// cuts the content so that "<status>|<content>" always fits in a single frame
fn fit_to_frame(mut content: String, status: &str) -> String {
    let limit = MAX_FRAME_LEN - status.len() - FIELD_SEPARATOR.len_utf8();
    if content.len() > limit {
        let mut end = limit;
        while !content.is_char_boundary(end) {
            end -= 1;
        }
        content.truncate(end);
    }

    content
}

impl FromStr for Response {
    type Err = ResponseErr;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (status, content) = s
            .split_once(FIELD_SEPARATOR)
            .ok_or(ResponseErr::MissingSeparator)?;

        match status {
            OK_STATUS => Ok(Self::Ok(content.into())),
            ERROR_STATUS => Ok(Self::Error(content.into())),
            status => Err(ResponseErr::UnknownStatus(status.into())),
        }
    }
}

impl fmt::Display for Response {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Ok(content) => write!(f, "{OK_STATUS}{FIELD_SEPARATOR}{content}"),
            Self::Error(reason) => write!(f, "{ERROR_STATUS}{FIELD_SEPARATOR}{reason}"),
        }
    }
}
