//! Result envelope and its serialisations.
//!
//! # Responsibilities
//! - Collect the optional arguments of `success` / `fail` / `result`
//! - Resolve the HTTP status from `code` or the `statuscode` pseudo header
//! - Serialise the envelope as json, jsonp, xml or text
//!
//! # Design Decisions
//! - Positional arguments become a builder plus `From` impls for tuples,
//!   so `("ok", json!({..}))` reads like the positional form
//! - `time` is unix seconds as an integer

use std::fmt::Write as _;
use std::str::FromStr;
use std::time::{SystemTime, UNIX_EPOCH};

use axum::http::{HeaderMap, StatusCode};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Pseudo header that overrides the status derived from `code`.
pub const STATUS_CODE_HEADER: &str = "statuscode";

/// Request header naming the preferred content kind.
pub const RESPONSE_TYPE_HEADER: &str = "response-type";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContentKind {
    Json,
    Jsonp,
    Xml,
    Text,
}

impl ContentKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ContentKind::Json => "json",
            ContentKind::Jsonp => "jsonp",
            ContentKind::Xml => "xml",
            ContentKind::Text => "text",
        }
    }

    pub fn content_type(&self) -> &'static str {
        match self {
            ContentKind::Json => "application/json; charset=utf-8",
            ContentKind::Jsonp => "application/javascript; charset=utf-8",
            ContentKind::Xml => "text/xml; charset=utf-8",
            ContentKind::Text => "text/plain; charset=utf-8",
        }
    }
}

impl FromStr for ContentKind {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "json" => Ok(ContentKind::Json),
            "jsonp" => Ok(ContentKind::Jsonp),
            "xml" => Ok(ContentKind::Xml),
            "text" => Ok(ContentKind::Text),
            _ => Err(()),
        }
    }
}

/// Arguments of a `success` / `fail` / `result` call.
#[derive(Debug, Clone, Default)]
pub struct Reply {
    pub msg: String,
    pub data: Value,
    /// `None` lets the caller pick its default (1 for success, 0 for failure).
    pub code: Option<i64>,
    pub kind: Option<ContentKind>,
    pub headers: HeaderMap,
}

impl Reply {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn msg(mut self, msg: impl Into<String>) -> Self {
        self.msg = msg.into();
        self
    }

    pub fn data(mut self, data: Value) -> Self {
        self.data = data;
        self
    }

    pub fn code(mut self, code: i64) -> Self {
        self.code = Some(code);
        self
    }

    pub fn kind(mut self, kind: ContentKind) -> Self {
        self.kind = Some(kind);
        self
    }

    pub fn headers(mut self, headers: HeaderMap) -> Self {
        self.headers = headers;
        self
    }
}

impl From<()> for Reply {
    fn from(_: ()) -> Self {
        Reply::new()
    }
}

impl From<&str> for Reply {
    fn from(msg: &str) -> Self {
        Reply::new().msg(msg)
    }
}

impl From<String> for Reply {
    fn from(msg: String) -> Self {
        Reply::new().msg(msg)
    }
}

impl<M: Into<String>> From<(M,)> for Reply {
    fn from((msg,): (M,)) -> Self {
        Reply::new().msg(msg)
    }
}

impl<M: Into<String>> From<(M, Value)> for Reply {
    fn from((msg, data): (M, Value)) -> Self {
        Reply::new().msg(msg).data(data)
    }
}

impl<M: Into<String>> From<(M, Value, i64)> for Reply {
    fn from((msg, data, code): (M, Value, i64)) -> Self {
        Reply::new().msg(msg).data(data).code(code)
    }
}

impl<M: Into<String>> From<(M, Value, i64, ContentKind)> for Reply {
    fn from((msg, data, code, kind): (M, Value, i64, ContentKind)) -> Self {
        Reply::new().msg(msg).data(data).code(code).kind(kind)
    }
}

impl<M: Into<String>> From<(M, Value, i64, ContentKind, HeaderMap)> for Reply {
    fn from((msg, data, code, kind, headers): (M, Value, i64, ContentKind, HeaderMap)) -> Self {
        Reply::new().msg(msg).data(data).code(code).kind(kind).headers(headers)
    }
}

/// Serialised result body.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Envelope {
    pub code: i64,
    pub msg: String,
    pub time: i64,
    pub data: Value,
}

impl Envelope {
    pub fn new(code: i64, msg: impl Into<String>, data: Value) -> Self {
        Self {
            code,
            msg: msg.into(),
            time: unix_now(),
            data,
        }
    }
}

fn unix_now() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs() as i64)
        .unwrap_or_default()
}

/// Status for an envelope. A `statuscode` header wins and is removed from
/// `headers`; otherwise codes outside `200..1000` map to 200.
pub fn resolve_status(code: i64, headers: &mut HeaderMap) -> StatusCode {
    if let Some(raw) = headers.remove(STATUS_CODE_HEADER) {
        return raw
            .to_str()
            .ok()
            .and_then(|s| s.trim().parse::<u16>().ok())
            .and_then(|c| StatusCode::from_u16(c).ok())
            .unwrap_or(StatusCode::OK);
    }
    if !(200..1000).contains(&code) {
        return StatusCode::OK;
    }
    u16::try_from(code)
        .ok()
        .and_then(|c| StatusCode::from_u16(c).ok())
        .unwrap_or(StatusCode::OK)
}

/// Formatting knobs taken from the `[response]` config section.
#[derive(Debug, Clone)]
pub struct RenderOptions<'a> {
    pub jsonp_callback: &'a str,
    pub xml_root: &'a str,
}

/// Renders `envelope` as `kind`, returning the body bytes.
pub fn render(
    envelope: &Envelope,
    kind: ContentKind,
    options: &RenderOptions<'_>,
) -> Result<Vec<u8>, serde_json::Error> {
    match kind {
        ContentKind::Json => serde_json::to_vec(envelope),
        ContentKind::Jsonp => {
            let json = serde_json::to_string(envelope)?;
            Ok(format!("{}({});", options.jsonp_callback, json).into_bytes())
        }
        ContentKind::Xml => {
            let value = serde_json::to_value(envelope)?;
            Ok(to_xml(&value, options.xml_root).into_bytes())
        }
        ContentKind::Text => Ok(envelope.msg.clone().into_bytes()),
    }
}

/// JSONP callbacks may only contain identifier characters, dots and `$`.
pub fn is_valid_callback(name: &str) -> bool {
    !name.is_empty()
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '.' | '$'))
}

/// XML document with `root` as the top element. Array entries become
/// `<item id="n">` and keys that are not valid element names are
/// written as `<item key="...">`.
pub fn to_xml(value: &Value, root: &str) -> String {
    let mut out = String::from(r#"<?xml version="1.0" encoding="utf-8"?>"#);
    let _ = write!(out, "<{}>", root);
    write_xml_value(&mut out, value);
    let _ = write!(out, "</{}>", root);
    out
}

fn write_xml_value(out: &mut String, value: &Value) {
    match value {
        Value::Null => {}
        Value::Bool(b) => out.push_str(if *b { "true" } else { "false" }),
        Value::Number(n) => out.push_str(&n.to_string()),
        Value::String(s) => escape_xml(out, s),
        Value::Array(items) => {
            for (id, item) in items.iter().enumerate() {
                let _ = write!(out, r#"<item id="{}">"#, id);
                write_xml_value(out, item);
                out.push_str("</item>");
            }
        }
        Value::Object(map) => {
            for (key, item) in map {
                if is_xml_name(key) {
                    let _ = write!(out, "<{}>", key);
                    write_xml_value(out, item);
                    let _ = write!(out, "</{}>", key);
                } else {
                    out.push_str(r#"<item key=""#);
                    escape_xml(out, key);
                    out.push_str(r#"">"#);
                    write_xml_value(out, item);
                    out.push_str("</item>");
                }
            }
        }
    }
}

fn is_xml_name(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '.'))
}

fn escape_xml(out: &mut String, text: &str) {
    for c in text.chars() {
        match c {
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '&' => out.push_str("&amp;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            other => out.push(other),
        }
    }
}
