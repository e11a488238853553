//! Wire types of the devproxy call protocol.
//!
//! Every exchange is a single JSON object per line in each direction. A [`Command`] either reads
//! an attribute of a remote target or calls one of its functions, and the remote side answers
//! with exactly one [`Response`].
use std::fmt::{Debug, Formatter};

use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

pub mod error;
pub mod traceback;
pub mod value;

pub use crate::error::UnmarshalError;
pub use crate::traceback::{Frame, Traceback};
pub use crate::value::{
    marshal_args, marshal_kwargs, unmarshal_args, unmarshal_kwargs, Kwargs, RemoteVar, TypedValue,
    Value, WireKwargs, WireValue,
};

pub const STATUS_SUCCESS: &str = "success";
pub const STATUS_EXCEPTION: &str = "exception";

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Command {
    Call {
        class: String,
        function: String,
        #[serde(default)]
        args: Vec<WireValue>,
        #[serde(default)]
        kwargs: WireKwargs,
    },
    Read {
        class: String,
        attribute: String,
    },
}

impl Command {
    pub fn call(class: &str, function: &str, args: &[Value], kwargs: &Kwargs) -> Self {
        Command::Call {
            class: class.to_string(),
            function: function.to_string(),
            args: marshal_args(args),
            kwargs: marshal_kwargs(kwargs),
        }
    }

    pub fn read(class: &str, attribute: &str) -> Self {
        Command::Read {
            class: class.to_string(),
            attribute: attribute.to_string(),
        }
    }

    /// The target class this command is routed to.
    pub fn class(&self) -> &str {
        match self {
            Command::Call { class, .. } => class,
            Command::Read { class, .. } => class,
        }
    }
}

#[derive(Clone, PartialEq, Serialize, Deserialize)]
pub struct Response {
    pub status: String,
    #[serde(rename = "return", skip_serializing_if = "Option::is_none", default)]
    pub ret: Option<WireValue>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub traceback: Option<JsonValue>,
}

/// The part of an exception response which survives a traceback too deeply nested to decode.
#[derive(Deserialize)]
struct ExceptionHead {
    status: String,
    #[serde(default)]
    message: Option<String>,
}

impl Response {
    /// Decode one response line.
    ///
    /// Each traceback frame adds a level of JSON nesting. If a deep traceback hits the decoder's
    /// recursion limit the exception is still returned, with the traceback dropped.
    pub fn decode(line: &[u8]) -> serde_json::Result<Self> {
        let err = match serde_json::from_slice(line) {
            Ok(x) => return Ok(x),
            Err(err) => err,
        };
        // unknown keys are skipped without recursing, so the head still decodes
        match serde_json::from_slice::<ExceptionHead>(line) {
            Ok(head) if head.status == STATUS_EXCEPTION => Ok(Self {
                status: head.status,
                ret: None,
                message: head.message,
                traceback: None,
            }),
            _ => Err(err),
        }
    }

    pub fn success(ret: WireValue) -> Self {
        Self {
            status: STATUS_SUCCESS.to_string(),
            ret: Some(ret),
            message: None,
            traceback: None,
        }
    }

    /// Answer to an attribute read which resolved to a method.
    pub fn callable() -> Self {
        Self::success(WireValue::Typed(TypedValue::callable()))
    }

    pub fn exception(message: &str, traceback: Option<Traceback>) -> Self {
        Self {
            status: STATUS_EXCEPTION.to_string(),
            ret: None,
            message: Some(message.to_string()),
            traceback: traceback.and_then(|x| serde_json::to_value(x).ok()),
        }
    }
}

impl Debug for Response {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match serde_json::to_string(self) {
            Ok(x) => f.write_str(&x),
            Err(_) => f.write_str("<unprintable response>"),
        }
    }
}
