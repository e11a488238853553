use std::fmt::{Display, Formatter};

use devproxy_protocol::{Frame, Response, Traceback, UnmarshalError};

/// A failure inside a target, reported to the client as an exception response.
#[derive(Clone, Debug, PartialEq)]
pub struct Fault {
    message: String,
    frames: Vec<Frame>,
}

/// Create a [`Fault`] from a format string, recording the current source location as a frame.
#[macro_export]
macro_rules! fault {
    ($($arg:tt)*) => {
        $crate::Fault::new(format!($($arg)*)).at(file!(), module_path!(), line!())
    };
}

impl Fault {
    pub fn new<T: Into<String>>(message: T) -> Self {
        Self {
            message: message.into(),
            frames: Vec::new(),
        }
    }

    /// Append an inner frame.
    pub fn at(mut self, filename: &str, name: &str, lineno: u32) -> Self {
        self.frames.push(Frame::new(filename, name, lineno));
        self
    }

    /// Prepend an outer frame, e.g. the dispatcher which called into the target.
    pub fn context(mut self, filename: &str, name: &str, lineno: u32) -> Self {
        self.frames.insert(0, Frame::new(filename, name, lineno));
        self
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn frames(&self) -> &[Frame] {
        &self.frames
    }

    pub fn into_response(self) -> Response {
        Response::exception(&self.message, Traceback::from_frames(&self.frames))
    }
}

impl Display for Fault {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.message)
    }
}

impl From<UnmarshalError> for Fault {
    fn from(x: UnmarshalError) -> Self {
        Fault::new(x.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn macro_records_location() {
        let fault = crate::fault!("bad value {}", 3);
        assert_eq!(fault.message(), "bad value 3");
        assert_eq!(fault.frames().len(), 1);
        assert!(fault.frames()[0].filename.ends_with("fault.rs"));
        assert_eq!(fault.frames()[0].name, "devproxy::fault::tests");
    }

    #[test]
    fn context_is_outermost() {
        let fault = Fault::new("x").at("inner.rs", "inner", 2).context("outer.rs", "outer", 1);
        let response = fault.into_response();
        assert_eq!(response.message.as_deref(), Some("x"));
        let tb: Traceback = serde_json::from_value(response.traceback.unwrap()).unwrap();
        let frames = tb.frames();
        assert_eq!(frames[0].name, "outer");
        assert_eq!(frames[1].name, "inner");
    }

    #[test]
    fn no_frames_no_traceback() {
        let response = Fault::new("x").into_response();
        assert!(response.traceback.is_none());
    }
}
