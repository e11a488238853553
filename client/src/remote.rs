use std::fmt::Write;

use devproxy_protocol::Frame;
use serde_json::Value as JsonValue;
use thiserror::Error;

/// Any failure which occurred on the remote side after a command was delivered.
///
/// The concrete type of the remote failure is not transferred, only its message and, with the
/// `traceback` feature enabled, the frames of the remote stack.
#[derive(Error, Debug, Clone, PartialEq)]
#[error("{message}")]
pub struct RemoteException {
    message: String,
    frames: Vec<Frame>,
}

impl RemoteException {
    pub fn new(message: &str) -> Self {
        Self {
            message: message.to_string(),
            frames: Vec::new(),
        }
    }

    pub(crate) fn from_response(message: Option<String>, traceback: Option<JsonValue>) -> Self {
        Self {
            message: message.unwrap_or_default(),
            frames: traceback.map(reconstruct_frames).unwrap_or_default(),
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    /// Remote frames, outermost first. Empty if the remote did not send a traceback.
    pub fn frames(&self) -> &[Frame] {
        &self.frames
    }

    pub fn format_traceback(&self) -> String {
        let mut ret = String::new();
        if !self.frames.is_empty() {
            ret.push_str("Traceback (most recent call last):\n");
            for frame in &self.frames {
                let _ = writeln!(ret, "{}", frame);
            }
        }
        let _ = write!(ret, "RemoteException: {}", self.message);
        ret
    }
}

#[cfg(feature = "traceback")]
fn reconstruct_frames(traceback: JsonValue) -> Vec<Frame> {
    match serde_json::from_value::<devproxy_protocol::Traceback>(traceback) {
        Ok(tb) => tb.frames(),
        Err(err) => {
            log::debug!("Cannot decode remote traceback: {}", err);
            Vec::new()
        }
    }
}

#[cfg(not(feature = "traceback"))]
fn reconstruct_frames(_traceback: JsonValue) -> Vec<Frame> {
    Vec::new()
}

#[cfg(test)]
mod tests {
    use super::*;
    use devproxy_protocol::Traceback;

    #[test]
    fn message_only() {
        let exc = RemoteException::from_response(Some("boom".to_string()), None);
        assert_eq!(exc.to_string(), "boom");
        assert!(exc.frames().is_empty());
        assert_eq!(exc.format_traceback(), "RemoteException: boom");
    }

    #[test]
    fn missing_message_is_empty() {
        let exc = RemoteException::from_response(None, None);
        assert_eq!(exc.message(), "");
    }

    #[test]
    fn garbage_traceback_keeps_message() {
        let exc = RemoteException::from_response(Some("boom".to_string()), Some(JsonValue::from(12)));
        assert_eq!(exc.message(), "boom");
        assert!(exc.frames().is_empty());
    }

    #[cfg(feature = "traceback")]
    #[test]
    fn frames_are_reattached() {
        let tb = Traceback::from_frames(&[Frame::new("app.rs", "dispatch", 10), Frame::new("widget.rs", "fail", 42)]);
        let tb = serde_json::to_value(tb).unwrap();
        let exc = RemoteException::from_response(Some("boom".to_string()), Some(tb));
        assert_eq!(exc.frames().len(), 2);
        assert_eq!(exc.frames()[1], Frame::new("widget.rs", "fail", 42));
        assert_eq!(
            exc.format_traceback(),
            "Traceback (most recent call last):\n  \
             File \"app.rs\", line 10, in dispatch\n  \
             File \"widget.rs\", line 42, in fail\n\
             RemoteException: boom"
        );
    }

    #[cfg(not(feature = "traceback"))]
    #[test]
    fn frames_are_dropped() {
        let tb = Traceback::from_frames(&[Frame::new("widget.rs", "fail", 42)]);
        let tb = serde_json::to_value(tb).unwrap();
        let exc = RemoteException::from_response(Some("boom".to_string()), Some(tb));
        assert!(exc.frames().is_empty());
    }
}
