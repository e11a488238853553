//! Structured tracebacks attached to exception responses.
//!
//! On the wire a traceback is a linked list of nodes, outermost frame first:
//!
//! ```text
//! {"tb_frame": {"f_code": {"co_filename": "...", "co_name": "..."}, "f_lineno": 12},
//!  "tb_lineno": 12,
//!  "tb_next": { ... } | null}
//! ```
use std::fmt::{Display, Formatter};

use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Frame {
    pub filename: String,
    pub name: String,
    pub lineno: u32,
}

impl Frame {
    pub fn new(filename: &str, name: &str, lineno: u32) -> Self {
        Self {
            filename: filename.to_string(),
            name: name.to_string(),
            lineno,
        }
    }
}

impl Display for Frame {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "  File \"{}\", line {}, in {}", self.filename, self.lineno, self.name)
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Code {
    pub co_filename: String,
    pub co_name: String,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TracebackFrame {
    pub f_code: Code,
    #[serde(default)]
    pub f_lineno: u32,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Traceback {
    pub tb_frame: TracebackFrame,
    pub tb_lineno: u32,
    #[serde(default)]
    pub tb_next: Option<Box<Traceback>>,
}

impl Traceback {
    /// Chain the given frames, outermost first. `None` if there are no frames.
    pub fn from_frames(frames: &[Frame]) -> Option<Self> {
        frames.iter().rev().fold(None, |next, frame| {
            Some(Traceback {
                tb_frame: TracebackFrame {
                    f_code: Code {
                        co_filename: frame.filename.clone(),
                        co_name: frame.name.clone(),
                    },
                    f_lineno: frame.lineno,
                },
                tb_lineno: frame.lineno,
                tb_next: next.map(Box::new),
            })
        })
    }

    pub fn frames(&self) -> Vec<Frame> {
        let mut ret = Vec::new();
        let mut node = Some(self);
        while let Some(tb) = node {
            ret.push(Frame {
                filename: tb.tb_frame.f_code.co_filename.clone(),
                name: tb.tb_frame.f_code.co_name.clone(),
                lineno: tb.tb_lineno,
            });
            node = tb.tb_next.as_deref();
        }
        ret
    }
}
