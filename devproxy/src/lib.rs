//! Serves local objects to `devproxy_client::Proxy` instances.
//!
//! Objects are registered as [`Target`]s under a class name in the [`Registry`]. The [`App`]
//! accepts one command per TCP connection, dispatches it and answers with one response line.
use std::io;

use thiserror::Error;

pub mod app;
pub mod demo;
pub mod fault;
pub mod registry;
pub mod target;
pub mod vars;

pub use app::App;
pub use devproxy_protocol as protocol;
pub use fault::Fault;
pub use registry::Registry;
pub use target::{Member, Target};
pub use vars::Vars;

#[derive(Error, Debug)]
pub enum Error {
    #[error("IO Error occurred: {0}")]
    Io(io::Error),
    #[error("JSON Error: {0}")]
    Json(serde_json::Error),
}

pub type Result<T> = std::result::Result<T, Error>;

impl From<io::Error> for Error {
    fn from(x: io::Error) -> Self {
        Error::Io(x)
    }
}

impl From<serde_json::Error> for Error {
    fn from(x: serde_json::Error) -> Self {
        Error::Json(x)
    }
}
