use std::convert::From;
use std::io;

use crate::run_state::RunState;
use crate::transport::TransportError;

#[derive(Debug, Fail)]
pub enum Error {
    /// The job parameters cannot be run (empty relay pool, zero rotation count,
    /// zero or non-numeric rate value)
    #[fail(display = "Validation error: {}", _0)]
    Validation(String),

    /// The message body contains a denied term
    #[fail(display = "Content policy violation: message contains \"{}\"", _0)]
    ContentPolicy(String),

    /// A control call was made in a state that does not accept it
    #[fail(display = "Cannot {} while {}", op, state)]
    InvalidState { op: &'static str, state: RunState },

    /// A relay identity failed its test handoff
    #[fail(display = "Transport error: {}", _0)]
    Transport(#[cause] TransportError),

    #[fail(display = "I/O error: {}", _0)]
    Io(#[cause] io::Error),

    #[fail(display = "TOML parse error: {}", _0)]
    TomlDe(#[cause] toml::de::Error),

    #[fail(display = "TOML serialization error: {}", _0)]
    TomlSer(#[cause] toml::ser::Error),

    #[fail(display = "Dispatch worker panicked")]
    WorkerPanicked,
}

impl From<TransportError> for Error {
    fn from(e: TransportError) -> Error {
        Error::Transport(e)
    }
}

impl From<io::Error> for Error {
    fn from(e: io::Error) -> Error {
        Error::Io(e)
    }
}

impl From<toml::de::Error> for Error {
    fn from(e: toml::de::Error) -> Error {
        Error::TomlDe(e)
    }
}

impl From<toml::ser::Error> for Error {
    fn from(e: toml::ser::Error) -> Error {
        Error::TomlSer(e)
    }
}
