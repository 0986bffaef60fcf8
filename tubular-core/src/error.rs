use std::{error, fmt, io};

/// Errors are kept clone-able with string payloads so they can live inside
/// app state (`Promise::Rejected`) and travel across the update channel.
#[derive(Clone, Debug)]
pub enum Error {
    WebApiError(String),
    Unauthenticated,
}

impl error::Error for Error {}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::WebApiError(err) => f.write_str(err),
            Self::Unauthenticated => f.write_str("Not logged in"),
        }
    }
}

impl From<io::Error> for Error {
    fn from(err: io::Error) -> Self {
        Self::WebApiError(err.to_string())
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Self::WebApiError(err.to_string())
    }
}

impl From<ureq::Error> for Error {
    fn from(err: ureq::Error) -> Self {
        Self::WebApiError(err.to_string())
    }
}
