//! Error taxonomy for API-key operations.
//!
//! Every failure maps to one of four kinds: bad input, a failed HTTP call, a
//! non-success answer from the cluster, or a success answer whose body is not
//! what was expected. [`Error::summary`] gives the short diagnostic title.

use reqwest::StatusCode;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    /// Resource file, state file or connection settings are unusable.
    #[error("invalid input: {message}")]
    Input { message: String },

    /// The HTTP request never produced a response.
    #[error("request failed while {action}: {source}")]
    Transport {
        action: &'static str,
        #[source]
        source: reqwest::Error,
    },

    /// The cluster answered with a non-success status.
    #[error("[{status}] error {action}: {body}")]
    Api {
        status: StatusCode,
        action: &'static str,
        body: String,
    },

    /// The cluster answered successfully but the body did not decode.
    #[error("error parsing the response body while {action}: {message}")]
    Decode {
        action: &'static str,
        message: String,
    },
}

impl Error {
    pub fn input(message: impl Into<String>) -> Self {
        Self::Input {
            message: message.into(),
        }
    }

    pub fn decode(action: &'static str, message: impl Into<String>) -> Self {
        Self::Decode {
            action,
            message: message.into(),
        }
    }

    /// Short diagnostic title for the error kind.
    pub fn summary(&self) -> &'static str {
        match self {
            Error::Input { .. } => "Configuration Error",
            Error::Transport { .. } => "Transport Error",
            Error::Api { .. } => "API Error",
            Error::Decode { .. } => "JSON Decode Error",
        }
    }

    /// Status code returned by the cluster, when there was one.
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            Error::Api { status, .. } => Some(*status),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_summary_per_kind() {
        assert_eq!(Error::input("x").summary(), "Configuration Error");
        assert_eq!(
            Error::decode("creating API key", "missing field").summary(),
            "JSON Decode Error"
        );

        let api = Error::Api {
            status: StatusCode::FORBIDDEN,
            action: "creating API key",
            body: "{}".into(),
        };
        assert_eq!(api.summary(), "API Error");
        assert_eq!(api.status(), Some(StatusCode::FORBIDDEN));
    }

    #[test]
    fn test_api_error_message_names_status_and_action() {
        let err = Error::Api {
            status: StatusCode::NOT_FOUND,
            action: "updating API key",
            body: "missing".into(),
        };
        let msg = err.to_string();
        assert!(msg.contains("404"));
        assert!(msg.contains("updating API key"));
    }
}
