//! Error type definitions.
//!
//! Boundary errors (`thiserror`) for initialization, descriptor parsing and engine
//! sessions, plus the per-candidate `ErrorKind` classification reported in results.

use std::fmt;
use std::str::FromStr;

use log::SetLoggerError;
use reqwest::Error as ReqwestError;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use strum_macros::{AsRefStr, EnumIter as EnumIterMacro};
use thiserror::Error;

/// Error types for initialization failures.
///
/// Any of these halts the run before a worker starts.
#[derive(Error, Debug)]
#[allow(clippy::enum_variant_names)] // All variants end with "Error" by convention
pub enum InitializationError {
    /// Error initializing the logger.
    #[error("Logger initialization error: {0}")]
    LoggerError(#[from] SetLoggerError),

    /// Error building an HTTP client (source fetcher or probe client).
    #[error("HTTP client initialization error: {0}")]
    HttpClientError(#[from] ReqwestError),

    /// The worker pool would need local ports past 65535.
    #[error("Port range error: {workers} workers starting at {port_start} exceed port 65535")]
    PortRangeError { port_start: u16, workers: usize },

    /// A configuration value is unusable (zero workers, empty status list, ...).
    #[error("Invalid configuration: {0}")]
    InvalidConfigError(String),
}

/// Why a descriptor could not be turned into a canonical record.
#[derive(Error, Debug)]
pub enum DescriptorError {
    #[error("unsupported descriptor scheme")]
    UnsupportedScheme,

    #[error("payload is not valid base64")]
    InvalidBase64,

    #[error("payload is not a JSON object: {0}")]
    InvalidJson(#[from] serde_json::Error),

    #[error("required field `{0}` is missing")]
    MissingField(&'static str),

    #[error("descriptor has no port")]
    MissingPort,

    #[error("port `{0}` is not a valid port number")]
    InvalidPort(String),

    #[error("descriptor is not a valid URI: {0}")]
    InvalidUri(#[from] url::ParseError),

    #[error("credentials are not in `method:password@host:port` form")]
    MalformedCredentials,
}

/// Coarse parse-failure buckets used for run statistics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, EnumIterMacro, AsRefStr)]
pub enum ParseFailureKind {
    UnsupportedScheme,
    InvalidEncoding,
    MissingField,
    MissingPort,
    InvalidPort,
    InvalidUri,
    MalformedCredentials,
}

impl DescriptorError {
    pub fn kind(&self) -> ParseFailureKind {
        match self {
            DescriptorError::UnsupportedScheme => ParseFailureKind::UnsupportedScheme,
            DescriptorError::InvalidBase64 | DescriptorError::InvalidJson(_) => {
                ParseFailureKind::InvalidEncoding
            }
            DescriptorError::MissingField(_) => ParseFailureKind::MissingField,
            DescriptorError::MissingPort => ParseFailureKind::MissingPort,
            DescriptorError::InvalidPort(_) => ParseFailureKind::InvalidPort,
            DescriptorError::InvalidUri(_) => ParseFailureKind::InvalidUri,
            DescriptorError::MalformedCredentials => ParseFailureKind::MalformedCredentials,
        }
    }
}

/// Failures while bringing up a forwarding session.
#[derive(Error, Debug)]
pub enum SessionError {
    /// The record could not be rendered into an engine configuration document.
    #[error("failed to serialize engine configuration: {0}")]
    Config(#[source] serde_json::Error),

    /// The engine executable could not be started.
    #[error("failed to spawn forwarding engine: {0}")]
    Spawn(#[source] std::io::Error),

    /// The configuration could not be handed over on stdin.
    #[error("failed to hand configuration to engine: {0}")]
    Handoff(#[source] std::io::Error),

    /// The engine exited before the warm-up period ended.
    #[error("forwarding engine exited during warm-up ({status})")]
    ExitedEarly { status: std::process::ExitStatus },
}

impl SessionError {
    /// Maps the session failure onto the candidate classification.
    pub fn kind(&self) -> ErrorKind {
        match self {
            SessionError::Config(_) => ErrorKind::ConfigError,
            SessionError::Spawn(_) | SessionError::Handoff(_) | SessionError::ExitedEarly { .. } => {
                ErrorKind::XrayCrash
            }
        }
    }
}

/// Classification of a failed candidate.
///
/// The string form (`TCP_Failed`, `HTTP_403`, ...) is what appears in result documents
/// and in the run summary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ErrorKind {
    /// The bare TCP pre-check could not reach the server.
    TcpFailed,
    /// The probe exceeded its deadline.
    Timeout,
    /// The probe could not complete through the local listener.
    ConnectionError,
    /// The probe completed with a status outside the accepted set.
    HttpStatus(u16),
    /// The engine failed to start or died during warm-up.
    XrayCrash,
    /// The record could not be translated into an engine configuration.
    ConfigError,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ErrorKind::TcpFailed => f.write_str("TCP_Failed"),
            ErrorKind::Timeout => f.write_str("Timeout"),
            ErrorKind::ConnectionError => f.write_str("ConnectionError"),
            ErrorKind::HttpStatus(code) => write!(f, "HTTP_{code}"),
            ErrorKind::XrayCrash => f.write_str("XrayCrash"),
            ErrorKind::ConfigError => f.write_str("ConfigError"),
        }
    }
}

impl FromStr for ErrorKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "TCP_Failed" => Ok(ErrorKind::TcpFailed),
            "Timeout" => Ok(ErrorKind::Timeout),
            "ConnectionError" => Ok(ErrorKind::ConnectionError),
            "XrayCrash" => Ok(ErrorKind::XrayCrash),
            "ConfigError" => Ok(ErrorKind::ConfigError),
            other => other
                .strip_prefix("HTTP_")
                .and_then(|code| code.parse::<u16>().ok())
                .map(ErrorKind::HttpStatus)
                .ok_or_else(|| format!("unknown error kind: {other}")),
        }
    }
}

impl Serialize for ErrorKind {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for ErrorKind {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}
