//! Error types for the discovery layer.

use std::fmt;

/// Error type for discovery operations.
///
/// Covers the failures that can happen while turning a UPnP device
/// description into a [`Device`](crate::Device).
#[derive(Debug)]
pub enum DiscoveryError {
    /// Parsing errors (malformed or incomplete device description XML)
    ParseError(String),
    /// The description parsed but is neither a media server nor a media renderer
    InvalidDevice(String),
}

impl fmt::Display for DiscoveryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DiscoveryError::ParseError(msg) => write!(f, "Parse error: {}", msg),
            DiscoveryError::InvalidDevice(msg) => write!(f, "Invalid device: {}", msg),
        }
    }
}

impl std::error::Error for DiscoveryError {}

/// Convenience Result type alias for discovery operations.
///
/// Equivalent to `std::result::Result<T, DiscoveryError>`.
pub type Result<T> = std::result::Result<T, DiscoveryError>;
