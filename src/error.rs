//! Error types for league_sync

use std::fmt;

/// Unified error type for league_sync operations
#[derive(Debug)]
pub enum LeagueError {
    /// Draft log violates the structural contract (segment count, header
    /// player count, missing selection marker)
    MalformedLog(String),
    /// A decklist matched zero or more than one candidate entry
    AmbiguousAttribution(String),
    /// A player named by a file is not present in the player directory
    MissingPlayer(String),
    /// A decklist file parsed to zero card rows
    NoCards(String),
    /// Card-metadata augmentation recovered fewer rows than required
    PartialLookup { resolved: usize, total: usize },
    /// Database operation failed
    Database(rusqlite::Error),
    /// Filesystem operation failed
    Io(std::io::Error),
    /// HTTP request failed (network error, timeout, etc.)
    Network(reqwest::Error),
    /// Failed to parse a JSON response or config file
    Parse(serde_json::Error),
    /// HTTP error status code
    HttpStatus(reqwest::StatusCode),
    /// Invalid configuration
    Config(String),
}

impl fmt::Display for LeagueError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LeagueError::MalformedLog(msg) => write!(f, "Malformed draft log: {}", msg),
            LeagueError::AmbiguousAttribution(msg) => {
                write!(f, "Cannot attribute decklist: {}", msg)
            }
            LeagueError::MissingPlayer(name) => write!(f, "No such player: {}", name),
            LeagueError::NoCards(file) => write!(f, "Decklist has no card rows: {}", file),
            LeagueError::PartialLookup { resolved, total } => write!(
                f,
                "Card lookup resolved only {} of {} rows",
                resolved, total
            ),
            LeagueError::Database(e) => write!(f, "Database error: {}", e),
            LeagueError::Io(e) => write!(f, "I/O error: {}", e),
            LeagueError::Network(e) => write!(f, "Network error: {}", e),
            LeagueError::Parse(e) => write!(f, "Parse error: {}", e),
            LeagueError::HttpStatus(status) => write!(f, "HTTP error: {}", status),
            LeagueError::Config(msg) => write!(f, "Configuration error: {}", msg),
        }
    }
}

impl std::error::Error for LeagueError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            LeagueError::Database(e) => Some(e),
            LeagueError::Io(e) => Some(e),
            LeagueError::Network(e) => Some(e),
            LeagueError::Parse(e) => Some(e),
            _ => None,
        }
    }
}

impl From<rusqlite::Error> for LeagueError {
    fn from(err: rusqlite::Error) -> Self {
        LeagueError::Database(err)
    }
}

impl From<std::io::Error> for LeagueError {
    fn from(err: std::io::Error) -> Self {
        LeagueError::Io(err)
    }
}

impl From<reqwest::Error> for LeagueError {
    fn from(err: reqwest::Error) -> Self {
        LeagueError::Network(err)
    }
}

impl From<serde_json::Error> for LeagueError {
    fn from(err: serde_json::Error) -> Self {
        LeagueError::Parse(err)
    }
}

/// Result alias for league_sync operations
pub type Result<T> = std::result::Result<T, LeagueError>;
