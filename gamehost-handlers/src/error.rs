//! Error types for the control loop

use thiserror::Error;

/// Failure reported by a Cloud Control API call
#[derive(Debug, Error)]
pub enum CloudError {
    #[error("{kind} not found: {id}")]
    NotFound { kind: &'static str, id: String },

    #[error("{operation} failed: {message}")]
    Provider {
        operation: &'static str,
        message: String,
    },

    #[error("invalid request: {0}")]
    InvalidRequest(String),
}

/// Failure while reconciling the game's A record
#[derive(Debug, Error)]
pub enum DnsError {
    #[error("failed to look up domain of hosted zone {zone}: {source}")]
    ZoneLookup {
        zone: String,
        #[source]
        source: CloudError,
    },

    #[error("failed to upsert {fqdn} in hosted zone {zone}: {source}")]
    Upsert {
        zone: String,
        fqdn: String,
        #[source]
        source: CloudError,
    },
}

#[derive(Debug, Error)]
pub enum ScheduleError {
    #[error("invalid schedule expression '{expr}': {message}")]
    Parse { expr: String, message: String },

    #[error("schedule expression '{expr}' has {count} fields, expected 5 or cron(6 fields)")]
    FieldCount { expr: String, count: usize },

    #[error("schedule expression '{0}' never fires again")]
    NoUpcoming(String),

    #[error("game {game}: {source}")]
    Game {
        game: String,
        #[source]
        source: Box<ScheduleError>,
    },
}

#[derive(Debug, Error)]
pub enum HandlerError {
    #[error("unknown handler: {0}")]
    UnknownHandler(String),

    #[error("invalid event for {handler}: {source}")]
    InvalidEvent {
        handler: &'static str,
        #[source]
        source: serde_json::Error,
    },

    #[error("{handler} has no {field} configured and the event does not name one")]
    MissingTarget {
        handler: &'static str,
        field: &'static str,
    },

    #[error(transparent)]
    Cloud(#[from] CloudError),
}

pub type HandlerResult<T> = Result<T, HandlerError>;
