//! Connection status multiplexing
//!
//! One status value is derived from whichever layer is authoritative: the
//! secured session when present, the raw socket otherwise. A probe that
//! reports nothing new leaves the cached status alone; any definite report,
//! a missing transport, or an already-failed cache latches the status to
//! [`Status::Error`] for the rest of the client's life.

/// Connection status, in the order of the wire-visible codes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    /// Unrecoverable transport or session failure (`-1`); permanent once set
    Error,
    /// No status has been determined yet (`0`)
    Unknown,
    /// The connection is established and usable (`1`)
    Connected,
    /// The peer closed the stream cleanly (`2`)
    GracefulShutdown,
}

impl Status {
    /// Numeric status code: `-1`, `0`, `1`, or `2`
    pub const fn code(self) -> i8 {
        match self {
            Self::Error => -1,
            Self::Unknown => 0,
            Self::Connected => 1,
            Self::GracefulShutdown => 2,
        }
    }

    /// Whether the status has latched to the failure sentinel
    pub const fn is_error(self) -> bool {
        matches!(self, Self::Error)
    }
}

impl From<Status> for i8 {
    fn from(status: Status) -> i8 {
        status.code()
    }
}

impl std::fmt::Display for Status {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Error => write!(f, "error"),
            Self::Unknown => write!(f, "unknown"),
            Self::Connected => write!(f, "connected"),
            Self::GracefulShutdown => write!(f, "graceful_shutdown"),
        }
    }
}

/// What a single status probe of the active layer observed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Probe {
    /// The layer reported nothing new; the cached status stands
    Quiet,
    /// The layer reported a definite condition; the status latches to error
    Definite,
}

/// Sticky status rule shared by the plain and secured layers.
///
/// `probe` is `None` when the client has no transport at all. The result only
/// ever moves toward [`Status::Error`]; it never recovers, regardless of what
/// later probes observe.
pub(crate) fn multiplex(cached: Status, probe: Option<Probe>) -> Status {
    match probe {
        Some(Probe::Quiet) if !cached.is_error() => cached,
        _ => Status::Error,
    }
}
