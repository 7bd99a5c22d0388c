//! Kinoid generation and decoding.
//!
//! Layout (decimal composite, most significant first):
//!
//! ```text
//! "1" TIMESTAMP{13} SINGULARITY{6} PID{7}
//! ```
//!
//! The 27-digit composite is rendered in lowercase base 36, which always
//! yields exactly [`ID_LENGTH`] characters.

use chrono::{DateTime, Utc};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::ser::SerializeStruct;
use serde::{Serialize, Serializer};
use std::fmt;
use thiserror::Error;
use tracing::{debug, trace, warn};

use crate::base36;
use crate::clock::{Clock, SystemClock, host_pid};

/// Reference epoch in Unix milliseconds (2021-12-25T12:20:00Z).
pub const EPOCH_MILLIS: u64 = 1_640_434_800_000;
/// Leading constant digit of the composite.
pub const SLIP_PREVENTER: char = '1';
/// Decimal digits of the timestamp field.
pub const TIMESTAMP_WIDTH: usize = 13;
/// Decimal digits of the singularity field.
pub const SINGULARITY_WIDTH: usize = 6;
/// Decimal digits of the pid field.
pub const PID_WIDTH: usize = 7;
/// Decimal digits of the full composite.
pub const COMPOSITE_WIDTH: usize = 1 + TIMESTAMP_WIDTH + SINGULARITY_WIDTH + PID_WIDTH;
/// Characters in every kinoid.
pub const ID_LENGTH: usize = 17;

pub const MAX_TIMESTAMP: u64 = max_for_width(TIMESTAMP_WIDTH);
pub const MAX_SINGULARITY: u32 = max_for_width(SINGULARITY_WIDTH) as u32;
pub const MAX_PID: u32 = max_for_width(PID_WIDTH) as u32;

const fn max_for_width(width: usize) -> u64 {
    10_u64.pow(width as u32) - 1
}

static ID_PATTERN: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[0-9a-z]{17}$").unwrap());

/// A numeric field of the composite.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    Timestamp,
    Singularity,
    Pid,
}

impl Field {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Timestamp => "timestamp",
            Self::Singularity => "singularity",
            Self::Pid => "pid",
        }
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Fatal conditions: the fixed-width layout can no longer represent a new id.
///
/// Callers should stop issuing ids rather than retry.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum KinoidError {
    #[error("{field} out of range: {value}")]
    FieldOverflow { field: Field, value: u64 },
    #[error("timestamp out of range: clock reads {0} ms, before the reference epoch")]
    ClockBeforeEpoch(u64),
}

/// Why a token failed to decode.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecodeErrorKind {
    #[error("Invalid ID format")]
    InvalidFormat,
    #[error("timestamp is out of range")]
    TimestampOutOfRange,
    #[error("singularity is out of range")]
    SingularityOutOfRange,
    #[error("PID is out of range")]
    PidOutOfRange,
}

/// Failed decode of an untrusted token. Ordinary data, not a fault.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{kind}: {id}")]
pub struct DecodeError {
    pub id: String,
    pub kind: DecodeErrorKind,
}

impl DecodeError {
    fn new(id: &str, kind: DecodeErrorKind) -> Self {
        Self {
            id: id.to_string(),
            kind,
        }
    }
}

impl Serialize for DecodeError {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut state = serializer.serialize_struct("DecodeError", 2)?;
        state.serialize_field("id", &self.id)?;
        state.serialize_field("error", &self.to_string())?;
        state.end()
    }
}

/// Decoded kinoid components.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DecodedId {
    pub id: String,
    pub date: DateTime<Utc>,
    pub singularity: u32,
    pub pid: u32,
}

impl DecodedId {
    /// Milliseconds since the reference epoch.
    pub fn timestamp(&self) -> u64 {
        (self.date.timestamp_millis() as u64).saturating_sub(EPOCH_MILLIS)
    }
}

/// Check that a token has the kinoid shape without decoding it.
pub fn validate(id: &str) -> bool {
    decode(id).is_ok()
}

/// Decode a token back into its date, singularity and pid.
pub fn decode(id: &str) -> Result<DecodedId, DecodeError> {
    use DecodeErrorKind::*;

    if !ID_PATTERN.is_match(id) {
        return Err(DecodeError::new(id, InvalidFormat));
    }
    let value = base36::decode(id).ok_or_else(|| DecodeError::new(id, InvalidFormat))?;

    let digits = format!("{:0width$}", value, width = COMPOSITE_WIDTH);
    if digits.len() != COMPOSITE_WIDTH || !digits.starts_with(SLIP_PREVENTER) {
        return Err(DecodeError::new(id, InvalidFormat));
    }

    let ts_end = 1 + TIMESTAMP_WIDTH;
    let seq_end = ts_end + SINGULARITY_WIDTH;
    let ts_str = &digits[1..ts_end];
    let seq_str = &digits[ts_end..seq_end];
    let pid_str = &digits[seq_end..];

    let timestamp: u64 = ts_str
        .parse()
        .map_err(|_| DecodeError::new(id, TimestampOutOfRange))?;
    let singularity: u32 = seq_str
        .parse()
        .ok()
        .filter(|s| *s <= MAX_SINGULARITY)
        .ok_or_else(|| DecodeError::new(id, SingularityOutOfRange))?;
    let pid: u32 = pid_str
        .parse()
        .ok()
        .filter(|p| *p <= MAX_PID)
        .ok_or_else(|| DecodeError::new(id, PidOutOfRange))?;

    let date = EPOCH_MILLIS
        .checked_add(timestamp)
        .and_then(|ms| i64::try_from(ms).ok())
        .and_then(DateTime::from_timestamp_millis)
        .filter(|d| d.timestamp_millis() >= EPOCH_MILLIS as i64)
        .ok_or_else(|| DecodeError::new(id, TimestampOutOfRange))?;

    Ok(DecodedId {
        id: id.to_string(),
        date,
        singularity,
        pid,
    })
}

/// Generator state for one process.
///
/// `encode` takes `&mut self`; share across threads through
/// [`SharedCodec`](crate::SharedCodec).
#[derive(Debug)]
pub struct IdCodec<C = SystemClock> {
    clock: C,
    pid: u32,
    last_timestamp: u64,
    singularity: u32,
}

impl IdCodec<SystemClock> {
    /// Create a codec on the system clock and the host process id.
    pub fn new() -> Result<Self, KinoidError> {
        Self::with_pid(host_pid())
    }

    /// Create a codec on the system clock with an explicit pid.
    pub fn with_pid(pid: u32) -> Result<Self, KinoidError> {
        Self::with_clock(SystemClock, pid)
    }
}

impl<C: Clock> IdCodec<C> {
    /// Create a codec with explicit collaborators.
    pub fn with_clock(clock: C, pid: u32) -> Result<Self, KinoidError> {
        if pid > MAX_PID {
            warn!(pid, "pid does not fit the kinoid pid field");
            return Err(KinoidError::FieldOverflow {
                field: Field::Pid,
                value: pid as u64,
            });
        }
        debug!(pid, "kinoid codec ready");
        Ok(Self {
            clock,
            pid,
            last_timestamp: 0,
            singularity: 0,
        })
    }

    fn overflow(field: Field, value: u64) -> KinoidError {
        warn!(%field, value, "kinoid field overflow, id space exhausted");
        KinoidError::FieldOverflow { field, value }
    }

    /// Generate the next kinoid.
    pub fn encode(&mut self) -> Result<String, KinoidError> {
        let now = self.clock.now_millis();
        let observed = now.checked_sub(EPOCH_MILLIS).ok_or_else(|| {
            warn!(now, "clock reads before the kinoid epoch");
            KinoidError::ClockBeforeEpoch(now)
        })?;

        // A clock stepping backwards keeps the last millisecond.
        let timestamp = observed.max(self.last_timestamp);
        let singularity = if timestamp == self.last_timestamp {
            let next = self.singularity as u64 + 1;
            trace!(timestamp, singularity = next, "same millisecond");
            next
        } else {
            0
        };

        if timestamp > MAX_TIMESTAMP {
            return Err(Self::overflow(Field::Timestamp, timestamp));
        }
        if singularity > MAX_SINGULARITY as u64 {
            return Err(Self::overflow(Field::Singularity, singularity));
        }

        self.last_timestamp = timestamp;
        self.singularity = singularity as u32;

        Ok(compose(timestamp, self.singularity, self.pid))
    }

    /// Generate n kinoids.
    pub fn next_n(&mut self, n: usize) -> Result<Vec<String>, KinoidError> {
        self.take(n).collect()
    }

    /// Process id embedded in every id from this codec.
    pub fn pid(&self) -> u32 {
        self.pid
    }

    /// Current `(last_timestamp, singularity)`.
    pub fn state(&self) -> (u64, u32) {
        (self.last_timestamp, self.singularity)
    }
}

impl<C: Clock> Iterator for IdCodec<C> {
    type Item = Result<String, KinoidError>;

    #[inline]
    fn next(&mut self) -> Option<Self::Item> {
        Some(self.encode())
    }
}

/// Render already-validated fields as a kinoid.
fn compose(timestamp: u64, singularity: u32, pid: u32) -> String {
    let digits = format!(
        "{}{:0tw$}{:0sw$}{:0pw$}",
        SLIP_PREVENTER,
        timestamp,
        singularity,
        pid,
        tw = TIMESTAMP_WIDTH,
        sw = SINGULARITY_WIDTH,
        pw = PID_WIDTH
    );
    let value: u128 = digits
        .bytes()
        .fold(0, |acc, d| acc * 10 + (d - b'0') as u128);
    base36::encode(value)
}
