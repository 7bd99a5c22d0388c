//! Thread-safe codec and the process-wide default instance.

use once_cell::sync::OnceCell;
use std::sync::{Mutex, MutexGuard, PoisonError};

use crate::clock::{Clock, SystemClock};
use crate::kinoid::{DecodeError, DecodedId, IdCodec, KinoidError, decode};

/// An [`IdCodec`] behind a mutex, so the read-check-increment of the
/// sequence state is atomic across threads.
#[derive(Debug)]
pub struct SharedCodec<C = SystemClock> {
    inner: Mutex<IdCodec<C>>,
}

impl SharedCodec<SystemClock> {
    /// Shared codec on the system clock and the host process id.
    pub fn new() -> Result<Self, KinoidError> {
        IdCodec::new().map(Self::from)
    }
}

impl<C: Clock> SharedCodec<C> {
    // State is written only after validation, so a poisoned lock still
    // guards a consistent codec.
    fn lock(&self) -> MutexGuard<'_, IdCodec<C>> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Generate the next kinoid.
    pub fn encode(&self) -> Result<String, KinoidError> {
        self.lock().encode()
    }

    /// Generate n kinoids under a single lock.
    pub fn next_n(&self, n: usize) -> Result<Vec<String>, KinoidError> {
        self.lock().next_n(n)
    }

    pub fn pid(&self) -> u32 {
        self.lock().pid()
    }
}

impl<C> From<IdCodec<C>> for SharedCodec<C> {
    fn from(codec: IdCodec<C>) -> Self {
        Self {
            inner: Mutex::new(codec),
        }
    }
}

/// Returns the process-wide codec, creating it on first use.
pub fn global_codec() -> Result<&'static SharedCodec, KinoidError> {
    static CODEC: OnceCell<SharedCodec> = OnceCell::new();
    CODEC.get_or_try_init(SharedCodec::new)
}

/// Generate a kinoid from the process-wide codec.
///
/// ```
/// let id = kinoid::new_id().expect("id space available");
/// assert_eq!(id.len(), kinoid::ID_LENGTH);
/// ```
pub fn new_id() -> Result<String, KinoidError> {
    global_codec()?.encode()
}

/// Decode a kinoid. Alias of [`decode`](crate::decode).
pub fn decode_id(id: &str) -> Result<DecodedId, DecodeError> {
    decode(id)
}
