//! kinoid: process-unique, sortable base-36 identifiers.
//!
//! Every kinoid is 17 lowercase base-36 characters encoding a fixed-width
//! decimal composite of a millisecond timestamp, a per-millisecond sequence
//! counter (the "singularity") and the process id. Ids from one codec are
//! strictly increasing, and any id decodes back to its components.
//!
//! # Format
//!
//! ```text
//! COMPOSITE ::= "1" TIMESTAMP{13} SINGULARITY{6} PID{7}
//! KINOID    ::= base36(COMPOSITE)        ; always 17 chars of [0-9a-z]
//! ```
//!
//! # Example
//!
//! ```
//! use kinoid::{IdCodec, decode};
//!
//! let mut codec = IdCodec::new().expect("pid fits the layout");
//! let id = codec.encode().expect("id space available");
//! let parts = decode(&id).expect("freshly generated ids decode");
//! println!("{} {} {} {}", id, parts.date, parts.singularity, parts.pid);
//!
//! assert!(decode("invalid123").is_err());
//! ```

mod async_api;
mod base36;
mod clock;
mod kinoid;
mod shared;

pub use async_api::{async_id_stream, async_new_id};
pub use clock::{Clock, SystemClock, host_pid};
pub use kinoid::{
    COMPOSITE_WIDTH, DecodeError, DecodeErrorKind, DecodedId, EPOCH_MILLIS, Field, ID_LENGTH,
    IdCodec, KinoidError, MAX_PID, MAX_SINGULARITY, MAX_TIMESTAMP, PID_WIDTH, SINGULARITY_WIDTH,
    SLIP_PREVENTER, TIMESTAMP_WIDTH, decode, validate,
};
pub use shared::{SharedCodec, decode_id, global_codec, new_id};
