//! Async convenience API built on the process-wide codec.

use crate::kinoid::KinoidError;
use crate::shared::global_codec;

/// Get one kinoid in async contexts.
pub async fn async_new_id() -> Result<String, KinoidError> {
    global_codec()?.encode()
}

/// Generate a finite batch of kinoids in async contexts.
pub async fn async_id_stream(count: usize) -> Result<Vec<String>, KinoidError> {
    global_codec()?.next_n(count)
}
