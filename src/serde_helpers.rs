use serde::de::DeserializeOwned;

use crate::Result;
use crate::error::{Error, Kind};

/// Decodes a JSON body.
///
/// With `tracing` enabled, decode errors carry the JSON path of the offending
/// value and fields the target type does not know about are reported at
/// `trace` level.
#[cfg(feature = "tracing")]
pub(crate) fn decode<T: DeserializeOwned>(bytes: &[u8]) -> Result<T> {
    let mut deserializer = serde_json::Deserializer::from_slice(bytes);
    let mut track = |path: serde_ignored::Path<'_>| {
        tracing::trace!(%path, "ignored unknown response field");
    };
    let ignored = serde_ignored::Deserializer::new(&mut deserializer, &mut track);

    let value: T = serde_path_to_error::deserialize(ignored)
        .map_err(|e| Error::with_source(Kind::Decode, e))?;
    deserializer
        .end()
        .map_err(|e| Error::with_source(Kind::Decode, e))?;

    Ok(value)
}

#[cfg(not(feature = "tracing"))]
pub(crate) fn decode<T: DeserializeOwned>(bytes: &[u8]) -> Result<T> {
    serde_json::from_slice(bytes).map_err(|e| Error::with_source(Kind::Decode, e))
}
