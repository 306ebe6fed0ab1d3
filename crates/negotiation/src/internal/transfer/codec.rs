use bincode::{DefaultOptions, Options};
use serde::Deserialize;

#[inline]
pub fn serialize<T>(value: &T) -> crate::Result<Vec<u8>>
where
    T: serde::Serialize + ?Sized,
{
    DefaultOptions::new()
        .with_limit(crate::MAX_FRAME_SIZE as u64)
        .with_fixint_encoding()
        .serialize(value)
        .map_err(|e| crate::Error::SerializationError(format!("Serialization failed: {e:?}")))
}

#[inline]
pub fn deserialize<'a, T>(bytes: &'a [u8]) -> crate::Result<T>
where
    T: Deserialize<'a>,
{
    DefaultOptions::new()
        .with_limit(crate::MAX_FRAME_SIZE as u64)
        .with_fixint_encoding()
        .deserialize(bytes)
        .map_err(|e| {
            crate::Error::SerializationError(format!(
                "Deserialization failed: {e:?}, {} bytes",
                bytes.len()
            ))
        })
}
