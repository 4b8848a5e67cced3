//! Lenient serde field helpers for client-supplied payloads and query strings.

use serde::{Deserialize, Deserializer};

/// An explicit `null` takes the field's default, same as an absent key.
pub(crate) fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// A blank value (`?itemId=`) counts as not given.
pub(crate) fn blank_as_none<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.filter(|v| !v.trim().is_empty()))
}
