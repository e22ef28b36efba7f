use crate::error::ErrorClass;
use serde::{Serialize, de::DeserializeOwned};
use serde_cbor::{from_slice, to_vec};
use std::panic::{AssertUnwindSafe, catch_unwind};
use thiserror::Error as ThisError;

/// Max serialized bytes for a single persisted document.
pub const MAX_DOCUMENT_BYTES: usize = 16 * 1024 * 1024;

///
/// SerializeError
///

#[derive(Debug, ThisError)]
pub enum SerializeError {
    #[error("serialize error: {0}")]
    Serialize(String),

    #[error("deserialize error: {0}")]
    Deserialize(String),
}

impl SerializeError {
    pub(crate) const fn class(&self) -> ErrorClass {
        match self {
            Self::Serialize(_) => ErrorClass::Internal,
            Self::Deserialize(_) => ErrorClass::Corruption,
        }
    }
}

/// Serialize a value into CBOR bytes.
pub fn serialize<T>(value: &T) -> Result<Vec<u8>, SerializeError>
where
    T: Serialize,
{
    to_vec(value).map_err(|e| SerializeError::Serialize(e.to_string()))
}

/// Deserialize CBOR bytes produced by [`serialize`].
///
/// Input size is bounded before decode and a panic inside the decoder is
/// reported as a deserialize error.
pub fn deserialize<T>(bytes: &[u8]) -> Result<T, SerializeError>
where
    T: DeserializeOwned,
{
    if bytes.len() > MAX_DOCUMENT_BYTES {
        return Err(SerializeError::Deserialize(
            "payload exceeds maximum allowed size".into(),
        ));
    }

    match catch_unwind(AssertUnwindSafe(|| from_slice(bytes))) {
        Ok(Ok(value)) => Ok(value),
        Ok(Err(err)) => Err(SerializeError::Deserialize(err.to_string())),
        Err(_) => Err(SerializeError::Deserialize(
            "panic during CBOR deserialization".into(),
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    #[test]
    fn garbage_is_a_deserialize_error() {
        let err = deserialize::<BTreeMap<String, u64>>(&[0xff, 0x00, 0x13]).unwrap_err();

        assert!(matches!(err, SerializeError::Deserialize(_)));
        assert_eq!(err.class(), ErrorClass::Corruption);
    }

    #[test]
    fn oversized_payloads_are_rejected_before_decode() {
        let bytes = vec![0u8; MAX_DOCUMENT_BYTES + 1];

        assert!(deserialize::<u64>(&bytes).is_err());
    }
}
