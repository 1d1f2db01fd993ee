//! CBOR encoding of documents.
//!
//! Documents are written with `ciborium` through the serde representation of
//! [`Value`]. The encoding is only used for storage; ordering never depends on
//! the encoded bytes.

use crate::error::{CodecError, CodecResult};
use crate::value::Value;

/// Encode a value to CBOR bytes.
///
/// # Errors
///
/// Returns an error if the serializer fails.
pub fn to_cbor(value: &Value) -> CodecResult<Vec<u8>> {
    let mut buffer = Vec::new();
    ciborium::ser::into_writer(value, &mut buffer)
        .map_err(|e| CodecError::encoding_failed(e.to_string()))?;
    Ok(buffer)
}

/// Decode a value from CBOR bytes.
///
/// # Errors
///
/// Returns an error if the bytes are not a valid encoded [`Value`].
pub fn from_cbor(bytes: &[u8]) -> CodecResult<Value> {
    ciborium::de::from_reader(bytes).map_err(|e| CodecError::decoding_failed(e.to_string()))
}

/// Decode bytes that must hold a document.
///
/// # Errors
///
/// Returns [`CodecError::InvalidStructure`] if the decoded value is not a document.
pub fn document_from_cbor(bytes: &[u8]) -> CodecResult<Value> {
    let value = from_cbor(bytes)?;
    if value.as_document().is_none() {
        return Err(CodecError::invalid_structure(format!(
            "expected a document, found {}",
            value.type_name()
        )));
    }
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn nested_document_survives_storage() {
        let doc = Value::document([
            ("_id", Value::Integer(1)),
            ("tags", Value::Array(vec!["a".into(), "b".into()])),
            ("blob", Value::Bytes(vec![0, 255])),
            ("inner", Value::document([("flag", true)])),
            ("nothing", Value::Null),
        ]);

        let bytes = to_cbor(&doc).unwrap();
        assert_eq!(document_from_cbor(&bytes).unwrap(), doc);
    }

    #[test]
    fn document_from_cbor_rejects_scalars() {
        let bytes = to_cbor(&Value::Integer(3)).unwrap();
        assert!(matches!(
            document_from_cbor(&bytes),
            Err(CodecError::InvalidStructure { .. })
        ));
    }

    #[test]
    fn garbage_is_a_decoding_error() {
        assert!(matches!(
            from_cbor(&[0xff, 0x00, 0x13]),
            Err(CodecError::DecodingFailed { .. })
        ));
    }
}
