//! Serialization helpers with uniform error handling.
//!
//! JSON for human-readable saves, rkyv for compact validated binary saves.

use crate::error::{IoError, Result};
use rkyv::de::deserializers::SharedDeserializeMap;
use rkyv::ser::serializers::AllocSerializer;
use rkyv::ser::Serializer;
use rkyv::validation::validators::DefaultValidator;
use rkyv::{AlignedVec, Archive, CheckBytes, Deserialize as RkyvDeserialize, Serialize as RkyvSerialize};
use serde::{Deserialize, Serialize};
use std::path::Path;

pub fn to_json<T>(data: &T) -> Result<String>
where
    T: Serialize,
{
    serde_json::to_string(data)
        .map_err(|e| IoError::serialization(format!("JSON serialization failed: {}", e)))
}

pub fn to_json_pretty<T>(data: &T) -> Result<String>
where
    T: Serialize,
{
    serde_json::to_string_pretty(data)
        .map_err(|e| IoError::serialization(format!("JSON serialization failed: {}", e)))
}

/// Deserializes from a JSON string. Blank input is a validation error.
pub fn from_json<T>(json: &str) -> Result<T>
where
    T: for<'de> Deserialize<'de>,
{
    if json.trim().is_empty() {
        return Err(IoError::validation("Empty JSON string"));
    }

    serde_json::from_str(json)
        .map_err(|e| IoError::serialization(format!("JSON deserialization failed: {}", e)))
}

pub fn write_json_file<T, P>(data: &T, path: P) -> Result<()>
where
    T: Serialize,
    P: AsRef<Path>,
{
    let json = to_json_pretty(data)?;
    std::fs::write(&path, json).map_err(|e| {
        IoError::FileSystem(e).with_context(format!("writing JSON to {:?}", path.as_ref()))
    })?;
    Ok(())
}

pub fn read_json_file<T, P>(path: P) -> Result<T>
where
    T: for<'de> Deserialize<'de>,
    P: AsRef<Path>,
{
    let json = std::fs::read_to_string(&path).map_err(|e| {
        IoError::FileSystem(e).with_context(format!("reading JSON from {:?}", path.as_ref()))
    })?;
    from_json(&json)
}

pub fn to_rkyv_bytes<T>(data: &T) -> Result<Vec<u8>>
where
    T: Archive + RkyvSerialize<AllocSerializer<4096>>,
{
    let mut serializer = AllocSerializer::<4096>::default();
    serializer
        .serialize_value(data)
        .map_err(|e| IoError::rkyv(format!("serialization failed: {:?}", e)))?;
    Ok(serializer.into_serializer().into_inner().to_vec())
}

/// Validates and deserializes an rkyv buffer.
pub fn from_rkyv_bytes<T>(bytes: &[u8]) -> Result<T>
where
    T: Archive,
    T::Archived: RkyvDeserialize<T, SharedDeserializeMap> + for<'a> CheckBytes<DefaultValidator<'a>>,
{
    if bytes.is_empty() {
        return Err(IoError::validation("Empty rkyv buffer"));
    }
    // Vec<u8> carries no alignment guarantee for archived roots.
    let mut aligned = AlignedVec::with_capacity(bytes.len());
    aligned.extend_from_slice(bytes);
    let archived = rkyv::check_archived_root::<T>(&aligned)
        .map_err(|e| IoError::rkyv(format!("validation failed: {:?}", e)))?;
    let mut deserializer = SharedDeserializeMap::default();
    archived
        .deserialize(&mut deserializer)
        .map_err(|e| IoError::rkyv(format!("deserialization failed: {:?}", e)))
}

pub fn write_rkyv_file<T, P>(data: &T, path: P) -> Result<()>
where
    T: Archive + RkyvSerialize<AllocSerializer<4096>>,
    P: AsRef<Path>,
{
    let bytes = to_rkyv_bytes(data)?;
    std::fs::write(&path, bytes).map_err(|e| {
        IoError::FileSystem(e).with_context(format!("writing rkyv to {:?}", path.as_ref()))
    })
}

pub fn read_rkyv_file<T, P>(path: P) -> Result<T>
where
    T: Archive,
    T::Archived: RkyvDeserialize<T, SharedDeserializeMap> + for<'a> CheckBytes<DefaultValidator<'a>>,
    P: AsRef<Path>,
{
    let bytes = std::fs::read(&path).map_err(|e| {
        IoError::FileSystem(e).with_context(format!("reading rkyv from {:?}", path.as_ref()))
    })?;
    from_rkyv_bytes(&bytes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use ecosteer_data::{HerdComponent, Vec3};

    #[derive(Debug, Serialize, Deserialize, PartialEq)]
    struct Sample {
        name: String,
        value: i32,
    }

    #[test]
    fn test_empty_json_fails() {
        let result: Result<Sample> = from_json("   ");
        assert!(matches!(result, Err(IoError::Validation(_))));
    }

    #[test]
    fn test_invalid_json_fails() {
        let result: Result<Sample> = from_json("{ invalid json");
        assert!(matches!(result, Err(IoError::Serialization(_))));
    }

    #[test]
    fn test_missing_field_fails() {
        let result: Result<Sample> = from_json(r#"{"name":"bison"}"#);
        assert!(result.is_err());
    }

    #[test]
    fn test_rkyv_bytes_restore_vector() {
        let v = Vec3::new(1.5, -2.0, 3.25);
        let bytes = to_rkyv_bytes(&v).unwrap();
        let restored: Vec3 = from_rkyv_bytes(&bytes).unwrap();
        assert_eq!(restored, v);
    }

    #[test]
    fn test_rkyv_rejects_garbage() {
        assert!(from_rkyv_bytes::<HerdComponent>(&[]).is_err());
        assert!(from_rkyv_bytes::<HerdComponent>(&[1, 2, 3]).is_err());
    }

    #[test]
    fn test_missing_file_has_context() {
        let err = read_json_file::<Sample, _>("/definitely/not/here.json").unwrap_err();
        assert!(err.to_string().contains("reading JSON"));
    }
}
