use crate::{StorageValue, decode::Decode, encode::Encode, error::ConversionError};

use super::mismatch;

fn real(value: &StorageValue<'_>, type_name: &'static str) -> Result<f64, ConversionError> {
    match value {
        StorageValue::Double(v) => Ok(*v),
        StorageValue::Int(v) => Ok(f64::from(*v)),
        StorageValue::Int64(v) => Ok(*v as f64),
        other => Err(mismatch(other, type_name)),
    }
}

/// Promoted to a double on write. Lossy: see the module docs.
impl Encode for f32 {
    fn encode(&self) -> Result<StorageValue<'_>, ConversionError> {
        Ok(StorageValue::Double(f64::from(*self)))
    }
}

/// Truncated from a double on read.
impl<'r> Decode<'r> for f32 {
    fn decode(value: StorageValue<'r>) -> Result<Self, ConversionError> {
        Ok(real(&value, "f32")? as f32)
    }
}

impl Encode for f64 {
    fn encode(&self) -> Result<StorageValue<'_>, ConversionError> {
        Ok(StorageValue::Double(*self))
    }
}

impl<'r> Decode<'r> for f64 {
    fn decode(value: StorageValue<'r>) -> Result<Self, ConversionError> {
        real(&value, "f64")
    }
}

#[cfg(test)]
mod tests {
    use std::{f32::consts::PI, f64::consts::E};

    use super::*;

    #[test]
    fn f32_round_trip_within_epsilon() {
        let encoded = PI.encode().unwrap();
        assert!(matches!(encoded, StorageValue::Double(_)));
        let decoded = f32::decode(encoded).unwrap();
        assert!((decoded - PI).abs() <= f32::EPSILON);
    }

    #[test]
    fn f64_is_exact() {
        assert_eq!(f64::decode(E.encode().unwrap()).unwrap(), E);
    }

    #[test]
    fn integers_widen_to_real() {
        assert_eq!(f64::decode(StorageValue::Int64(3)).unwrap(), 3.0);
    }
}
