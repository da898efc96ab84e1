//! Registry number codec.
//!
//! # Responsibility
//! - Map the internal numeric card id to/from the public `Z-###` identifier.
//! - Keep the display format the only bridge between key spaces.
//!
//! # Invariants
//! - `decode_registry_number(encode_registry_number(n)) == n` for all `n >= 0`.
//! - Ids below 1000 are zero-padded to three digits; larger ids render raw.
//! - The numeric primary key stays authoritative; the string is presentation.

use std::error::Error;
use std::fmt::{Display, Formatter};
use std::num::ParseIntError;

const REGISTRY_PREFIX: &str = "Z-";

/// Result type for registry number decoding.
pub type RegistryResult<T> = Result<T, RegistryNumberError>;

/// Errors from parsing a public registry number.
#[derive(Debug)]
pub enum RegistryNumberError {
    /// Value is too short, lacks the `Z-` prefix, or encodes a negative id.
    InvalidFormat(String),
    /// Suffix after the prefix is not a valid integer.
    InvalidDigits {
        value: String,
        source: ParseIntError,
    },
}

impl Display for RegistryNumberError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidFormat(value) => write!(f, "invalid registry number: `{value}`"),
            Self::InvalidDigits { value, source } => {
                write!(f, "invalid registry number digits in `{value}`: {source}")
            }
        }
    }
}

impl Error for RegistryNumberError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::InvalidFormat(_) => None,
            Self::InvalidDigits { source, .. } => Some(source),
        }
    }
}

/// Renders the public registry number for a card id.
///
/// Zero-pads to width 3 under 1000 and renders raw digits above, so
/// `7 -> "Z-007"` and `1000 -> "Z-1000"`.
pub fn encode_registry_number(id: i64) -> String {
    format!("{REGISTRY_PREFIX}{id:03}")
}

/// Parses a public registry number back into the internal card id.
///
/// The exact left inverse of [`encode_registry_number`] for every id it
/// produces. Consumers of the wire format must replicate this parse.
pub fn decode_registry_number(value: &str) -> RegistryResult<i64> {
    if value.len() < 3 || !value.starts_with(REGISTRY_PREFIX) {
        return Err(RegistryNumberError::InvalidFormat(value.to_string()));
    }

    let id = value[REGISTRY_PREFIX.len()..].parse::<i64>().map_err(|source| {
        RegistryNumberError::InvalidDigits {
            value: value.to_string(),
            source,
        }
    })?;

    if id < 0 {
        return Err(RegistryNumberError::InvalidFormat(value.to_string()));
    }

    Ok(id)
}

#[cfg(test)]
mod tests {
    use super::{decode_registry_number, encode_registry_number, RegistryNumberError};

    #[test]
    fn encode_pads_below_one_thousand() {
        assert_eq!(encode_registry_number(7), "Z-007");
        assert_eq!(encode_registry_number(999), "Z-999");
    }

    #[test]
    fn encode_renders_raw_above_padding_width() {
        assert_eq!(encode_registry_number(1000), "Z-1000");
        assert_eq!(encode_registry_number(123_456_789), "Z-123456789");
    }

    #[test]
    fn decode_is_left_inverse_of_encode() {
        for id in [0, 1, 7, 99, 999, 1000, 1001, 65_536, i64::from(u32::MAX)] {
            let encoded = encode_registry_number(id);
            assert_eq!(decode_registry_number(&encoded).unwrap(), id);
        }
    }

    #[test]
    fn decode_rejects_missing_or_wrong_prefix() {
        for value in ["", "AB-1", "Z", "Z7", "007"] {
            assert!(matches!(
                decode_registry_number(value),
                Err(RegistryNumberError::InvalidFormat(_))
            ));
        }
    }

    #[test]
    fn decode_rejects_empty_or_garbage_digits() {
        assert!(matches!(
            decode_registry_number("Z-"),
            Err(RegistryNumberError::InvalidFormat(_))
        ));
        assert!(matches!(
            decode_registry_number("Z-x"),
            Err(RegistryNumberError::InvalidDigits { .. })
        ));
        assert!(matches!(
            decode_registry_number("Z-12a"),
            Err(RegistryNumberError::InvalidDigits { .. })
        ));
    }

    #[test]
    fn decode_rejects_negative_ids() {
        assert!(matches!(
            decode_registry_number("Z--5"),
            Err(RegistryNumberError::InvalidFormat(_))
        ));
    }
}
