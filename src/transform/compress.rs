//! LZMA2 compression layer.
//!
//! A compressed stream is one property byte encoding the dictionary size,
//! followed by a raw LZMA2 stream.

use crate::{Error, Result};

/// Highest supported compression preset.
pub const MAX_PRESET: u32 = 9;

/// Decodes the dictionary size from the LZMA2 property byte.
///
/// The property byte encodes dictionary size as:
/// - Even values: 2^(prop/2 + 12)
/// - Odd values: 3 * 2^(prop/2 + 11)
/// - 40: 4GB - 1
pub(crate) fn decode_lzma2_dict_size(prop: u8) -> Result<u32> {
    if prop > 40 {
        return Err(Error::InvalidFormat(format!(
            "invalid LZMA2 dictionary size property: {}",
            prop
        )));
    }
    if prop == 40 {
        return Ok(0xFFFF_FFFF);
    }

    let base_log = (prop as u32) / 2 + 12;
    let dict_size = if prop % 2 == 0 {
        1u32 << base_log
    } else {
        3u32 << (base_log - 1)
    };
    Ok(dict_size)
}

/// Encodes a dictionary size into the LZMA2 property byte, rounding up.
pub(crate) fn encode_lzma2_dict_size(dict_size: u32) -> u8 {
    (0..40u8)
        .find(|&prop| decode_lzma2_dict_size(prop).is_ok_and(|size| size >= dict_size))
        .unwrap_or(40)
}

/// Builds LZMA2 options for a preset, clamped to [`MAX_PRESET`].
pub(crate) fn lzma2_options(preset: u32) -> lzma_rust2::Lzma2Options {
    lzma_rust2::Lzma2Options::with_preset(preset.min(MAX_PRESET))
}

/// Returns the property byte written before a stream compressed with `options`.
pub(crate) fn property_byte(options: &lzma_rust2::Lzma2Options) -> u8 {
    encode_lzma2_dict_size(options.lzma_options.dict_size)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dict_size_property_values() {
        assert_eq!(decode_lzma2_dict_size(0).unwrap(), 4 * 1024);
        assert_eq!(decode_lzma2_dict_size(1).unwrap(), 6 * 1024);
        assert_eq!(decode_lzma2_dict_size(18).unwrap(), 2 * 1024 * 1024);
        assert_eq!(decode_lzma2_dict_size(40).unwrap(), u32::MAX);
        assert!(matches!(decode_lzma2_dict_size(41), Err(Error::InvalidFormat(_))));
    }

    #[test]
    fn test_encode_rounds_up() {
        assert_eq!(encode_lzma2_dict_size(4 * 1024), 0);
        assert_eq!(encode_lzma2_dict_size(4 * 1024 + 1), 1);
        assert_eq!(encode_lzma2_dict_size(8 * 1024 * 1024), 22);
        assert_eq!(encode_lzma2_dict_size(u32::MAX), 40);
    }

    #[test]
    fn test_property_covers_preset_dictionary() {
        for preset in 0..=MAX_PRESET {
            let options = lzma2_options(preset);
            let prop = property_byte(&options);
            assert!(decode_lzma2_dict_size(prop).unwrap() >= options.lzma_options.dict_size);
        }
    }
}
