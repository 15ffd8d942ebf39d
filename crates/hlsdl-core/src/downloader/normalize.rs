//! Transport-stream payload normalization.

/// First byte of every MPEG-TS packet.
pub const TS_SYNC_BYTE: u8 = 0x47;

/// Drops everything before the first sync byte.
///
/// Some origins prepend junk (fake PNG headers, padding) that breaks playback
/// once segments are concatenated. A buffer with no sync byte at all is
/// returned unchanged.
pub fn trim_to_sync_byte(data: &[u8]) -> &[u8] {
    match data.iter().position(|&b| b == TS_SYNC_BYTE) {
        Some(start) => &data[start..],
        None => data,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn leading_junk_removed() {
        assert_eq!(
            trim_to_sync_byte(&[0x00, 0x00, 0x47, 0x01, 0x02]),
            &[0x47, 0x01, 0x02]
        );
    }

    #[test]
    fn already_aligned_unchanged() {
        let data = [0x47, 0x40, 0x00, 0x47];
        assert_eq!(trim_to_sync_byte(&data), &data);
    }

    #[test]
    fn no_sync_byte_is_noop() {
        let data = [0x01, 0x02, 0x03];
        assert_eq!(trim_to_sync_byte(&data), &data);
        assert!(trim_to_sync_byte(&[]).is_empty());
    }
}
