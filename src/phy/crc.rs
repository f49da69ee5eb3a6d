// Frame check sequences for 802.11b
// FCS: CRC-32 (IEEE 802.3 polynomial) over the MAC header and body
// PLCP: CRC-16 CCITT (x^16 + x^12 + x^5 + 1) over SIGNAL, SERVICE and LENGTH

use byteorder::{ByteOrder, LittleEndian};
use crc::{CRC_16_IBM_SDLC, Crc};
use crc32fast::Hasher;

use crate::utils::consts::FCS_BYTES;

/// Preset ones, LSB-first bit order, complemented output
const PLCP_CRC: Crc<u16> = Crc::<u16>::new(&CRC_16_IBM_SDLC);

/// Calculate the FCS of a MAC frame (FCS field excluded)
pub fn calc_fcs(data: &[u8]) -> u32 {
    let mut hasher = Hasher::new();
    hasher.update(data);
    hasher.finalize()
}

/// Read the trailing FCS of a frame, as sent on air (little-endian)
pub fn extract_fcs(frame: &[u8]) -> Option<u32> {
    if frame.len() < FCS_BYTES {
        return None;
    }
    Some(LittleEndian::read_u32(&frame[frame.len() - FCS_BYTES..]))
}

/// Verify the FCS of a frame that carries it in its last 4 bytes
pub fn validate_fcs(frame: &[u8]) -> bool {
    match extract_fcs(frame) {
        Some(fcs) => calc_fcs(&frame[..frame.len() - FCS_BYTES]) == fcs,
        None => false,
    }
}

/// Append the FCS to a MAC frame body
pub fn append_fcs(frame: &mut Vec<u8>) {
    let mut fcs = [0u8; FCS_BYTES];
    LittleEndian::write_u32(&mut fcs, calc_fcs(frame));
    frame.extend_from_slice(&fcs);
}

/// CRC-16 over the first four PLCP header bytes
pub fn calc_plcp_crc16(header: &[u8; 4]) -> u16 {
    PLCP_CRC.checksum(header)
}

/// Check a 6-byte PLCP header whose last two bytes hold the CRC (little-endian)
pub fn validate_plcp_crc16(header: &[u8; 6]) -> bool {
    let fields = [header[0], header[1], header[2], header[3]];
    calc_plcp_crc16(&fields) == LittleEndian::read_u16(&header[4..])
}

/// Convert byte to bit array (LSB first, air order)
pub fn byte_to_bits(byte: u8) -> [u8; 8] {
    let mut bits = [0u8; 8];
    for (i, bit) in bits.iter_mut().enumerate() {
        *bit = (byte >> i) & 1;
    }
    bits
}

/// Convert bit array to byte (LSB first)
pub fn bits_to_byte(bits: &[u8]) -> u8 {
    let mut byte = 0u8;
    for (i, &bit) in bits.iter().enumerate().take(8) {
        if bit != 0 {
            byte |= 1 << i;
        }
    }
    byte
}

/// Convert bytes to bit vector
pub fn bytes_to_bits(bytes: &[u8]) -> Vec<u8> {
    let mut bits = Vec::with_capacity(bytes.len() * 8);
    for &byte in bytes {
        bits.extend_from_slice(&byte_to_bits(byte));
    }
    bits
}

/// Convert bit vector to bytes; a trailing partial byte is zero-filled
pub fn bits_to_bytes(bits: &[u8]) -> Vec<u8> {
    bits.chunks(8).map(bits_to_byte).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fcs_deterministic() {
        let data = [0x01, 0x02, 0x03, 0x04, 0x05];
        let fcs = calc_fcs(&data);
        assert_ne!(fcs, 0);
        assert_eq!(fcs, calc_fcs(&data));
    }

    #[test]
    fn test_fcs_matches_ethernet_check_value() {
        // CRC-32/ISO-HDLC check value
        assert_eq!(calc_fcs(b"123456789"), 0xCBF4_3926);
    }

    #[test]
    fn test_fcs_validation() {
        let mut frame: Vec<u8> = (0..96).collect();
        append_fcs(&mut frame);
        assert_eq!(frame.len(), 100);
        assert!(validate_fcs(&frame));
        assert_eq!(extract_fcs(&frame), Some(calc_fcs(&frame[..96])));

        frame[50] ^= 0xFF;
        assert!(!validate_fcs(&frame));
    }

    #[test]
    fn test_fcs_single_bit_flips() {
        let mut frame = b"802.11b frame body".to_vec();
        append_fcs(&mut frame);
        for bit in 0..frame.len() * 8 {
            let mut corrupted = frame.clone();
            corrupted[bit / 8] ^= 1 << (bit % 8);
            assert!(!validate_fcs(&corrupted), "flip of bit {} went unnoticed", bit);
        }
    }

    #[test]
    fn test_short_frames() {
        assert_eq!(extract_fcs(&[1, 2, 3]), None);
        assert!(!validate_fcs(&[1, 2, 3]));
    }

    #[test]
    fn test_plcp_crc16() {
        // 1 Mbps, locked clocks, LENGTH = 100
        let header = [0x0A, 0x04, 0x64, 0x00];
        let crc = calc_plcp_crc16(&header);
        assert_ne!(crc, 0);

        let mut full = [0u8; 6];
        full[..4].copy_from_slice(&header);
        LittleEndian::write_u16(&mut full[4..], crc);
        assert!(validate_plcp_crc16(&full));

        for bit in 0..48 {
            let mut corrupted = full;
            corrupted[bit / 8] ^= 1 << (bit % 8);
            assert!(!validate_plcp_crc16(&corrupted));
        }
    }

    #[test]
    fn test_bit_conversion() {
        let byte = 0b1011_0011;
        let bits = byte_to_bits(byte);
        assert_eq!(bits, [1, 1, 0, 0, 1, 1, 0, 1]);
        assert_eq!(bits_to_byte(&bits), byte);
    }

    #[test]
    fn test_bytes_bits_conversion() {
        let bytes = vec![0xAB, 0xCD, 0xEF];
        let bits = bytes_to_bits(&bytes);
        assert_eq!(bits.len(), 24);
        assert_eq!(bits_to_bytes(&bits), bytes);
    }
}
