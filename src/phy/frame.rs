// PLCP header: [SIGNAL:1] [SERVICE:1] [LENGTH:2, LE] [CRC-16:2, LE]

use byteorder::{ByteOrder, LittleEndian};
use tracing::debug;

use super::crc::{bits_to_bytes, bytes_to_bits, calc_plcp_crc16, validate_plcp_crc16};
use super::rate::Rate;
use crate::error::{PhyError, PhyResult};
use crate::utils::consts::{MAX_PSDU_OCTETS, PLCP_HEADER_BYTES, SERVICE_LOCKED_CLOCKS};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlcpHeader {
    pub signal: u8,
    pub service: u8,
    pub length: u16, // PSDU octets
}

impl PlcpHeader {
    pub fn new(rate: Rate, psdu_len: usize) -> PhyResult<Self> {
        if psdu_len > MAX_PSDU_OCTETS {
            return Err(PhyError::PsduTooLong(psdu_len));
        }
        Ok(Self {
            signal: rate.signal(),
            service: 0,
            length: psdu_len as u16,
        })
    }

    pub fn with_service(mut self, service: u8) -> Self {
        self.service = service;
        self
    }

    pub fn rate(&self) -> PhyResult<Rate> {
        Rate::from_signal(self.signal)
    }

    pub fn locked_clocks(&self) -> bool {
        self.service & SERVICE_LOCKED_CLOCKS != 0
    }

    pub fn psdu_len(&self) -> usize {
        self.length as usize
    }

    /// SIGNAL, SERVICE, LENGTH: the bytes the CRC covers
    pub fn fields(&self) -> [u8; 4] {
        let mut fields = [self.signal, self.service, 0, 0];
        LittleEndian::write_u16(&mut fields[2..], self.length);
        fields
    }

    pub fn crc(&self) -> u16 {
        calc_plcp_crc16(&self.fields())
    }

    pub fn to_bytes(&self) -> [u8; PLCP_HEADER_BYTES] {
        let mut bytes = [0u8; PLCP_HEADER_BYTES];
        bytes[..4].copy_from_slice(&self.fields());
        LittleEndian::write_u16(&mut bytes[4..], self.crc());
        bytes
    }

    pub fn to_bits(&self) -> Vec<u8> {
        bytes_to_bits(&self.to_bytes())
    }

    /// Parse a received header. The CRC is checked before anything else is
    /// trusted, then the SIGNAL code must name a known rate.
    pub fn from_bytes(bytes: &[u8]) -> PhyResult<Self> {
        let header: [u8; PLCP_HEADER_BYTES] = match bytes.get(..PLCP_HEADER_BYTES) {
            Some(slice) => [slice[0], slice[1], slice[2], slice[3], slice[4], slice[5]],
            None => {
                debug!("PLCP header too short: {} bytes", bytes.len());
                return Err(PhyError::HeaderTooShort(bytes.len()));
            }
        };

        if !validate_plcp_crc16(&header) {
            debug!("PLCP header CRC-16 mismatch: {:02x?}", header);
            return Err(PhyError::HeaderCrcMismatch);
        }

        let parsed = Self {
            signal: header[0],
            service: header[1],
            length: LittleEndian::read_u16(&header[2..4]),
        };
        parsed.rate()?;
        Ok(parsed)
    }

    pub fn from_bits(bits: &[u8]) -> PhyResult<Self> {
        Self::from_bytes(&bits_to_bytes(bits))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_header_layout() {
        let header = PlcpHeader::new(Rate::Mbps1, 100).unwrap();
        let bytes = header.to_bytes();
        assert_eq!(&bytes[..4], &[0x0A, 0x00, 0x64, 0x00]);
        assert_eq!(LittleEndian::read_u16(&bytes[4..]), header.crc());
        assert!(validate_plcp_crc16(&bytes));
    }

    #[test]
    fn test_header_round_trip() {
        let header = PlcpHeader::new(Rate::Mbps1, 100).unwrap();
        let parsed = PlcpHeader::from_bytes(&header.to_bytes()).unwrap();
        assert_eq!(parsed, header);
        assert_eq!(parsed.rate().unwrap(), Rate::Mbps1);
        assert_eq!(parsed.psdu_len(), 100);
        assert_eq!(PlcpHeader::from_bits(&header.to_bits()).unwrap(), header);
    }

    #[test]
    fn test_any_bit_flip_is_rejected() {
        let bytes = PlcpHeader::new(Rate::Mbps1, 100).unwrap().to_bytes();
        for bit in 0..48 {
            let mut corrupted = bytes;
            corrupted[bit / 8] ^= 1 << (bit % 8);
            assert_eq!(
                PlcpHeader::from_bytes(&corrupted),
                Err(PhyError::HeaderCrcMismatch),
                "bit {}",
                bit
            );
        }
    }

    #[test]
    fn test_length_limits() {
        assert!(PlcpHeader::new(Rate::Mbps11, 65535).is_ok());
        assert_eq!(
            PlcpHeader::new(Rate::Mbps11, 65536),
            Err(PhyError::PsduTooLong(65536))
        );
    }

    #[test]
    fn test_unknown_signal_with_valid_crc() {
        let header = PlcpHeader {
            signal: 0x42,
            service: 0,
            length: 4,
        };
        assert_eq!(
            PlcpHeader::from_bytes(&header.to_bytes()),
            Err(PhyError::UnknownSignalCode(0x42))
        );
        assert_eq!(
            PlcpHeader::from_bytes(&[0x0A, 0x00]),
            Err(PhyError::HeaderTooShort(2))
        );
    }

    #[test]
    fn test_service_bits() {
        let header = PlcpHeader::new(Rate::Mbps2, 10)
            .unwrap()
            .with_service(SERVICE_LOCKED_CLOCKS);
        assert!(header.locked_clocks());
        assert_eq!(header.to_bytes()[1], 0x04);
    }
}
