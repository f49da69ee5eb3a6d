use tracing::{debug, info};

use super::crc::bytes_to_bits;
use super::frame::PlcpHeader;
use super::rate::{DsssMode, Rate};
use super::scrambler::Scrambler;
use crate::error::{PhyError, PhyResult};
use crate::utils::consts::{MAX_PSDU_OCTETS, SERVICE_LOCKED_CLOCKS};

/// A PPDU ready for chip mapping: unscrambled preamble, scrambled header and
/// scrambled payload, each as 0/1 bits in air order.
#[derive(Debug, Clone)]
pub struct PpduBits {
    pub mode: DsssMode,
    pub header: PlcpHeader,
    pub preamble_bits: Vec<u8>,
    pub header_bits: Vec<u8>,
    pub payload_bits: Vec<u8>,
}

impl PpduBits {
    pub fn psdu_len(&self) -> usize {
        self.header.psdu_len()
    }

    pub fn total_bits(&self) -> usize {
        self.preamble_bits.len() + self.header_bits.len() + self.payload_bits.len()
    }

    /// Airtime in microseconds
    pub fn duration_us(&self) -> f64 {
        self.mode.preamble.plcp_duration_us()
            + self.payload_bits.len() as f64 / self.mode.rate.mbps() as f64
    }
}

/// Builds PLCP preamble and header in front of a PSDU and scrambles
/// header and payload with one running scrambler.
pub struct PpduFramer {
    mode: DsssMode,
    service: u8,
}

impl PpduFramer {
    pub fn new(mode: DsssMode) -> Self {
        info!("PpduFramer initialized: {}", mode.name());
        Self { mode, service: 0 }
    }

    /// Index as in [`DsssMode::from_index`]
    pub fn from_index(index: i32) -> PhyResult<Self> {
        Ok(Self::new(DsssMode::from_index(index)?))
    }

    pub fn with_locked_clocks(mut self, locked: bool) -> Self {
        if locked {
            self.service |= SERVICE_LOCKED_CLOCKS;
        } else {
            self.service &= !SERVICE_LOCKED_CLOCKS;
        }
        self
    }

    pub fn mode(&self) -> DsssMode {
        self.mode
    }

    pub fn rate(&self) -> Rate {
        self.mode.rate
    }

    /// Applies to the next PPDU built; a PPDU already returned keeps its mode.
    pub fn update_rate(&mut self, mode: DsssMode) {
        if mode != self.mode {
            info!("PpduFramer rate update: {} -> {}", self.mode.name(), mode.name());
        }
        self.mode = mode;
    }

    pub fn update_rate_index(&mut self, index: i32) -> PhyResult<()> {
        self.update_rate(DsssMode::from_index(index)?);
        Ok(())
    }

    pub fn frame(&self, psdu: &[u8]) -> PhyResult<PpduBits> {
        if psdu.len() > MAX_PSDU_OCTETS {
            return Err(PhyError::PsduTooLong(psdu.len()));
        }

        let header = PlcpHeader::new(self.mode.rate, psdu.len())?.with_service(self.service);

        // never reseeded between header and payload
        let mut scrambler = Scrambler::for_preamble(self.mode.preamble);
        let mut header_bytes = header.to_bytes();
        scrambler.apply_bytes(&mut header_bytes);
        let mut payload = psdu.to_vec();
        scrambler.apply_bytes(&mut payload);

        let ppdu = PpduBits {
            mode: self.mode,
            header,
            preamble_bits: self.mode.preamble.bits(),
            header_bits: bytes_to_bits(&header_bytes),
            payload_bits: bytes_to_bits(&payload),
        };

        debug!(
            "Framed PPDU: {}, psdu={} bytes, total_bits={}, airtime={:.1} us",
            self.mode.name(),
            psdu.len(),
            ppdu.total_bits(),
            ppdu.duration_us()
        );
        Ok(ppdu)
    }
}
