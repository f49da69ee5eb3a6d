use serde::{Deserialize, Serialize};

use crate::error::{PhyError, PhyResult};
use crate::phy::barker::{DbpskBarker, DqpskBarker};
use crate::phy::cck::CckCodec;
use crate::phy::symbol::SymbolCodec;
use crate::utils::consts::*;

/// Chip-level modulation of an 802.11b rate
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Modulation {
    Dbpsk,
    Dqpsk,
    Cck,
}

/// 802.11b data rate
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Rate {
    Mbps1,
    Mbps2,
    Mbps5_5,
    Mbps11,
}

impl Rate {
    pub const ALL: [Rate; 4] = [Rate::Mbps1, Rate::Mbps2, Rate::Mbps5_5, Rate::Mbps11];

    /// SIGNAL field value (rate in units of 100 kbps)
    pub fn signal(self) -> u8 {
        match self {
            Rate::Mbps1 => SIGNAL_1M,
            Rate::Mbps2 => SIGNAL_2M,
            Rate::Mbps5_5 => SIGNAL_5_5M,
            Rate::Mbps11 => SIGNAL_11M,
        }
    }

    pub fn from_signal(signal: u8) -> PhyResult<Self> {
        match signal {
            SIGNAL_1M => Ok(Rate::Mbps1),
            SIGNAL_2M => Ok(Rate::Mbps2),
            SIGNAL_5_5M => Ok(Rate::Mbps5_5),
            SIGNAL_11M => Ok(Rate::Mbps11),
            other => Err(PhyError::UnknownSignalCode(other)),
        }
    }

    pub fn mbps(self) -> f32 {
        match self {
            Rate::Mbps1 => 1.0,
            Rate::Mbps2 => 2.0,
            Rate::Mbps5_5 => 5.5,
            Rate::Mbps11 => 11.0,
        }
    }

    pub fn modulation(self) -> Modulation {
        match self {
            Rate::Mbps1 => Modulation::Dbpsk,
            Rate::Mbps2 => Modulation::Dqpsk,
            Rate::Mbps5_5 | Rate::Mbps11 => Modulation::Cck,
        }
    }

    pub fn chips_per_symbol(self) -> usize {
        match self.modulation() {
            Modulation::Dbpsk | Modulation::Dqpsk => BARKER_CHIPS,
            Modulation::Cck => CCK_CHIPS,
        }
    }

    pub fn bits_per_symbol(self) -> usize {
        match self {
            Rate::Mbps1 => 1,
            Rate::Mbps2 => 2,
            Rate::Mbps5_5 => 4,
            Rate::Mbps11 => 8,
        }
    }

    /// Symbol mapper/demapper for this rate
    pub fn codec(self) -> Box<dyn SymbolCodec> {
        match self {
            Rate::Mbps1 => Box::new(DbpskBarker),
            Rate::Mbps2 => Box::new(DqpskBarker),
            Rate::Mbps5_5 => Box::new(CckCodec::for_5_5()),
            Rate::Mbps11 => Box::new(CckCodec::for_11()),
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Rate::Mbps1 => "1 Mbps DBPSK",
            Rate::Mbps2 => "2 Mbps DQPSK",
            Rate::Mbps5_5 => "5.5 Mbps CCK",
            Rate::Mbps11 => "11 Mbps CCK",
        }
    }
}

/// PLCP preamble variant
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Preamble {
    #[default]
    Long,
    Short,
}

impl Preamble {
    pub fn from_long(is_long: bool) -> Self {
        if is_long { Preamble::Long } else { Preamble::Short }
    }

    pub fn is_long(self) -> bool {
        self == Preamble::Long
    }

    pub fn scrambler_seed(self) -> u8 {
        match self {
            Preamble::Long => LONG_SCRAMBLER_SEED,
            Preamble::Short => SHORT_SCRAMBLER_SEED,
        }
    }

    pub fn sync_bits(self) -> usize {
        match self {
            Preamble::Long => LONG_SYNC_BITS,
            Preamble::Short => SHORT_SYNC_BITS,
        }
    }

    pub fn sfd(self) -> u16 {
        match self {
            Preamble::Long => LONG_SFD,
            Preamble::Short => SHORT_SFD,
        }
    }

    /// Rate the PLCP header is sent at
    pub fn header_rate(self) -> Rate {
        match self {
            Preamble::Long => Rate::Mbps1,
            Preamble::Short => Rate::Mbps2,
        }
    }

    /// SYNC (all ones) followed by the SFD, LSB first, unscrambled
    pub fn bits(self) -> Vec<u8> {
        let mut bits = vec![1u8; self.sync_bits()];
        let sfd = self.sfd();
        bits.extend((0..SFD_BITS).map(|i| ((sfd >> i) & 1) as u8));
        bits
    }

    /// Preamble plus header airtime in microseconds
    pub fn plcp_duration_us(self) -> f64 {
        let preamble_us = (self.sync_bits() + SFD_BITS) as f64;
        preamble_us + PLCP_HEADER_BITS as f64 / self.header_rate().mbps() as f64
    }
}

/// Rate and preamble chosen for one PPDU
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct DsssMode {
    pub rate: Rate,
    pub preamble: Preamble,
}

impl Default for DsssMode {
    fn default() -> Self {
        Self {
            rate: Rate::Mbps1,
            preamble: Preamble::Long,
        }
    }
}

impl DsssMode {
    pub const COUNT: i32 = 7;

    pub fn new(rate: Rate, preamble: Preamble) -> PhyResult<Self> {
        if rate == Rate::Mbps1 && preamble == Preamble::Short {
            return Err(PhyError::ShortPreambleAt1Mbps);
        }
        Ok(Self { rate, preamble })
    }

    /// 0=1M long, 1=2M long, 2=5.5M long, 3=11M long, 4=2M short, 5=5.5M short, 6=11M short
    pub fn from_index(index: i32) -> PhyResult<Self> {
        let (rate, preamble) = match index {
            0 => (Rate::Mbps1, Preamble::Long),
            1 => (Rate::Mbps2, Preamble::Long),
            2 => (Rate::Mbps5_5, Preamble::Long),
            3 => (Rate::Mbps11, Preamble::Long),
            4 => (Rate::Mbps2, Preamble::Short),
            5 => (Rate::Mbps5_5, Preamble::Short),
            6 => (Rate::Mbps11, Preamble::Short),
            other => return Err(PhyError::UnsupportedModeIndex(other)),
        };
        Ok(Self { rate, preamble })
    }

    pub fn index(self) -> i32 {
        let rate_index = Rate::ALL
            .iter()
            .position(|&r| r == self.rate)
            .unwrap_or(0) as i32;
        match self.preamble {
            Preamble::Long => rate_index,
            Preamble::Short => rate_index + 3,
        }
    }

    pub fn all() -> impl Iterator<Item = DsssMode> {
        (0..Self::COUNT).filter_map(|i| Self::from_index(i).ok())
    }

    pub fn name(self) -> String {
        let preamble = match self.preamble {
            Preamble::Long => "long",
            Preamble::Short => "short",
        };
        format!("{} ({} preamble)", self.rate.name(), preamble)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_signal_codes_round_trip() {
        for rate in Rate::ALL {
            assert_eq!(Rate::from_signal(rate.signal()).unwrap(), rate);
        }
        assert_eq!(Rate::from_signal(0x42), Err(PhyError::UnknownSignalCode(0x42)));
    }

    #[test]
    fn test_chip_factors() {
        assert_eq!(Rate::Mbps1.chips_per_symbol(), 11);
        assert_eq!(Rate::Mbps2.chips_per_symbol(), 11);
        assert_eq!(Rate::Mbps5_5.chips_per_symbol(), 8);
        assert_eq!(Rate::Mbps11.chips_per_symbol(), 8);
    }

    #[test]
    fn test_preamble_bits() {
        let long = Preamble::Long.bits();
        assert_eq!(long.len(), 144);
        assert!(long[..128].iter().all(|&b| b == 1));
        // 0xF3A0 LSB first
        assert_eq!(&long[128..], &[0, 0, 0, 0, 0, 1, 0, 1, 1, 1, 0, 0, 1, 1, 1, 1]);

        let short = Preamble::Short.bits();
        assert_eq!(short.len(), 72);
        assert_eq!(Preamble::Long.plcp_duration_us(), 192.0);
        assert_eq!(Preamble::Short.plcp_duration_us(), 96.0);
    }

    #[test]
    fn test_mode_indices() {
        for index in 0..DsssMode::COUNT {
            let mode = DsssMode::from_index(index).unwrap();
            assert_eq!(mode.index(), index);
        }
        assert_eq!(DsssMode::all().count(), 7);
        assert_eq!(DsssMode::from_index(7), Err(PhyError::UnsupportedModeIndex(7)));
        assert_eq!(DsssMode::from_index(-1), Err(PhyError::UnsupportedModeIndex(-1)));
        assert_eq!(
            DsssMode::new(Rate::Mbps1, Preamble::Short),
            Err(PhyError::ShortPreambleAt1Mbps)
        );
        assert!(DsssMode::from_index(3).unwrap().name().contains("11 Mbps"));
    }
}
