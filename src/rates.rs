//! WiFi rate catalog covering 802.11b/a/g/n/ac.
//!
//! Only the DSSS/CCK entries can be framed and mapped by this crate; the OFDM,
//! HT and VHT rows are descriptive.

use serde::Serialize;
use std::sync::LazyLock;

use crate::error::{PhyError, PhyResult};
use crate::phy::rate::{DsssMode, Preamble, Rate};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[repr(u8)]
pub enum WifiRate {
    // 802.11b
    Dsss1MLong,
    Dsss2MLong,
    Dsss5_5MLong,
    Dsss11MLong,
    Dsss2MShort,
    Dsss5_5MShort,
    Dsss11MShort,

    // 802.11a/g
    Ofdm6M,
    Ofdm9M,
    Ofdm12M,
    Ofdm18M,
    Ofdm24M,
    Ofdm36M,
    Ofdm48M,
    Ofdm54M,

    // 802.11n, 20 MHz
    HtMcs0,
    HtMcs1,
    HtMcs2,
    HtMcs3,
    HtMcs4,
    HtMcs5,
    HtMcs6,
    HtMcs7,

    // 802.11ac, 20 MHz
    VhtMcs0,
    VhtMcs1,
    VhtMcs2,
    VhtMcs3,
    VhtMcs4,
    VhtMcs5,
    VhtMcs6,
    VhtMcs7,
    VhtMcs8,
    VhtMcs9,
}

impl WifiRate {
    pub const ALL: [WifiRate; 33] = [
        WifiRate::Dsss1MLong,
        WifiRate::Dsss2MLong,
        WifiRate::Dsss5_5MLong,
        WifiRate::Dsss11MLong,
        WifiRate::Dsss2MShort,
        WifiRate::Dsss5_5MShort,
        WifiRate::Dsss11MShort,
        WifiRate::Ofdm6M,
        WifiRate::Ofdm9M,
        WifiRate::Ofdm12M,
        WifiRate::Ofdm18M,
        WifiRate::Ofdm24M,
        WifiRate::Ofdm36M,
        WifiRate::Ofdm48M,
        WifiRate::Ofdm54M,
        WifiRate::HtMcs0,
        WifiRate::HtMcs1,
        WifiRate::HtMcs2,
        WifiRate::HtMcs3,
        WifiRate::HtMcs4,
        WifiRate::HtMcs5,
        WifiRate::HtMcs6,
        WifiRate::HtMcs7,
        WifiRate::VhtMcs0,
        WifiRate::VhtMcs1,
        WifiRate::VhtMcs2,
        WifiRate::VhtMcs3,
        WifiRate::VhtMcs4,
        WifiRate::VhtMcs5,
        WifiRate::VhtMcs6,
        WifiRate::VhtMcs7,
        WifiRate::VhtMcs8,
        WifiRate::VhtMcs9,
    ];

    pub fn id(self) -> u8 {
        self as u8
    }

    pub fn from_id(id: u8) -> PhyResult<Self> {
        Self::ALL
            .get(id as usize)
            .copied()
            .ok_or(PhyError::UnknownRate(id))
    }

    /// The DSSS mode for an 802.11b entry, `None` for OFDM rates
    pub fn dsss_mode(self) -> Option<DsssMode> {
        let (rate, preamble) = match self {
            WifiRate::Dsss1MLong => (Rate::Mbps1, Preamble::Long),
            WifiRate::Dsss2MLong => (Rate::Mbps2, Preamble::Long),
            WifiRate::Dsss5_5MLong => (Rate::Mbps5_5, Preamble::Long),
            WifiRate::Dsss11MLong => (Rate::Mbps11, Preamble::Long),
            WifiRate::Dsss2MShort => (Rate::Mbps2, Preamble::Short),
            WifiRate::Dsss5_5MShort => (Rate::Mbps5_5, Preamble::Short),
            WifiRate::Dsss11MShort => (Rate::Mbps11, Preamble::Short),
            _ => return None,
        };
        DsssMode::new(rate, preamble).ok()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ModulationType {
    Dsss,
    Cck,
    Ofdm,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum CodingType {
    None,
    Bcc,
    Ldpc,
}

#[derive(Debug, Clone, Serialize)]
pub struct RateInfo {
    pub rate: WifiRate,
    pub mbps: f32,
    pub modulation: ModulationType,
    pub coding: CodingType,
    pub bandwidth_mhz: u32,
    pub description: &'static str,
    pub long_preamble: bool,
}

fn dsss(rate: WifiRate, mbps: f32, modulation: ModulationType, description: &'static str, long_preamble: bool) -> RateInfo {
    RateInfo {
        rate,
        mbps,
        modulation,
        coding: CodingType::None,
        bandwidth_mhz: 22,
        description,
        long_preamble,
    }
}

fn ofdm(rate: WifiRate, mbps: f32, description: &'static str) -> RateInfo {
    RateInfo {
        rate,
        mbps,
        modulation: ModulationType::Ofdm,
        coding: CodingType::Bcc,
        bandwidth_mhz: 20,
        description,
        long_preamble: false,
    }
}

/// One row per [`WifiRate`], in identifier order
static RATE_TABLE: LazyLock<Vec<RateInfo>> = LazyLock::new(|| {
    use ModulationType::{Cck, Dsss};
    use WifiRate::*;
    vec![
        dsss(Dsss1MLong, 1.0, Dsss, "1 Mbps DBPSK (long preamble)", true),
        dsss(Dsss2MLong, 2.0, Dsss, "2 Mbps DQPSK (long preamble)", true),
        dsss(Dsss5_5MLong, 5.5, Cck, "5.5 Mbps CCK (long preamble)", true),
        dsss(Dsss11MLong, 11.0, Cck, "11 Mbps CCK (long preamble)", true),
        dsss(Dsss2MShort, 2.0, Dsss, "2 Mbps DQPSK (short preamble)", false),
        dsss(Dsss5_5MShort, 5.5, Cck, "5.5 Mbps CCK (short preamble)", false),
        dsss(Dsss11MShort, 11.0, Cck, "11 Mbps CCK (short preamble)", false),
        ofdm(Ofdm6M, 6.0, "6 Mbps OFDM (BPSK 1/2)"),
        ofdm(Ofdm9M, 9.0, "9 Mbps OFDM (BPSK 3/4)"),
        ofdm(Ofdm12M, 12.0, "12 Mbps OFDM (QPSK 1/2)"),
        ofdm(Ofdm18M, 18.0, "18 Mbps OFDM (QPSK 3/4)"),
        ofdm(Ofdm24M, 24.0, "24 Mbps OFDM (16-QAM 1/2)"),
        ofdm(Ofdm36M, 36.0, "36 Mbps OFDM (16-QAM 3/4)"),
        ofdm(Ofdm48M, 48.0, "48 Mbps OFDM (64-QAM 2/3)"),
        ofdm(Ofdm54M, 54.0, "54 Mbps OFDM (64-QAM 3/4)"),
        ofdm(HtMcs0, 6.5, "HT MCS0 6.5 Mbps (BPSK 1/2)"),
        ofdm(HtMcs1, 13.0, "HT MCS1 13 Mbps (QPSK 1/2)"),
        ofdm(HtMcs2, 19.5, "HT MCS2 19.5 Mbps (QPSK 3/4)"),
        ofdm(HtMcs3, 26.0, "HT MCS3 26 Mbps (16-QAM 1/2)"),
        ofdm(HtMcs4, 39.0, "HT MCS4 39 Mbps (16-QAM 3/4)"),
        ofdm(HtMcs5, 52.0, "HT MCS5 52 Mbps (64-QAM 2/3)"),
        ofdm(HtMcs6, 58.5, "HT MCS6 58.5 Mbps (64-QAM 3/4)"),
        ofdm(HtMcs7, 65.0, "HT MCS7 65 Mbps (64-QAM 5/6)"),
        ofdm(VhtMcs0, 6.5, "VHT MCS0 6.5 Mbps (BPSK 1/2)"),
        ofdm(VhtMcs1, 13.0, "VHT MCS1 13 Mbps (QPSK 1/2)"),
        ofdm(VhtMcs2, 19.5, "VHT MCS2 19.5 Mbps (QPSK 3/4)"),
        ofdm(VhtMcs3, 26.0, "VHT MCS3 26 Mbps (16-QAM 1/2)"),
        ofdm(VhtMcs4, 39.0, "VHT MCS4 39 Mbps (16-QAM 3/4)"),
        ofdm(VhtMcs5, 52.0, "VHT MCS5 52 Mbps (64-QAM 2/3)"),
        ofdm(VhtMcs6, 58.5, "VHT MCS6 58.5 Mbps (64-QAM 3/4)"),
        ofdm(VhtMcs7, 65.0, "VHT MCS7 65 Mbps (64-QAM 5/6)"),
        ofdm(VhtMcs8, 78.0, "VHT MCS8 78 Mbps (256-QAM 3/4)"),
        ofdm(VhtMcs9, 86.7, "VHT MCS9 86.7 Mbps (256-QAM 5/6)"),
    ]
});

/// Full catalog in identifier order
pub fn all_rates() -> &'static [RateInfo] {
    &RATE_TABLE
}

pub fn rate_info(rate: WifiRate) -> &'static RateInfo {
    &RATE_TABLE[rate.id() as usize]
}

/// Catalog lookup by raw identifier
pub fn rate_info_by_id(id: u8) -> PhyResult<&'static RateInfo> {
    WifiRate::from_id(id).map(rate_info)
}

pub fn rate_name(rate: WifiRate) -> &'static str {
    rate_info(rate).description
}

pub fn rate_mbps(rate: WifiRate) -> f32 {
    rate_info(rate).mbps
}

pub fn is_dsss_rate(rate: WifiRate) -> bool {
    matches!(
        rate_info(rate).modulation,
        ModulationType::Dsss | ModulationType::Cck
    )
}

pub fn is_ofdm_rate(rate: WifiRate) -> bool {
    rate_info(rate).modulation == ModulationType::Ofdm
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_table_order() {
        assert_eq!(all_rates().len(), WifiRate::ALL.len());
        for (id, info) in all_rates().iter().enumerate() {
            assert_eq!(info.rate.id() as usize, id);
        }
    }

    #[test]
    fn test_lookups() {
        assert_eq!(rate_name(WifiRate::Dsss1MLong), "1 Mbps DBPSK (long preamble)");
        assert_eq!(rate_mbps(WifiRate::Dsss5_5MShort), 5.5);
        assert_eq!(rate_mbps(WifiRate::VhtMcs9), 86.7);
        assert_eq!(rate_info(WifiRate::Ofdm54M).bandwidth_mhz, 20);
        assert_eq!(rate_info(WifiRate::Dsss11MLong).coding, CodingType::None);
        assert!(rate_info(WifiRate::Dsss2MLong).long_preamble);
        assert!(!rate_info(WifiRate::Dsss2MShort).long_preamble);
    }

    #[test]
    fn test_rate_families() {
        let dsss = WifiRate::ALL.iter().filter(|&&r| is_dsss_rate(r)).count();
        let ofdm = WifiRate::ALL.iter().filter(|&&r| is_ofdm_rate(r)).count();
        assert_eq!(dsss, 7);
        assert_eq!(ofdm, 26);
    }

    #[test]
    fn test_unknown_id() {
        assert_eq!(WifiRate::from_id(3), Ok(WifiRate::Dsss11MLong));
        assert_eq!(WifiRate::from_id(33), Err(PhyError::UnknownRate(33)));
        assert!(rate_info_by_id(200).is_err());
    }

    #[test]
    fn test_dsss_modes_follow_mode_index() {
        // the first seven identifiers line up with the DSSS mode index
        for rate in WifiRate::ALL.iter().copied().filter(|&r| is_dsss_rate(r)) {
            let mode = rate.dsss_mode().unwrap();
            assert_eq!(mode.index(), rate.id() as i32);
            assert_eq!(mode.preamble.is_long(), rate_info(rate).long_preamble);
            assert_eq!(mode.rate.mbps(), rate_mbps(rate));
        }
        assert_eq!(WifiRate::HtMcs7.dsss_mode(), None);
    }
}
