/// Log level (overridden by RUST_LOG)
pub const LOG_LEVEL: &str = "info";

// ============================================================================
// Chip level
// ============================================================================

/// Chip rate (Hz); the receiver runs at one sample per chip
pub const CHIP_RATE_HZ: f64 = 11e6;

/// Barker-11 spreading sequence used for 1 and 2 Mbps
pub const BARKER_11: [f32; 11] = [1.0, -1.0, 1.0, 1.0, -1.0, 1.0, 1.0, 1.0, -1.0, -1.0, -1.0];

pub const BARKER_CHIPS: usize = 11;
pub const CCK_CHIPS: usize = 8;

// ============================================================================
// PLCP framing
// ============================================================================

/// Scrambler seed for the long preamble
pub const LONG_SCRAMBLER_SEED: u8 = 0x1B;
/// Scrambler seed for the short preamble
pub const SHORT_SCRAMBLER_SEED: u8 = 0x6C;

pub const LONG_SYNC_BITS: usize = 128;
pub const SHORT_SYNC_BITS: usize = 56;
pub const SFD_BITS: usize = 16;

/// Start frame delimiters, sent LSB first
pub const LONG_SFD: u16 = 0xF3A0;
pub const SHORT_SFD: u16 = 0x05CF;

pub const PLCP_HEADER_BYTES: usize = 6; // SIGNAL (1) + SERVICE (1) + LENGTH (2) + CRC (2)
pub const PLCP_HEADER_BITS: usize = PLCP_HEADER_BYTES * 8;

/// Largest PSDU the LENGTH field can describe
pub const MAX_PSDU_OCTETS: usize = u16::MAX as usize;

pub const SIGNAL_1M: u8 = 0x0A;
pub const SIGNAL_2M: u8 = 0x14;
pub const SIGNAL_5_5M: u8 = 0x37;
pub const SIGNAL_11M: u8 = 0x6E;

/// SERVICE bit 2: transmit frequency and symbol clocks derived from the same oscillator
pub const SERVICE_LOCKED_CLOCKS: u8 = 0x04;

pub const FCS_BYTES: usize = 4;

// ============================================================================
// Receiver
// ============================================================================

/// Default peak-to-sidelobe ratio required to accept a Barker lock
pub const DEFAULT_THRESHOLD: f32 = 2.3;

/// Symbol periods accumulated per acquisition decision
pub const ACQUISITION_SYMBOLS: usize = 12;

// ============================================================================
// Statistics
// ============================================================================

pub const QUALITY_HISTORY_LEN: usize = 100;
pub const DEFAULT_STATS_INTERVAL_MS: u64 = 1000;

/// Samples handed to the synchronizer per call by the CLI
pub const DEFAULT_CHUNK_SAMPLES: usize = 4096;
