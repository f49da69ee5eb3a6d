use thiserror::Error;

pub type PhyResult<T> = Result<T, PhyError>;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum PhyError {
    /// Correlation threshold must be a positive number
    #[error("invalid correlation threshold {0}: must be positive")]
    InvalidThreshold(f32),

    #[error("unsupported DSSS mode index {0} (expected 0..=6)")]
    UnsupportedModeIndex(i32),

    #[error("1 Mbps cannot be sent with a short preamble")]
    ShortPreambleAt1Mbps,

    #[error("unknown SIGNAL rate code 0x{0:02x}")]
    UnknownSignalCode(u8),

    #[error("PSDU of {0} octets does not fit the 16-bit LENGTH field")]
    PsduTooLong(usize),

    /// Bit count is not a whole number of symbols for the rate
    #[error("{bits} bits do not fill whole symbols of {bits_per_symbol} bits")]
    MisalignedBits { bits: usize, bits_per_symbol: usize },

    #[error("PLCP header too short: {0} bytes")]
    HeaderTooShort(usize),

    #[error("PLCP header CRC-16 mismatch")]
    HeaderCrcMismatch,

    #[error("unknown WiFi rate identifier {0}")]
    UnknownRate(u8),
}
