use num_complex::Complex32;
use std::f32::consts::{FRAC_PI_2, TAU};

/// Differential phase carried from one symbol to the next, across
/// preamble, header and payload.
#[derive(Debug, Clone, Default)]
pub struct DiffPhase {
    /// Carrier phase of the last transmitted symbol (radians)
    pub tx_phase: f32,
    /// Despread value of the last received symbol
    pub rx_ref: Option<Complex32>,
    /// Symbols mapped since the current section started (CCK cover sequence)
    pub symbol_index: usize,
}

impl DiffPhase {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rotate the transmit phase by `quarters` quarter turns
    pub fn advance(&mut self, quarters: u8) {
        self.tx_phase = (self.tx_phase + quarters as f32 * FRAC_PI_2).rem_euclid(TAU);
    }

    /// Start a new section: the phase reference carries over, the symbol count does not
    pub fn start_section(&mut self) {
        self.symbol_index = 0;
    }
}

/// One 802.11b symbol format: bits in, chips out and back.
pub trait SymbolCodec {
    fn bits_per_symbol(&self) -> usize;

    fn chips_per_symbol(&self) -> usize;

    /// Append the chips for one symbol worth of bits
    fn map(&self, bits: &[u8], phase: &mut DiffPhase, out: &mut Vec<Complex32>);

    /// Recover one symbol worth of bits; returns the despread value
    fn demap(&self, chips: &[Complex32], phase: &mut DiffPhase, bits: &mut Vec<u8>) -> Complex32;
}

/// DQPSK phase change for a dibit, in quarter turns (00 -> 0, 01 -> 1, 11 -> 2, 10 -> 3)
pub fn dqpsk_quarters(d0: u8, d1: u8) -> u8 {
    match (d0 & 1, d1 & 1) {
        (0, 0) => 0,
        (0, 1) => 1,
        (1, 1) => 2,
        _ => 3,
    }
}

/// Inverse of [`dqpsk_quarters`]
pub fn dqpsk_dibit(quarters: u8) -> [u8; 2] {
    match quarters & 3 {
        0 => [0, 0],
        1 => [0, 1],
        2 => [1, 1],
        _ => [1, 0],
    }
}

/// Phase of `delta` rounded to the nearest quarter turn
pub fn nearest_quarter(delta: Complex32) -> u8 {
    ((delta.arg() / FRAC_PI_2).round() as i32).rem_euclid(4) as u8
}
