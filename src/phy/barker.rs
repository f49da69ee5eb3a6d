//! Barker-11 spreading for the 1 and 2 Mbps rates.
//!
//! Every symbol is the Barker sequence rotated by the symbol's carrier
//! phase. The sequence has an aperiodic autocorrelation of 11 at zero lag and
//! at most 1 in magnitude elsewhere, which is what acquisition relies on.

use num_complex::Complex32;

use crate::phy::symbol::{DiffPhase, SymbolCodec, dqpsk_dibit, dqpsk_quarters, nearest_quarter};
use crate::utils::consts::{BARKER_11, BARKER_CHIPS};

/// Aperiodic autocorrelation of a real sequence at `lag`
pub fn autocorrelation(sequence: &[f32], lag: usize) -> f32 {
    sequence
        .iter()
        .zip(sequence.iter().skip(lag))
        .map(|(a, b)| a * b)
        .sum()
}

/// Barker-11 chips rotated by `phase` radians
pub fn spread(phase: f32) -> [Complex32; BARKER_CHIPS] {
    let rotation = Complex32::from_polar(1.0, phase);
    BARKER_11.map(|chip| rotation * chip)
}

/// Correlate 11 chips against Barker-11
pub fn despread(chips: &[Complex32]) -> Complex32 {
    chips
        .iter()
        .zip(BARKER_11.iter())
        .map(|(&c, &b)| c * b)
        .sum()
}

/// 1 Mbps: one bit per symbol, a 1 flips the phase
pub struct DbpskBarker;

impl SymbolCodec for DbpskBarker {
    fn bits_per_symbol(&self) -> usize {
        1
    }

    fn chips_per_symbol(&self) -> usize {
        BARKER_CHIPS
    }

    fn map(&self, bits: &[u8], phase: &mut DiffPhase, out: &mut Vec<Complex32>) {
        phase.advance((bits[0] & 1) * 2);
        out.extend_from_slice(&spread(phase.tx_phase));
        phase.symbol_index += 1;
    }

    fn demap(&self, chips: &[Complex32], phase: &mut DiffPhase, bits: &mut Vec<u8>) -> Complex32 {
        let y = despread(chips);
        let reference = phase.rx_ref.unwrap_or(Complex32::new(1.0, 0.0));
        let delta = y * reference.conj();
        bits.push(u8::from(delta.re < 0.0));
        phase.rx_ref = Some(y);
        phase.symbol_index += 1;
        y
    }
}

/// 2 Mbps: one dibit per symbol as a differential quarter-turn rotation
pub struct DqpskBarker;

impl SymbolCodec for DqpskBarker {
    fn bits_per_symbol(&self) -> usize {
        2
    }

    fn chips_per_symbol(&self) -> usize {
        BARKER_CHIPS
    }

    fn map(&self, bits: &[u8], phase: &mut DiffPhase, out: &mut Vec<Complex32>) {
        phase.advance(dqpsk_quarters(bits[0], bits[1]));
        out.extend_from_slice(&spread(phase.tx_phase));
        phase.symbol_index += 1;
    }

    fn demap(&self, chips: &[Complex32], phase: &mut DiffPhase, bits: &mut Vec<u8>) -> Complex32 {
        let y = despread(chips);
        let reference = phase.rx_ref.unwrap_or(Complex32::new(1.0, 0.0));
        bits.extend_from_slice(&dqpsk_dibit(nearest_quarter(y * reference.conj())));
        phase.rx_ref = Some(y);
        phase.symbol_index += 1;
        y
    }
}
