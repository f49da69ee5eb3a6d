//! Complementary Code Keying for 5.5 and 11 Mbps.
//!
//! A codeword is eight chips built from four phases:
//!
//! ```text
//! c = e^{jφ1} · { e^{j(φ2+φ3+φ4)}, e^{j(φ3+φ4)}, e^{j(φ2+φ4)}, -e^{jφ4},
//!                 e^{j(φ2+φ3)},    e^{jφ3},      -e^{jφ2},     1 }
//! ```
//!
//! φ1 carries the first dibit differentially (DQPSK, plus an extra half turn
//! on odd-numbered symbols). The remaining bits pick φ2..φ4: at 11 Mbps each
//! of the next three dibits (d_i, d_i+1) gives (2·d_i + d_i+1)·π/2, at
//! 5.5 Mbps φ2 = d2·π + π/2, φ3 = 0 and φ4 = d3·π.

use num_complex::Complex32;
use std::f32::consts::{FRAC_PI_2, PI};

use crate::phy::symbol::{DiffPhase, SymbolCodec, dqpsk_dibit, dqpsk_quarters, nearest_quarter};
use crate::utils::consts::CCK_CHIPS;

pub type Codeword = [Complex32; CCK_CHIPS];

/// Codeword for the phases φ1..φ4
pub fn codeword(phi1: f32, phi2: f32, phi3: f32, phi4: f32) -> Codeword {
    let e = |p: f32| Complex32::from_polar(1.0, p);
    [
        e(phi1 + phi2 + phi3 + phi4),
        e(phi1 + phi3 + phi4),
        e(phi1 + phi2 + phi4),
        -e(phi1 + phi4),
        e(phi1 + phi2 + phi3),
        e(phi1 + phi3),
        -e(phi1 + phi2),
        e(phi1),
    ]
}

fn qpsk_phase(a: u8, b: u8) -> f32 {
    (2 * (a & 1) + (b & 1)) as f32 * FRAC_PI_2
}

pub struct CckCodec {
    /// Codewords with φ1 = 0, indexed by the selector bits (first bit in the LSB)
    codebook: Vec<Codeword>,
    selector_bits: usize,
}

impl CckCodec {
    /// 5.5 Mbps: 4 bits per symbol
    pub fn for_5_5() -> Self {
        let codebook = (0..4u8)
            .map(|index| {
                let d2 = index & 1;
                let d3 = (index >> 1) & 1;
                codeword(0.0, d2 as f32 * PI + FRAC_PI_2, 0.0, d3 as f32 * PI)
            })
            .collect();
        Self {
            codebook,
            selector_bits: 2,
        }
    }

    /// 11 Mbps: 8 bits per symbol
    pub fn for_11() -> Self {
        let codebook = (0..64u8)
            .map(|index| {
                let bit = |i: u8| (index >> i) & 1;
                codeword(
                    0.0,
                    qpsk_phase(bit(0), bit(1)),
                    qpsk_phase(bit(2), bit(3)),
                    qpsk_phase(bit(4), bit(5)),
                )
            })
            .collect();
        Self {
            codebook,
            selector_bits: 6,
        }
    }

    pub fn codebook(&self) -> &[Codeword] {
        &self.codebook
    }

    fn cover_quarters(symbol_index: usize) -> u8 {
        if symbol_index % 2 == 1 { 2 } else { 0 }
    }
}

impl SymbolCodec for CckCodec {
    fn bits_per_symbol(&self) -> usize {
        2 + self.selector_bits
    }

    fn chips_per_symbol(&self) -> usize {
        CCK_CHIPS
    }

    fn map(&self, bits: &[u8], phase: &mut DiffPhase, out: &mut Vec<Complex32>) {
        phase.advance(dqpsk_quarters(bits[0], bits[1]) + Self::cover_quarters(phase.symbol_index));
        let index = bits[2..2 + self.selector_bits]
            .iter()
            .enumerate()
            .fold(0usize, |acc, (i, &b)| acc | (((b & 1) as usize) << i));
        let rotation = Complex32::from_polar(1.0, phase.tx_phase);
        out.extend(self.codebook[index].iter().map(|&c| c * rotation));
        phase.symbol_index += 1;
    }

    fn demap(&self, chips: &[Complex32], phase: &mut DiffPhase, bits: &mut Vec<u8>) -> Complex32 {
        // Maximum-likelihood codeword, phase-blind
        let (index, r) = self
            .codebook
            .iter()
            .enumerate()
            .map(|(i, word)| {
                let r: Complex32 = chips
                    .iter()
                    .zip(word.iter())
                    .map(|(&s, &c)| s * c.conj())
                    .sum();
                (i, r)
            })
            .fold((0, Complex32::new(0.0, 0.0)), |best, cand| {
                if cand.1.norm_sqr() > best.1.norm_sqr() { cand } else { best }
            });

        let reference = phase.rx_ref.unwrap_or(Complex32::new(1.0, 0.0));
        let quarters = (nearest_quarter(r * reference.conj()) + 4
            - Self::cover_quarters(phase.symbol_index))
            % 4;
        bits.extend_from_slice(&dqpsk_dibit(quarters));
        bits.extend((0..self.selector_bits).map(|i| ((index >> i) & 1) as u8));

        phase.rx_ref = Some(r);
        phase.symbol_index += 1;
        r
    }
}
