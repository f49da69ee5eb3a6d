// 802.11b data scrambler: 7-bit LFSR, S(x) = x^7 + x^4 + 1
// The LFSR output is XORed into each data bit, so scrambling and descrambling
// with the same seed are the same operation.

use crate::phy::rate::Preamble;

#[derive(Debug, Clone)]
pub struct Scrambler {
    state: u8,
}

impl Scrambler {
    pub fn new(seed: u8) -> Self {
        Self { state: seed & 0x7F }
    }

    /// Scrambler seeded for the header of a PPDU with the given preamble
    pub fn for_preamble(preamble: Preamble) -> Self {
        Self::new(preamble.scrambler_seed())
    }

    pub fn state(&self) -> u8 {
        self.state
    }

    /// Advance one step and return the output bit
    pub fn next_bit(&mut self) -> u8 {
        let feedback = ((self.state >> 6) ^ (self.state >> 3)) & 1;
        self.state = ((self.state << 1) | feedback) & 0x7F;
        feedback
    }

    /// Scramble a slice of 0/1 bits in place
    pub fn apply_bits(&mut self, bits: &mut [u8]) {
        for bit in bits.iter_mut() {
            *bit = (*bit & 1) ^ self.next_bit();
        }
    }

    /// Scramble bytes in place, LSB of each byte first
    pub fn apply_bytes(&mut self, data: &mut [u8]) {
        for byte in data.iter_mut() {
            for i in 0..8 {
                *byte ^= self.next_bit() << i;
            }
        }
    }
}

impl Iterator for Scrambler {
    type Item = u8;

    fn next(&mut self) -> Option<Self::Item> {
        Some(self.next_bit())
    }
}

/// Scramble `data` in place starting from `init`
pub fn scramble(data: &mut [u8], init: u8) {
    Scrambler::new(init).apply_bytes(data);
}

/// Same routine as [`scramble`]
pub fn descramble(data: &mut [u8], init: u8) {
    scramble(data, init);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::phy::crc::{bits_to_bytes, bytes_to_bits};
    use crate::utils::consts::{LONG_SCRAMBLER_SEED, SHORT_SCRAMBLER_SEED};

    #[test]
    fn test_scrambler_changes_and_restores() {
        let original: Vec<u8> = (0..32).map(|i| (i * 17) as u8).collect();
        let mut data = original.clone();

        scramble(&mut data, LONG_SCRAMBLER_SEED);
        assert_ne!(data, original);

        descramble(&mut data, LONG_SCRAMBLER_SEED);
        assert_eq!(data, original);
    }

    #[test]
    fn test_self_inverse_all_seeds_and_lengths() {
        for seed in 0..=0x7Fu8 {
            for len in 0..40usize {
                let original: Vec<u8> = (0..len).map(|i| (i as u8).wrapping_mul(31) ^ seed).collect();
                let mut data = original.clone();
                scramble(&mut data, seed);
                descramble(&mut data, seed);
                assert_eq!(data, original, "seed {:#04x} len {}", seed, len);
            }
        }
    }

    #[test]
    fn test_running_state_is_continuous() {
        // header and payload through one instance == one pass over both
        let header = [0x0A, 0x00, 0x04, 0x00, 0x12, 0x34];
        let payload = [0xDE, 0xAD, 0xBE, 0xEF];

        let mut split = Scrambler::new(SHORT_SCRAMBLER_SEED);
        let mut h = header;
        let mut p = payload;
        split.apply_bytes(&mut h);
        split.apply_bytes(&mut p);

        let mut joined: Vec<u8> = header.iter().chain(payload.iter()).copied().collect();
        scramble(&mut joined, SHORT_SCRAMBLER_SEED);

        assert_eq!(&joined[..6], &h);
        assert_eq!(&joined[6..], &p);
    }

    #[test]
    fn test_bit_and_byte_paths_agree() {
        let data = [0x5A, 0xC3, 0x0F];
        let mut bytes = data;
        scramble(&mut bytes, LONG_SCRAMBLER_SEED);

        let mut bits = bytes_to_bits(&data);
        Scrambler::new(LONG_SCRAMBLER_SEED).apply_bits(&mut bits);
        assert_eq!(bits_to_bytes(&bits), bytes.to_vec());
    }

    #[test]
    fn test_maximal_length_sequence() {
        let sequence: Vec<u8> = Scrambler::new(LONG_SCRAMBLER_SEED).take(254).collect();
        assert_eq!(&sequence[..127], &sequence[127..]);
        let ones = sequence[..127].iter().filter(|&&b| b == 1).count();
        assert_eq!(ones, 64);
    }
}
