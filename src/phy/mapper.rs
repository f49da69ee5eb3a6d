use num_complex::Complex32;
use tracing::debug;

use super::framer::PpduBits;
use super::rate::{DsssMode, Rate};
use super::symbol::{DiffPhase, SymbolCodec};
use crate::error::{PhyError, PhyResult};

/// Stream tag carrying the chip count of a burst
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LengthTag {
    pub key: String,
    pub value: usize,
}

/// Chips of one PPDU
#[derive(Debug, Clone)]
pub struct ChipBurst {
    pub mode: DsssMode,
    pub chips: Vec<Complex32>,
    pub tag: LengthTag,
}

/// Maps PPDU bits to chips: preamble at 1 Mbps, header at the preamble's
/// header rate, payload at the PPDU rate. The differential phase runs
/// through all three sections.
pub struct ChipMapper {
    len_tag_key: String,
}

impl ChipMapper {
    pub fn new(len_tag_key: &str) -> Self {
        Self {
            len_tag_key: len_tag_key.to_string(),
        }
    }

    pub fn len_tag_key(&self) -> &str {
        &self.len_tag_key
    }

    fn check_aligned(bits: usize, rate: Rate) -> PhyResult<()> {
        let bits_per_symbol = rate.bits_per_symbol();
        if bits % bits_per_symbol != 0 {
            return Err(PhyError::MisalignedBits {
                bits,
                bits_per_symbol,
            });
        }
        Ok(())
    }

    /// Map whole symbols of `bits` at `rate`
    pub fn map_bits(rate: Rate, bits: &[u8], phase: &mut DiffPhase) -> PhyResult<Vec<Complex32>> {
        Self::check_aligned(bits.len(), rate)?;
        let codec = rate.codec();
        let mut chips = Vec::with_capacity(bits.len() / codec.bits_per_symbol() * codec.chips_per_symbol());
        Self::map_section(codec.as_ref(), bits, phase, &mut chips);
        Ok(chips)
    }

    fn map_section(codec: &dyn SymbolCodec, bits: &[u8], phase: &mut DiffPhase, out: &mut Vec<Complex32>) {
        phase.start_section();
        for symbol in bits.chunks_exact(codec.bits_per_symbol()) {
            codec.map(symbol, phase, out);
        }
    }

    pub fn map(&self, ppdu: &PpduBits) -> PhyResult<ChipBurst> {
        let header_rate = ppdu.mode.preamble.header_rate();
        let payload_rate = ppdu.mode.rate;

        // validate everything before producing any chips
        Self::check_aligned(ppdu.preamble_bits.len(), Rate::Mbps1)?;
        Self::check_aligned(ppdu.header_bits.len(), header_rate)?;
        Self::check_aligned(ppdu.payload_bits.len(), payload_rate)?;

        let capacity = ppdu.preamble_bits.len() * Rate::Mbps1.chips_per_symbol()
            + ppdu.header_bits.len() / header_rate.bits_per_symbol() * header_rate.chips_per_symbol()
            + ppdu.payload_bits.len() / payload_rate.bits_per_symbol() * payload_rate.chips_per_symbol();
        let mut chips = Vec::with_capacity(capacity);
        let mut phase = DiffPhase::new();

        Self::map_section(Rate::Mbps1.codec().as_ref(), &ppdu.preamble_bits, &mut phase, &mut chips);
        Self::map_section(header_rate.codec().as_ref(), &ppdu.header_bits, &mut phase, &mut chips);
        Self::map_section(payload_rate.codec().as_ref(), &ppdu.payload_bits, &mut phase, &mut chips);

        debug!(
            "Mapped PPDU: {}, psdu={} bytes, chips={}",
            ppdu.mode.name(),
            ppdu.psdu_len(),
            chips.len()
        );

        let tag = LengthTag {
            key: self.len_tag_key.clone(),
            value: chips.len(),
        };
        Ok(ChipBurst {
            mode: ppdu.mode,
            chips,
            tag,
        })
    }

    /// Map several PPDUs with `gap_chips` of silence between them
    pub fn map_all(&self, ppdus: &[PpduBits], gap_chips: usize) -> PhyResult<Vec<Complex32>> {
        let mut output = Vec::new();

        for (i, ppdu) in ppdus.iter().enumerate() {
            output.extend(self.map(ppdu)?.chips);

            if i + 1 < ppdus.len() {
                output.extend(std::iter::repeat_n(Complex32::new(0.0, 0.0), gap_chips));
            }
        }

        debug!("Mapped {} PPDUs, total chips: {}", ppdus.len(), output.len());
        Ok(output)
    }
}
