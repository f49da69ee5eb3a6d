//! Chip synchronizer.
//!
//! Takes a stream of complex chips at one sample per chip, finds Barker
//! symbol timing, then walks the SYNC field to the SFD, decodes and checks the
//! PLCP header and demodulates exactly LENGTH octets of payload at the rate
//! the header announces. Samples may arrive in chunks of any size.

use crossbeam_channel::Sender;
use num_complex::Complex32;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, trace, warn};

use super::barker::{DbpskBarker, despread};
use super::crc::bits_to_bytes;
use super::frame::PlcpHeader;
use super::power::linear_to_dbm;
use super::rate::{Preamble, Rate};
use super::scrambler::Scrambler;
use super::symbol::{DiffPhase, SymbolCodec};
use crate::error::{PhyError, PhyResult};
use crate::stats::PhyEvent;
use crate::utils::consts::{
    ACQUISITION_SYMBOLS, BARKER_CHIPS, DEFAULT_THRESHOLD, PLCP_HEADER_BITS, SFD_BITS,
};

/// Externally visible synchronizer state.
///
/// `Done` and `Failed` are terminal per frame; the synchronizer re-arms to
/// `Searching` straight away and reports them through [`ChipSync::last_outcome`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum SyncState {
    Searching,
    HeaderLock,
    Payload,
    Done,
    Failed,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SyncConfig {
    pub preamble: Preamble,
    /// Peak-to-sidelobe ratio of the accumulated Barker correlation
    pub threshold: f32,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            preamble: Preamble::Long,
            threshold: DEFAULT_THRESHOLD,
        }
    }
}

impl SyncConfig {
    pub fn new(long_preamble: bool, threshold: f32) -> PhyResult<Self> {
        let config = Self {
            preamble: Preamble::from_long(long_preamble),
            threshold,
        };
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> PhyResult<()> {
        check_threshold(self.threshold)
    }
}

fn check_threshold(threshold: f32) -> PhyResult<()> {
    // NaN fails the comparison too
    if threshold > 0.0 {
        Ok(())
    } else {
        Err(PhyError::InvalidThreshold(threshold))
    }
}

/// A PSDU recovered from the chip stream
#[derive(Debug, Clone, PartialEq)]
pub struct DecodedPsdu {
    pub psdu: Vec<u8>,
    pub rate: Rate,
    pub preamble: Preamble,
    pub service: u8,
    pub snr_db: Option<f32>,
    pub rssi_dbm: Option<f32>,
    /// Net timing correction applied while locked, in chips
    pub timing_offset: i32,
    /// Absolute sample index of the first preamble chip
    pub start_sample: u64,
}

enum Stage {
    Sfd { register: u16, bits_seen: usize },
    Header { bits: Vec<u8> },
    Payload { header: PlcpHeader, rate: Rate, bits: Vec<u8> },
}

#[derive(Default)]
struct Quality {
    signal: f32,
    noise: f32,
    power: f32,
    chips: usize,
}

impl Quality {
    /// Barker symbols split into despread energy and residual
    fn add_barker(&mut self, chips: &[Complex32], y: Complex32) {
        let total: f32 = chips.iter().map(Complex32::norm_sqr).sum();
        let signal = y.norm_sqr() / BARKER_CHIPS as f32;
        self.signal += signal;
        self.noise += (total - signal).max(0.0);
        self.add_power(total, chips.len());
    }

    fn add_power(&mut self, total: f32, chips: usize) {
        self.power += total;
        self.chips += chips;
    }

    fn snr_db(&self) -> Option<f32> {
        if self.signal <= 0.0 {
            return None;
        }
        // clean input would give an infinite ratio; cap it at 60 dB
        let noise = self.noise.max(self.signal * 1e-6);
        Some(10.0 * (self.signal / noise).log10())
    }

    fn rssi_dbm(&self) -> Option<f32> {
        if self.chips == 0 {
            return None;
        }
        linear_to_dbm(self.power / self.chips as f32)
    }
}

/// Everything that belongs to the frame currently being received
struct FrameLock {
    preamble: Preamble,
    stage: Stage,
    codec: Box<dyn SymbolCodec>,
    phase: DiffPhase,
    scrambler: Scrambler,
    quality: Quality,
    timing_offset: i32,
    start_sample: u64,
}

pub struct ChipSync {
    config: SyncConfig,

    // Sample buffer for processing
    samples: Vec<Complex32>,
    cursor: usize, // next window (searching) or next symbol (locked)
    base: u64,     // absolute index of samples[0]

    // Correlation magnitude per chip phase
    acc: [f32; BARKER_CHIPS],
    acc_windows: usize,

    lock: Option<FrameLock>,
    last_outcome: Option<SyncState>,
    frames_done: u64,
    frames_failed: u64,

    events: Option<Sender<PhyEvent>>,
    decoded: Vec<DecodedPsdu>,
}

impl ChipSync {
    pub fn new(config: SyncConfig) -> PhyResult<Self> {
        config.validate()?;
        info!(
            "Chip sync: {:?} preamble, threshold {:.2}",
            config.preamble, config.threshold
        );
        Ok(Self {
            config,
            samples: Vec::new(),
            cursor: 0,
            base: 0,
            acc: [0.0; BARKER_CHIPS],
            acc_windows: 0,
            lock: None,
            last_outcome: None,
            frames_done: 0,
            frames_failed: 0,
            events: None,
            decoded: Vec::new(),
        })
    }

    pub fn with_params(long_preamble: bool, threshold: f32) -> PhyResult<Self> {
        Self::new(SyncConfig::new(long_preamble, threshold)?)
    }

    /// Publish per-frame events to `events`
    pub fn with_event_sender(mut self, events: Sender<PhyEvent>) -> Self {
        self.events = Some(events);
        self
    }

    /// Takes effect at the next acquisition; a frame in flight keeps its preamble
    pub fn set_preamble_type(&mut self, long_preamble: bool) {
        self.set_preamble(Preamble::from_long(long_preamble));
    }

    pub fn set_preamble(&mut self, preamble: Preamble) {
        if self.lock.is_some() {
            debug!("Preamble set to {:?}, applies from the next frame", preamble);
        }
        self.config.preamble = preamble;
    }

    pub fn set_threshold(&mut self, threshold: f32) -> PhyResult<()> {
        check_threshold(threshold)?;
        self.config.threshold = threshold;
        Ok(())
    }

    pub fn config(&self) -> SyncConfig {
        self.config
    }

    pub fn state(&self) -> SyncState {
        match &self.lock {
            None => SyncState::Searching,
            Some(lock) => match lock.stage {
                Stage::Sfd { .. } | Stage::Header { .. } => SyncState::HeaderLock,
                Stage::Payload { .. } => SyncState::Payload,
            },
        }
    }

    /// How the most recent frame attempt ended
    pub fn last_outcome(&self) -> Option<SyncState> {
        self.last_outcome
    }

    pub fn frames_done(&self) -> u64 {
        self.frames_done
    }

    pub fn frames_failed(&self) -> u64 {
        self.frames_failed
    }

    // entry point for processing incoming samples
    pub fn process_samples(&mut self, samples: &[Complex32]) -> Vec<DecodedPsdu> {
        self.samples.extend_from_slice(samples);

        loop {
            let progressed = if self.lock.is_some() {
                self.step_locked()
            } else {
                self.search()
            };
            if !progressed {
                break;
            }
        }

        // Keep one sample before the cursor for the early timing window, also
        // while searching so a lock taken in the next call still has it
        let drain_end = self.cursor.saturating_sub(1);
        if drain_end > 0 {
            self.samples.drain(..drain_end);
            self.cursor -= drain_end;
            self.base += drain_end as u64;
        }

        std::mem::take(&mut self.decoded)
    }

    pub fn reset(&mut self) {
        self.samples.clear();
        self.cursor = 0;
        self.base = 0;
        self.lock = None;
        self.last_outcome = None;
        self.clear_acquisition();
    }

    fn clear_acquisition(&mut self) {
        self.acc = [0.0; BARKER_CHIPS];
        self.acc_windows = 0;
    }

    fn emit(&self, event: PhyEvent) {
        if let Some(events) = &self.events {
            if events.send(event).is_err() {
                trace!("PHY event receiver dropped");
            }
        }
    }

    /// Slide a Barker correlator over the buffer, folding |corr| into one
    /// bin per chip phase. Returns true once a lock is taken, false when
    /// more data is needed.
    fn search(&mut self) -> bool {
        let block = ACQUISITION_SYMBOLS * BARKER_CHIPS;

        while self.cursor + BARKER_CHIPS <= self.samples.len() {
            let y = despread(&self.samples[self.cursor..self.cursor + BARKER_CHIPS]);
            let bin = ((self.base + self.cursor as u64) % BARKER_CHIPS as u64) as usize;
            self.acc[bin] += y.norm();
            self.cursor += 1;
            self.acc_windows += 1;

            if self.acc_windows < block {
                continue;
            }
            let peak = self.acquisition_peak();
            self.clear_acquisition();
            if let Some(bin) = peak {
                self.acquire(bin);
                return true;
            }
        }
        false
    }

    fn acquisition_peak(&self) -> Option<usize> {
        let (bin, peak) = self
            .acc
            .iter()
            .copied()
            .enumerate()
            .fold((0, f32::MIN), |best, (i, v)| if v > best.1 { (i, v) } else { best });
        let sidelobe = (self.acc.iter().sum::<f32>() - peak) / (BARKER_CHIPS - 1) as f32;

        trace!("Acquisition peak {:.2} at phase {}, sidelobe {:.2}", peak, bin, sidelobe);
        if peak > 0.0 && peak > self.config.threshold * sidelobe {
            Some(bin)
        } else {
            None
        }
    }

    fn acquire(&mut self, bin: usize) {
        let phase_now = ((self.base + self.cursor as u64) % BARKER_CHIPS as u64) as usize;
        self.cursor += (bin + BARKER_CHIPS - phase_now) % BARKER_CHIPS;
        let preamble = self.config.preamble;

        debug!(
            "Barker lock at sample {} ({:?} preamble)",
            self.base + self.cursor as u64,
            preamble
        );
        self.lock = Some(FrameLock {
            preamble,
            stage: Stage::Sfd {
                register: 0,
                bits_seen: 0,
            },
            codec: Box::new(DbpskBarker),
            phase: DiffPhase::new(),
            scrambler: Scrambler::for_preamble(preamble),
            quality: Quality::default(),
            timing_offset: 0,
            start_sample: self.base + self.cursor as u64,
        });
    }

    fn step_locked(&mut self) -> bool {
        let Some(mut lock) = self.lock.take() else {
            return false;
        };

        let mut bits = Vec::with_capacity(8);
        if !self.next_symbol(&mut lock, &mut bits) {
            self.lock = Some(lock);
            return false;
        }

        self.lock = self.advance(lock, &bits);
        true
    }

    /// Demodulate one symbol at the cursor; false if it has not fully arrived.
    /// Barker symbols also wait for the sample after them so the late timing window
    /// runs no matter how the input is chunked.
    fn next_symbol(&mut self, lock: &mut FrameLock, bits: &mut Vec<u8>) -> bool {
        let chips = lock.codec.chips_per_symbol();
        let barker = chips == BARKER_CHIPS;
        if self.cursor + chips + usize::from(barker) > self.samples.len() {
            return false;
        }

        if barker {
            self.track_timing(lock);
        }

        let window = &self.samples[self.cursor..self.cursor + chips];
        let y = lock.codec.demap(window, &mut lock.phase, bits);
        if barker {
            lock.quality.add_barker(window, y);
        } else {
            lock.quality
                .add_power(window.iter().map(Complex32::norm_sqr).sum(), chips);
        }
        self.cursor += chips;
        true
    }

    /// Early/late gate: move the symbol start one chip toward a strictly
    /// stronger neighbour. Only the very first sample of the stream has no
    /// early neighbour.
    fn track_timing(&mut self, lock: &mut FrameLock) {
        if self.cursor == 0 {
            return;
        }
        let magnitude = |start: usize| despread(&self.samples[start..start + BARKER_CHIPS]).norm();
        let early = magnitude(self.cursor - 1);
        let on_time = magnitude(self.cursor);
        let late = magnitude(self.cursor + 1);

        if early > on_time && early >= late {
            self.cursor -= 1;
            lock.timing_offset -= 1;
            trace!("Timing slip -1 chip (total {})", lock.timing_offset);
        } else if late > on_time {
            self.cursor += 1;
            lock.timing_offset += 1;
            trace!("Timing slip +1 chip (total {})", lock.timing_offset);
        }
    }

    /// Feed one symbol's bits into the frame; `None` once the frame is over
    fn advance(&mut self, mut lock: FrameLock, bits: &[u8]) -> Option<FrameLock> {
        match &mut lock.stage {
            Stage::Sfd {
                register,
                bits_seen,
            } => {
                *register = (*register >> 1) | (u16::from(bits[0] & 1) << 15);
                *bits_seen += 1;
                let found = *bits_seen >= SFD_BITS && *register == lock.preamble.sfd();
                let exhausted = *bits_seen >= lock.preamble.sync_bits() + SFD_BITS;

                if found {
                    self.enter_header(&mut lock);
                } else if exhausted {
                    debug!(
                        "No SFD within {} symbols of lock, back to search",
                        lock.preamble.sync_bits() + SFD_BITS
                    );
                    self.finish(SyncState::Failed);
                    return None;
                }
                Some(lock)
            }
            Stage::Header { bits: collected } => {
                collected.extend_from_slice(bits);
                if collected.len() < PLCP_HEADER_BITS {
                    return Some(lock);
                }
                let mut raw = std::mem::take(collected);
                lock.scrambler.apply_bits(&mut raw);

                match PlcpHeader::from_bits(&raw).and_then(|header| Ok((header, header.rate()?))) {
                    Ok((header, rate)) => self.enter_payload(lock, header, rate),
                    Err(err) => {
                        warn!(
                            "Dropping PPDU starting at sample {}: {}",
                            lock.start_sample, err
                        );
                        self.emit(PhyEvent::RxError);
                        self.finish(SyncState::Failed);
                        None
                    }
                }
            }
            Stage::Payload {
                header,
                rate,
                bits: collected,
            } => {
                collected.extend_from_slice(bits);
                let needed = header.psdu_len() * 8;
                if collected.len() < needed {
                    return Some(lock);
                }
                let (header, rate) = (*header, *rate);
                let mut raw = std::mem::take(collected);
                raw.truncate(needed);
                lock.scrambler.apply_bits(&mut raw);
                self.complete(lock, header, rate, bits_to_bytes(&raw));
                None
            }
        }
    }

    fn enter_header(&self, lock: &mut FrameLock) {
        let preamble_chips = (lock.preamble.bits().len() * BARKER_CHIPS) as u64;
        lock.start_sample = (self.base + self.cursor as u64).saturating_sub(preamble_chips);
        lock.codec = lock.preamble.header_rate().codec();
        lock.phase.start_section();
        lock.stage = Stage::Header {
            bits: Vec::with_capacity(PLCP_HEADER_BITS),
        };
        debug!("SFD found, PPDU starts at sample {}", lock.start_sample);
    }

    fn enter_payload(
        &mut self,
        mut lock: FrameLock,
        header: PlcpHeader,
        rate: Rate,
    ) -> Option<FrameLock> {
        debug!(
            "PLCP header: {} Mbps, service 0x{:02x}, {} octets",
            rate.mbps(),
            header.service,
            header.psdu_len()
        );
        if header.psdu_len() == 0 {
            self.complete(lock, header, rate, Vec::new());
            return None;
        }

        lock.codec = rate.codec();
        lock.phase.start_section();
        lock.stage = Stage::Payload {
            header,
            rate,
            bits: Vec::with_capacity(header.psdu_len() * 8),
        };
        Some(lock)
    }

    fn complete(&mut self, lock: FrameLock, header: PlcpHeader, rate: Rate, psdu: Vec<u8>) {
        let decoded = DecodedPsdu {
            psdu,
            rate,
            preamble: lock.preamble,
            service: header.service,
            snr_db: lock.quality.snr_db(),
            rssi_dbm: lock.quality.rssi_dbm(),
            timing_offset: lock.timing_offset,
            start_sample: lock.start_sample,
        };
        info!(
            "Decoded PSDU: {} octets at {} Mbps (sample {}, SNR {:?} dB)",
            decoded.psdu.len(),
            rate.mbps(),
            decoded.start_sample,
            decoded.snr_db
        );

        self.emit(PhyEvent::RxPsdu {
            length: decoded.psdu.len(),
            rate,
        });
        self.emit(PhyEvent::SignalQuality {
            snr_db: decoded.snr_db,
            rssi_dbm: decoded.rssi_dbm,
        });
        self.decoded.push(decoded);
        self.finish(SyncState::Done);
    }

    fn finish(&mut self, outcome: SyncState) {
        match outcome {
            SyncState::Done => self.frames_done += 1,
            _ => self.frames_failed += 1,
        }
        self.last_outcome = Some(outcome);
        self.clear_acquisition();
    }
}
