//! Per-packet events from the PHY and the statistics collector fed by them.

use crossbeam_channel::{Receiver, Sender};
use serde::Serialize;
use std::collections::VecDeque;
use std::time::{Duration, Instant};
use tracing::{debug, trace};

use crate::phy::rate::{Modulation, Rate};
use crate::utils::consts::{DEFAULT_STATS_INTERVAL_MS, QUALITY_HISTORY_LEN};

/// Events published in the order frames complete
#[derive(Debug, Clone, PartialEq)]
pub enum PhyEvent {
    RxPsdu { length: usize, rate: Rate },
    RxError,
    SignalQuality { snr_db: Option<f32>, rssi_dbm: Option<f32> },
    TxPsdu { length: usize },
}

#[derive(Debug, Clone, Serialize)]
pub struct StatsReport {
    pub rx_packets_total: u64,
    pub rx_packets_success: u64,
    pub rx_packets_error: u64,
    pub tx_packets_total: u64,

    // bytes per second
    pub throughput_current: f64,
    pub throughput_average: f64,
    pub throughput_peak: f64,

    pub snr_current: f32,
    pub snr_average: f32,
    pub rssi_current: f32,
    pub rssi_average: f32,

    /// Packet error rate
    pub per: f64,

    pub current_rate: Option<Rate>,
    pub current_modulation: Option<Modulation>,

    pub elapsed_secs: f64,
    pub total_bytes: u64,
}

pub struct StatsCollector {
    events: Receiver<PhyEvent>,
    update_interval: Duration,

    rx_packets_total: u64,
    rx_packets_success: u64,
    rx_packets_error: u64,
    tx_packets_total: u64,
    total_bytes: u64,

    snr_history: VecDeque<f32>,
    rssi_history: VecDeque<f32>,
    snr_current: f32,
    rssi_current: f32,

    start: Instant,
    last_update: Instant,
    bytes_since_update: u64,
    throughput_current: f64,
    throughput_peak: f64,

    current_rate: Option<Rate>,
}

/// Unbounded event queue plus a collector draining it
pub fn channel() -> (Sender<PhyEvent>, StatsCollector) {
    let (tx, rx) = crossbeam_channel::unbounded();
    (tx, StatsCollector::new(rx, DEFAULT_STATS_INTERVAL_MS))
}

fn push_bounded(history: &mut VecDeque<f32>, value: f32) {
    history.push_back(value);
    if history.len() > QUALITY_HISTORY_LEN {
        history.pop_front();
    }
}

fn mean(history: &VecDeque<f32>) -> f32 {
    if history.is_empty() {
        0.0
    } else {
        history.iter().sum::<f32>() / history.len() as f32
    }
}

impl StatsCollector {
    pub fn new(events: Receiver<PhyEvent>, update_interval_ms: u64) -> Self {
        let now = Instant::now();
        Self {
            events,
            update_interval: Duration::from_millis(update_interval_ms),
            rx_packets_total: 0,
            rx_packets_success: 0,
            rx_packets_error: 0,
            tx_packets_total: 0,
            total_bytes: 0,
            snr_history: VecDeque::with_capacity(QUALITY_HISTORY_LEN),
            rssi_history: VecDeque::with_capacity(QUALITY_HISTORY_LEN),
            snr_current: 0.0,
            rssi_current: 0.0,
            start: now,
            last_update: now,
            bytes_since_update: 0,
            throughput_current: 0.0,
            throughput_peak: 0.0,
            current_rate: None,
        }
    }

    /// Drain every pending event; returns how many were handled
    pub fn poll(&mut self) -> usize {
        let pending: Vec<PhyEvent> = self.events.try_iter().collect();
        for event in &pending {
            self.handle(event);
        }
        self.update_throughput(Instant::now());
        pending.len()
    }

    pub fn handle(&mut self, event: &PhyEvent) {
        trace!("PHY event: {:?}", event);
        match *event {
            PhyEvent::RxPsdu { length, rate } => {
                self.rx_packets_total += 1;
                self.rx_packets_success += 1;
                self.total_bytes += length as u64;
                self.bytes_since_update += length as u64;
                self.current_rate = Some(rate);
            }
            PhyEvent::RxError => {
                self.rx_packets_total += 1;
                self.rx_packets_error += 1;
            }
            PhyEvent::SignalQuality { snr_db, rssi_dbm } => {
                if let Some(snr) = snr_db {
                    self.snr_current = snr;
                    push_bounded(&mut self.snr_history, snr);
                }
                if let Some(rssi) = rssi_dbm {
                    self.rssi_current = rssi;
                    push_bounded(&mut self.rssi_history, rssi);
                }
            }
            PhyEvent::TxPsdu { length } => {
                self.tx_packets_total += 1;
                self.total_bytes += length as u64;
                self.bytes_since_update += length as u64;
            }
        }
    }

    fn update_throughput(&mut self, now: Instant) {
        let elapsed = now.duration_since(self.last_update);
        if elapsed < self.update_interval || elapsed.is_zero() {
            return;
        }

        self.throughput_current = self.bytes_since_update as f64 / elapsed.as_secs_f64();
        self.throughput_peak = self.throughput_peak.max(self.throughput_current);
        self.bytes_since_update = 0;
        self.last_update = now;
        debug!(
            "Throughput: {:.1} B/s (peak {:.1} B/s)",
            self.throughput_current, self.throughput_peak
        );
    }

    pub fn report(&self) -> StatsReport {
        let elapsed_secs = self.start.elapsed().as_secs_f64();
        let per = if self.rx_packets_total > 0 {
            self.rx_packets_error as f64 / self.rx_packets_total as f64
        } else {
            0.0
        };

        StatsReport {
            rx_packets_total: self.rx_packets_total,
            rx_packets_success: self.rx_packets_success,
            rx_packets_error: self.rx_packets_error,
            tx_packets_total: self.tx_packets_total,
            throughput_current: self.throughput_current,
            throughput_average: if elapsed_secs > 0.0 {
                self.total_bytes as f64 / elapsed_secs
            } else {
                0.0
            },
            throughput_peak: self.throughput_peak,
            snr_current: self.snr_current,
            snr_average: mean(&self.snr_history),
            rssi_current: self.rssi_current,
            rssi_average: mean(&self.rssi_history),
            per,
            current_rate: self.current_rate,
            current_modulation: self.current_rate.map(Rate::modulation),
            elapsed_secs,
            total_bytes: self.total_bytes,
        }
    }

    pub fn reset(&mut self) {
        let now = Instant::now();
        self.rx_packets_total = 0;
        self.rx_packets_success = 0;
        self.rx_packets_error = 0;
        self.tx_packets_total = 0;
        self.total_bytes = 0;
        self.bytes_since_update = 0;
        self.throughput_current = 0.0;
        self.throughput_peak = 0.0;
        self.snr_history.clear();
        self.rssi_history.clear();
        self.start = now;
        self.last_update = now;
    }

    pub fn set_update_interval(&mut self, interval_ms: u64) {
        self.update_interval = Duration::from_millis(interval_ms);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counters_and_per() {
        let (tx, mut stats) = channel();
        tx.send(PhyEvent::RxPsdu { length: 100, rate: Rate::Mbps11 }).unwrap();
        tx.send(PhyEvent::RxPsdu { length: 50, rate: Rate::Mbps2 }).unwrap();
        tx.send(PhyEvent::RxError).unwrap();
        tx.send(PhyEvent::TxPsdu { length: 10 }).unwrap();
        assert_eq!(stats.poll(), 4);

        let report = stats.report();
        assert_eq!(report.rx_packets_total, 3);
        assert_eq!(report.rx_packets_success, 2);
        assert_eq!(report.rx_packets_error, 1);
        assert_eq!(report.tx_packets_total, 1);
        assert_eq!(report.total_bytes, 160);
        assert!((report.per - 1.0 / 3.0).abs() < 1e-9);
        assert_eq!(report.current_rate, Some(Rate::Mbps2));
        assert_eq!(report.current_modulation, Some(Modulation::Dqpsk));
    }

    #[test]
    fn test_quality_history_is_bounded() {
        let (_tx, mut stats) = channel();
        for i in 0..(QUALITY_HISTORY_LEN + 50) {
            stats.handle(&PhyEvent::SignalQuality {
                snr_db: Some(i as f32),
                rssi_dbm: None,
            });
        }
        let report = stats.report();
        assert_eq!(report.snr_current, (QUALITY_HISTORY_LEN + 49) as f32);
        // mean of 50..=149
        assert!((report.snr_average - 99.5).abs() < 1e-3);
        assert_eq!(report.rssi_average, 0.0);
    }

    #[test]
    fn test_throughput_and_reset() {
        let (tx, mut stats) = channel();
        stats.set_update_interval(0);
        tx.send(PhyEvent::RxPsdu { length: 1000, rate: Rate::Mbps1 }).unwrap();
        std::thread::sleep(Duration::from_millis(5));
        stats.poll();

        let report = stats.report();
        assert!(report.throughput_current > 0.0);
        assert!(report.throughput_peak >= report.throughput_current);

        stats.reset();
        let report = stats.report();
        assert_eq!(report.rx_packets_total, 0);
        assert_eq!(report.throughput_peak, 0.0);
        assert_eq!(report.per, 0.0);
    }

    #[test]
    fn test_report_serializes() {
        let (_tx, stats) = channel();
        let json = serde_json::to_string(&stats.report()).unwrap();
        assert!(json.contains("rx_packets_total"));
    }
}
