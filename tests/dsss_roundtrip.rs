use num_complex::Complex32;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use wifi_dsss::phy::crc::{append_fcs, validate_fcs};
use wifi_dsss::phy::{ChipMapper, ChipSync, DsssMode, PpduFramer, Preamble, Rate, SyncState};
use wifi_dsss::stats::{self, PhyEvent};
use wifi_dsss::utils::consts::DEFAULT_THRESHOLD;
use wifi_dsss::utils::dump::ChipDump;

fn silence(chips: usize) -> Vec<Complex32> {
    vec![Complex32::new(0.0, 0.0); chips]
}

#[test]
fn burst_of_frames_in_every_mode() {
    let mut rng = StdRng::seed_from_u64(2024);
    let mapper = ChipMapper::new("packet_len");

    for index in 0..DsssMode::COUNT {
        let framer = PpduFramer::from_index(index).expect("mode index should be valid");
        let psdus: Vec<Vec<u8>> = (0..3)
            .map(|n| {
                let mut body: Vec<u8> = (0..20 + 17 * n).map(|_| rng.random()).collect();
                append_fcs(&mut body);
                body
            })
            .collect();
        let ppdus: Vec<_> = psdus
            .iter()
            .map(|psdu| framer.frame(psdu).expect("PSDU should frame"))
            .collect();

        let mut stream = silence(300);
        stream.extend(mapper.map_all(&ppdus, 600).expect("bits should map"));
        stream.extend(silence(300));

        let mut sync =
            ChipSync::with_params(framer.mode().preamble.is_long(), DEFAULT_THRESHOLD).unwrap();
        let decoded: Vec<_> = stream
            .chunks(1000)
            .flat_map(|chunk| sync.process_samples(chunk))
            .collect();

        assert_eq!(decoded.len(), psdus.len(), "{}", framer.mode().name());
        for (rx, tx) in decoded.iter().zip(&psdus) {
            assert_eq!(&rx.psdu, tx);
            assert!(validate_fcs(&rx.psdu));
            assert_eq!(rx.rate, framer.rate());
        }
    }
}

#[test]
fn events_feed_the_statistics_collector() {
    let (events, mut collector) = stats::channel();
    let framer = PpduFramer::new(DsssMode::new(Rate::Mbps5_5, Preamble::Short).unwrap());
    let mapper = ChipMapper::new("packet_len");

    let mut sync = ChipSync::with_params(false, DEFAULT_THRESHOLD)
        .unwrap()
        .with_event_sender(events.clone());

    let ppdus: Vec<_> = [b"alpha".as_slice(), b"beta".as_slice(), b"gamma".as_slice()]
        .iter()
        .map(|psdu| framer.frame(psdu).unwrap())
        .collect();
    for ppdu in &ppdus {
        events
            .send(PhyEvent::TxPsdu {
                length: ppdu.psdu_len(),
            })
            .unwrap();
    }

    let mut stream = mapper.map_all(&ppdus, 800).unwrap();
    stream.extend(silence(100));
    assert_eq!(sync.process_samples(&stream).len(), 3);

    collector.poll();
    let report = collector.report();
    assert_eq!(report.tx_packets_total, 3);
    assert_eq!(report.rx_packets_success, 3);
    assert_eq!(report.rx_packets_error, 0);
    assert_eq!(report.per, 0.0);
    assert_eq!(report.current_rate, Some(Rate::Mbps5_5));
    assert!(report.snr_average > 0.0);
}

#[test]
fn chip_dump_survives_json() {
    let framer = PpduFramer::from_index(6).unwrap().with_locked_clocks(true);
    let ppdu = framer.frame(b"dumped to disk").unwrap();
    let burst = ChipMapper::new("packet_len").map(&ppdu).unwrap();
    assert_eq!(burst.tag.value, burst.chips.len());

    let json = serde_json::to_string(&ChipDump::from_chips(&burst.chips)).unwrap();
    let dump: ChipDump = serde_json::from_str(&json).unwrap();

    let mut sync = ChipSync::with_params(false, DEFAULT_THRESHOLD).unwrap();
    let mut chips = dump.to_chips();
    chips.extend(silence(50));
    let decoded = sync.process_samples(&chips);

    assert_eq!(decoded.len(), 1);
    assert_eq!(decoded[0].psdu, b"dumped to disk");
    assert_eq!(decoded[0].service & 0x04, 0x04);
    assert_eq!(sync.last_outcome(), Some(SyncState::Done));
}

#[test]
fn wrong_preamble_setting_decodes_nothing() {
    let framer = PpduFramer::from_index(3).unwrap();
    let ppdu = framer.frame(&[0xA5; 32]).unwrap();
    let mut chips = ChipMapper::new("packet_len").map(&ppdu).unwrap().chips;
    chips.extend(silence(2000));

    // short SFD never appears in a long-preamble PPDU
    let mut sync = ChipSync::with_params(false, DEFAULT_THRESHOLD).unwrap();
    assert!(sync.process_samples(&chips).is_empty());
    assert_eq!(sync.frames_done(), 0);
}
