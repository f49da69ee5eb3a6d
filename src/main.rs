use clap::{Parser, Subcommand};
use num_complex::Complex32;
use rand::Rng;
use std::error::Error;
use std::fs::File;
use std::io::{BufReader, BufWriter};
use tracing::{info, warn};

use wifi_dsss::phy::crc::{append_fcs, validate_fcs};
use wifi_dsss::phy::{
    ChipMapper, ChipSync, DecodedPsdu, PpduBits, PpduFramer, Preamble, SyncConfig,
};
use wifi_dsss::rates::all_rates;
use wifi_dsss::stats::{self, PhyEvent};
use wifi_dsss::utils::consts::{CHIP_RATE_HZ, DEFAULT_CHUNK_SAMPLES, DEFAULT_THRESHOLD};
use wifi_dsss::utils::dump::ChipDump;
use wifi_dsss::utils::logging::init_logging;

const LEN_TAG_KEY: &str = "packet_len";

#[derive(Parser)]
#[command(author, version, about = "802.11b DSSS/CCK baseband", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Frame random PSDUs, pass them through a noisy channel and decode them
    Loopback {
        /// 0..=3: 1/2/5.5/11 Mbps long preamble, 4..=6: 2/5.5/11 Mbps short
        #[arg(short, long, default_value_t = 3)]
        mode: i32,
        /// MAC body octets per frame (FCS added on top)
        #[arg(short, long, default_value_t = 100)]
        len: usize,
        #[arg(short, long, default_value_t = 10)]
        count: usize,
        /// Uniform noise amplitude per I/Q component
        #[arg(short, long, default_value_t = 0.0)]
        noise: f32,
        #[arg(long, default_value_t = 1.0)]
        gain: f32,
        /// Carrier phase offset (radians)
        #[arg(long, default_value_t = 0.0)]
        phase: f32,
        /// Silent chips between frames
        #[arg(long, default_value_t = 1000)]
        gap: usize,
        #[arg(short, long)]
        threshold: Option<f32>,
        /// Receiver settings as JSON
        #[arg(long)]
        config: Option<String>,
    },
    /// Print the rate catalog as JSON
    Rates,
    /// Frame a file as one PSDU and write its chips
    Tx {
        #[arg(short, long, default_value_t = 3)]
        mode: i32,
        #[arg(short, long)]
        input: String,
        #[arg(short, long)]
        output: String,
    },
    /// Synchronize a chip dump and print recovered PSDUs in hex
    Rx {
        #[arg(short, long)]
        input: String,
        #[arg(long)]
        short: bool,
        #[arg(short, long)]
        threshold: Option<f32>,
    },
}

fn load_config(path: Option<&str>) -> Result<SyncConfig, Box<dyn Error>> {
    let config = match path {
        Some(path) => serde_json::from_reader(BufReader::new(File::open(path)?))?,
        None => SyncConfig::default(),
    };
    config.validate()?;
    Ok(config)
}

/// Gain, fixed phase rotation and uniform noise
fn apply_channel(chips: &[Complex32], gain: f32, phase: f32, noise: f32) -> Vec<Complex32> {
    let rotation = Complex32::from_polar(gain, phase);
    let mut rng = rand::rng();
    chips
        .iter()
        .map(|&c| {
            let mut sample = c * rotation;
            if noise > 0.0 {
                sample += Complex32::new(
                    rng.random_range(-noise..noise),
                    rng.random_range(-noise..noise),
                );
            }
            sample
        })
        .collect()
}

fn run_sync(sync: &mut ChipSync, samples: &[Complex32]) -> Vec<DecodedPsdu> {
    samples
        .chunks(DEFAULT_CHUNK_SAMPLES)
        .flat_map(|chunk| sync.process_samples(chunk))
        .collect()
}

fn hex(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{:02x}", b)).collect()
}

#[allow(clippy::too_many_arguments)]
fn loopback(
    mode: i32,
    len: usize,
    count: usize,
    noise: f32,
    gain: f32,
    phase: f32,
    gap: usize,
    threshold: Option<f32>,
    config: Option<&str>,
) -> Result<(), Box<dyn Error>> {
    let framer = PpduFramer::from_index(mode)?;
    let mapper = ChipMapper::new(LEN_TAG_KEY);

    let mut config = load_config(config)?;
    config.preamble = framer.mode().preamble;
    if let Some(threshold) = threshold {
        config.threshold = threshold;
    }

    let (events, mut collector) = stats::channel();
    let mut sync = ChipSync::new(config)?.with_event_sender(events.clone());

    let mut rng = rand::rng();
    let mut sent = Vec::with_capacity(count);
    let mut ppdus: Vec<PpduBits> = Vec::with_capacity(count);
    for _ in 0..count {
        let mut psdu: Vec<u8> = (0..len).map(|_| rng.random()).collect();
        append_fcs(&mut psdu);
        ppdus.push(framer.frame(&psdu)?);
        events.send(PhyEvent::TxPsdu { length: psdu.len() })?;
        sent.push(psdu);
    }

    let mut chips = vec![Complex32::new(0.0, 0.0); gap];
    chips.extend(mapper.map_all(&ppdus, gap)?);
    chips.extend(std::iter::repeat_n(Complex32::new(0.0, 0.0), gap));
    info!(
        "{} PPDUs, {} chips ({:.3} ms of air time)",
        count,
        chips.len(),
        chips.len() as f64 / CHIP_RATE_HZ * 1e3
    );

    let received = apply_channel(&chips, gain, phase, noise);
    let decoded = run_sync(&mut sync, &received);

    let mut matched = 0;
    for (i, psdu) in decoded.iter().enumerate() {
        let fcs_ok = validate_fcs(&psdu.psdu);
        let exact = sent.contains(&psdu.psdu);
        if exact {
            matched += 1;
        }
        println!(
            "#{:<3} {:>5} octets  {:>4} Mbps  fcs {}  snr {:>5.1} dB  timing {:+}",
            i,
            psdu.psdu.len(),
            psdu.rate.mbps(),
            if fcs_ok { "ok " } else { "bad" },
            psdu.snr_db.unwrap_or(f32::NAN),
            psdu.timing_offset
        );
    }
    if matched < count {
        warn!("{} of {} PSDUs recovered intact", matched, count);
    } else {
        info!("All {} PSDUs recovered intact", count);
    }

    collector.poll();
    println!("{}", serde_json::to_string_pretty(&collector.report())?);
    Ok(())
}

fn tx(mode: i32, input: &str, output: &str) -> Result<(), Box<dyn Error>> {
    let psdu = std::fs::read(input)?;
    let framer = PpduFramer::from_index(mode)?;
    let ppdu = framer.frame(&psdu)?;
    let burst = ChipMapper::new(LEN_TAG_KEY).map(&ppdu)?;

    let writer = BufWriter::new(File::create(output)?);
    serde_json::to_writer(writer, &ChipDump::from_chips(&burst.chips))?;
    info!(
        "{}: {} octets -> {} chips ({:.1} us) in {}",
        burst.mode.name(),
        psdu.len(),
        burst.tag.value,
        ppdu.duration_us(),
        output
    );
    Ok(())
}

fn rx(input: &str, short: bool, threshold: Option<f32>) -> Result<(), Box<dyn Error>> {
    let dump: ChipDump = serde_json::from_reader(BufReader::new(File::open(input)?))?;
    let config = SyncConfig {
        preamble: Preamble::from_long(!short),
        threshold: threshold.unwrap_or(DEFAULT_THRESHOLD),
    };

    let mut sync = ChipSync::new(config)?;
    let decoded = run_sync(&mut sync, &dump.to_chips());
    for psdu in &decoded {
        println!(
            "{} Mbps service=0x{:02x} len={} {}",
            psdu.rate.mbps(),
            psdu.service,
            psdu.psdu.len(),
            hex(&psdu.psdu)
        );
    }
    info!(
        "{} PSDUs decoded, {} failed attempts",
        sync.frames_done(),
        sync.frames_failed()
    );
    Ok(())
}

fn main() -> Result<(), Box<dyn Error>> {
    init_logging();
    let cli = Cli::parse();

    match cli.command {
        Commands::Loopback {
            mode,
            len,
            count,
            noise,
            gain,
            phase,
            gap,
            threshold,
            config,
        } => loopback(
            mode,
            len,
            count,
            noise,
            gain,
            phase,
            gap,
            threshold,
            config.as_deref(),
        )?,
        Commands::Rates => println!("{}", serde_json::to_string_pretty(all_rates())?),
        Commands::Tx {
            mode,
            input,
            output,
        } => tx(mode, &input, &output)?,
        Commands::Rx {
            input,
            short,
            threshold,
        } => rx(&input, short, threshold)?,
    }

    Ok(())
}
