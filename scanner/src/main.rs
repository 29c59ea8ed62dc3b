use anyhow::Context;
use bridge::bridge::{default_bind_address, ReportBridge};
use bridge::upload::upload_batch;
use clap::Parser;
use generator::{CaptureCatalog, SimulatedCatalog};
use log::{error, info};
use std::fs::File;
use std::io::{self, BufReader, BufWriter, Write};
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::thread;
use sweepcore::device::DeviceCatalog;
use sweepcore::report::{CsvSink, IntegrationLog};
use sweepcore::scan::{StopHandle, SystemClock};
use tokio::runtime::Builder as TokioBuilder;
use tokio::signal;
use workflow::config::WorkflowConfig;
use workflow::runner::Runner;

mod bridge;
mod generator;
mod workflow;

#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about = "Wideband spectral survey: sweeps a range and logs power per bin"
)]
pub(crate) struct Args {
    /// Survey range as lower:upper:bin_size, e.g. 88M:108M:125k
    #[arg(short = 'f', long)]
    pub frequency: Option<String>,
    /// Report interval (suffixes s, m, h)
    #[arg(short = 'i', long, default_value = "10s")]
    pub interval: String,
    /// Report once, then exit
    #[arg(short = '1', long = "single-shot", default_value_t = false)]
    pub single_shot: bool,
    /// Stop after this long (suffixes s, m, h)
    #[arg(short = 'e', long = "exit-timer")]
    pub exit_timer: Option<String>,
    /// Device index, serial, or serial fragment
    #[arg(short = 'd', long, default_value = "0")]
    pub device: String,
    /// Tuner gain in dB; automatic when absent
    #[arg(short = 'g', long)]
    pub gain: Option<f64>,
    /// Frequency correction in parts per million
    #[arg(short = 'p', long, default_value_t = 0, allow_negative_numbers = true)]
    pub ppm: i32,
    /// Window applied before the transform
    #[arg(short = 'w', long, default_value = "rectangle")]
    pub window: String,
    /// Fraction of every hop to discard, e.g. 20% or 0.2
    #[arg(short = 'c', long, default_value = "0")]
    pub crop: String,
    /// Use recursive decimation; 9 enables droop compensation
    #[arg(short = 'F', long = "fir-size")]
    pub fir_size: Option<usize>,
    /// Keep the per-bin maximum instead of the average
    #[arg(short = 'P', long = "peak-hold", default_value_t = false)]
    pub peak_hold: bool,
    /// Sample the antenna input directly
    #[arg(short = 'D', long = "direct-sampling", default_value_t = false)]
    pub direct_sampling: bool,
    /// Enable offset tuning on tuners that support it
    #[arg(short = 'O', long = "offset-tuning", default_value_t = false)]
    pub offset_tuning: bool,
    /// Report file; `-` or absent writes to stdout
    pub output: Option<PathBuf>,
    /// Load survey settings from YAML instead of flags
    #[arg(long)]
    pub workflow: Option<PathBuf>,
    /// Serve a recorded raw 8-bit I/Q capture instead of the simulated tuner
    #[arg(long)]
    pub replay: Option<PathBuf>,
    /// Also write the integrations as JSON to this path
    #[arg(long)]
    pub json: Option<PathBuf>,
    /// Publish each report over HTTP while scanning
    #[arg(long, default_value_t = false)]
    pub serve: bool,
    /// Port for --serve; defaults to 9000 on localhost
    #[arg(long)]
    pub port: Option<u16>,
    /// Convert an existing report file to JSON and exit
    #[arg(long)]
    pub convert: Option<PathBuf>,
    /// POST the JSON integrations to this URL after the run or conversion
    #[arg(long)]
    pub upload: Option<String>,
    /// Batch identifier recorded in JSON output
    #[arg(long = "batch-id", default_value = "scan")]
    pub batch_id: String,
}

fn open_output(path: Option<&PathBuf>) -> anyhow::Result<Box<dyn Write>> {
    match path {
        Some(path) if path.as_os_str() != "-" => {
            let file = File::create(path)
                .with_context(|| format!("creating report file {}", path.display()))?;
            Ok(Box::new(BufWriter::new(file)))
        }
        _ => Ok(Box::new(io::stdout().lock())),
    }
}

/// First Ctrl+C finishes the current pass, the second aborts.
fn install_interrupt_handler(stop: StopHandle) {
    thread::spawn(move || {
        let runtime = match TokioBuilder::new_current_thread().enable_all().build() {
            Ok(runtime) => runtime,
            Err(err) => {
                error!("cannot install signal handler: {}", err);
                return;
            }
        };
        runtime.block_on(async move {
            while !stop.abort_requested() {
                if let Err(err) = signal::ctrl_c().await {
                    error!("awaiting Ctrl+C: {}", err);
                    return;
                }
                stop.request_stop();
            }
        });
    });
}

fn convert(input: &Path, args: &Args, interval: u64) -> anyhow::Result<()> {
    let file =
        File::open(input).with_context(|| format!("opening report file {}", input.display()))?;
    let log = IntegrationLog::from_csv(BufReader::new(file), args.batch_id.clone(), interval)
        .with_context(|| format!("parsing report file {}", input.display()))?;
    info!("Converted {} integrations", log.len());
    if args.upload.is_none() || args.json.is_some() || args.output.is_some() {
        let target = args.json.as_ref().or(args.output.as_ref());
        log.write_json(open_output(target)?)
            .context("writing integrations")?;
    }
    if let Some(url) = &args.upload {
        upload_batch(url, &log)?;
    }
    Ok(())
}

fn main() -> anyhow::Result<()> {
    env_logger::init();
    let args = Args::parse();

    let workflow_config = if let Some(path) = &args.workflow {
        WorkflowConfig::load(path)?
    } else {
        WorkflowConfig::from_args(&args)?
    };

    if let Some(input) = &args.convert {
        let interval = workflow_config.interval_secs()?.max(1);
        return convert(input, &args, interval);
    }

    let scan_config = workflow_config.to_scan_config()?;
    let runner = Runner::new(scan_config.clone());

    let catalog: Box<dyn DeviceCatalog> = match &args.replay {
        Some(path) => Box::new(CaptureCatalog::new(path)),
        None => Box::new(SimulatedCatalog::new(workflow_config.generator.clone())),
    };

    let bridge = if args.serve {
        let bridge = ReportBridge::new(runner.metrics());
        let addr = args
            .port
            .map(|port| SocketAddr::from(([127, 0, 0, 1], port)))
            .unwrap_or_else(default_bind_address);
        bridge.spawn(addr);
        Some(bridge)
    } else {
        None
    };
    let integrations = (args.json.is_some() || args.upload.is_some())
        .then(|| IntegrationLog::new(args.batch_id.clone(), scan_config.interval()));

    let mut sink = (
        CsvSink::new(open_output(args.output.as_ref())?),
        (integrations, bridge),
    );
    let summary = runner.execute(
        catalog.as_ref(),
        &mut sink,
        &SystemClock,
        install_interrupt_handler,
    )?;
    info!(
        "Exited after {} sweeps and {} reports",
        summary.sweeps, summary.reports
    );

    let (_, (integrations, _)) = sink;
    let Some(log) = integrations else {
        return Ok(());
    };
    if let Some(path) = &args.json {
        let file =
            File::create(path).with_context(|| format!("creating JSON file {}", path.display()))?;
        log.write_json(BufWriter::new(file))
            .context("writing integrations")?;
    }
    if let Some(url) = &args.upload {
        upload_batch(url, &log)?;
    }
    Ok(())
}
