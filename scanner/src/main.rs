use anyhow::Context;
use clap::Parser;
use feed::script::approach_script;
use feed::source::{ScriptedDecoder, SyntheticFeed};
use overlay_bridge::bridge::OverlayBridge;
use overlay_bridge::model::OverlayModel;
use pipeline::config::ScannerConfig;
use pipeline::fetch::MockFetchService;
use pipeline::runner::{drive_feed, ScanRunner};
use scancore::boundary::state::BoundaryState;
use scancore::external::fetch::ProductFetcher;
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::runtime::Builder as TokioBuilder;
use tokio::signal;

mod feed;
mod overlay_bridge;
mod pipeline;

#[derive(Parser)]
#[command(author, version, about = "Boundary-analysis scan session driver")]
struct Args {
    /// Run a single scripted scan session and emit a baseline summary
    #[arg(long, default_value_t = false)]
    offline: bool,
    /// Load a scanner config from YAML
    #[arg(long)]
    config: Option<PathBuf>,
    #[arg(long, default_value_t = 1080)]
    image_width: u32,
    #[arg(long, default_value_t = 1920)]
    image_height: u32,
    /// Sensor-to-display rotation in degrees (0, 90, 180, 270)
    #[arg(long, default_value_t = 0)]
    rotation: i32,
    #[arg(long, default_value_t = 48)]
    frames: usize,
    /// Keep the overlay bridge alive for externally injected frames
    #[arg(long, default_value_t = false)]
    serve: bool,
}

fn main() -> anyhow::Result<()> {
    env_logger::init();
    let args = Args::parse();

    let config = if let Some(path) = args.config {
        ScannerConfig::load(path)?
    } else {
        ScannerConfig::from_args(args.image_width, args.image_height, args.rotation, args.frames)
    };

    let boundaries = Arc::new(BoundaryState::new());
    boundaries.set_viewport(config.viewport);
    boundaries.set_scanning_window(config.window());

    let runner = Arc::new(ScanRunner::new(&config, boundaries.clone()));
    let fetcher: Arc<dyn ProductFetcher> = Arc::new(MockFetchService::new(config.fetch_delay_ms));
    let bridge = OverlayBridge::new(runner.clone(), boundaries, fetcher.clone());

    if args.offline {
        let mut source = SyntheticFeed::new(&config);
        let decoder = ScriptedDecoder::new(approach_script(&config));
        let runtime = TokioBuilder::new_current_thread()
            .enable_all()
            .build()
            .context("creating runtime for the offline session")?;
        let report = runtime.block_on(drive_feed(
            &runner,
            &mut source,
            &decoder,
            fetcher,
            Duration::from_millis(config.frame_interval_ms),
            true,
        ))?;

        println!(
            "Offline run -> frames {}, events {}, commits {}, dropped {}",
            report.frames_delivered,
            report.events.len(),
            report.metrics.commits,
            report.metrics.frames_dropped
        );

        bridge.publish(&OverlayModel::from_runner(&runner))?;
        bridge.publish_status("Offline scan session results ready.");

        let line = format!(
            "frames={} events={} commits={} dropped={} decode_errors={}\n",
            report.frames_delivered,
            report.events.len(),
            report.metrics.commits,
            report.metrics.frames_dropped,
            report.metrics.decode_errors
        );
        let report_path = PathBuf::from("tools/data/scan_session.log");
        if let Some(parent) = report_path.parent() {
            fs::create_dir_all(parent)?;
        }
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(report_path)?;
        file.write_all(line.as_bytes())?;
    }
    if args.serve {
        bridge.publish_status("Overlay bridge running (Ctrl+C to stop)...");
        let runtime = TokioBuilder::new_current_thread()
            .enable_all()
            .build()
            .context("creating runtime for signal handling")?;
        runtime.block_on(async {
            signal::ctrl_c().await.context("awaiting Ctrl+C to exit")?;
            Ok::<(), anyhow::Error>(())
        })?;
    }

    Ok(())
}
