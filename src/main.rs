//! Spectrabar - segmented spectrum bars in the terminal
//!
//! Runs the spectrum pipeline against the chosen source and redraws a
//! one-line bar summary on every accepted tick.

use anyhow::Result;
use clap::Parser;
use std::io::{self, Write};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use spectrabar::cli::Args;
use spectrabar::clock::{Clock, SystemClock};
use spectrabar::scheduler::{SleepFrameHost, TickOutcome};
use spectrabar::sink::SegmentGrid;
use spectrabar::source::{list_input_devices, DefaultSourceFactory};
use spectrabar::visualizer::Visualizer;

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(io::stderr)
        .init();

    let args = Args::parse();

    if args.list_devices {
        for name in list_input_devices()? {
            println!("{}", name);
        }
        return Ok(());
    }

    let settings = args.settings()?;
    if args.print_config {
        println!("{}", settings.to_json()?);
        return Ok(());
    }

    let request = args.source_request()?;
    let run_limit = args.run_limit()?;

    let pipeline = settings.pipeline.clone();
    let grid = SegmentGrid::new(pipeline.band_count, pipeline.segment_count, pipeline.color_zones);
    let mut visualizer = Visualizer::new(
        pipeline,
        SystemClock::new(),
        SleepFrameHost::display_rate(),
        grid,
        DefaultSourceFactory::new(settings.analysis.clone()),
    )?;

    // A failed source is not fatal: the demo spectrum keeps the bars alive
    if let Err(err) = visualizer.switch_source(request) {
        warn!("[main] {}; showing demo spectrum", err);
    }

    visualizer.start();
    info!("[main] running on {} (ctrl+c to quit)", visualizer.active_source());

    let mut stdout = io::stdout();
    while visualizer.host_mut().wait_for_frame() {
        if run_limit.is_some_and(|limit| visualizer.clock().now() >= limit) {
            break;
        }

        if visualizer.on_display_frame() == TickOutcome::Ran {
            write!(stdout, "\r|{}|", visualizer.sink().summary())?;
            stdout.flush()?;
        }
    }

    visualizer.stop();
    writeln!(stdout)?;
    info!("[main] stopped after {} ticks", visualizer.tick_count());
    Ok(())
}
