use aquaroute::prelude::*;
use anyhow::{bail, Context};
use std::time::Duration;

const USAGE: &str = "usage: aquaroute-app [1h|6h|24h] [--heatmap]";

/// Command line options
struct Args {
    filter: Option<TimeFilter>,
    mode: DisplayMode,
}

fn parse_args() -> anyhow::Result<Args> {
    let mut args = Args {
        filter: None,
        mode: DisplayMode::Markers,
    };
    for arg in std::env::args().skip(1) {
        match arg.as_str() {
            "--heatmap" => args.mode = DisplayMode::Heatmap,
            "--markers" => args.mode = DisplayMode::Markers,
            "-h" | "--help" => {
                println!("{}", USAGE);
                std::process::exit(0);
            }
            other => {
                let filter = other
                    .parse::<TimeFilter>()
                    .with_context(|| format!("bad argument {:?}\n{}", other, USAGE))?;
                args.filter = Some(filter);
            }
        }
    }
    Ok(args)
}

/// Standalone report viewer
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    aquaroute::init_logging();

    let args = parse_args()?;
    let mut config = ClientConfig::from_env();
    if let Some(filter) = args.filter {
        config = config.with_time_filter(filter);
    }
    if config.require_photo {
        bail!("AQUAROUTE_REQUIRE_PHOTO is set but this viewer cannot attach photos");
    }

    let mut session = Session::connect(config, Capabilities::none())
        .context("failed to set up session")?;
    let events = session.events();
    session.start();

    let mut ticker = tokio::time::interval(Duration::from_millis(250));
    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                log::info!("interrupted, shutting down");
                break;
            }
            _ = ticker.tick() => {
                for event in events.try_iter() {
                    handle_event(&session, &event, args.mode);
                }
            }
        }
    }

    session.stop();
    Ok(())
}

fn handle_event(session: &Session, event: &ClientEvent, mode: DisplayMode) {
    match event {
        ClientEvent::ReportsUpdated { .. } => {
            println!("{}", session.summary());
            match session.projection(mode, None) {
                Projection::Markers(markers) => markers.iter().for_each(print_marker),
                Projection::Heatmap(points) => {
                    let config = HeatmapConfig::default();
                    points.iter().for_each(|point| print_heat(point, &config));
                }
            }
        }
        ClientEvent::PollDiscarded { filter } => {
            log::debug!("ignored stale {} snapshot", filter);
        }
        ClientEvent::PollFailed { message } => {
            eprintln!("refresh failed ({}), retrying on next tick", message);
        }
        ClientEvent::Notice(notice) => {
            if notice.is_error() {
                eprintln!("{}", notice.message());
            } else {
                println!("{}", notice.message());
            }
        }
    }
}

fn print_marker(marker: &MarkerPoint) {
    let pending = if marker.pending { " (pending)" } else { "" };
    println!(
        "  [{:<6}] {} {} - {}{}",
        marker.severity,
        marker.popup.location,
        marker.popup.reported_at,
        marker.popup.advisory,
        pending
    );
}

fn print_heat(point: &HeatmapPoint, config: &HeatmapConfig) {
    let [r, g, b, _] = point.color(config);
    println!(
        "  {} weight {:.1} #{:02x}{:02x}{:02x}",
        point.position, point.intensity, r, g, b
    );
}
