// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Viewport monitor host: polls a camera source and streams changes to a
//! WebSocket consumer until Ctrl+C.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{anyhow, Context, Result};
use clap::Parser;
use tokio::runtime::Handle;
use tracing::info;
use tracing_subscriber::EnvFilter;
use viewport_monitor_config_fs::FsConfigStore;
use viewport_monitor_core::config::{ConfigService, MonitorConfig, CONFIG_KEY};
use viewport_monitor_core::{CameraSource, Monitor, MonitorSettings, Sink};
use viewport_monitor_ws::{WsSink, WsSinkOptions};

mod source;

use source::{FileCameraSource, OrbitSource};

#[derive(Parser, Debug)]
#[command(author, version, about = "Stream viewport camera changes over WebSocket")]
struct Args {
    /// WebSocket URL of the consumer (e.g. ws://127.0.0.1:8080)
    #[arg(long)]
    endpoint: Option<String>,
    /// JSON file holding the live camera, rewritten by the host
    #[arg(long, conflicts_with = "orbit")]
    camera_file: Option<PathBuf>,
    /// Synthesize an orbiting camera instead of reading a file
    #[arg(long)]
    orbit: bool,
    /// Label copied into every camera's `name`
    #[arg(long)]
    camera_label: Option<String>,
    /// Poll interval in milliseconds
    #[arg(long)]
    interval_ms: Option<f64>,
    /// Directory holding viewport-monitor.json (defaults to the platform config dir)
    #[arg(long)]
    config_dir: Option<PathBuf>,
    /// Persist the effective configuration and exit
    #[arg(long)]
    save_config: bool,
}

impl Args {
    fn apply(&self, config: &mut MonitorConfig) {
        if let Some(endpoint) = &self.endpoint {
            config.endpoint.clone_from(endpoint);
        }
        if let Some(path) = &self.camera_file {
            config.camera_file = Some(path.clone());
        }
        if let Some(label) = &self.camera_label {
            config.camera_label.clone_from(label);
        }
        if let Some(interval_ms) = self.interval_ms {
            config.interval_ms = interval_ms;
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("info".parse()?))
        .init();

    let store = match &args.config_dir {
        Some(dir) => FsConfigStore::at(dir),
        None => FsConfigStore::new(),
    }
    .context("open config store")?;
    let service = ConfigService::new(store);
    let mut config = service.load_monitor_config().context("load config")?;
    args.apply(&mut config);

    if args.save_config {
        service.save(CONFIG_KEY, &config).context("save config")?;
        info!(?config, "configuration saved");
        return Ok(());
    }

    if args.orbit {
        run(OrbitSource::new(10.0, 5.0), &config).await
    } else {
        let path = config
            .camera_file
            .clone()
            .ok_or_else(|| anyhow!("no camera source: pass --camera-file or --orbit"))?;
        run(FileCameraSource::new(path), &config).await
    }
}

async fn run<S>(source: S, config: &MonitorConfig) -> Result<()>
where
    S: CameraSource + 'static,
{
    let handle = Handle::current();
    let sink = Arc::new(WsSink::spawn(
        config.endpoint.clone(),
        WsSinkOptions::default(),
        &handle,
    ));
    let settings = MonitorSettings {
        sink: Some(Arc::clone(&sink) as Arc<dyn Sink>),
        camera_label: config.camera_label.clone(),
        interval_ms: config.interval_ms,
    };
    let mut monitor = Monitor::new(source, settings, handle).context("build monitor")?;
    monitor.start();
    info!(
        endpoint = %config.endpoint,
        camera_label = %config.camera_label,
        interval_ms = config.interval_ms,
        "viewport monitor running"
    );

    tokio::signal::ctrl_c()
        .await
        .context("install ctrl-c handler")?;

    let stats = monitor.stats();
    monitor.shutdown();
    sink.close();
    info!(
        ticks = stats.ticks,
        dispatched = stats.dispatched,
        failed = stats.failed,
        "viewport monitor stopped"
    );
    Ok(())
}
