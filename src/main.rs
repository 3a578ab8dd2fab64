mod app;
mod graph;
mod headless;
mod layout;
mod profile;
mod session;
mod util;

use std::path::PathBuf;

use anyhow::anyhow;
use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::layout::LayoutConfig;
use crate::profile::Dataset;
use crate::session::Session;

#[derive(Debug, Parser)]
#[command(author, version, about)]
struct Args {
    /// Profile JSON file (`{"profile": [...]}`).
    data: PathBuf,

    /// Profile to select on startup; may be given more than once.
    #[arg(long = "select", value_name = "NAME")]
    select: Vec<String>,

    /// Canvas width; overrides the layout config file (default 1600).
    #[arg(long)]
    width: Option<f32>,

    /// Canvas height; overrides the layout config file (default 1600).
    #[arg(long)]
    height: Option<f32>,

    /// JSON file overriding any subset of the layout parameters.
    #[arg(long, value_name = "FILE.json")]
    layout_config: Option<PathBuf>,

    /// Run the layout without a window and print the final snapshot.
    #[arg(long)]
    headless: bool,

    #[arg(long, default_value_t = 300, requires = "headless")]
    ticks: usize,

    /// Snapshot destination for headless runs; stdout when omitted.
    #[arg(long, value_name = "FILE", requires = "headless")]
    output: Option<PathBuf>,
}

impl Args {
    fn layout_config(&self) -> anyhow::Result<LayoutConfig> {
        let base = match &self.layout_config {
            Some(path) => LayoutConfig::load(path)?,
            None => LayoutConfig::default(),
        };
        Ok(LayoutConfig {
            width: self.width.unwrap_or(base.width),
            height: self.height.unwrap_or(base.height),
            ..base
        }
        .sanitized())
    }
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    let config = args.layout_config()?;

    if args.headless {
        let dataset = Dataset::load(&args.data)?;
        let mut session = Session::with_selection(dataset, config, &args.select);
        info!(
            profiles = session.dataset().len(),
            selected = session.selection().len(),
            max_ticks = args.ticks,
            "running headless layout"
        );
        let snapshot = headless::run_layout(&mut session, args.ticks);
        return headless::write_snapshot(&snapshot, args.output.as_deref());
    }

    let options = eframe::NativeOptions {
        viewport: eframe::egui::ViewportBuilder::default().with_inner_size([1440.0, 920.0]),
        ..Default::default()
    };

    eframe::run_native(
        "relgraph",
        options,
        Box::new(move |cc| {
            Ok(Box::new(app::RelGraphApp::new(
                cc,
                args.data.clone(),
                config,
                args.select.clone(),
            )))
        }),
    )
    .map_err(|error| anyhow!("viewer failed: {error}"))
}

#[cfg(test)]
mod tests {
    use std::fs;

    use super::*;

    fn args(extra: &[&str]) -> Args {
        let mut argv = vec!["relgraph", "data.json"];
        argv.extend_from_slice(extra);
        Args::try_parse_from(argv).unwrap()
    }

    #[test]
    fn canvas_defaults_without_overrides() {
        let config = args(&[]).layout_config().unwrap();
        assert_eq!((config.width, config.height), (1600.0, 1600.0));
    }

    #[test]
    fn config_file_canvas_survives_without_flags() {
        let path = std::env::temp_dir().join(format!("relgraph-layout-{}.json", std::process::id()));
        fs::write(&path, r#"{"width": 900, "link_distance": 120}"#).unwrap();
        let path_arg = path.to_string_lossy().into_owned();

        let from_file = args(&["--layout-config", &path_arg]).layout_config().unwrap();
        assert_eq!(from_file.width, 900.0);
        assert_eq!(from_file.height, 1600.0);
        assert_eq!(from_file.link_distance, 120.0);

        let overridden = args(&["--layout-config", &path_arg, "--width", "700"])
            .layout_config()
            .unwrap();
        assert_eq!(overridden.width, 700.0);
        assert_eq!(overridden.link_distance, 120.0);

        fs::remove_file(&path).unwrap();
    }

    #[test]
    fn ticks_and_output_need_headless() {
        assert!(Args::try_parse_from(["relgraph", "data.json", "--ticks", "5"]).is_err());
        assert!(args(&["--headless", "--ticks", "5"]).headless);
    }
}
