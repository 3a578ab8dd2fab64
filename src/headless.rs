use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::Path;

use anyhow::{Context, Result};
use tracing::info;

use crate::layout::LayoutSnapshot;
use crate::session::Session;

/// Ticks the session without a window until it settles or `max_ticks` elapse.
pub fn run_layout(session: &mut Session, max_ticks: usize) -> LayoutSnapshot {
    let ran = session.settle(max_ticks);

    let snapshot = session.snapshot();
    info!(
        ticks = ran,
        settled = snapshot.settled,
        alpha = snapshot.alpha,
        "headless layout finished"
    );
    (*snapshot).clone()
}

pub fn write_snapshot(snapshot: &LayoutSnapshot, output: Option<&Path>) -> Result<()> {
    match output {
        Some(path) => {
            let file = File::create(path)
                .with_context(|| format!("failed to create {}", path.display()))?;
            let mut writer = BufWriter::new(file);
            serde_json::to_writer_pretty(&mut writer, snapshot)
                .context("failed to serialize layout snapshot")?;
            writer
                .flush()
                .with_context(|| format!("failed to write {}", path.display()))?;
            info!(path = %path.display(), nodes = snapshot.nodes.len(), "wrote layout snapshot");
        }
        None => {
            let stdout = io::stdout();
            let mut writer = stdout.lock();
            serde_json::to_writer_pretty(&mut writer, snapshot)
                .context("failed to serialize layout snapshot")?;
            writeln!(writer).context("failed to write layout snapshot to stdout")?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use serde_json::Value;

    use super::*;
    use crate::layout::LayoutConfig;
    use crate::profile::{Dataset, parse_profiles};

    fn session() -> Session {
        let dataset = Dataset::from_raw(
            &parse_profiles(
                r#"{"profile":[{"name":"Alice","relations":[
                    {"relation":"born_in","entities":["Paris"],"status":["confirmed"]}
                ]},{"name":"Bob","relations":[]}]}"#,
            )
            .unwrap(),
        );
        Session::with_selection(dataset, LayoutConfig::default(), &["Alice".to_string()])
    }

    #[test]
    fn runs_until_settled_within_budget() {
        let mut session = session();
        let snapshot = run_layout(&mut session, 5_000);
        assert!(snapshot.settled);
        assert!(snapshot.tick < 5_000);
    }

    #[test]
    fn stops_at_the_tick_budget() {
        let mut session = session();
        let snapshot = run_layout(&mut session, 10);
        assert_eq!(snapshot.tick, 10);
        assert!(!snapshot.settled);
    }

    #[test]
    fn snapshot_serializes_nodes_and_links() {
        let mut session = session();
        let snapshot = run_layout(&mut session, 5);
        let json = serde_json::to_value(&snapshot).unwrap();

        assert_eq!(json["generation"], Value::from(1));
        let nodes = json["nodes"].as_array().unwrap();
        assert_eq!(nodes.len(), 3);
        assert_eq!(nodes[0]["kind"], "profile");
        assert_eq!(nodes[0]["role"], "focus");
        assert_eq!(nodes[2]["origin"], "born_in");
        assert!(nodes[1].get("origin").is_none());
        assert_eq!(json["links"][0]["label"], "born_in");
    }
}
