use std::sync::Arc;
use std::sync::mpsc::{self, Receiver, Sender};

use tracing::{debug, info, warn};

use crate::graph::{NodeKind, SelectionController, compose};
use crate::layout::{ForceLayoutEngine, LayoutConfig, LayoutSnapshot};
use crate::profile::Dataset;

/// Owns the selection and the live layout engine for one loaded dataset.
///
/// Clicks recompose the graph and replace the engine; drags pin nodes in the
/// running engine. Every committed tick is published to subscribers as an
/// immutable snapshot.
pub struct Session {
    dataset: Dataset,
    selection: SelectionController,
    config: LayoutConfig,
    engine: ForceLayoutEngine,
    generation: u64,
    latest: Arc<LayoutSnapshot>,
    subscribers: Vec<Sender<Arc<LayoutSnapshot>>>,
}

impl Session {
    pub fn new(dataset: Dataset, config: LayoutConfig) -> Self {
        let config = config.sanitized();
        let engine = ForceLayoutEngine::new(compose(&dataset, &[]), config);
        let latest = Arc::new(engine.snapshot());
        Self {
            dataset,
            selection: SelectionController::new(),
            config,
            engine,
            generation: 0,
            latest,
            subscribers: Vec::new(),
        }
    }

    /// Starts with `initial` selected, in order; names that are not profiles are skipped.
    pub fn with_selection(dataset: Dataset, config: LayoutConfig, initial: &[String]) -> Self {
        let mut session = Self::new(dataset, config);
        let mut changed = false;
        for id in initial {
            if !session.dataset.is_profile(id) {
                warn!(id = %id, "initial selection is not a profile, skipping");
                continue;
            }
            if session.selection.contains(id) {
                continue;
            }
            changed |= session.selection.toggle(id, NodeKind::Profile);
        }
        if changed {
            session.recompose();
        }
        session
    }

    /// Click callback: toggles a profile and rebuilds the graph around it.
    pub fn click(&mut self, id: &str, kind: NodeKind) -> bool {
        if !self.selection.toggle(id, kind) {
            return false;
        }
        info!(
            id = %id,
            selected = self.selection.contains(id),
            total = self.selection.len(),
            "selection toggled"
        );
        self.recompose();
        true
    }

    fn recompose(&mut self) {
        self.engine.stop();
        let retained = self.engine.retained_layout();
        let graph = compose(&self.dataset, &self.selection.ids());
        self.engine = ForceLayoutEngine::with_retained(graph, self.config, &retained);
        self.generation += 1;
        debug!(
            generation = self.generation,
            retained = retained.len(),
            "layout engine replaced"
        );
        self.publish();
    }

    pub fn drag_start(&mut self, id: &str, x: f32, y: f32) -> bool {
        let pinned = self.engine.pin(id, x, y);
        if pinned {
            self.publish();
        }
        pinned
    }

    pub fn drag_move(&mut self, id: &str, x: f32, y: f32) -> bool {
        let moved = self.engine.move_pin(id, x, y);
        if moved {
            self.publish();
        }
        moved
    }

    pub fn drag_end(&mut self, id: &str) -> bool {
        let released = self.engine.unpin(id);
        if released {
            self.publish();
        }
        released
    }

    /// Advances the layout one step and publishes the result when anything moved.
    pub fn tick(&mut self) -> bool {
        let moved = self.engine.tick();
        if moved {
            self.publish();
        }
        moved
    }

    /// Runs up to `max_ticks` without publishing each step, then publishes the result once.
    pub fn settle(&mut self, max_ticks: usize) -> usize {
        let ran = self.engine.settle(max_ticks);
        if ran > 0 {
            self.publish();
        }
        ran
    }

    pub fn reheat(&mut self) {
        self.engine.reheat(1.0);
    }

    /// Applies new force parameters to the running engine and later ones.
    pub fn set_config(&mut self, config: LayoutConfig) {
        self.config = config.sanitized();
        self.engine.set_config(self.config);
        self.engine.reheat(self.config.drag_alpha_target.max(self.engine.alpha()));
    }

    pub fn subscribe(&mut self) -> Receiver<Arc<LayoutSnapshot>> {
        let (tx, rx) = mpsc::channel();
        let _ = tx.send(Arc::clone(&self.latest));
        self.subscribers.push(tx);
        rx
    }

    fn publish(&mut self) {
        let mut snapshot = self.engine.snapshot();
        snapshot.generation = self.generation;
        self.latest = Arc::new(snapshot);

        let latest = &self.latest;
        self.subscribers
            .retain(|subscriber| subscriber.send(Arc::clone(latest)).is_ok());
    }

    /// Latest committed snapshot.
    pub fn snapshot(&self) -> Arc<LayoutSnapshot> {
        Arc::clone(&self.latest)
    }

    pub fn dataset(&self) -> &Dataset {
        &self.dataset
    }

    pub fn selection(&self) -> &SelectionController {
        &self.selection
    }

    pub fn engine(&self) -> &ForceLayoutEngine {
        &self.engine
    }

    pub fn config(&self) -> &LayoutConfig {
        &self.config
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::EngineState;
    use crate::profile::parse_profiles;

    fn dataset() -> Dataset {
        Dataset::from_raw(
            &parse_profiles(
                r#"{"profile":[
                    {"name":"Alice","relations":[
                        {"relation":"born_in","entities":["Paris"],"status":["confirmed"]},
                        {"relation":"knows","entities":["Bob"],"status":[]}
                    ]},
                    {"name":"Bob","relations":[{"relation":"lives_in","entities":["Rome"],"status":[]}]}
                ]}"#,
            )
            .unwrap(),
        )
    }

    fn session() -> Session {
        Session::new(dataset(), LayoutConfig::default())
    }

    #[test]
    fn starts_with_the_baseline_graph() {
        let session = session();
        let snapshot = session.snapshot();
        assert_eq!(snapshot.generation, 0);
        assert_eq!(snapshot.nodes.len(), 2);
        assert!(snapshot.links.is_empty());
    }

    #[test]
    fn clicking_a_profile_expands_and_collapses_it() {
        let mut session = session();
        assert!(session.click("Alice", NodeKind::Profile));
        let expanded = session.snapshot();
        assert_eq!(expanded.generation, 1);
        assert_eq!(expanded.nodes.len(), 3);
        assert_eq!(expanded.links.len(), 2);

        assert!(session.click("Alice", NodeKind::Profile));
        let collapsed = session.snapshot();
        assert_eq!(collapsed.generation, 2);
        assert_eq!(collapsed.nodes.len(), 2);
        assert!(collapsed.links.is_empty());
        assert!(session.selection().is_empty());
    }

    #[test]
    fn clicking_an_entity_changes_nothing() {
        let mut session = session();
        session.click("Alice", NodeKind::Profile);
        assert!(!session.click("Paris", NodeKind::Entity));
        assert_eq!(session.generation(), 1);
    }

    #[test]
    fn recomposition_keeps_positions_of_surviving_nodes() {
        let mut session = session();
        for _ in 0..60 {
            session.tick();
        }
        let alice = session.engine().position("Alice").unwrap();
        let bob = session.engine().position("Bob").unwrap();

        session.click("Alice", NodeKind::Profile);
        assert_eq!(session.engine().position("Alice"), Some(alice));
        assert_eq!(session.engine().position("Bob"), Some(bob));
        assert_eq!(session.engine().state(), EngineState::Running);
        assert_eq!(session.snapshot().tick, 0);
    }

    #[test]
    fn subscribers_receive_every_committed_tick() {
        let mut session = session();
        let receiver = session.subscribe();
        assert_eq!(receiver.try_recv().unwrap().tick, 0);

        session.tick();
        session.tick();
        let ticks = receiver.try_iter().map(|snapshot| snapshot.tick).collect::<Vec<_>>();
        assert_eq!(ticks, vec![1, 2]);

        session.click("Bob", NodeKind::Profile);
        let replaced = receiver.try_recv().unwrap();
        assert_eq!(replaced.generation, 1);
        assert_eq!(replaced.tick, 0);
    }

    #[test]
    fn dropped_subscribers_are_pruned() {
        let mut session = session();
        drop(session.subscribe());
        let live = session.subscribe();
        session.tick();
        assert_eq!(session.subscribers.len(), 1);
        assert!(live.try_iter().count() >= 1);
    }

    #[test]
    fn drag_routes_to_the_pin_api() {
        let mut session = session();
        assert!(session.drag_start("Bob", 10.0, 20.0));
        session.tick();
        assert_eq!(session.snapshot().node("Bob").unwrap().position().x, 10.0);
        assert!(session.drag_move("Bob", 30.0, 40.0));
        session.tick();
        let bob = session.snapshot().node("Bob").unwrap().clone();
        assert_eq!((bob.x, bob.y), (30.0, 40.0));
        assert!(bob.pinned);
        assert!(session.drag_end("Bob"));
        assert!(!session.engine().is_pinned("Bob"));
        assert!(!session.drag_move("Bob", 0.0, 0.0));
    }

    #[test]
    fn drag_end_publishes_the_release() {
        let mut session = session();
        let receiver = session.subscribe();
        session.drag_start("Bob", 10.0, 20.0);
        assert!(session.drag_end("Bob"));

        let last = receiver.try_iter().last().unwrap();
        assert!(!last.node("Bob").unwrap().pinned);
        assert!(!session.snapshot().node("Bob").unwrap().pinned);
    }

    #[test]
    fn drag_survives_recomposition() {
        let mut session = session();
        assert!(session.drag_start("Bob", 10.0, 20.0));
        assert!(session.click("Alice", NodeKind::Profile));

        assert!(session.engine().is_pinned("Bob"));
        assert!(session.drag_move("Bob", 40.0, 50.0));
        assert!(session.drag_end("Bob"));
        assert!(!session.engine().is_pinned("Bob"));
        assert!(!session.snapshot().node("Bob").unwrap().pinned);
    }

    #[test]
    fn initial_selection_skips_unknown_names() {
        let session = Session::with_selection(
            dataset(),
            LayoutConfig::default(),
            &["Ghost".to_string(), "Bob".to_string(), "Bob".to_string()],
        );
        assert_eq!(session.selection().ids(), vec!["Bob"]);
        assert_eq!(session.generation(), 1);
        assert_eq!(session.snapshot().links.len(), 1);
    }

    #[test]
    fn config_changes_apply_to_later_engines() {
        let mut session = session();
        session.set_config(LayoutConfig {
            link_distance: 90.0,
            ..LayoutConfig::default()
        });
        session.click("Alice", NodeKind::Profile);
        assert_eq!(session.engine().config().link_distance, 90.0);
        assert_eq!(session.config().link_distance, 90.0);
    }
}
