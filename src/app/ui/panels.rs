use std::path::Path;

use eframe::egui::{self, Align, Context, Layout, Vec2};

use crate::layout::{EngineState, LayoutConfig};
use crate::profile::Dataset;
use crate::session::Session;

use super::super::ViewModel;

impl ViewModel {
    pub(in crate::app) fn new(dataset: Dataset, config: LayoutConfig, initial: &[String]) -> Self {
        let mut session = Session::with_selection(dataset, config, initial);
        let snapshots = session.subscribe();
        let latest = session.snapshot();
        let config = *session.config();

        Self {
            session,
            snapshots,
            latest,
            config,
            search: String::new(),
            pan: Vec2::ZERO,
            zoom: 0.5,
            live_physics: true,
            show_link_labels: true,
            dragging: None,
        }
    }

    fn selection_text(&self) -> String {
        if self.session.selection().is_empty() {
            return "selection: none".to_owned();
        }
        let names = self.session.selection().iter().collect::<Vec<_>>();
        format!("selection: {}", names.join(", "))
    }

    pub(in crate::app) fn show(&mut self, ctx: &Context, data_path: &Path) {
        egui::TopBottomPanel::top("top_bar")
            .resizable(false)
            .show(ctx, |ui| {
                ui.horizontal(|ui| {
                    ui.heading("relgraph");
                    ui.separator();
                    ui.label(format!("data: {}", data_path.display()));
                    ui.label(format!("profiles: {}", self.session.dataset().len()));
                    ui.label(format!("relations: {}", self.session.dataset().relation_count()));
                    ui.label(format!("nodes: {}", self.session.engine().node_count()));
                    ui.label(format!("links: {}", self.session.engine().link_count()));
                    ui.with_layout(Layout::right_to_left(Align::Center), |ui| {
                        match self.session.engine().state() {
                            EngineState::Running => {
                                ui.spinner();
                            }
                            EngineState::Settled => {
                                ui.weak("settled");
                            }
                            EngineState::Stopped => {
                                ui.weak("stopped");
                            }
                        }
                        ui.label(format!(
                            "gen {}  |  tick {}  |  alpha {:.3}",
                            self.session.generation(),
                            self.latest.tick,
                            self.latest.alpha
                        ));
                        ui.label(self.selection_text());
                    });
                });
            });

        egui::SidePanel::left("controls")
            .resizable(true)
            .default_width(320.0)
            .show(ctx, |ui| self.draw_controls(ui));

        egui::CentralPanel::default().show(ctx, |ui| {
            if self.session.dataset().is_empty() {
                ui.vertical_centered(|ui| {
                    ui.add_space(120.0);
                    ui.heading("No profiles in this file");
                });
            } else {
                self.draw_graph(ui);
            }
        });
    }
}
