use std::path::PathBuf;
use std::sync::Arc;
use std::sync::mpsc::{self, Receiver};
use std::thread;

use eframe::egui::{self, Context, Vec2};

use crate::layout::{LayoutConfig, LayoutSnapshot};
use crate::profile::Dataset;
use crate::session::Session;

mod graph;
mod render_utils;
mod ui;

pub struct RelGraphApp {
    data_path: PathBuf,
    config: LayoutConfig,
    initial_selection: Vec<String>,
    state: AppState,
}

enum AppState {
    Loading {
        rx: Receiver<Result<Dataset, String>>,
    },
    Ready(Box<ViewModel>),
    Error(String),
}

struct ViewModel {
    session: Session,
    snapshots: Receiver<Arc<LayoutSnapshot>>,
    latest: Arc<LayoutSnapshot>,
    config: LayoutConfig,
    search: String,
    pan: Vec2,
    zoom: f32,
    live_physics: bool,
    show_link_labels: bool,
    dragging: Option<String>,
}

impl RelGraphApp {
    pub fn new(
        _cc: &eframe::CreationContext<'_>,
        data_path: PathBuf,
        config: LayoutConfig,
        initial_selection: Vec<String>,
    ) -> Self {
        let state = Self::start_load(data_path.clone());
        Self {
            data_path,
            config,
            initial_selection,
            state,
        }
    }

    fn start_load(data_path: PathBuf) -> AppState {
        let (tx, rx) = mpsc::channel();

        thread::spawn(move || {
            let result = Dataset::load(&data_path).map_err(|error| format!("{error:#}"));
            let _ = tx.send(result);
        });

        AppState::Loading { rx }
    }
}

impl eframe::App for RelGraphApp {
    fn update(&mut self, ctx: &Context, _frame: &mut eframe::Frame) {
        let mut transition = None;

        match &mut self.state {
            AppState::Loading { rx } => {
                match rx.try_recv() {
                    Ok(Ok(dataset)) => {
                        transition = Some(AppState::Ready(Box::new(ViewModel::new(
                            dataset,
                            self.config,
                            &self.initial_selection,
                        ))));
                    }
                    Ok(Err(error)) => transition = Some(AppState::Error(error)),
                    Err(mpsc::TryRecvError::Empty) => ctx.request_repaint(),
                    Err(mpsc::TryRecvError::Disconnected) => {
                        transition =
                            Some(AppState::Error("Background load worker disconnected".to_owned()));
                    }
                }

                egui::CentralPanel::default().show(ctx, |ui| {
                    ui.vertical_centered(|ui| {
                        ui.add_space(120.0);
                        ui.heading("Loading profile graph...");
                        ui.add_space(8.0);
                        ui.spinner();
                    });
                });
            }
            AppState::Error(error) => {
                egui::CentralPanel::default().show(ctx, |ui| {
                    ui.heading("Failed to load profile data");
                    ui.add_space(6.0);
                    ui.label(error.as_str());
                    ui.add_space(10.0);
                    if ui.button("Retry").clicked() {
                        transition = Some(Self::start_load(self.data_path.clone()));
                    }
                });
            }
            AppState::Ready(model) => model.show(ctx, &self.data_path),
        }

        if let Some(next_state) = transition {
            self.state = next_state;
        }
    }
}
