use std::ops::RangeInclusive;

use eframe::egui::{self, Ui};
use fuzzy_matcher::FuzzyMatcher;
use fuzzy_matcher::skim::SkimMatcherV2;

use crate::graph::{NodeKind, NodeRole};
use crate::layout::LayoutConfig;

use super::super::ViewModel;

const SEARCH_RESULT_ROWS: usize = 30;

fn fuzzy_match_score(matcher: &SkimMatcherV2, text: &str, query: &str) -> Option<i64> {
    matcher.fuzzy_match(text, query).or_else(|| {
        matcher.fuzzy_match(&text.to_ascii_lowercase(), &query.to_ascii_lowercase())
    })
}

/// Profile names matching `query`, best score first. An empty query lists every name in order.
fn rank_profiles<'a>(names: impl Iterator<Item = &'a str>, query: &str, limit: usize) -> Vec<&'a str> {
    let query = query.trim();
    if query.is_empty() {
        return names.take(limit).collect();
    }

    let matcher = SkimMatcherV2::default();
    let mut scored = names
        .filter_map(|name| fuzzy_match_score(&matcher, name, query).map(|score| (score, name)))
        .collect::<Vec<_>>();
    scored.sort_by(|left, right| right.0.cmp(&left.0).then_with(|| left.1.cmp(right.1)));
    scored.into_iter().take(limit).map(|(_, name)| name).collect()
}

/// Which nodes a role's charge applies to.
fn charge_hint(role: NodeRole) -> &'static str {
    match role {
        NodeRole::Focus => "Repulsion of selected profiles.",
        NodeRole::Profile => "Repulsion of unselected profiles while a selection exists.",
        NodeRole::Background => "Repulsion of entities, and of every node while nothing is selected.",
    }
}

fn physics_slider(
    ui: &mut Ui,
    value: &mut f32,
    range: RangeInclusive<f32>,
    label: &str,
    hover: &str,
) -> bool {
    ui.add(egui::Slider::new(value, range).text(label))
        .on_hover_text(hover)
        .changed()
}

impl ViewModel {
    fn draw_force_sliders(&mut self, ui: &mut Ui) -> bool {
        let config = &mut self.config;
        let mut changed = false;

        changed |= physics_slider(
            ui,
            &mut config.link_distance,
            10.0..=800.0,
            "Link distance",
            "Rest length of every relation link.",
        );
        changed |= physics_slider(
            ui,
            &mut config.link_strength,
            0.0..=2.0,
            "Link strength",
            "How hard links pull toward their rest length.",
        );
        changed |= physics_slider(
            ui,
            &mut config.charge.focus,
            -600.0..=0.0,
            "Focus charge",
            charge_hint(NodeRole::Focus),
        );
        changed |= physics_slider(
            ui,
            &mut config.charge.profile,
            -600.0..=0.0,
            "Profile charge",
            charge_hint(NodeRole::Profile),
        );
        changed |= physics_slider(
            ui,
            &mut config.charge.background,
            -300.0..=0.0,
            "Background charge",
            charge_hint(NodeRole::Background),
        );
        changed |= physics_slider(
            ui,
            &mut config.collide_radius,
            0.0..=120.0,
            "Collision radius",
            "Minimum spacing kept between node centres.",
        );
        changed |= physics_slider(
            ui,
            &mut config.radial_strength,
            0.0..=0.3,
            "Radial pull",
            "Pull of unselected nodes toward the outer ring.",
        );
        changed |= physics_slider(
            ui,
            &mut config.velocity_decay,
            0.05..=0.95,
            "Velocity decay",
            "Friction applied to every node per tick.",
        );

        changed
    }

    fn draw_profile_search(&mut self, ui: &mut Ui) {
        ui.label("Search profiles")
            .on_hover_text("Fuzzy-match profile names, then click one to toggle it.");
        ui.text_edit_singleline(&mut self.search);
        ui.add_space(4.0);

        let mut clicked = None;
        {
            let dataset = self.session.dataset();
            let selection = self.session.selection();
            let names = dataset.profiles().iter().map(|profile| profile.name.as_str());
            let matches = rank_profiles(names, &self.search, SEARCH_RESULT_ROWS);

            egui::ScrollArea::vertical()
                .id_salt("profile_search")
                .max_height(260.0)
                .show(ui, |ui| {
                    if matches.is_empty() {
                        ui.weak("No matching profiles");
                    }
                    for name in matches {
                        if ui.selectable_label(selection.contains(name), name).clicked() {
                            clicked = Some(name.to_owned());
                        }
                    }
                });
        }

        if let Some(name) = clicked {
            self.apply_node_click(&name, NodeKind::Profile);
        }
    }

    pub(in crate::app) fn draw_controls(&mut self, ui: &mut Ui) {
        ui.heading("Graph Controls");
        ui.separator();
        ui.add_space(4.0);

        self.draw_profile_search(ui);
        ui.separator();

        ui.checkbox(&mut self.live_physics, "Live physics")
            .on_hover_text("Advance the layout every frame.");
        ui.checkbox(&mut self.show_link_labels, "Relation labels");

        ui.horizontal(|ui| {
            if ui.button("Reheat").clicked() {
                self.session.reheat();
            }
            if ui.button("Reset view").clicked() {
                self.reset_view();
            }
            let has_selection = !self.session.selection().is_empty();
            if ui
                .add_enabled(has_selection, egui::Button::new("Clear selection"))
                .clicked()
            {
                for id in self.session.selection().ids() {
                    self.apply_node_click(&id, NodeKind::Profile);
                }
            }
        });

        ui.separator();
        ui.label("Forces");
        if self.draw_force_sliders(ui) {
            self.session.set_config(self.config);
        }
        if ui.button("Restore defaults").clicked() {
            let canvas = *self.session.config();
            self.config = LayoutConfig {
                width: canvas.width,
                height: canvas.height,
                ..LayoutConfig::default()
            };
            self.session.set_config(self.config);
        }
    }
}
