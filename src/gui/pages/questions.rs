// src/gui/pages/questions.rs
//
// Every known question, latest snapshot per row, watched ones on top.
// Double-click a row (or tick its Watched box) to flip watch status.

use std::collections::HashSet;

use eframe::egui::{self, Align, Layout, RichText, Sense, TextWrapMode};
use egui_extras::{Column, TableBuilder};

use crate::{gui::app::App, store::Snapshot};

use super::Page;

pub const HEADERS: [&str; 8] = [
    "Name", "Time", "Potential", "Views", "View Increment", "Answers", "Answers Increment", "Watched",
];
pub const WIDTHS: [f32; 8] = [800.0, 100.0, 80.0, 100.0, 100.0, 100.0, 100.0, 50.0];

pub struct QuestionsPage;
pub static PAGE: QuestionsPage = QuestionsPage;

impl Page for QuestionsPage {
    fn title(&self) -> &'static str { "Questions" }

    fn draw(&self, ui: &mut egui::Ui, app: &mut App) {
        ui.horizontal(|ui| {
            ui.checkbox(&mut app.state.gui.only_growing, "Only growing")
                .on_hover_text("Hide unwatched questions the site reports no view increment for");
            ui.separator();
            ui.label(format!("{} question(s), {} watched", app.rows.len(), app.watched.len()));
        });
        ui.separator();

        let rows = visible_rows(&app.rows, &app.watched, app.state.gui.only_growing);
        let toggle = table(ui, &rows, &app.watched);

        if let Some(url) = toggle {
            logf!("UI: toggle watch {}", url);
            app.toggle_watched(&url);
        }
    }
}

/// Rows left after the "Only growing" filter. Watched rows always stay; the
/// rest need a positive view increment as reported by the site.
pub fn visible_rows<'a>(rows: &'a [Snapshot], watched: &HashSet<String>, only_growing: bool) -> Vec<&'a Snapshot> {
    rows.iter()
        .filter(|s| !only_growing || s.question.view_increment > 0 || watched.contains(s.url()))
        .collect()
}

/// Draw the table; returns the URL the user asked to toggle, if any.
fn table(
    ui: &mut egui::Ui,
    rows: &[&Snapshot],
    watched: &HashSet<String>,
) -> Option<String> {
    let mut toggle = None;

    let mut builder = TableBuilder::new(ui)
        .striped(true)
        .sense(Sense::click())
        .min_scrolled_height(0.0)
        .cell_layout(Layout::left_to_right(Align::Center));
    for w in WIDTHS {
        builder = builder.column(Column::initial(w).resizable(true).clip(true).at_least(20.0));
    }

    builder
        .header(24.0, |mut header| {
            for h in HEADERS {
                header.col(|ui| {
                    ui.add(egui::Label::new(RichText::new(h).strong()).selectable(false));
                });
            }
        })
        .body(|body| {
            body.rows(20.0, rows.len(), |mut row| {
                let snap = rows[row.index()];
                let q = &snap.question;
                let is_watched = watched.contains(snap.url());
                row.set_selected(is_watched);

                let cells = [
                    q.question_text.clone(),
                    q.date.clone().unwrap_or_default(),
                    format!("{:.1}", q.potential_score),
                    q.view_total.to_string(),
                    q.view_increment.to_string(),
                    q.answer_total.to_string(),
                    q.answer_increment.to_string(),
                ];
                for (ci, cell) in cells.into_iter().enumerate() {
                    row.col(|ui| {
                        ui.style_mut().wrap_mode = Some(TextWrapMode::Truncate);
                        let label = egui::Label::new(cell).selectable(false);
                        if ci == 0 {
                            ui.add(label).on_hover_text(snap.url());
                        } else {
                            ui.add(label);
                        }
                    });
                }

                let mut ticked = is_watched;
                row.col(|ui| {
                    ui.centered_and_justified(|ui| {
                        if ui.checkbox(&mut ticked, "").changed() {
                            toggle = Some(s!(snap.url()));
                        }
                    });
                });

                if row.response().double_clicked() {
                    toggle = Some(s!(snap.url()));
                }
            });
        });

    toggle
}
