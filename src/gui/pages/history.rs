// src/gui/pages/history.rs
//
// Retained snapshots of each watched question, with the growth trend
// between the first and last one.

use eframe::egui::{self, Color32, RichText};

use crate::{
    analyzer::{Direction, Trend},
    gui::app::{App, WatchedHistory},
};

use super::Page;

const COLUMNS: [&str; 6] = ["Saved at", "Views", "View Increment", "Answers", "Answers Increment", "Potential"];

pub struct HistoryPage;
pub static PAGE: HistoryPage = HistoryPage;

impl Page for HistoryPage {
    fn title(&self) -> &'static str { "History" }

    fn draw(&self, ui: &mut egui::Ui, app: &mut App) {
        if app.history.is_empty() {
            ui.label("No watched questions. Double-click a question on the Questions tab to watch it.");
            return;
        }

        let mut unwatch = None;
        egui::ScrollArea::vertical()
            .id_salt("history_scroll")
            .auto_shrink([false, false])
            .show(ui, |ui| {
                for entry in &app.history {
                    if entry_section(ui, entry) {
                        unwatch = Some(entry.url.clone());
                    }
                }
            });

        if let Some(url) = unwatch {
            app.toggle_watched(&url);
        }
    }
}

/// One collapsible block per question. Returns true if "Unwatch" was clicked.
fn entry_section(ui: &mut egui::Ui, entry: &WatchedHistory) -> bool {
    let mut clicked = false;
    egui::CollapsingHeader::new(RichText::new(&entry.text).strong())
        .id_salt(&entry.url)
        .default_open(true)
        .show(ui, |ui| {
            ui.horizontal(|ui| {
                ui.hyperlink_to(entry.url.as_str(), &entry.url);
                if ui.small_button("Unwatch").clicked() {
                    clicked = true;
                }
            });

            if entry.snapshots.is_empty() {
                ui.label("No snapshots yet.");
                return;
            }

            egui::Grid::new(("history_grid", &entry.url))
                .striped(true)
                .num_columns(COLUMNS.len())
                .show(ui, |ui| {
                    for h in COLUMNS {
                        ui.label(RichText::new(h).strong());
                    }
                    ui.end_row();

                    for s in &entry.snapshots {
                        let q = &s.question;
                        ui.label(s.saved_at.as_str());
                        ui.label(q.view_total.to_string());
                        ui.label(q.view_increment.to_string());
                        ui.label(q.answer_total.to_string());
                        ui.label(q.answer_increment.to_string());
                        ui.label(format!("{:.1}", q.potential_score));
                        ui.end_row();
                    }
                });

            match &entry.trend {
                Some(t) => trend_line(ui, t),
                None => { ui.label("Trend: needs two snapshots"); }
            }
        });
    clicked
}

fn trend_line(ui: &mut egui::Ui, t: &Trend) {
    let color = match t.direction {
        Direction::Rising => Color32::from_rgb(0x4C, 0xAF, 0x50),
        Direction::Flat => ui.visuals().weak_text_color(),
        Direction::Falling => Color32::from_rgb(0xDC, 0x61, 0x49),
    };
    ui.label(
        RichText::new(format!(
            "Trend: {} ({:+} views, {:+} answers over {:.1} h; {:+.0} views/h)",
            t.direction, t.view_delta, t.answer_delta, t.span_hours, t.views_per_hour
        ))
        .color(color),
    );
}
