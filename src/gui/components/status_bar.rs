// src/gui/components/status_bar.rs
//
// Bottom line: last refresh time, tracker status, Refresh button.

use eframe::egui::{self, Align, Layout};

use crate::gui::app::App;

pub fn draw(ui: &mut egui::Ui, app: &mut App) {
    ui.horizontal(|ui| {
        let last = app.last_refresh().unwrap_or_else(|| s!("N/A"));
        ui.label(format!("Last Refresh: {last}"));
        ui.separator();

        if app.is_busy() {
            ui.spinner();
        }
        ui.label(app.status_text());

        ui.with_layout(Layout::right_to_left(Align::Center), |ui| {
            let can_refresh = app.is_tracking() && !app.is_busy();
            let resp = ui
                .add_enabled(can_refresh, egui::Button::new("Refresh"))
                .on_hover_text("Fetch now (F5)");
            if resp.clicked() {
                app.refresh();
            }
        });
    });
}
