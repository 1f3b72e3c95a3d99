// src/gui/pages/mod.rs
use eframe::egui;

use crate::gui::app::App;

pub mod history;
pub mod questions;

/// A tab. Pages are stateless statics; everything they show lives in `App`.
pub trait Page: Send + Sync + 'static {
    fn title(&self) -> &'static str;

    /// Draw the page body below the tabs.
    fn draw(&self, ui: &mut egui::Ui, app: &mut App);
}
