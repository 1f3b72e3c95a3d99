// src/config/state.rs
use super::options::AppOptions;

#[derive(Clone, Debug)]
pub struct GuiState {
    pub window_w: u32,
    pub window_h: u32,

    /// Active tab index into router::PAGES
    pub current_page_index: usize,

    /// Questions page -> hide rows with no view growth since last fetch
    pub only_growing: bool,
}

impl Default for GuiState {
    fn default() -> Self {
        Self {
            window_w: 1500,
            window_h: 900,
            current_page_index: 0,
            only_growing: false,
        }
    }
}

#[derive(Clone, Debug, Default)]
pub struct AppState {
    pub options: AppOptions,
    pub gui: GuiState,
}

impl AppState {
    pub fn new(options: AppOptions) -> Self {
        Self { options, gui: GuiState::default() }
    }
}
