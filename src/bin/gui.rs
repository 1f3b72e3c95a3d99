// src/bin/gui.rs
#![cfg_attr(target_os = "windows", windows_subsystem = "windows")]
use std::path::Path;

use eframe::egui::ViewportBuilder;
use zhihu_tracker::{
    config::{consts::CONFIG_FILE, options::AppOptions, state::AppState},
    gui, log,
};

fn startup() -> zhihu_tracker::Result<AppState> {
    let options = AppOptions::load(Path::new(CONFIG_FILE))?;
    log::init(&options.log)?;
    Ok(AppState::new(options))
}

fn main() {
    let state = match startup() {
        Ok(s) => s,
        Err(e) => {
            eprintln!("GUI failed: {}", e);
            std::process::exit(1);
        }
    };

    let options = eframe::NativeOptions {
        viewport: ViewportBuilder::default()
            .with_inner_size([state.gui.window_w as f32, state.gui.window_h as f32]),
        ..Default::default()
    };

    if let Err(e) = gui::run(options, state) {
        eprintln!("GUI failed: {}", e);
        std::process::exit(1);
    }
}
