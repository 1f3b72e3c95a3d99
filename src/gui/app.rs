// src/gui/app.rs
use std::{
    collections::HashSet,
    error::Error,
    sync::{
        Arc, Mutex,
        atomic::{AtomicBool, Ordering},
    },
};

use eframe::egui;

use crate::{
    analyzer::{self, Trend},
    config::state::AppState,
    scrape,
    store::{ListenerId, QuestionStore, Snapshot},
    tracker::{Tracker, lock},
};

use super::{
    pages::Page,
    progress::GuiProgress,
    router,
};

pub fn run(options: eframe::NativeOptions, state: AppState) -> Result<(), Box<dyn Error>> {
    eframe::run_native(
        "Data Tracker GUI",
        options,
        Box::new(move |cc| Ok(Box::new(App::new(&cc.egui_ctx, state)?))),
    )?;
    Ok(())
}

/// One watched question as the History page shows it.
pub struct WatchedHistory {
    pub url: String,
    pub text: String,
    pub snapshots: Vec<Snapshot>,
    pub trend: Option<Trend>,
}

pub struct App {
    // single source of truth for UI settings (UI thread only)
    pub state: AppState,

    pub store: Arc<Mutex<QuestionStore>>,
    tracker: Option<Tracker>,
    listener: ListenerId,

    // cached views, rebuilt when the store reports changes
    pub rows: Vec<Snapshot>,
    pub watched: HashSet<String>,
    pub history: Vec<WatchedHistory>,
    dirty: Arc<AtomicBool>,

    // status (tracker thread writes here)
    pub status: Arc<Mutex<String>>,
}

impl App {
    pub fn new(ctx: &egui::Context, state: AppState) -> crate::Result<Self> {
        let opts = &state.options;
        let store = Arc::new(Mutex::new(QuestionStore::open(opts.store.clone())?));

        // Listeners run on the tracker thread; just flag and wake the UI.
        let dirty = Arc::new(AtomicBool::new(true));
        let listener = {
            let dirty = Arc::clone(&dirty);
            let ctx = ctx.clone();
            lock(&store).register_listener(move |changes| {
                logd!("UI: store changed ({})", changes);
                dirty.store(true, Ordering::Release);
                ctx.request_repaint();
            })
        };

        let status = Arc::new(Mutex::new(s!("Starting…")));
        let fetcher = scrape::scraper_from_options(&opts.scraper)?;
        let tracker = Tracker::spawn(
            fetcher,
            Arc::clone(&store),
            opts.tracker.interval(),
            GuiProgress::new(Arc::clone(&status), ctx.clone()),
        )?;

        logf!(
            "Init: source={:?}, interval={}s, page={}",
            opts.scraper.source,
            opts.tracker.interval_secs,
            router::all_pages()[state.gui.current_page_index].title()
        );

        Ok(Self {
            state,
            store,
            tracker: Some(tracker),
            listener,
            rows: Vec::new(),
            watched: HashSet::new(),
            history: Vec::new(),
            dirty,
            status,
        })
    }

    /* ---------- tiny helpers ---------- */

    #[inline]
    pub fn current_index(&self) -> usize { self.state.gui.current_page_index }

    #[inline]
    pub fn set_current_index(&mut self, idx: usize) { self.state.gui.current_page_index = idx; }

    #[inline]
    pub fn current_page(&self) -> &'static dyn Page { router::all_pages()[self.current_index()] }

    #[inline]
    pub fn status<T: Into<String>>(&self, msg: T) {
        *lock(&self.status) = msg.into();
    }

    pub fn status_text(&self) -> String {
        lock(&self.status).clone()
    }

    pub fn last_refresh(&self) -> Option<String> {
        self.tracker.as_ref().and_then(Tracker::last_refresh_time)
    }

    pub fn is_busy(&self) -> bool {
        self.tracker.as_ref().is_some_and(Tracker::is_busy)
    }

    pub fn is_tracking(&self) -> bool {
        self.tracker.as_ref().is_some_and(Tracker::is_running)
    }

    pub fn refresh(&self) {
        match &self.tracker {
            Some(t) => {
                logf!("UI: refresh requested");
                self.status("Refreshing…");
                t.refresh();
            }
            None => self.status("Tracker stopped"),
        }
    }

    /// Tell the worker to exit without blocking the UI thread. An update
    /// already in flight finishes; the join happens in `Drop`.
    pub fn stop_tracker(&self) {
        if let Some(t) = &self.tracker {
            self.status("Stopping…");
            t.request_stop();
        }
    }

    pub fn toggle_watched(&mut self, url: &str) {
        let result = lock(&self.store).toggle_watched(url);
        match result {
            Ok(true) => self.status(format!("Watching {url}")),
            Ok(false) if self.watched.contains(url) => self.status(format!("Stopped watching {url}")),
            Ok(false) => self.status(format!("Cannot watch {url}: no data yet")),
            Err(e) => {
                loge!("UI: toggling {} failed: {}", url, e);
                self.status(format!("Saving watchlist failed: {e}"));
            }
        }
        self.rebuild_view();
    }

    /// Re-read rows, watch set and watched histories from the store.
    pub fn rebuild_view(&mut self) {
        let store = lock(&self.store);
        self.rows = store.question_list();
        self.watched = store.watched().urls().map(String::from).collect();
        self.history = store
            .watched()
            .iter()
            .map(|(url, watched)| {
                let snapshots = store.history(url).to_vec();
                let trend = analyzer::clean_histories([(url, snapshots.as_slice())])
                    .first()
                    .and_then(analyzer::trend_for);
                let text = snapshots
                    .last()
                    .unwrap_or(watched)
                    .question
                    .question_text
                    .clone();
                WatchedHistory { url: s!(url), text, snapshots, trend }
            })
            .collect();
        logd!("UI: view rebuilt (rows={}, watched={})", self.rows.len(), self.watched.len());
    }

    fn handle_keys(&mut self, ctx: &egui::Context) {
        let (f5, esc) = ctx.input(|i| (i.key_pressed(egui::Key::F5), i.key_pressed(egui::Key::Escape)));
        if f5 {
            self.refresh();
        }
        if esc {
            logf!("UI: escape pressed, closing");
            self.stop_tracker();
            ctx.send_viewport_cmd(egui::ViewportCommand::Close);
        }
    }
}

impl eframe::App for App {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.handle_keys(ctx);

        if self.dirty.swap(false, Ordering::AcqRel) {
            self.rebuild_view();
        }

        egui::TopBottomPanel::bottom("status_bar").show(ctx, |ui| {
            super::components::status_bar::draw(ui, self);
        });

        egui::CentralPanel::default().show(ctx, |ui| {
            super::components::tabs::draw(ui, self);

            ui.separator();

            let page = self.current_page();
            page.draw(ui, self);
        });

        // keep the status line and clock honest while a fetch runs
        if self.is_busy() {
            ctx.request_repaint_after(std::time::Duration::from_millis(500));
        }
    }
}

impl Drop for App {
    fn drop(&mut self) {
        lock(&self.store).unregister_listener(self.listener);
        if let Some(mut t) = self.tracker.take() {
            t.stop();
            logf!("UI: tracker stopped");
        }
    }
}
