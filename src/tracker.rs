// src/tracker.rs
//
// Background refresh loop: fetch, fold into the store, sleep, repeat.
//
// The worker thread owns the fetcher (a browser session is not shareable) and
// the progress sink. The store is shared behind a mutex that is only held while
// the fetched questions are applied, never during the slow fetch itself.

use std::{
    sync::{
        Arc, Mutex, MutexGuard, PoisonError,
        atomic::{AtomicBool, AtomicUsize, Ordering},
        mpsc::{self, Receiver, RecvTimeoutError, Sender},
    },
    thread::{self, JoinHandle},
    time::Duration,
};

use chrono::Local;

use crate::{
    config::consts::SAVED_AT_FORMAT,
    error::Result,
    progress::Progress,
    scrape::Fetch,
    store::{Changes, QuestionStore},
};

enum Command {
    Refresh,
    Stop,
}

#[derive(Default)]
struct Shared {
    last_refresh: Mutex<Option<String>>,
    busy: AtomicBool,
    runs: AtomicUsize,
}

pub struct Tracker {
    tx: Sender<Command>,
    handle: Option<JoinHandle<()>>,
    shared: Arc<Shared>,
}

impl Tracker {
    /// Start the loop. The first update runs immediately.
    pub fn spawn<F, P>(
        fetcher: F,
        store: Arc<Mutex<QuestionStore>>,
        interval: Duration,
        progress: P,
    ) -> Result<Self>
    where
        F: Fetch + 'static,
        P: Progress + Send + 'static,
    {
        let (tx, rx) = mpsc::channel();
        let shared = Arc::new(Shared::default());
        let worker = Worker {
            fetcher,
            store,
            progress,
            shared: Arc::clone(&shared),
        };
        let handle = thread::Builder::new()
            .name(s!("tracker"))
            .spawn(move || worker.run(rx, interval))?;

        Ok(Self { tx, handle: Some(handle), shared })
    }

    /// Update now instead of waiting; the interval restarts afterwards.
    pub fn refresh(&self) {
        if self.tx.send(Command::Refresh).is_err() {
            logw!("Tracker: refresh ignored, worker is gone");
        }
    }

    /// Ask the worker to exit after the current update without waiting for it.
    /// The UI thread uses this; `stop` or `Drop` joins later.
    pub fn request_stop(&self) {
        let _ = self.tx.send(Command::Stop);
    }

    /// Stop the loop, wait for the current update to finish, release the fetcher.
    pub fn stop(&mut self) {
        self.request_stop();
        self.join();
    }

    /// Block until the worker exits on its own (used when stdin closes in the CLI).
    pub fn join(&mut self) {
        if let Some(handle) = self.handle.take() {
            if handle.join().is_err() {
                loge!("Tracker: worker panicked");
            }
        }
    }

    /// When the last update started, `"%Y-%m-%d %H:%M:%S"` local time.
    pub fn last_refresh_time(&self) -> Option<String> {
        lock(&self.shared.last_refresh).clone()
    }

    pub fn is_running(&self) -> bool {
        self.handle.as_ref().is_some_and(|h| !h.is_finished())
    }

    /// True while a fetch/update is in flight.
    pub fn is_busy(&self) -> bool {
        self.shared.busy.load(Ordering::Acquire)
    }

    /// Completed updates, successful or not.
    pub fn runs(&self) -> usize {
        self.shared.runs.load(Ordering::Acquire)
    }
}

impl Drop for Tracker {
    fn drop(&mut self) {
        self.stop();
    }
}

struct Worker<F, P> {
    fetcher: F,
    store: Arc<Mutex<QuestionStore>>,
    progress: P,
    shared: Arc<Shared>,
}

impl<F: Fetch + 'static, P: Progress + 'static> Worker<F, P> {
    fn run(mut self, rx: Receiver<Command>, interval: Duration) {
        logf!("Tracker: started, interval {}s", interval.as_secs());
        loop {
            self.perform_update();

            match rx.recv_timeout(interval) {
                Err(RecvTimeoutError::Timeout) => {}
                Ok(Command::Refresh) => {
                    logd!("Tracker: refresh requested");
                    // Several presses while busy collapse into one update.
                    if stop_pending(&rx) { break; }
                }
                Ok(Command::Stop) | Err(RecvTimeoutError::Disconnected) => break,
            }
        }
        self.fetcher.close();
        logf!("Tracker: stopped after {} update(s)", self.shared.runs.load(Ordering::Acquire));
    }

    fn perform_update(&mut self) {
        let stamp = Local::now().format(SAVED_AT_FORMAT).to_string();
        logf!("Tracker: fetching new data…");
        *lock(&self.shared.last_refresh) = Some(stamp);
        self.shared.busy.store(true, Ordering::Release);

        let progress: &mut dyn Progress = &mut self.progress;
        match update_from(&mut self.fetcher, &self.store, Some(progress)) {
            Ok(changes) => {
                logf!("Tracker: data updated ({})", changes);
                self.progress.log(&format!("Updated: {changes}"));
            }
            Err(e) => {
                loge!("Tracker: update failed: {}", e);
                self.progress.failed(&e);
            }
        }

        self.shared.busy.store(false, Ordering::Release);
        self.shared.runs.fetch_add(1, Ordering::AcqRel);
    }
}

/// Drain queued commands; true if one of them was Stop.
fn stop_pending(rx: &Receiver<Command>) -> bool {
    rx.try_iter().any(|c| matches!(c, Command::Stop))
}

/// One fetch folded into the store. The store lock is taken only after the
/// fetch returns.
pub fn update_from<F: Fetch + ?Sized>(
    fetcher: &mut F,
    store: &Mutex<QuestionStore>,
    progress: Option<&mut dyn Progress>,
) -> Result<Changes> {
    let questions = fetcher.fetch(progress)?;
    lock(store).update_questions(questions)
}

/// Poisoning only means another thread panicked mid-update; the data is still usable.
pub fn lock<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    m.lock().unwrap_or_else(PoisonError::into_inner)
}

#[cfg(test)]
mod tests {
    use std::time::Instant;

    use super::*;
    use crate::{
        config::options::StoreOptions,
        error::Error,
        progress::NullProgress,
        scrape::Question,
    };

    /// Returns one more question each call; fails on the calls listed in `fail_on`.
    struct Scripted {
        calls: Arc<AtomicUsize>,
        closed: Arc<AtomicBool>,
        fail_on: Vec<usize>,
        delay: Duration,
    }

    impl Fetch for Scripted {
        fn fetch(&mut self, _p: Option<&mut dyn Progress>) -> Result<Vec<Question>> {
            thread::sleep(self.delay);
            let n = self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail_on.contains(&n) {
                return Err(Error::DriverLaunch(s!("scripted failure")));
            }
            Ok((0..=n)
                .map(|i| Question {
                    question_url: format!("https://www.zhihu.com/question/{i}"),
                    view_total: 10 * (n as i64 + 1),
                    ..Question::default()
                })
                .collect())
        }
        fn close(&mut self) {
            self.closed.store(true, Ordering::SeqCst);
        }
    }

    fn wait_for(cond: impl Fn() -> bool) {
        let start = Instant::now();
        while !cond() {
            assert!(start.elapsed() < Duration::from_secs(5), "timed out");
            thread::sleep(Duration::from_millis(5));
        }
    }

    fn setup(fail_on: Vec<usize>) -> (Scripted, Arc<AtomicUsize>, Arc<AtomicBool>, Arc<Mutex<QuestionStore>>, tempfile::TempDir) {
        let dir = tempfile::tempdir().unwrap();
        let store = QuestionStore::open(StoreOptions::in_dir(dir.path())).unwrap();
        let calls = Arc::new(AtomicUsize::new(0));
        let closed = Arc::new(AtomicBool::new(false));
        let fetcher = Scripted {
            calls: Arc::clone(&calls),
            closed: Arc::clone(&closed),
            fail_on,
            delay: Duration::ZERO,
        };
        (fetcher, calls, closed, Arc::new(Mutex::new(store)), dir)
    }

    #[test]
    fn first_update_is_immediate_and_refresh_wakes_worker() {
        let (fetcher, calls, closed, store, _dir) = setup(vec![]);
        let mut tracker =
            Tracker::spawn(fetcher, Arc::clone(&store), Duration::from_secs(3600), NullProgress).unwrap();

        wait_for(|| tracker.runs() == 1);
        assert!(tracker.last_refresh_time().is_some());
        assert_eq!(lock(&store).len(), 1);

        tracker.refresh();
        wait_for(|| tracker.runs() == 2);
        assert_eq!(lock(&store).len(), 2);
        assert_eq!(lock(&store).history("https://www.zhihu.com/question/0").len(), 2);

        tracker.stop();
        assert!(!tracker.is_running());
        assert!(closed.load(Ordering::SeqCst));
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn interval_repeats_and_failures_do_not_stop_the_loop() {
        let (fetcher, _calls, _closed, store, _dir) = setup(vec![1]);
        let mut tracker =
            Tracker::spawn(fetcher, Arc::clone(&store), Duration::from_millis(20), NullProgress).unwrap();

        wait_for(|| tracker.runs() >= 3);
        tracker.stop();
        // run #1 failed, run #2 still landed three questions
        assert!(lock(&store).len() >= 3);
    }

    #[test]
    fn listeners_fire_from_the_worker_thread() {
        let (fetcher, _calls, _closed, store, _dir) = setup(vec![]);
        let hits = Arc::new(AtomicUsize::new(0));
        let sink = Arc::clone(&hits);
        lock(&store).register_listener(move |_| { sink.fetch_add(1, Ordering::SeqCst); });

        let mut tracker =
            Tracker::spawn(fetcher, Arc::clone(&store), Duration::from_secs(3600), NullProgress).unwrap();
        wait_for(|| hits.load(Ordering::SeqCst) == 1);
        tracker.stop();
    }

    #[test]
    fn stop_is_idempotent_and_drop_safe() {
        let (fetcher, _calls, closed, store, _dir) = setup(vec![]);
        let mut tracker = Tracker::spawn(fetcher, store, Duration::from_secs(3600), NullProgress).unwrap();
        tracker.stop();
        tracker.stop();
        tracker.refresh();
        drop(tracker);
        assert!(closed.load(Ordering::SeqCst));
    }

    #[test]
    fn request_stop_returns_while_a_fetch_is_in_flight() {
        let (mut fetcher, calls, closed, store, _dir) = setup(vec![]);
        fetcher.delay = Duration::from_millis(400);
        let mut tracker =
            Tracker::spawn(fetcher, Arc::clone(&store), Duration::from_secs(3600), NullProgress).unwrap();
        wait_for(|| tracker.is_busy());

        let asked = Instant::now();
        tracker.request_stop();
        assert!(asked.elapsed() < Duration::from_millis(100));
        assert!(tracker.is_busy(), "the in-flight update is not interrupted");

        wait_for(|| !tracker.is_running());
        tracker.join();
        assert_eq!(tracker.runs(), 1);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(closed.load(Ordering::SeqCst));
    }

    #[test]
    fn refreshes_queued_during_an_update_collapse_into_one() {
        let (mut fetcher, calls, _closed, store, _dir) = setup(vec![]);
        fetcher.delay = Duration::from_millis(200);
        let mut tracker =
            Tracker::spawn(fetcher, Arc::clone(&store), Duration::from_secs(3600), NullProgress).unwrap();
        wait_for(|| tracker.is_busy());

        tracker.refresh();
        tracker.refresh();
        tracker.refresh();

        wait_for(|| tracker.runs() == 2);
        thread::sleep(Duration::from_millis(600));
        assert_eq!(tracker.runs(), 2);
        assert_eq!(calls.load(Ordering::SeqCst), 2);
        tracker.stop();
    }
}
