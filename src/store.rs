// src/store.rs
//! Local question history and the watchlist.
//!
//! Two JSON files, keyed by question URL:
//! - `questions.json`          url → [Snapshot], oldest first, at most `max_history`
//! - `watched_questions.json`  url → Snapshot taken when the question was watched,
//!                             kept in the order questions were added
//!
//! Every fetch is folded in through `update_questions`, which diffs the new
//! totals against each question's latest snapshot, appends a timestamped
//! snapshot, saves, and then tells registered listeners what changed.

use std::{
    collections::{BTreeMap, HashSet},
    fmt, fs,
    path::Path,
};

use chrono::{Local, NaiveDateTime};
use serde::{
    Deserialize, Deserializer, Serialize, Serializer,
    de::{DeserializeOwned, MapAccess, Visitor},
    ser::SerializeMap,
};

use crate::{
    config::{consts::SAVED_AT_FORMAT, options::StoreOptions},
    error::Result,
    scrape::Question,
};

/// A question as seen at one point in time.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    #[serde(flatten)]
    pub question: Question,
    pub saved_at: String,
}

impl Snapshot {
    pub fn new(question: Question, saved_at: &NaiveDateTime) -> Self {
        Self { question, saved_at: saved_at.format(SAVED_AT_FORMAT).to_string() }
    }

    pub fn url(&self) -> &str { &self.question.question_url }

    pub fn saved_at(&self) -> Option<NaiveDateTime> {
        NaiveDateTime::parse_from_str(&self.saved_at, SAVED_AT_FORMAT).ok()
    }
}

/// Growth of an already known question since its previous snapshot.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Update {
    pub question_url: String,
    pub view_increment: i64,
    pub answer_increment: i64,
}

/// Outcome of folding one fetch into the store.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct Changes {
    /// Known questions whose view or answer total moved.
    pub updated: Vec<Update>,
    /// Questions seen for the first time.
    pub new: Vec<Question>,
}

impl Changes {
    pub fn is_empty(&self) -> bool {
        self.updated.is_empty() && self.new.is_empty()
    }
}

impl fmt::Display for Changes {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} updated, {} new", self.updated.len(), self.new.len())
    }
}

/// Watched questions in the order they were added.
/// Stored on disk as a JSON object whose key order is the watch order.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Watchlist {
    entries: Vec<(String, Snapshot)>,
}

impl Watchlist {
    pub fn contains(&self, url: &str) -> bool {
        self.entries.iter().any(|(u, _)| u == url)
    }

    pub fn get(&self, url: &str) -> Option<&Snapshot> {
        self.entries.iter().find(|(u, _)| u == url).map(|(_, s)| s)
    }

    /// Appends unless already present. Returns whether it was added.
    pub fn insert(&mut self, url: String, snapshot: Snapshot) -> bool {
        if self.contains(&url) {
            return false;
        }
        self.entries.push((url, snapshot));
        true
    }

    pub fn remove(&mut self, url: &str) -> bool {
        let before = self.entries.len();
        self.entries.retain(|(u, _)| u != url);
        self.entries.len() != before
    }

    pub fn urls(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(u, _)| u.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Snapshot)> {
        self.entries.iter().map(|(u, s)| (u.as_str(), s))
    }

    pub fn len(&self) -> usize { self.entries.len() }
    pub fn is_empty(&self) -> bool { self.entries.is_empty() }
}

impl Serialize for Watchlist {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (url, snap) in &self.entries {
            map.serialize_entry(url, snap)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for Watchlist {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        struct OrderedVisitor;

        impl<'de> Visitor<'de> for OrderedVisitor {
            type Value = Watchlist;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a map of question url to snapshot")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> std::result::Result<Watchlist, A::Error> {
                let mut list = Watchlist::default();
                while let Some((url, snap)) = access.next_entry::<String, Snapshot>()? {
                    list.insert(url, snap);
                }
                Ok(list)
            }
        }

        deserializer.deserialize_map(OrderedVisitor)
    }
}

pub type ListenerId = u64;
type Listener = Box<dyn Fn(&Changes) + Send>;

pub struct QuestionStore {
    opts: StoreOptions,
    questions: BTreeMap<String, Vec<Snapshot>>,
    watched: Watchlist,
    listeners: Vec<(ListenerId, Listener)>,
    next_listener: ListenerId,
}

impl fmt::Debug for QuestionStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("QuestionStore")
            .field("questions", &self.questions.len())
            .field("watched", &self.watched.len())
            .field("listeners", &self.listeners.len())
            .finish()
    }
}

impl QuestionStore {
    /// Load both files; missing files start empty.
    pub fn open(opts: StoreOptions) -> Result<Self> {
        let questions: BTreeMap<String, Vec<Snapshot>> = load_json(&opts.data_file)?;
        let watched: Watchlist = load_json(&opts.watched_file)?;
        logf!(
            "Store: {} question(s), {} watched from {}",
            questions.len(),
            watched.len(),
            opts.data_file.display()
        );
        Ok(Self {
            opts,
            questions,
            watched,
            listeners: Vec::new(),
            next_listener: 0,
        })
    }

    pub fn options(&self) -> &StoreOptions { &self.opts }
    pub fn len(&self) -> usize { self.questions.len() }
    pub fn is_empty(&self) -> bool { self.questions.is_empty() }
    pub fn watched(&self) -> &Watchlist { &self.watched }
    pub fn is_watched(&self, url: &str) -> bool { self.watched.contains(url) }

    /// Retained snapshots for one question, oldest first.
    pub fn history(&self, url: &str) -> &[Snapshot] {
        self.questions.get(url).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn latest(&self, url: &str) -> Option<&Snapshot> {
        self.history(url).last()
    }

    /// Every question with its history, ordered by URL.
    pub fn histories(&self) -> impl Iterator<Item = (&str, &[Snapshot])> {
        self.questions.iter().map(|(u, h)| (u.as_str(), h.as_slice()))
    }

    /// Fold a fresh fetch into the history, stamped with the local time.
    pub fn update_questions(&mut self, new: Vec<Question>) -> Result<Changes> {
        self.update_questions_at(new, Local::now().naive_local())
    }

    pub fn update_questions_at(&mut self, new: Vec<Question>, now: NaiveDateTime) -> Result<Changes> {
        let mut changes = Changes::default();

        for question in new {
            let url = question.question_url.clone();
            match self.latest(&url) {
                Some(last) => {
                    let view_increment = question.view_total - last.question.view_total;
                    let answer_increment = question.answer_total - last.question.answer_total;
                    if view_increment != 0 || answer_increment != 0 {
                        changes.updated.push(Update {
                            question_url: url.clone(),
                            view_increment,
                            answer_increment,
                        });
                    }
                }
                None => changes.new.push(question.clone()),
            }
            self.push_snapshot(url, Snapshot::new(question, &now));
        }

        save_json(&self.questions, &self.opts.data_file)?;
        logd!("Store: saved {} ({})", self.opts.data_file.display(), changes);

        self.notify(&changes);
        Ok(changes)
    }

    fn push_snapshot(&mut self, url: String, snapshot: Snapshot) {
        let history = self.questions.entry(url).or_default();
        history.push(snapshot);
        if history.len() > self.opts.max_history {
            let excess = history.len() - self.opts.max_history;
            history.drain(..excess);
        }
    }

    /// Latest snapshot of every question for display: watched questions first,
    /// in watch order, then the rest by the potential score of their oldest
    /// retained snapshot, highest first.
    pub fn question_list(&self) -> Vec<Snapshot> {
        let mut out = Vec::with_capacity(self.questions.len());
        let mut seen: HashSet<&str> = HashSet::new();

        for url in self.watched.urls() {
            if let Some(last) = self.latest(url) {
                out.push(last.clone());
                seen.insert(url);
            }
        }

        let mut rest: Vec<(&String, &Vec<Snapshot>)> = self
            .questions
            .iter()
            .filter(|(url, h)| !h.is_empty() && !seen.contains(url.as_str()))
            .collect();
        rest.sort_by(|(ua, ha), (ub, hb)| {
            hb[0].question.potential_score
                .total_cmp(&ha[0].question.potential_score)
                .then_with(|| ua.cmp(ub))
        });
        out.extend(rest.into_iter().filter_map(|(_, h)| h.last().cloned()));
        out
    }

    /// Watch a known question. Returns false if already watched or never seen.
    pub fn add_to_watched(&mut self, url: &str) -> Result<bool> {
        if self.watched.contains(url) {
            return Ok(false);
        }
        let Some(latest) = self.latest(url).cloned() else {
            logd!("Store: cannot watch unknown {}", url);
            return Ok(false);
        };
        self.watched.insert(s!(url), latest);
        save_json(&self.watched, &self.opts.watched_file)?;
        logf!("Store: watching {}", url);
        Ok(true)
    }

    pub fn remove_from_watched(&mut self, url: &str) -> Result<bool> {
        if !self.watched.remove(url) {
            return Ok(false);
        }
        save_json(&self.watched, &self.opts.watched_file)?;
        logf!("Store: unwatched {}", url);
        Ok(true)
    }

    /// Flip watch state; returns the new state.
    pub fn toggle_watched(&mut self, url: &str) -> Result<bool> {
        if self.is_watched(url) {
            self.remove_from_watched(url)?;
            Ok(false)
        } else {
            self.add_to_watched(url)
        }
    }

    /// Called after every `update_questions`, once the data file is saved.
    pub fn register_listener<F>(&mut self, f: F) -> ListenerId
    where
        F: Fn(&Changes) + Send + 'static,
    {
        let id = self.next_listener;
        self.next_listener += 1;
        self.listeners.push((id, Box::new(f)));
        id
    }

    pub fn unregister_listener(&mut self, id: ListenerId) -> bool {
        let before = self.listeners.len();
        self.listeners.retain(|(lid, _)| *lid != id);
        self.listeners.len() != before
    }

    fn notify(&self, changes: &Changes) {
        for (_, listener) in &self.listeners {
            listener(changes);
        }
    }
}

fn load_json<T: DeserializeOwned + Default>(path: &Path) -> Result<T> {
    if !path.exists() {
        return Ok(T::default());
    }
    let text = fs::read_to_string(path)?;
    if text.trim().is_empty() {
        return Ok(T::default());
    }
    Ok(serde_json::from_str(&text)?)
}

/// Write through a sibling temp file so a crash never leaves half a file.
fn save_json<T: Serialize>(value: &T, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }
    let text = serde_json::to_string_pretty(value)?;
    let tmp = path.with_extension("json.tmp");
    fs::write(&tmp, text)?;
    fs::rename(&tmp, path)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use chrono::NaiveDate;

    use super::*;

    fn q(url: &str, score: f64, views: i64, answers: i64) -> Question {
        Question {
            question_text: format!("question {url}"),
            question_url: s!(url),
            potential_score: score,
            view_total: views,
            answer_total: answers,
            ..Question::default()
        }
    }

    fn at(h: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 1, 6).unwrap().and_hms_opt(h, 0, 0).unwrap()
    }

    fn open(dir: &Path) -> QuestionStore {
        QuestionStore::open(StoreOptions::in_dir(dir)).unwrap()
    }

    #[test]
    fn first_fetch_is_all_new() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = open(dir.path());
        let changes = store.update_questions_at(vec![q("a", 7.0, 100, 1), q("b", 6.0, 50, 0)], at(1)).unwrap();
        assert_eq!(changes.new.len(), 2);
        assert!(changes.updated.is_empty());
        assert_eq!(store.history("a")[0].saved_at, "2024-01-06 01:00:00");
    }

    #[test]
    fn second_fetch_reports_only_moved_totals() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = open(dir.path());
        store.update_questions_at(vec![q("a", 7.0, 100, 1), q("b", 6.0, 50, 0)], at(1)).unwrap();

        let changes = store
            .update_questions_at(vec![q("a", 7.0, 180, 3), q("b", 6.0, 50, 0), q("c", 5.0, 1, 0)], at(2))
            .unwrap();
        assert_eq!(
            changes.updated,
            vec![Update { question_url: s!("a"), view_increment: 80, answer_increment: 2 }]
        );
        assert_eq!(changes.new.len(), 1);
        assert_eq!(changes.new[0].question_url, "c");
        // unchanged questions still get a snapshot
        assert_eq!(store.history("b").len(), 2);
        assert_eq!(changes.to_string(), "1 updated, 1 new");
    }

    #[test]
    fn history_is_capped_oldest_first() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = open(dir.path());
        for h in 0..5 {
            store.update_questions_at(vec![q("a", 7.0, 100 + h as i64, 0)], at(h)).unwrap();
        }
        let views: Vec<i64> = store.history("a").iter().map(|s| s.question.view_total).collect();
        assert_eq!(views, vec![102, 103, 104]);
    }

    #[test]
    fn list_puts_watched_first_then_oldest_score() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = open(dir.path());
        store.update_questions_at(vec![q("a", 5.0, 1, 0), q("b", 9.0, 1, 0), q("c", 7.0, 1, 0)], at(1)).unwrap();
        // b's latest score drops, but ordering uses the oldest retained snapshot
        store.update_questions_at(vec![q("b", 1.0, 2, 0)], at(2)).unwrap();

        let urls: Vec<String> = store.question_list().into_iter().map(|s| s.question.question_url).collect();
        assert_eq!(urls, ["b", "c", "a"]);

        assert!(store.add_to_watched("a").unwrap());
        assert!(store.add_to_watched("c").unwrap());
        let list = store.question_list();
        let urls: Vec<&str> = list.iter().map(|s| s.url()).collect();
        assert_eq!(urls, ["a", "c", "b"]);
        assert_eq!(list[2].question.view_total, 2);
    }

    #[test]
    fn watch_rules_and_persistence() {
        let dir = tempfile::tempdir().unwrap();
        {
            let mut store = open(dir.path());
            assert!(!store.add_to_watched("ghost").unwrap());
            store.update_questions_at(vec![q("z", 5.0, 1, 0), q("y", 4.0, 1, 0)], at(1)).unwrap();
            assert!(store.add_to_watched("z").unwrap());
            assert!(!store.add_to_watched("z").unwrap());
            assert!(store.add_to_watched("y").unwrap());
        }

        let mut store = open(dir.path());
        assert_eq!(store.len(), 2);
        let order: Vec<&str> = store.watched().urls().collect();
        assert_eq!(order, ["z", "y"]);

        assert!(store.remove_from_watched("z").unwrap());
        assert!(!store.remove_from_watched("z").unwrap());
        assert!(!store.toggle_watched("y").unwrap());
        assert!(store.toggle_watched("z").unwrap());

        let store = open(dir.path());
        let order: Vec<&str> = store.watched().urls().collect();
        assert_eq!(order, ["z"]);
    }

    #[test]
    fn listeners_see_changes_until_unregistered() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = open(dir.path());
        let seen = Arc::new(Mutex::new(Vec::new()));

        let sink = Arc::clone(&seen);
        let id = store.register_listener(move |c: &Changes| sink.lock().unwrap().push(c.new.len()));

        store.update_questions_at(vec![q("a", 1.0, 1, 0)], at(1)).unwrap();
        assert!(store.unregister_listener(id));
        assert!(!store.unregister_listener(id));
        store.update_questions_at(vec![q("b", 1.0, 1, 0)], at(2)).unwrap();

        assert_eq!(*seen.lock().unwrap(), vec![1]);
    }

    #[test]
    fn loads_files_written_with_float_counts() {
        let dir = tempfile::tempdir().unwrap();
        let opts = StoreOptions::in_dir(dir.path());
        fs::write(
            &opts.data_file,
            r##"{
                "https://www.zhihu.com/question/638355600": [{
                    "question_text": "鲁东大学…",
                    "question_url": "https://www.zhihu.com/question/638355600",
                    "topics": ["#医院"],
                    "date_raw": "提问时间：2024-01-06",
                    "potential_score_raw": "7.1 分",
                    "view_amount_raw": "2.4 万\n共 142 万",
                    "answer_amount_raw": "3\n共 148",
                    "potential_score": 7.1,
                    "view_increment": 24000.0,
                    "view_total": 1420000.0,
                    "answer_increment": 3,
                    "answer_total": 148,
                    "date": "2024-01-06",
                    "saved_at": "2024-01-06 12:30:00"
                }]
            }"##,
        )
        .unwrap();

        let store = QuestionStore::open(opts).unwrap();
        let snap = store.latest("https://www.zhihu.com/question/638355600").unwrap();
        assert_eq!(snap.question.view_total, 1_420_000);
        assert_eq!(snap.saved_at().unwrap(), NaiveDate::from_ymd_opt(2024, 1, 6).unwrap().and_hms_opt(12, 30, 0).unwrap());
    }

    #[test]
    fn saved_json_keeps_chinese_readable() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = open(dir.path());
        let mut question = q("a", 1.0, 1, 0);
        question.question_text = s!("显卡");
        store.update_questions_at(vec![question], at(1)).unwrap();
        let text = fs::read_to_string(&store.options().data_file).unwrap();
        assert!(text.contains("显卡"));
        assert!(!dir.path().join("questions.json.tmp").exists());
    }
}
