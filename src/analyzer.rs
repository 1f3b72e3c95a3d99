// src/analyzer.rs
//! Statistics and trends over the stored snapshot history.
//!
//! Pipeline: `clean_data` → `calculate_statistics` + `analyze_trends` →
//! `generate_report`. Everything works on the store's retained history, so
//! trends span at most `max_history` fetches.

use std::fmt::{self, Write};

use chrono::NaiveDateTime;
use serde::Serialize;

use crate::store::{QuestionStore, Snapshot};

/// One metric sample of a question.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Point {
    pub at: NaiveDateTime,
    pub views: i64,
    pub answers: i64,
    pub potential: f64,
}

/// Cleaned, time-ordered samples of one question.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Series {
    pub url: String,
    pub text: String,
    pub points: Vec<Point>,
}

impl Series {
    pub fn latest(&self) -> Option<&Point> { self.points.last() }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct Statistics {
    pub questions: usize,
    pub snapshots: usize,
    pub mean_potential: f64,
    pub mean_views: f64,
    pub mean_answers: f64,
    /// (question text, views) of the most viewed question
    pub top_viewed: Option<(String, i64)>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub enum Direction {
    Rising,
    Flat,
    Falling,
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Direction::Rising => "rising",
            Direction::Flat => "flat",
            Direction::Falling => "falling",
        })
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Trend {
    pub url: String,
    pub text: String,
    pub span_hours: f64,
    pub view_delta: i64,
    pub answer_delta: i64,
    pub views_per_hour: f64,
    pub answers_per_hour: f64,
    pub direction: Direction,
}

/// Samples with a readable timestamp, oldest first, one per instant.
/// Questions left with no samples are dropped.
pub fn clean_data(store: &QuestionStore) -> Vec<Series> {
    clean_histories(store.histories())
}

pub fn clean_histories<'a, I>(histories: I) -> Vec<Series>
where
    I: IntoIterator<Item = (&'a str, &'a [Snapshot])>,
{
    histories
        .into_iter()
        .filter_map(|(url, history)| {
            let mut points: Vec<Point> = history
                .iter()
                .filter_map(|s| {
                    Some(Point {
                        at: s.saved_at()?,
                        views: s.question.view_total,
                        answers: s.question.answer_total,
                        potential: s.question.potential_score,
                    })
                })
                .collect();
            if points.is_empty() {
                return None;
            }
            // stable: the later of two same-instant samples wins
            points.sort_by_key(|p| p.at);
            points.reverse();
            points.dedup_by_key(|p| p.at);
            points.reverse();

            let text = history.last().map(|s| s.question.question_text.clone()).unwrap_or_default();
            Some(Series { url: s!(url), text, points })
        })
        .collect()
}

pub fn calculate_statistics(series: &[Series]) -> Statistics {
    let latest: Vec<(&Series, &Point)> = series
        .iter()
        .filter_map(|s| s.latest().map(|p| (s, p)))
        .collect();
    if latest.is_empty() {
        return Statistics::default();
    }

    let n = latest.len() as f64;
    let top_viewed = latest
        .iter()
        .max_by_key(|(_, p)| p.views)
        .map(|(s, p)| (s.text.clone(), p.views));

    Statistics {
        questions: latest.len(),
        snapshots: series.iter().map(|s| s.points.len()).sum(),
        mean_potential: latest.iter().map(|(_, p)| p.potential).sum::<f64>() / n,
        mean_views: latest.iter().map(|(_, p)| p.views as f64).sum::<f64>() / n,
        mean_answers: latest.iter().map(|(_, p)| p.answers as f64).sum::<f64>() / n,
        top_viewed,
    }
}

/// Growth between the first and last sample of one series.
/// `None` with fewer than two samples.
pub fn trend_for(series: &Series) -> Option<Trend> {
    let (first, last) = match series.points.as_slice() {
        [first, .., last] => (first, last),
        _ => return None,
    };
    let span_hours = (last.at - first.at).num_seconds() as f64 / 3600.0;
    let view_delta = last.views - first.views;
    let answer_delta = last.answers - first.answers;
    let rate = |delta: i64| if span_hours > 0.0 { delta as f64 / span_hours } else { 0.0 };

    Some(Trend {
        url: series.url.clone(),
        text: series.text.clone(),
        span_hours,
        view_delta,
        answer_delta,
        views_per_hour: rate(view_delta),
        answers_per_hour: rate(answer_delta),
        direction: match view_delta {
            d if d > 0 => Direction::Rising,
            0 => Direction::Flat,
            _ => Direction::Falling,
        },
    })
}

/// Trends of every series with history, fastest view growth first.
pub fn analyze_trends(series: &[Series]) -> Vec<Trend> {
    let mut trends: Vec<Trend> = series.iter().filter_map(trend_for).collect();
    trends.sort_by(|a, b| {
        b.views_per_hour
            .total_cmp(&a.views_per_hour)
            .then_with(|| a.url.cmp(&b.url))
    });
    trends
}

pub fn generate_report(stats: &Statistics, trends: &[Trend], top: usize) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Questions tracked: {} ({} snapshots)", stats.questions, stats.snapshots);
    if stats.questions == 0 {
        return out;
    }
    let _ = writeln!(out, "Mean potential score: {:.2}", stats.mean_potential);
    let _ = writeln!(out, "Mean views: {:.0}", stats.mean_views);
    let _ = writeln!(out, "Mean answers: {:.1}", stats.mean_answers);
    if let Some((text, views)) = &stats.top_viewed {
        let _ = writeln!(out, "Most viewed: {text} ({views} views)");
    }

    let _ = writeln!(out);
    if trends.is_empty() {
        let _ = writeln!(out, "No question has two snapshots yet.");
        return out;
    }
    let _ = writeln!(out, "Fastest growing:");
    for (i, t) in trends.iter().take(top).enumerate() {
        let _ = writeln!(
            out,
            "{:>3}. {}  {:+.0} views/h, {:+.1} answers/h over {:.1} h [{}]",
            i + 1,
            t.text,
            t.views_per_hour,
            t.answers_per_hour,
            t.span_hours,
            t.direction,
        );
    }
    out
}

/// Whole pipeline over a store.
pub fn report(store: &QuestionStore, top: usize) -> String {
    let series = clean_data(store);
    let stats = calculate_statistics(&series);
    let trends = analyze_trends(&series);
    generate_report(&stats, &trends, top)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scrape::Question;

    fn snap(url: &str, at: &str, views: i64, answers: i64, potential: f64) -> Snapshot {
        Snapshot {
            question: Question {
                question_text: format!("text {url}"),
                question_url: s!(url),
                view_total: views,
                answer_total: answers,
                potential_score: potential,
                ..Question::default()
            },
            saved_at: s!(at),
        }
    }

    fn series() -> Vec<Series> {
        let a = vec![
            snap("a", "2024-01-06 10:00:00", 1000, 10, 7.0),
            snap("a", "2024-01-06 12:00:00", 3000, 14, 7.2),
        ];
        let b = vec![
            snap("b", "2024-01-06 10:00:00", 500, 1, 5.0),
            snap("b", "not a time", 999, 9, 5.0),
            snap("b", "2024-01-06 11:00:00", 500, 2, 5.0),
        ];
        let c = vec![snap("c", "2024-01-06 11:00:00", 100, 0, 9.0)];
        let d = vec![snap("d", "garbage", 1, 0, 1.0)];
        clean_histories(vec![
            ("a", a.as_slice()),
            ("b", b.as_slice()),
            ("c", c.as_slice()),
            ("d", d.as_slice()),
        ])
    }

    #[test]
    fn cleaning_drops_bad_timestamps_and_empty_series() {
        let s = series();
        assert_eq!(s.len(), 3);
        assert_eq!(s[1].points.len(), 2);
        assert_eq!(s[1].points[1].answers, 2);
    }

    #[test]
    fn same_instant_keeps_the_later_sample() {
        let h = vec![
            snap("a", "2024-01-06 10:00:00", 1, 0, 1.0),
            snap("a", "2024-01-06 10:00:00", 2, 0, 1.0),
        ];
        let s = clean_histories(vec![("a", h.as_slice())]);
        assert_eq!(s[0].points.len(), 1);
        assert_eq!(s[0].points[0].views, 2);
    }

    #[test]
    fn statistics_use_latest_samples() {
        let stats = calculate_statistics(&series());
        assert_eq!(stats.questions, 3);
        assert_eq!(stats.snapshots, 5);
        assert!((stats.mean_views - 1200.0).abs() < 1e-9);
        assert!((stats.mean_potential - (7.2 + 5.0 + 9.0) / 3.0).abs() < 1e-9);
        assert_eq!(stats.top_viewed, Some((s!("text a"), 3000)));
    }

    #[test]
    fn trends_sorted_by_view_rate() {
        let trends = analyze_trends(&series());
        assert_eq!(trends.len(), 2);
        assert_eq!(trends[0].url, "a");
        assert_eq!(trends[0].span_hours, 2.0);
        assert_eq!(trends[0].views_per_hour, 1000.0);
        assert_eq!(trends[0].answers_per_hour, 2.0);
        assert_eq!(trends[0].direction, Direction::Rising);
        assert_eq!(trends[1].direction, Direction::Flat);
    }

    #[test]
    fn report_mentions_leaders() {
        let s = series();
        let text = generate_report(&calculate_statistics(&s), &analyze_trends(&s), 1);
        assert!(text.starts_with("Questions tracked: 3 (5 snapshots)"));
        assert!(text.contains("Most viewed: text a (3000 views)"));
        assert!(text.contains("1. text a  +1000 views/h"));
        assert!(!text.contains("text b  "));
    }

    #[test]
    fn empty_report_is_one_line() {
        let text = generate_report(&Statistics::default(), &[], 5);
        assert_eq!(text, "Questions tracked: 0 (0 snapshots)\n");
    }
}
