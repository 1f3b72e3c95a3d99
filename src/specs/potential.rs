// src/specs/potential.rs
//! Spec for the creator centre's "potential questions" list.
//!
//! Layout of the rendered page (class names abbreviated):
//!
//! ```text
//! div.Card
//!   div[role=list]
//!     div.css-vurnku                      ← one item per question
//!       div                               ← row
//!         div  a[href*=question] > div    ← title, topics, "提问时间：…"
//!         div  "7.9 分"                   ← potential score
//!         div  "16.7 万" / "共 32.9 万"   ← views: growth / total
//!         div  "61" / "共 61"             ← answers: growth / total
//! ```
//!
//! Two passes: `parse_page` lifts the raw strings, `extract` turns them into
//! numbers. Raw strings are kept on the record so a bad parse can be diagnosed
//! from the saved data.

use scraper::{ElementRef, Html, Node};
use serde::{Deserialize, Deserializer, Serialize};

use crate::{
    config::consts::SITE_ORIGIN,
    core::sanitize::{after_colon, first_number, normalize_ws, parse_scaled},
    error::{Error, Result},
};

/// Strings as they appear on the page.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct RawQuestion {
    pub question_text: String,
    pub question_url: String,
    pub topics: Vec<String>,
    pub date_raw: String,
    pub potential_score_raw: String,
    pub view_amount_raw: String,
    pub answer_amount_raw: String,
}

/// One scraped question. Field names match the JSON files written by earlier
/// versions of the tracker, so old data keeps loading.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Question {
    pub question_text: String,
    pub question_url: String,
    #[serde(default)]
    pub topics: Vec<String>,
    #[serde(default)]
    pub date_raw: String,
    #[serde(default)]
    pub potential_score_raw: String,
    #[serde(default)]
    pub view_amount_raw: String,
    #[serde(default)]
    pub answer_amount_raw: String,
    pub potential_score: f64,
    #[serde(deserialize_with = "whole_number")]
    pub view_increment: i64,
    #[serde(deserialize_with = "whole_number")]
    pub view_total: i64,
    #[serde(deserialize_with = "whole_number")]
    pub answer_increment: i64,
    #[serde(deserialize_with = "whole_number")]
    pub answer_total: i64,
    #[serde(default)]
    pub date: Option<String>,
}

/// Older data files stored counts as floats (`24000.0`).
fn whole_number<'de, D: Deserializer<'de>>(d: D) -> std::result::Result<i64, D::Error> {
    let v = f64::deserialize(d)?;
    Ok(v.round() as i64)
}

const BLOCK_TAGS: &[&str] = &["div", "p", "li", "ul", "ol", "section", "h1", "h2", "h3", "h4"];

/// Parse the page and convert every item. Items that fail conversion are
/// returned as errors next to the good ones instead of sinking the whole page.
pub fn parse_questions(html: &str) -> (Vec<Question>, Vec<Error>) {
    let mut ok = Vec::new();
    let mut failed = Vec::new();
    for raw in parse_page(html) {
        match extract(raw) {
            Ok(q) => ok.push(q),
            Err(e) => failed.push(e),
        }
    }
    (ok, failed)
}

/// Lift the raw strings of every question item on the page.
pub fn parse_page(html: &str) -> Vec<RawQuestion> {
    let doc = Html::parse_document(html);
    let mut out = Vec::new();

    let cards = descendants(doc.root_element()).filter(|el| has_class(*el, "Card"));
    for card in cards {
        let Some(list) = descendants(card).find(|el| el.value().attr("role") == Some("list")) else {
            logd!("Spec: card without a list, skipping");
            continue;
        };

        let items = children(list).filter(|el| is_div(*el) && class_contains(*el, "vurnku"));
        for item in items {
            if let Some(raw) = parse_item(item) {
                out.push(raw);
            }
        }
    }
    out
}

fn parse_item(item: ElementRef<'_>) -> Option<RawQuestion> {
    let link = descendants(item).find(|el| {
        el.value().name() == "a"
            && el.value().attr("href").is_some_and(|h| h.contains("question") && !h.contains("write"))
    })?;

    let question_text = descendants(link)
        .find(|el| is_div(*el))
        .map(inline_text)
        .unwrap_or_else(|| inline_text(link));
    let question_url = absolutize(link.value().attr("href").unwrap_or_default());

    let topics = descendants(item)
        .filter(|el| {
            el.value().name() == "a"
                && el.value().attr("href").is_some_and(|h| h.contains("topic"))
        })
        .map(inline_text)
        .filter(|t| !t.is_empty())
        .collect();

    let date_raw = descendants(item)
        .find(|el| is_div(*el) && own_text(*el).contains("时间"))
        .map(inline_text)
        .unwrap_or_default();

    // ./div/div
    let cells: Vec<ElementRef<'_>> = children(item)
        .filter(|el| is_div(*el))
        .flat_map(|row| children(row).filter(|el| is_div(*el)))
        .collect();
    if cells.len() < 4 {
        logd!("Spec: {} has {} cells, expected 4", question_url, cells.len());
        return None;
    }

    Some(RawQuestion {
        question_text,
        question_url,
        topics,
        date_raw,
        potential_score_raw: rendered_text(cells[1]),
        view_amount_raw: rendered_text(cells[2]),
        answer_amount_raw: rendered_text(cells[3]),
    })
}

/// Convert the raw strings into numbers.
pub fn extract(raw: RawQuestion) -> Result<Question> {
    let date = after_colon(&raw.date_raw).map(String::from);

    let potential_score = first_number(&raw.potential_score_raw)
        .ok_or_else(|| Error::parse("potential_score", &raw.potential_score_raw))?;

    let (view_inc_raw, view_total_raw) = two_lines(&raw.view_amount_raw, "view_amount")?;
    let view_increment = parse_scaled(view_inc_raw)
        .ok_or_else(|| Error::parse("view_increment", view_inc_raw))?;
    let view_total = parse_scaled(view_total_raw)
        .ok_or_else(|| Error::parse("view_total", view_total_raw))?;

    let (answer_inc_raw, answer_total_raw) = two_lines(&raw.answer_amount_raw, "answer_amount")?;
    let answer_increment = first_number(answer_inc_raw)
        .ok_or_else(|| Error::parse("answer_increment", answer_inc_raw))?;
    let answer_total = first_number(answer_total_raw)
        .ok_or_else(|| Error::parse("answer_total", answer_total_raw))?;

    Ok(Question {
        potential_score,
        view_increment: view_increment.round() as i64,
        view_total: view_total.round() as i64,
        answer_increment: answer_increment.round() as i64,
        answer_total: answer_total.round() as i64,
        date,
        question_text: raw.question_text,
        question_url: raw.question_url,
        topics: raw.topics,
        date_raw: raw.date_raw,
        potential_score_raw: raw.potential_score_raw,
        view_amount_raw: raw.view_amount_raw,
        answer_amount_raw: raw.answer_amount_raw,
    })
}

fn two_lines<'a>(text: &'a str, field: &'static str) -> Result<(&'a str, &'a str)> {
    let mut lines = text.lines().map(str::trim).filter(|l| !l.is_empty());
    match (lines.next(), lines.next()) {
        (Some(a), Some(b)) => Ok((a, b)),
        _ => Err(Error::parse(field, text)),
    }
}

/// Links on the page are protocol-relative or root-relative.
pub fn absolutize(href: &str) -> String {
    if href.starts_with("http://") || href.starts_with("https://") {
        s!(href)
    } else if let Some(rest) = href.strip_prefix("//") {
        join!("https://", rest)
    } else if href.starts_with('/') {
        join!(SITE_ORIGIN, href)
    } else {
        join!(SITE_ORIGIN, "/", href)
    }
}

/* ---------- tree helpers ---------- */

fn descendants<'a>(el: ElementRef<'a>) -> impl Iterator<Item = ElementRef<'a>> {
    el.descendants().skip(1).filter_map(ElementRef::wrap)
}

fn children<'a>(el: ElementRef<'a>) -> impl Iterator<Item = ElementRef<'a>> {
    el.children().filter_map(ElementRef::wrap)
}

fn is_div(el: ElementRef<'_>) -> bool {
    el.value().name() == "div"
}

fn has_class(el: ElementRef<'_>, class: &str) -> bool {
    el.value().classes().any(|c| c == class)
}

fn class_contains(el: ElementRef<'_>, needle: &str) -> bool {
    el.value().attr("class").is_some_and(|c| c.contains(needle))
}

/// Text of the element's own text nodes, ignoring children.
fn own_text(el: ElementRef<'_>) -> String {
    el.children()
        .filter_map(|n| match n.value() {
            Node::Text(t) => Some(&**t),
            _ => None,
        })
        .collect()
}

/// All text on one line.
fn inline_text(el: ElementRef<'_>) -> String {
    normalize_ws(&el.text().collect::<String>())
}

/// Text the way a browser lays it out: block children start new lines.
/// `<div><div>16.7 万</div><div>共 32.9 万</div></div>` → `"16.7 万\n共 32.9 万"`.
pub fn rendered_text(el: ElementRef<'_>) -> String {
    let mut lines = Vec::new();
    let mut current = String::new();
    collect_lines(el, &mut lines, &mut current);
    flush_line(&mut lines, &mut current);
    lines.join("\n")
}

fn collect_lines(el: ElementRef<'_>, lines: &mut Vec<String>, current: &mut String) {
    for node in el.children() {
        match node.value() {
            Node::Text(t) => current.push_str(t),
            Node::Element(e) => {
                let Some(child) = ElementRef::wrap(node) else { continue };
                if e.name() == "br" {
                    flush_line(lines, current);
                    continue;
                }
                let block = BLOCK_TAGS.contains(&e.name());
                if block { flush_line(lines, current); }
                collect_lines(child, lines, current);
                if block { flush_line(lines, current); }
            }
            _ => {}
        }
    }
}

fn flush_line(lines: &mut Vec<String>, current: &mut String) {
    let line = normalize_ws(current);
    if !line.is_empty() {
        lines.push(line);
    }
    current.clear();
}
