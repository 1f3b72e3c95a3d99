// src/specs/mod.rs
//! # Page "specs"
//!
//! Where the ground truth lives in the rendered HTML, and how to read it.
//!
//! Specs are **pure parsing**: they take a page source string and return
//! records. They do not talk to the browser, touch the store, or know about the
//! GUI. That keeps them testable offline against saved pages.
//!
//! ```text
//! tracker → scrape::Fetch::fetch() → core::webdriver (page source)
//!                                  ↘ specs::potential::parse_questions()
//!           store::QuestionStore::update_questions()
//! ```
//!
//! The site's class names are generated (`css-vurnku`, …), so selectors match on
//! stable fragments and on structure (`role="list"`, direct children) rather
//! than full class strings.
pub mod potential;
