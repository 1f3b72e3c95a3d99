// src/cli.rs
//
// Headless front end: one-shot fetches, a foreground tracker, watchlist
// edits, reports, and offline parsing of saved pages.

use std::{
    fs,
    io::{self, BufRead},
    path::PathBuf,
    sync::{Arc, Mutex},
};

use clap::{Parser, Subcommand};
use color_eyre::eyre::{Result, WrapErr, eyre};

use crate::{
    analyzer,
    config::{consts::CONFIG_FILE, options::AppOptions},
    log,
    progress::{LogProgress, Progress},
    scrape::{self, Fetch},
    specs::potential,
    store::QuestionStore,
    tracker::{self, Tracker},
};

#[derive(Parser, Debug)]
#[command(name = "zhihu_tracker", version)]
#[command(about = "Track view and answer growth of Zhihu potential questions")]
pub struct Cli {
    /// Config file (TOML); missing file means defaults
    #[arg(short, long, global = true, default_value = CONFIG_FILE)]
    pub config: PathBuf,

    /// Debug logging mirrored to stderr
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Scrape once, update the store, print the changes as JSON
    Fetch,
    /// Keep tracking in the foreground; type `r` to refresh, `q` to quit
    Track,
    /// Print every known question, watched first
    List,
    /// Add a question to the watchlist
    Watch { url: String },
    /// Remove a question from the watchlist
    Unwatch { url: String },
    /// Statistics and fastest growing questions
    Report {
        #[arg(short, long, default_value_t = 10)]
        top: usize,
    },
    /// Parse a saved page offline and dump the questions as JSON
    Parse {
        html: PathBuf,
        #[arg(short, long)]
        out: Option<PathBuf>,
    },
    /// Apply a saved JSON dump to the store as if it was just fetched
    Import { json: PathBuf },
}

pub fn run() -> Result<()> {
    let cli = Cli::parse();

    let mut opts = AppOptions::load(&cli.config)
        .wrap_err_with(|| format!("loading {}", cli.config.display()))?;
    if cli.verbose {
        opts.log.level = s!("debug");
        opts.log.stderr = true;
    }
    log::init(&opts.log)?;
    logd!("CLI: {:?}", cli.command);

    match cli.command {
        Command::Fetch => fetch(&opts),
        Command::Track => track(&opts),
        Command::List => list(&opts),
        Command::Watch { url } => {
            let mut store = QuestionStore::open(opts.store.clone())?;
            if store.add_to_watched(&url)? {
                println!("Watching {url}");
            } else if store.is_watched(&url) {
                println!("Already watching {url}");
            } else {
                return Err(eyre!("unknown question {url}; fetch it first"));
            }
            Ok(())
        }
        Command::Unwatch { url } => {
            let mut store = QuestionStore::open(opts.store.clone())?;
            if store.remove_from_watched(&url)? {
                println!("Stopped watching {url}");
            } else {
                println!("Not watching {url}");
            }
            Ok(())
        }
        Command::Report { top } => {
            let store = QuestionStore::open(opts.store.clone())?;
            print!("{}", analyzer::report(&store, top));
            Ok(())
        }
        Command::Parse { html, out } => parse(html, out),
        Command::Import { json } => {
            let questions = scrape::read_questions(&json)
                .wrap_err_with(|| format!("reading {}", json.display()))?;
            let mut store = QuestionStore::open(opts.store.clone())?;
            let changes = store.update_questions(questions)?;
            println!("{}", serde_json::to_string_pretty(&changes)?);
            Ok(())
        }
    }
}

fn fetch(opts: &AppOptions) -> Result<()> {
    let store = Mutex::new(QuestionStore::open(opts.store.clone())?);
    let mut fetcher = scrape::scraper_from_options(&opts.scraper)?;
    let mut sink = LogProgress::default();
    let progress: &mut dyn Progress = &mut sink;

    let result = tracker::update_from(&mut fetcher, &store, Some(progress));
    fetcher.close();

    let changes = result?;
    println!("{}", serde_json::to_string_pretty(&changes)?);
    Ok(())
}

fn track(opts: &AppOptions) -> Result<()> {
    let store = Arc::new(Mutex::new(QuestionStore::open(opts.store.clone())?));
    let fetcher = scrape::scraper_from_options(&opts.scraper)?;
    let mut tracker = Tracker::spawn(fetcher, store, opts.tracker.interval(), LogProgress::default())?;
    eprintln!("Tracking every {}s. Type `r` + Enter to refresh, `q` to quit.", opts.tracker.interval_secs);

    for line in io::stdin().lock().lines() {
        match line?.trim() {
            "r" => tracker.refresh(),
            "q" => {
                tracker.stop();
                return Ok(());
            }
            "" => {}
            other => eprintln!("Unknown command {other:?} (r = refresh, q = quit)"),
        }
    }

    // stdin closed (daemonized, piped): keep running until killed
    logf!("CLI: stdin closed, tracking continues");
    tracker.join();
    Ok(())
}

fn list(opts: &AppOptions) -> Result<()> {
    let store = QuestionStore::open(opts.store.clone())?;
    for snap in store.question_list() {
        let q = &snap.question;
        println!(
            "{} {:>4.1} {:>9} {:>+7} {:>5} {:>+4}  {}  {}",
            if store.is_watched(snap.url()) { '*' } else { ' ' },
            q.potential_score,
            q.view_total,
            q.view_increment,
            q.answer_total,
            q.answer_increment,
            q.question_text,
            q.question_url,
        );
    }
    Ok(())
}

fn parse(html: PathBuf, out: Option<PathBuf>) -> Result<()> {
    let text = fs::read_to_string(&html).wrap_err_with(|| format!("reading {}", html.display()))?;
    let (questions, failed) = potential::parse_questions(&text);
    for e in &failed {
        logw!("Parse: skipped item: {}", e);
    }
    eprintln!("{} question(s), {} skipped", questions.len(), failed.len());

    match out {
        Some(path) => scrape::write_questions(&path, &questions)?,
        None => println!("{}", serde_json::to_string_pretty(&questions)?),
    }
    Ok(())
}
