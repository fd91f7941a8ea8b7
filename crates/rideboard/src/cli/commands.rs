//! # CLI Layer
//!
//! The only place that:
//! - Knows about terminal I/O (stdout, stderr, the confirmation prompt)
//! - Installs the tracing subscriber
//! - Formats output for humans
//!
//! Each handler opens a [`RideboardApi`], performs the initial load, and renders the
//! resulting [`CmdResult`]. Store failures arrive as notifications, not errors.

use super::render::{render_config, render_listing, render_messages, render_status};
use super::setup::{AddArgs, Cli, Commands, ListArgs};
use anyhow::{Context, Result};
use chrono::Utc;
use clap::Parser;
use rideboardapp::api::{CmdResult, RideboardApi};
use rideboardapp::config::RideboardConfig;
use rideboardapp::filter::EntryFilter;
use rideboardapp::model::EntryDraft;
use std::io::{self, BufRead, Write};
use std::time::Duration;
use tracing::debug;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter};

pub async fn run() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let config = RideboardConfig::load(cli.config.as_deref())?;
    debug!(backend = config.backend_name(), "configuration loaded");

    match cli.command {
        None => handle_list(&config, ListArgs::default()).await,
        Some(Commands::List(args)) => handle_list(&config, args).await,
        Some(Commands::Add(args)) => handle_add(&config, args).await,
        Some(Commands::Delete { id, yes }) => handle_delete(&config, &id, yes).await,
        Some(Commands::Refresh(args)) => handle_refresh(&config, args).await,
        Some(Commands::Watch { interval, filter }) => {
            handle_watch(&config, interval, filter).await
        }
        Some(Commands::Config) => handle_config(&config),
    }
}

fn init_tracing(verbose: bool) {
    let default_level = if verbose { "info" } else { "warn" };
    let filter = EnvFilter::try_from_env("RIDEBOARD_LOG")
        .unwrap_or_else(|_| EnvFilter::new(default_level));
    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(
            fmt::layer()
                .with_writer(io::stderr)
                .with_target(false)
                .compact(),
        )
        .try_init();
}

fn list_filter(args: &ListArgs) -> Result<EntryFilter> {
    let kind = if args.kind.is_empty() { "all" } else { &args.kind };
    Ok(EntryFilter::from_raw(
        kind,
        args.date.as_deref().unwrap_or(""),
    )?)
}

fn print_result(api: &RideboardApi, result: &CmdResult, json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(&result.listed_entries)?);
        eprint!("{}", render_messages(&result.messages));
        return Ok(());
    }
    print!("{}", render_listing(&result.listed_entries, Utc::now()));
    println!();
    print!(
        "{}",
        render_status(
            api.filter(),
            result.listed_entries.len(),
            result.sync_state,
            result.pending
        )
    );
    print!("{}", render_messages(&result.messages));
    Ok(())
}

async fn handle_list(config: &RideboardConfig, args: ListArgs) -> Result<()> {
    let filter = list_filter(&args)?;
    let mut api = RideboardApi::open(config)?;
    let loaded = api.load().await;
    let result = api.set_filter(filter).with_messages(loaded.messages);
    print_result(&api, &result, args.json)
}

async fn handle_refresh(config: &RideboardConfig, args: ListArgs) -> Result<()> {
    let filter = list_filter(&args)?;
    let mut api = RideboardApi::open(config)?;
    api.set_filter(filter);
    let result = api.refresh().await;
    print_result(&api, &result, args.json)
}

async fn handle_add(config: &RideboardConfig, args: AddArgs) -> Result<()> {
    let draft = EntryDraft {
        name: args.name,
        phone: args.phone,
        kind: args.kind,
        date: args.date,
        time: args.time,
        from: args.from,
        to: args.to,
        details: args.details,
    };
    let api = RideboardApi::open(config)?;
    let result = api.submit(draft).await?;
    let now = Utc::now();
    for entry in &result.affected_entries {
        print!("{}", render_listing(std::slice::from_ref(entry), now));
    }
    print!("{}", render_messages(&result.messages));
    Ok(())
}

async fn handle_delete(config: &RideboardConfig, id: &str, yes: bool) -> Result<()> {
    let api = RideboardApi::open(config)?;
    let loaded = api.load().await;
    print!("{}", render_messages(&loaded.messages));

    let Some(entry) = api.find(id) else {
        println!("No travel plan with id {}.", id);
        return Ok(());
    };

    if !yes && !confirm(&format!("Delete {}'s travel plan?", entry.display_name()))? {
        println!("Cancelled.");
        return Ok(());
    }

    let result = api.delete(id).await;
    print!("{}", render_messages(&result.messages));
    Ok(())
}

fn confirm(question: &str) -> Result<bool> {
    let mut stderr = io::stderr();
    write!(stderr, "{} [y/N] ", question)?;
    stderr.flush()?;
    let mut answer = String::new();
    io::stdin()
        .lock()
        .read_line(&mut answer)
        .context("failed to read confirmation")?;
    Ok(matches!(answer.trim().to_lowercase().as_str(), "y" | "yes"))
}

async fn handle_watch(
    config: &RideboardConfig,
    interval: Option<u64>,
    args: ListArgs,
) -> Result<()> {
    let filter = list_filter(&args)?;
    let period = interval
        .map(|s| Duration::from_secs(s.max(1)))
        .unwrap_or_else(|| config.refresh_interval());

    let mut api = RideboardApi::open(config)?;
    let loaded = api.load().await;
    let result = api.set_filter(filter).with_messages(loaded.messages);
    let term = console::Term::stdout();
    redraw(&term, &api, &result)?;

    let (refresh, mut reports) = api.auto_refresh(period);
    loop {
        tokio::select! {
            report = reports.recv() => match report {
                Some(report) => {
                    let result = api.on_refresh(report);
                    redraw(&term, &api, &result)?;
                }
                None => break,
            },
            _ = tokio::signal::ctrl_c() => break,
        }
    }
    refresh.stop().await;
    Ok(())
}

fn redraw(term: &console::Term, api: &RideboardApi, result: &CmdResult) -> Result<()> {
    if term.is_term() {
        term.clear_screen()?;
    }
    print_result(api, result, false)?;
    println!(
        "{}",
        super::styles::THEME
            .muted
            .apply_to(format!("updated {} · Ctrl-C to stop", Utc::now().format("%H:%M:%S")))
    );
    Ok(())
}

fn handle_config(config: &RideboardConfig) -> Result<()> {
    let user_file = RideboardConfig::user_config_path().map(|p| p.display().to_string());
    print!("{}", render_config(&config.display_pairs(), user_file));
    Ok(())
}
