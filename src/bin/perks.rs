//! CLI for searching and filtering perks from the Perks API.

use core::time::Duration;
use std::collections::BTreeSet;
use std::io::{self, Write as _};
use std::process::ExitCode;
use std::sync::Arc;

use clap::{Args, Parser, Subcommand};
use comfy_table::presets::UTF8_FULL;
use comfy_table::{Cell, Color, Table};
use indicatif::{ProgressBar, ProgressStyle};
use owo_colors::OwoColorize;
use perks_rs::client::{PerksBlockingClient, PerksClient};
use perks_rs::controller::{
    ControllerConfig, ControllerHandle, DEFAULT_DEBOUNCE, ListingState, unique_merchants,
};
use perks_rs::models::{Perk, PerkQuery};
use tokio::io::{AsyncBufReadExt as _, BufReader};

/// Environment variable name for the API base URL.
const BASE_URL_ENV: &str = "PERKS_API_URL";

/// Environment variable name for the optional bearer token.
const TOKEN_ENV: &str = "PERKS_API_TOKEN";

/// Placeholder for missing values in tables.
const MISSING: &str = "\u{2014}";

/// Perks API CLI — search and filter perks.
#[derive(Debug, Parser)]
#[command(name = "perks", version, about)]
struct Cli {
    /// API base URL (default: $PERKS_API_URL, then the built-in default).
    #[arg(long, global = true, value_name = "URL")]
    base_url: Option<String>,
    /// Per-request timeout in seconds.
    #[arg(long, global = true, value_name = "SECS")]
    timeout: Option<u64>,
    /// Subcommand to execute.
    #[command(subcommand)]
    command: Command,
}

/// Available subcommands.
#[derive(Debug, Subcommand)]
enum Command {
    /// List perks once, optionally filtered.
    List(FilterArgs),
    /// List the distinct merchants of a listing.
    Merchants {
        /// Only consider perks matching this search text.
        #[arg(long)]
        search: Option<String>,
    },
    /// Browse interactively: typed text is searched after a short pause.
    Browse(BrowseArgs),
}

/// Filters shared by one-shot commands.
#[derive(Debug, Args)]
struct FilterArgs {
    /// Free-text search.
    #[arg(long)]
    search: Option<String>,
    /// Merchant name.
    #[arg(long)]
    merchant: Option<String>,
}

impl FilterArgs {
    /// Builds the request query.
    fn query(&self) -> PerkQuery {
        PerkQuery::new(
            self.search.as_deref().unwrap_or_default(),
            self.merchant.as_deref().unwrap_or_default(),
        )
    }
}

/// Arguments for the `browse` subcommand.
#[derive(Debug, Args)]
struct BrowseArgs {
    /// Quiet period in milliseconds before typed text is searched.
    #[arg(long, value_name = "MS")]
    debounce_ms: Option<u64>,
    /// Apply whichever response arrives last, even for superseded requests.
    #[arg(long)]
    allow_stale: bool,
}

impl BrowseArgs {
    /// Builds the controller configuration.
    fn config(&self) -> ControllerConfig {
        let debounce = self
            .debounce_ms
            .map_or(DEFAULT_DEBOUNCE, Duration::from_millis);
        ControllerConfig::default()
            .with_debounce(debounce)
            .with_discard_stale_responses(!self.allow_stale)
    }
}

/// Connection settings resolved from flags and the environment.
#[derive(Debug)]
struct Connection {
    /// Base URL override.
    base_url: Option<String>,
    /// Bearer token.
    token: Option<String>,
    /// Request timeout.
    timeout: Option<Duration>,
}

impl Connection {
    /// Resolves settings: flags first, then environment variables.
    fn resolve(cli: &Cli) -> Self {
        Self {
            base_url: cli.base_url.clone().or_else(|| read_env(BASE_URL_ENV)),
            token: read_env(TOKEN_ENV),
            timeout: cli.timeout.map(Duration::from_secs),
        }
    }

    /// Builds a blocking client.
    fn blocking_client(&self) -> perks_rs::error::Result<PerksBlockingClient> {
        let mut builder = PerksBlockingClient::builder();
        if let Some(url) = self.base_url.as_deref() {
            builder = builder.base_url(url);
        }
        if let Some(token) = self.token.as_deref() {
            builder = builder.token(token);
        }
        if let Some(timeout) = self.timeout {
            builder = builder.timeout(timeout);
        }
        builder.build()
    }

    /// Builds an async client.
    fn async_client(&self) -> perks_rs::error::Result<PerksClient> {
        let mut builder = PerksClient::builder();
        if let Some(url) = self.base_url.as_deref() {
            builder = builder.base_url(url);
        }
        if let Some(token) = self.token.as_deref() {
            builder = builder.token(token);
        }
        if let Some(timeout) = self.timeout {
            builder = builder.timeout(timeout);
        }
        builder.build()
    }
}

/// Reads a non-empty environment variable.
fn read_env(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|value| !value.is_empty())
}

/// Runs the CLI, returning an appropriate exit code.
fn run() -> io::Result<ExitCode> {
    tracing_subscriber::fmt()
        .with_writer(io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .init();

    let _dotenv = dotenvy::dotenv();

    let cli = Cli::parse();
    let connection = Connection::resolve(&cli);

    match cli.command {
        Command::List(args) => cmd_list(&connection, &args),
        Command::Merchants { search } => cmd_merchants(&connection, search.as_deref()),
        Command::Browse(args) => cmd_browse(&connection, &args),
    }
}

/// Prints a fatal error line.
fn report(context: &str, err: &dyn core::fmt::Display) -> io::Result<ExitCode> {
    writeln!(
        io::stderr().lock(),
        "{} {context}: {err}",
        "error:".red().bold()
    )?;
    Ok(ExitCode::FAILURE)
}

/// Fetches a listing with a spinner, using the blocking client.
fn fetch_blocking(connection: &Connection, query: &PerkQuery) -> io::Result<Option<Vec<Perk>>> {
    let client = match connection.blocking_client() {
        Ok(client) => client,
        Err(err) => {
            _ = report("failed to build client", &err)?;
            return Ok(None);
        }
    };

    let spinner = make_spinner("Loading perks...");
    let result = client.list_perks(query);
    spinner.finish_and_clear();

    match result {
        Ok(response) => Ok(Some(response.perks)),
        Err(err) => {
            writeln!(
                io::stderr().lock(),
                "{} {}",
                "error:".red().bold(),
                err.user_message()
            )?;
            tracing::debug!(error = %err, "listing failed");
            Ok(None)
        }
    }
}

/// Executes the `list` subcommand.
fn cmd_list(connection: &Connection, args: &FilterArgs) -> io::Result<ExitCode> {
    let Some(perks) = fetch_blocking(connection, &args.query())? else {
        return Ok(ExitCode::FAILURE);
    };
    print_perks_table(&perks)?;
    Ok(ExitCode::SUCCESS)
}

/// Executes the `merchants` subcommand.
fn cmd_merchants(connection: &Connection, search: Option<&str>) -> io::Result<ExitCode> {
    let query = PerkQuery::new(search.unwrap_or_default(), "");
    let Some(perks) = fetch_blocking(connection, &query)? else {
        return Ok(ExitCode::FAILURE);
    };
    print_merchants(&unique_merchants(&perks))?;
    Ok(ExitCode::SUCCESS)
}

/// Executes the `browse` subcommand on a fresh tokio runtime.
fn cmd_browse(connection: &Connection, args: &BrowseArgs) -> io::Result<ExitCode> {
    let client = match connection.async_client() {
        Ok(client) => client,
        Err(err) => return report("failed to build client", &err),
    };
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?;
    runtime.block_on(browse(client, args.config()))
}

/// One line of interactive input.
#[derive(Debug, Clone, PartialEq, Eq)]
enum BrowseInput {
    /// Replace the search text (debounced).
    Search(String),
    /// Select a merchant; empty clears the filter.
    Merchant(String),
    /// Search now.
    Submit,
    /// Clear all filters.
    Reset,
    /// Repeat the last fetch.
    Retry,
    /// Show usage.
    Help,
    /// Leave the session.
    Quit,
}

/// Parses a line typed in the browse session.
fn parse_browse_input(line: &str) -> BrowseInput {
    if line.trim().is_empty() {
        return BrowseInput::Submit;
    }
    let Some(command) = line.trim_start().strip_prefix('/') else {
        return BrowseInput::Search(line.to_owned());
    };
    let (name, argument) = command
        .split_once(char::is_whitespace)
        .map_or((command, ""), |(name, rest)| (name, rest.trim()));
    match name {
        "merchant" | "m" => BrowseInput::Merchant(argument.to_owned()),
        "submit" | "s" => BrowseInput::Submit,
        "reset" => BrowseInput::Reset,
        "retry" | "r" => BrowseInput::Retry,
        "quit" | "q" | "exit" => BrowseInput::Quit,
        _ => BrowseInput::Help,
    }
}

/// Runs the interactive session until `/quit` or end of input.
async fn browse(client: PerksClient, config: ControllerConfig) -> io::Result<ExitCode> {
    let handle = ControllerHandle::spawn(Arc::new(client), config);
    let mut updates = handle.subscribe();
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    print_browse_help()?;

    loop {
        tokio::select! {
            next = lines.next_line() => {
                let Some(line) = next? else {
                    break;
                };
                let sent = match parse_browse_input(&line) {
                    BrowseInput::Search(text) => handle.set_search(text),
                    BrowseInput::Merchant(merchant) => handle.set_merchant(merchant),
                    BrowseInput::Submit => handle.submit(),
                    BrowseInput::Reset => handle.reset(),
                    BrowseInput::Retry => handle.retry(),
                    BrowseInput::Help => {
                        print_browse_help()?;
                        Ok(())
                    }
                    BrowseInput::Quit => break,
                };
                if let Err(err) = sent {
                    return report("browse session ended", &err);
                }
            }
            changed = updates.changed() => {
                if changed.is_err() {
                    break;
                }
                let snapshot = updates.borrow_and_update().clone();
                print_snapshot(&snapshot)?;
            }
        }
    }

    if let Err(err) = handle.shutdown() {
        tracing::debug!(error = %err, "controller already stopped");
    }
    Ok(ExitCode::SUCCESS)
}

// ── Output formatting ────────────────────────────────────────────────

/// Prints the browse session usage.
fn print_browse_help() -> io::Result<()> {
    let mut out = io::stdout().lock();
    writeln!(out, "{}", "Browse perks".green().bold())?;
    writeln!(out, "  {}  search after a short pause", "<text>".bold())?;
    writeln!(out, "  {}  search now", "<enter>".bold())?;
    writeln!(out, "  {}  filter by merchant (empty clears)", "/merchant NAME".bold())?;
    writeln!(out, "  {}  clear all filters", "/reset".bold())?;
    writeln!(out, "  {}  repeat the last request", "/retry".bold())?;
    writeln!(out, "  {}  leave", "/quit".bold())?;
    Ok(())
}

/// Prints a controller snapshot.
fn print_snapshot(state: &ListingState) -> io::Result<()> {
    if state.loading() {
        let mut out = io::stdout().lock();
        writeln!(out, "{}", describe_filters(state).dimmed())?;
        return Ok(());
    }
    if let Some(message) = state.error() {
        let mut err = io::stderr().lock();
        writeln!(err, "{} {message}", "error:".red().bold())?;
        writeln!(err, "  {} type /retry to try again", "hint:".cyan())?;
    }
    print_perks_table(state.perks())?;
    print_merchants(state.unique_merchants())
}

/// Describes the filters of an in-flight request.
fn describe_filters(state: &ListingState) -> String {
    let query = PerkQuery::new(state.debounced_search_query(), state.merchant_filter());
    match (query.search(), query.merchant()) {
        (None, None) => "Loading all perks...".to_owned(),
        (Some(search), None) => format!("Searching for \"{search}\"..."),
        (None, Some(merchant)) => format!("Loading perks from {merchant}..."),
        (Some(search), Some(merchant)) => {
            format!("Searching for \"{search}\" at {merchant}...")
        }
    }
}

/// Formats a discount percentage.
fn format_discount(discount: Option<f64>) -> String {
    discount.map_or_else(|| MISSING.to_owned(), |percent| format!("{percent}%"))
}

/// Prints perks in a table.
fn print_perks_table(perks: &[Perk]) -> io::Result<()> {
    let mut out = io::stdout().lock();
    if perks.is_empty() {
        writeln!(out, "{}", "No perks found.".dimmed())?;
        return Ok(());
    }

    let mut table = Table::new();
    _ = table.load_preset(UTF8_FULL);
    _ = table.set_header(vec![
        Cell::new("Title").fg(Color::Cyan),
        Cell::new("Category").fg(Color::Cyan),
        Cell::new("Merchant").fg(Color::Cyan),
        Cell::new("Discount").fg(Color::Cyan),
        Cell::new("Details").fg(Color::Cyan),
    ]);

    for perk in perks {
        let discount_cell = if perk.discount_percent.is_some() {
            Cell::new(format_discount(perk.discount_percent)).fg(Color::Green)
        } else {
            Cell::new(MISSING).fg(Color::DarkGrey)
        };
        _ = table.add_row(vec![
            Cell::new(&perk.title),
            Cell::new(&perk.category),
            Cell::new(perk.merchant_name().unwrap_or(MISSING)),
            discount_cell,
            Cell::new(perk.id.detail_path()).fg(Color::DarkGrey),
        ]);
    }

    writeln!(
        out,
        "{} {}",
        "Perks".green().bold(),
        format!("({})", perks.len()).dimmed()
    )?;
    writeln!(out)?;
    writeln!(out, "{table}")?;
    Ok(())
}

/// Prints merchant names on one line.
fn print_merchants(merchants: &BTreeSet<String>) -> io::Result<()> {
    let mut out = io::stdout().lock();
    if merchants.is_empty() {
        writeln!(out, "{}", "No merchants.".dimmed())?;
        return Ok(());
    }
    let names: Vec<&str> = merchants.iter().map(String::as_str).collect();
    writeln!(out, "{} {}", "Merchants:".bold(), names.join(", "))?;
    Ok(())
}

/// Creates a spinner with the given message.
fn make_spinner(message: &str) -> ProgressBar {
    let spinner = ProgressBar::new_spinner();
    spinner.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.cyan} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    spinner.set_message(message.to_owned());
    spinner.enable_steady_tick(Duration::from_millis(80));
    spinner
}

/// Entry point.
fn main() -> ExitCode {
    match run() {
        Ok(code) => code,
        Err(err) => {
            // stderr itself may be gone; nothing left to report to.
            let _ignored = writeln!(io::stderr(), "fatal I/O error: {err}");
            ExitCode::FAILURE
        }
    }
}
