//! course-search main entry point
//!
//! Command-line front end: validate a configuration, index a course, or
//! index a course and run a query against it.

use anyhow::{bail, Context};
use clap::Parser;
use course_search::config::{load_config_with_hash, Config};
use course_search::index::SearchOutcome;
use course_search::tasks::Task;
use course_search::web::AppState;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// course-search: crawl, index and search course content
///
/// Crawls course pages while respecting robots.txt, indexes their visible
/// text per course, and answers free-text queries.
#[derive(Parser, Debug)]
#[command(name = "course-search")]
#[command(version = "1.0.0")]
#[command(about = "Crawl, index and search course content", long_about = None)]
struct Cli {
    /// Path to TOML configuration file
    #[arg(value_name = "CONFIG")]
    config: PathBuf,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,

    /// Validate config and show what would be crawled without crawling
    #[arg(long, conflicts_with_all = ["index", "search"])]
    dry_run: bool,

    /// Crawl and index one course, then print the run
    #[arg(long, value_name = "COURSE", conflicts_with = "search")]
    index: Option<String>,

    /// Index a course, then run this query against it
    #[arg(long, value_name = "QUERY", requires = "course")]
    search: Option<String>,

    /// Course to search
    #[arg(long, value_name = "COURSE")]
    course: Option<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    setup_logging(cli.verbose, cli.quiet);

    tracing::info!("Loading configuration from: {}", cli.config.display());
    let (config, config_hash) = load_config_with_hash(&cli.config)
        .with_context(|| format!("Failed to load configuration from {}", cli.config.display()))?;
    tracing::info!("Configuration loaded successfully (hash: {})", config_hash);

    if cli.dry_run {
        handle_dry_run(&config);
        return Ok(());
    }

    let state = AppState::from_config(config, config_hash)?;

    if let Some(course_id) = cli.index.as_deref() {
        handle_index(&state, course_id).await?;
    } else if let (Some(query), Some(course_id)) = (cli.search.as_deref(), cli.course.as_deref()) {
        handle_search(&state, course_id, query).await?;
    } else {
        let course_ids: Vec<String> = state.config.courses.iter().map(|c| c.id.clone()).collect();
        for course_id in &course_ids {
            handle_index(&state, course_id).await?;
        }
    }

    Ok(())
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("course_search=info,warn"),
            1 => EnvFilter::new("course_search=debug,info"),
            2 => EnvFilter::new("course_search=trace,debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .init();
}

/// Handles the --dry-run mode: shows the validated configuration
fn handle_dry_run(config: &Config) {
    println!("=== course-search Dry Run ===\n");

    println!("Crawler Configuration:");
    println!("  Link depth: {}", config.crawler.link_depth);
    println!("  Max pages per crawl: {}", config.crawler.max_pages);
    println!(
        "  Timeouts: {}s request, {}s connect",
        config.crawler.request_timeout_secs, config.crawler.connect_timeout_secs
    );
    println!("  Max crawl delay: {}ms", config.crawler.max_crawl_delay_ms);

    println!("\nUser Agent:");
    println!("  {}", config.user_agent.header());

    println!("\nSearch:");
    println!("  Results per query: {}", config.search.results_limit);
    println!("  Snippet length: {}", config.search.snippet_length);
    println!("  Crawl log: {}", config.storage.database_path);
    println!(
        "  Module: {}",
        if config.module.enabled {
            "enabled"
        } else {
            "disabled"
        }
    );

    println!("\nCourses ({}):", config.courses.len());
    for course in &config.courses {
        println!("  - {} ({} seeds)", course.id, course.seeds.len());
        for seed in &course.seeds {
            println!("    * {}", seed);
        }
        if !course.allowed_domains.is_empty() {
            println!("    allowed: {}", course.allowed_domains.join(", "));
        }
    }

    println!("\n✓ Configuration is valid");
}

/// Handles the --index mode: crawls one course and prints its run
async fn handle_index(state: &AppState, course_id: &str) -> anyhow::Result<()> {
    if state.config.course(course_id).is_none() {
        bail!("Unknown course: {}", course_id);
    }

    state.tasks.enqueue(Task::IndexCourse(course_id.to_string()));
    state.tasks.run_pending().await;

    let storage = state
        .storage
        .lock()
        .map_err(|_| anyhow::anyhow!("Crawl log lock poisoned"))?;
    let run = storage
        .latest_run(course_id)?
        .with_context(|| format!("No run recorded for course {}", course_id))?;

    println!(
        "Course {}: run {} {} ({} indexed, {} skipped)",
        course_id,
        run.id,
        run.status.to_db_string(),
        run.pages_indexed,
        run.pages_skipped
    );
    for page in storage.pages_for_run(run.id)? {
        match page.detail {
            Some(detail) => println!("  {:<14} {} ({})", page.outcome, page.url, detail),
            None => println!("  {:<14} {}", page.outcome, page.url),
        }
    }

    Ok(())
}

/// Handles the --search mode: indexes the course, then queries it
async fn handle_search(state: &AppState, course_id: &str, query: &str) -> anyhow::Result<()> {
    handle_index(state, course_id).await?;

    println!();
    match state.queries.search(course_id, query) {
        SearchOutcome::Hits(hits) => {
            for (rank, hit) in hits.iter().enumerate() {
                println!("{}. {} <{}> ({:.3})", rank + 1, hit.title, hit.url, hit.score);
                println!("   {}", hit.snippet);
            }
        }
        SearchOutcome::NoResults => println!("No results for {:?}", query),
        SearchOutcome::MalformedQuery { message } => {
            println!("Could not understand {:?}: {}", query, message)
        }
        SearchOutcome::EmptyQuery => println!("Nothing to search for"),
    }

    Ok(())
}
