mod render;

use anyhow::{Context, Result};
use chrono::Utc;
use clap::Parser;
use owo_colors::OwoColorize;
use tracing_subscriber::EnvFilter;

use feedlens_core::client::HttpRemoteClient;
use feedlens_core::config::FeedlensConfig;
use feedlens_core::model::{
    Category, FeedbackItem, InsightsSnapshot, PriorityLevel, SentimentHighlight,
};
use feedlens_core::store::{DataStore, StoreOptions};
use feedlens_core::view::{project, SortDirection, SortKey, ViewOptions};

use render::Tone;

const DEFAULT_LOG_FILTER: &str = "feedlens=warn,feedlens_core=warn";

#[derive(Parser)]
#[command(
    name = "feedlens",
    about = "Feedlens: submit feedback and browse what the analysis service made of it",
    version
)]
enum Cli {
    /// Submit a piece of feedback
    Submit {
        /// Feedback text (at least 10 characters after trimming)
        message: String,
        /// Wait for the follow-up insights refresh and print it
        #[arg(long)]
        wait: bool,
        /// Output raw JSON
        #[arg(long)]
        json: bool,
    },
    /// List feedback, filtered by theme and sorted
    List {
        /// Case-insensitive substring matched against themes
        #[arg(short, long)]
        filter: Option<String>,
        /// Sort key (sentiment_score, priority_score, priority_level)
        #[arg(short, long)]
        sort: Option<String>,
        /// Sort ascending
        #[arg(long, conflicts_with = "desc")]
        asc: bool,
        /// Sort descending
        #[arg(long)]
        desc: bool,
        /// Maximum number of rows (default from config)
        #[arg(short, long)]
        limit: Option<usize>,
        /// Output raw JSON
        #[arg(long)]
        json: bool,
    },
    /// Show aggregate insights
    Insights {
        /// Output raw JSON
        #[arg(long)]
        json: bool,
    },
    /// Check the service and show sync status
    Status,
}

type Store = DataStore<HttpRemoteClient>;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER)),
        )
        .compact()
        .init();

    let cli = Cli::parse();
    let config = FeedlensConfig::load(Some(&std::env::current_dir()?)).unwrap_or_else(|e| {
        tracing::warn!(error = %e, "config load failed, using defaults");
        FeedlensConfig::default_config()
    });

    run(cli, &config).await
}

async fn run(cli: Cli, config: &FeedlensConfig) -> Result<()> {
    match cli {
        Cli::Submit {
            message,
            wait,
            json,
        } => {
            let store = make_store(config)?;
            cmd_submit(&store, &message, wait, json).await
        }
        Cli::List {
            filter,
            sort,
            asc,
            desc,
            limit,
            json,
        } => {
            let store = make_store(config)?;
            let direction = if asc {
                Some(SortDirection::Ascending)
            } else if desc {
                Some(SortDirection::Descending)
            } else {
                None
            };
            cmd_list(&store, config, filter, sort, direction, limit, json).await
        }
        Cli::Insights { json } => {
            let store = make_store(config)?;
            cmd_insights(&store, json).await
        }
        Cli::Status => cmd_status(config).await,
    }
}

fn make_store(config: &FeedlensConfig) -> Result<Store> {
    let client =
        HttpRemoteClient::from_config(&config.api).context("failed to create HTTP client")?;
    Ok(DataStore::with_tokio(client, StoreOptions::from(&config.sync)))
}

async fn cmd_submit(store: &Store, message: &str, wait: bool, json: bool) -> Result<()> {
    let created = store.submit_feedback(message).await?;

    let insights = if wait {
        if let Some(handle) = store.pending_reconciliation() {
            if !json {
                eprintln!(
                    "{}",
                    format!(
                        "Waiting {:.1}s for analysis to catch up...",
                        handle.delay().as_secs_f64()
                    )
                    .dimmed()
                );
            }
            handle.wait().await;
        }
        if let Some(err) = store.status(Category::Insights).error {
            tracing::warn!(error = %err, "insights refresh after submit failed");
        }
        Some(store.insights())
    } else {
        None
    };

    if json {
        let out = match &insights {
            Some(insights) => serde_json::json!({ "feedback": created, "insights": insights }),
            None => serde_json::to_value(&created)?,
        };
        println!("{}", serde_json::to_string_pretty(&out)?);
        return Ok(());
    }

    println!(
        "{} Feedback {} submitted.",
        "Thanks!".green().bold(),
        created.id.to_string().cyan()
    );
    if created.is_processing() {
        println!(
            "  {}",
            "Sentiment and priority are still being computed.".dimmed()
        );
    }
    if let Some(insights) = insights {
        println!();
        print_insights(&insights);
    }
    Ok(())
}

async fn cmd_list(
    store: &Store,
    config: &FeedlensConfig,
    filter: Option<String>,
    sort: Option<String>,
    direction: Option<SortDirection>,
    limit: Option<usize>,
    json: bool,
) -> Result<()> {
    let key = sort
        .as_deref()
        .map(|s| s.parse::<SortKey>().map_err(|e| anyhow::anyhow!(e)))
        .transpose()?
        .unwrap_or_else(|| config.view.sort_key());

    let mut options =
        ViewOptions::for_key(key).with_limit(limit.unwrap_or(config.view.default_limit));
    if let Some(direction) = direction {
        options = options.with_direction(direction);
    }
    if let Some(filter) = filter {
        options = options.with_filter(filter);
    }

    store.fetch_feedback().await;
    if let Some(err) = store.status(Category::Feedback).error {
        anyhow::bail!(err);
    }

    let items = store.feedback();
    let view = project(&items, &options);

    if json {
        println!("{}", serde_json::to_string_pretty(&view.items)?);
        return Ok(());
    }

    if view.items.is_empty() {
        if items.is_empty() {
            println!("No feedback yet.");
        } else {
            println!("No feedback matches {:?}.", options.filter_text.trim());
        }
        return Ok(());
    }

    println!(
        "  {}  {}  {}  {}  {}",
        format!("{:<6}", "ID").dimmed(),
        format!("{:<10}", "Sentiment").dimmed(),
        format!("{:<10}", "Priority").dimmed(),
        format!("{:<16}", "Received").dimmed(),
        "Message".dimmed(),
    );
    println!("{}", "─".repeat(78).dimmed());

    let now = Utc::now();
    for item in &view.items {
        print_row(item, now);
    }

    println!("{}", "─".repeat(78).dimmed());
    println!(
        "  {}  {}",
        render::showing(view.shown(), view.filtered_total),
        format!("sorted by {} {}", options.sort_key, options.direction).dimmed()
    );
    Ok(())
}

fn print_row(item: &FeedbackItem, now: chrono::DateTime<Utc>) {
    let sentiment = format!("{:<10}", render::sentiment_cell(item));
    let sentiment = match item.sentiment_score.map(render::tone) {
        Some(Tone::Positive) => sentiment.green().to_string(),
        Some(Tone::Negative) => sentiment.red().to_string(),
        Some(Tone::Neutral) => sentiment.yellow().to_string(),
        None => sentiment.dimmed().to_string(),
    };
    let priority = format!("{:<10}", render::priority_cell(item));
    let priority = match item.priority_level {
        Some(PriorityLevel::High) => priority.red().bold().to_string(),
        Some(_) => priority.magenta().to_string(),
        None => priority.dimmed().to_string(),
    };
    let received = render::relative_time(item.timestamp.unwrap_or(item.created_at), now);

    println!(
        "  {}  {}  {}  {:<16}  {}",
        format!("{:<6}", item.id).cyan(),
        sentiment,
        priority,
        received,
        render::truncate(&item.message, 40),
    );
    if !item.themes.is_empty() {
        println!(
            "  {:<6}  {}",
            "",
            format!("themes: {}", render::themes_cell(item)).dimmed()
        );
    }
}

async fn cmd_insights(store: &Store, json: bool) -> Result<()> {
    store.fetch_insights().await;
    if let Some(err) = store.status(Category::Insights).error {
        anyhow::bail!(err);
    }
    let insights = store.insights();

    if json {
        println!("{}", serde_json::to_string_pretty(&insights)?);
        return Ok(());
    }
    print_insights(&insights);
    Ok(())
}

fn print_highlights(title: &str, highlights: &[SentimentHighlight]) {
    println!("{}", title.bold());
    if highlights.is_empty() {
        println!("  {}", "none yet".dimmed());
        return;
    }
    let now = Utc::now();
    for h in highlights {
        let score = render::signed_score(h.sentiment_score);
        let score = match render::tone(h.sentiment_score) {
            Tone::Positive => score.green().to_string(),
            Tone::Negative => score.red().to_string(),
            Tone::Neutral => score.yellow().to_string(),
        };
        let when = h
            .timestamp
            .map(|t| render::relative_time(t, now))
            .unwrap_or_default();
        println!(
            "  {}  {}  {}",
            score,
            render::truncate(&h.feedback, 56),
            when.dimmed()
        );
    }
}

fn print_insights(insights: &InsightsSnapshot) {
    if insights.is_empty() {
        println!("No insights yet. Submit some feedback first.");
        return;
    }

    print_highlights("Most positive", &insights.top_positive);
    println!();
    print_highlights("Most negative", &insights.top_negative);
    println!();

    println!("{}", "Themes".bold());
    if insights.themes.is_empty() {
        println!("  {}", "none yet".dimmed());
    }
    for t in &insights.themes {
        println!("  {:<24} {}", t.theme, t.count.to_string().cyan());
    }
    println!();

    println!("{}", "Recommendations".bold());
    if insights.recommendations.is_empty() {
        println!("  {}", "none yet".dimmed());
    }
    for r in &insights.recommendations {
        let tag = format!("[{}]", r.priority);
        let tag = if r.priority.eq_ignore_ascii_case("high") {
            tag.red().to_string()
        } else {
            tag.yellow().to_string()
        };
        println!("  {} {}", tag, r.recommendation);
    }
}

async fn cmd_status(config: &FeedlensConfig) -> Result<()> {
    let version = env!("CARGO_PKG_VERSION");
    println!("{}", format!("Feedlens Status v{version}").bold());
    println!("  {}    {}", "API:".dimmed(), config.api.base_url);

    let client =
        HttpRemoteClient::from_config(&config.api).context("failed to create HTTP client")?;
    match client.health().await {
        Ok(health) => println!(
            "  {} {} ({})",
            "Service:".dimmed(),
            health.status.green(),
            health.service.as_deref().unwrap_or("unknown")
        ),
        Err(e) => println!("  {} {} - {}", "Service:".dimmed(), "unreachable".red(), e),
    }

    let store = DataStore::with_tokio(client, StoreOptions::from(&config.sync));
    store.activate().await;
    let snapshot = store.snapshot();

    for category in [Category::Feedback, Category::Insights] {
        let status = snapshot.status.get(category);
        let label = format!("{:<9}", format!("{category}:"));
        match &status.error {
            None => {
                let detail = match category {
                    Category::Feedback => format!("{} items", snapshot.feedback.len()),
                    _ => format!("{} themes", snapshot.insights.themes.len()),
                };
                println!("  {} {} ({})", label.dimmed(), "ok".green(), detail);
            }
            Some(err) => println!("  {} {} - {}", label.dimmed(), "error".red(), err),
        }
    }

    let processing = snapshot
        .feedback
        .iter()
        .filter(|f| f.is_processing())
        .count();
    if processing > 0 {
        println!(
            "  {} {}",
            "Pending:".dimmed(),
            format!("{processing} item(s) still processing").yellow()
        );
    }
    Ok(())
}
