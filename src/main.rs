use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, Subcommand, ValueEnum};
use sqlx::postgres::PgPoolOptions;
use tracing_subscriber::EnvFilter;

mod db;
mod health;
mod models;
mod opportunity;
mod report;
mod response;
mod scorer;
mod shift;

use models::{HealthScoreResult, LeadRecord, ResponseDomain};

#[derive(Parser)]
#[command(name = "policy-health")]
#[command(about = "Policy health and churn early warning tracker for Solisa Insurance", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, ValueEnum)]
enum DomainArg {
    LifeEvent,
    Occasion,
}

impl From<DomainArg> for ResponseDomain {
    fn from(arg: DomainArg) -> Self {
        match arg {
            DomainArg::LifeEvent => ResponseDomain::LifeEvent,
            DomainArg::Occasion => ResponseDomain::Occasion,
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Create or upgrade the database schema
    InitDb,
    /// Load realistic seed data
    Seed,
    /// Import touchpoints from a CSV file
    Import {
        #[arg(long)]
        csv: PathBuf,
    },
    /// Score policy health for a lead and persist the snapshot
    Score {
        #[arg(long)]
        email: String,
    },
    /// Classify the intent shift an incoming touchpoint would cause
    Shift {
        #[arg(long)]
        email: String,
        #[arg(long)]
        intent: String,
    },
    /// Process a customer reply to retention outreach
    Respond {
        #[arg(long)]
        email: String,
        #[arg(long, value_enum)]
        domain: DomainArg,
        #[arg(long)]
        text: String,
    },
    /// Recommend outreach for a life event
    Outreach {
        #[arg(long)]
        email: String,
        #[arg(long)]
        event_type: String,
    },
    /// Generate a markdown report for a lead
    Report {
        #[arg(long)]
        email: String,
        #[arg(long, default_value = "report.md")]
        out: PathBuf,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .init();

    let cli = Cli::parse();
    let database_url = std::env::var("DATABASE_URL")
        .context("DATABASE_URL must be set to a production Postgres instance")?;

    let pool = PgPoolOptions::new()
        .max_connections(5)
        .connect(&database_url)
        .await
        .context("failed to connect to Postgres")?;

    match cli.command {
        Commands::InitDb => {
            db::init_db(&pool).await?;
            println!("Schema ready.");
        }
        Commands::Seed => {
            db::seed(&pool).await?;
            println!("Seed data inserted.");
        }
        Commands::Import { csv } => {
            let inserted = db::import_csv(&pool, &csv).await?;
            println!("Inserted {inserted} touchpoints from {}.", csv.display());
        }
        Commands::Score { email } => {
            let scorer = scorer::scorer_from_env()?;
            let lead = db::fetch_lead(&pool, &email).await?;
            let touchpoints = db::fetch_touchpoints(&pool, lead.id).await?;
            let life_events = db::fetch_life_events(&pool, lead.id).await?;

            let result = scorer.score(&lead, &touchpoints, &life_events).await;
            db::save_health_snapshot(&pool, lead.id, &result, scorer.name()).await?;
            print_health(&lead, &result);
        }
        Commands::Shift { email, intent } => {
            let lead = db::fetch_lead(&pool, &email).await?;
            let touchpoints = db::fetch_touchpoints(&pool, lead.id).await?;

            let result = shift::detect_from_history(&touchpoints, &intent);
            println!("{}", result.message);
            println!(
                "- shift type {} ({} significance)",
                result.shift_type.as_str(),
                result.significance.as_str()
            );
            if let (Some(previous), Some(current)) = (result.previous_level, result.current_level)
            {
                println!("- funnel level {previous} -> {current}");
            }
        }
        Commands::Respond {
            email,
            domain,
            text,
        } => {
            let domain = ResponseDomain::from(domain);
            let lead = db::fetch_lead(&pool, &email).await?;
            let touchpoints = db::fetch_touchpoints(&pool, lead.id).await?;
            let life_events = db::fetch_life_events(&pool, lead.id).await?;

            let analysis = response::classify_reply(domain, &text);
            let mut result = health::compute_health_score(&lead, &touchpoints, &life_events);
            health::apply_reply_adjustment(&mut result, domain, analysis.outcome);
            db::save_health_snapshot(&pool, lead.id, &result, "deterministic").await?;

            println!(
                "Reply read as {} ({}, confidence {:.2}); next action: {}.",
                analysis.intent.as_str(),
                analysis.outcome.as_str(),
                analysis.confidence,
                analysis.next_action
            );
            print_health(&lead, &result);
        }
        Commands::Outreach { email, event_type } => {
            let lead = db::fetch_lead(&pool, &email).await?;
            let touchpoints = db::fetch_touchpoints(&pool, lead.id).await?;
            let life_events = db::fetch_life_events(&pool, lead.id).await?;

            let current = health::compute_health_score(&lead, &touchpoints, &life_events);
            let action = opportunity::generate_retention_action(&event_type, &lead, &current);

            println!(
                "Recommended {} outreach ({} priority, {} timing):",
                action.action_type,
                action.priority.as_str(),
                action.timing
            );
            println!(
                "- opportunity: {} ({})",
                action.opportunity_type.as_str(),
                action.recommended_product
            );
            println!("- deliver to: {}", lead.phone);
            println!(
                "- estimated value: ${}/month",
                action.estimated_value_monthly
            );
            println!("- message: {}", action.content);
        }
        Commands::Report { email, out } => {
            let lead = db::fetch_lead(&pool, &email).await?;
            let touchpoints = db::fetch_touchpoints(&pool, lead.id).await?;
            let life_events = db::fetch_life_events(&pool, lead.id).await?;

            let result = health::compute_health_score(&lead, &touchpoints, &life_events);
            let report = report::build_report(&lead, &result, &touchpoints, &life_events);
            std::fs::write(&out, report)?;
            println!("Report written to {}.", out.display());
        }
    }

    Ok(())
}

fn print_health(lead: &LeadRecord, result: &HealthScoreResult) {
    println!("Policy health for {} ({}):", lead.full_name, lead.email);
    println!(
        "- health score {} / 100 ({} churn risk, {}% probability)",
        result.health_score,
        result.churn_risk.as_str(),
        result.churn_probability
    );
    println!(
        "- sub-scores: engagement {}, satisfaction {}, usage {}, payment {}",
        result.engagement_score,
        result.satisfaction_score,
        result.usage_score,
        result.payment_score
    );
    println!(
        "- priority {}; predicted churn horizon {} days",
        result.priority.as_str(),
        result.days_to_predicted_churn
    );
    println!("- reasoning: {}", result.reasoning);
    println!("Retention actions:");
    for action in &result.retention_actions {
        println!("- {action}");
    }
}
