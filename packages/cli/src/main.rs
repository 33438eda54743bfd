#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Command-line front end for the grievance portal.
//!
//! Complaints live in a JSON snapshot (`GRIEVANCE_STORE`, default
//! `grievances.json`) that every command loads and mutating commands
//! write back.

mod commands;

use std::path::PathBuf;
use std::str::FromStr;

use clap::{Parser, Subcommand};
use grievance_complaint_models::{ComplaintCategory, ComplaintPriority, ComplaintStatus};

#[derive(Parser)]
#[command(name = "grievance", about = "Civic grievance portal tool")]
struct Cli {
    /// JSON snapshot holding complaints and profiles
    #[arg(long, env = "GRIEVANCE_STORE", default_value = "grievances.json", global = true)]
    store: PathBuf,

    /// Alternative keyword tables (TOML) for priority classification
    #[arg(long, env = "GRIEVANCE_KEYWORDS", global = true)]
    keywords: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

/// Options shared by commands that classify an image.
#[derive(clap::Args)]
struct VisionArgs {
    /// Photo to classify (local path or `file://` URI)
    #[arg(long)]
    image: Option<String>,
    /// JSON file of `{label, probability}` predictions to use as the image
    /// model output. Without it, classification is text-only.
    #[arg(long)]
    predictions: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Estimate the priority of a complaint without filing it
    Classify {
        /// Complaint description
        #[arg(long)]
        description: String,
        /// Category (e.g. `water_supply`)
        #[arg(long, value_parser = ComplaintCategory::from_str)]
        category: ComplaintCategory,
        #[command(flatten)]
        vision: VisionArgs,
    },
    /// File a new complaint
    Submit {
        /// Category (e.g. `road_potholes`)
        #[arg(long, value_parser = ComplaintCategory::from_str)]
        category: ComplaintCategory,
        /// Complaint description
        #[arg(long)]
        description: String,
        /// Latitude in degrees
        #[arg(long, allow_hyphen_values = true)]
        lat: f64,
        /// Longitude in degrees
        #[arg(long, allow_hyphen_values = true)]
        lng: f64,
        /// Human-readable address
        #[arg(long)]
        address: String,
        /// Submitting user id (omit for anonymous)
        #[arg(long)]
        user: Option<String>,
        /// Uploaded photo URL stored with the complaint
        #[arg(long)]
        image_url: Option<String>,
        /// Uploaded video URL stored with the complaint
        #[arg(long)]
        video_url: Option<String>,
        #[command(flatten)]
        vision: VisionArgs,
    },
    /// List complaints
    List {
        /// Only this status
        #[arg(long, value_parser = ComplaintStatus::from_str)]
        status: Option<ComplaintStatus>,
        /// Only this category
        #[arg(long, value_parser = ComplaintCategory::from_str)]
        category: Option<ComplaintCategory>,
    },
    /// Show admin dashboard counts and urgent alerts
    Dashboard,
    /// Show outstanding complaints by responsible authority, oldest first
    Billboard,
    /// Show this quarter's top reporting citizens
    Leaderboard,
    /// Assign a worker to a complaint
    Assign {
        /// Complaint id
        id: String,
        /// Worker id
        worker: String,
    },
    /// Submit completion proof for an assigned task
    Complete {
        /// Complaint id
        id: String,
        /// URL of the completion photo
        image_url: String,
    },
    /// Approve completion proof and resolve
    Approve {
        /// Complaint id
        id: String,
    },
    /// Reject completion proof and send the task back
    Reassign {
        /// Complaint id
        id: String,
    },
    /// Override a complaint's priority
    SetPriority {
        /// Complaint id
        id: String,
        /// `high`, `medium` or `low`
        #[arg(value_parser = ComplaintPriority::from_str)]
        priority: ComplaintPriority,
    },
    /// Set a complaint's status directly
    SetStatus {
        /// Complaint id
        id: String,
        /// `pending`, `in_progress`, `waiting_approval` or `resolved`
        #[arg(value_parser = ComplaintStatus::from_str)]
        status: ComplaintStatus,
    },
    /// Delete a complaint
    Delete {
        /// Complaint id
        id: String,
    },
    /// Ask the help assistant a question about the portal
    Ask {
        /// Question text
        question: String,
        /// Alternative knowledge base (TOML)
        #[arg(long, env = "GRIEVANCE_KNOWLEDGE")]
        knowledge: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    pretty_env_logger::init();
    let cli = Cli::parse();

    if let Commands::Ask {
        question,
        knowledge,
    } = &cli.command
    {
        return commands::ask(question, knowledge.as_deref());
    }

    let ctx = commands::Context::open(cli.store, cli.keywords).await?;

    match cli.command {
        Commands::Classify {
            description,
            category,
            vision,
        } => {
            ctx.classify(&description, category, vision.image, vision.predictions)
                .await?;
        }
        Commands::Submit {
            category,
            description,
            lat,
            lng,
            address,
            user,
            image_url,
            video_url,
            vision,
        } => {
            let new = grievance_complaint_models::NewComplaint {
                user_id: user,
                category,
                description,
                location: grievance_complaint_models::Location { lat, lng, address },
                image_url,
                video_url,
                media_urls: Vec::new(),
            };
            ctx.submit(new, vision.image, vision.predictions).await?;
        }
        Commands::List { status, category } => ctx.list(status, category).await?,
        Commands::Dashboard => ctx.dashboard().await?,
        Commands::Billboard => ctx.billboard().await?,
        Commands::Leaderboard => ctx.leaderboard().await?,
        Commands::Assign { id, worker } => ctx.assign(&id, &worker).await?,
        Commands::Complete { id, image_url } => ctx.complete(&id, &image_url).await?,
        Commands::Approve { id } => ctx.approve(&id).await?,
        Commands::Reassign { id } => ctx.reassign(&id).await?,
        Commands::SetPriority { id, priority } => ctx.set_priority(&id, priority).await?,
        Commands::SetStatus { id, status } => ctx.set_status(&id, status).await?,
        Commands::Delete { id } => ctx.delete(&id).await?,
        Commands::Ask { .. } => {}
    }

    Ok(())
}
