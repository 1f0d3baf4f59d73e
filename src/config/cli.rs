use crate::core::render::OutputFormat;
use crate::domain::model::SortKey;
use clap::{Parser, Subcommand};

#[derive(Debug, Clone, Parser)]
#[command(name = "campus-market")]
#[command(about = "Browse and manage a campus marketplace from the terminal")]
pub struct CliConfig {
    /// Path to TOML configuration file
    #[arg(short, long)]
    pub config: Option<String>,

    /// JSON dataset to load into the in-memory backend
    #[arg(long)]
    pub data: Option<String>,

    /// Act as this signed-in user id
    #[arg(long)]
    pub user: Option<String>,

    #[arg(short, long, help = "Enable verbose output")]
    pub verbose: bool,

    #[arg(long, help = "Emit logs as JSON")]
    pub json_logs: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Clone, Subcommand)]
pub enum Command {
    /// Search and filter the catalog
    Browse {
        #[arg(short, long, default_value = "")]
        search: String,

        /// Category name; empty for all categories
        #[arg(long, default_value = "")]
        category: String,

        /// newest, price_low or price_high
        #[arg(long)]
        sort: Option<SortKey>,

        #[arg(long, default_value = "table")]
        format: OutputFormat,

        /// Hide sold and deleted listings
        #[arg(long)]
        active_only: bool,
    },

    /// Show one listing with its seller
    Show { id: String },

    /// Show a user's public page
    Seller {
        id: String,

        #[arg(long)]
        sort: Option<SortKey>,

        #[arg(long, default_value = "table")]
        format: OutputFormat,

        /// Hide sold and deleted listings
        #[arg(long)]
        active_only: bool,
    },

    /// List the signed-in user's saved listings
    Saved,

    /// Save or unsave a listing for the signed-in user
    ToggleSave { id: String },

    /// Post a new listing as the signed-in user
    Sell {
        #[arg(long)]
        title: String,

        #[arg(long)]
        description: String,

        #[arg(long)]
        price: String,

        #[arg(long)]
        category: String,

        #[arg(long)]
        condition: String,

        /// Image URL; repeat for up to the configured maximum
        #[arg(long = "image")]
        images: Vec<String>,
    },

    /// Mark one of your listings as sold
    MarkSold { id: String },

    /// Delete one of your listings
    Delete { id: String },
}
