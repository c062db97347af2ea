use clap::{Parser, Subcommand, ValueEnum};

use alerts::{AlertId, Direction};
use market::types::ChartWindow;

#[derive(Debug, Parser)]
#[command(name = "coinwatch", version, about = "Crypto market data and price alerts")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Top assets by market cap
    Top,

    /// Detail view for one asset (evaluates its alert)
    Detail { asset_id: String },

    /// Price history for one asset
    Chart {
        asset_id: String,

        #[arg(long, value_enum, default_value_t = WindowCli::SevenDays)]
        window: WindowCli,
    },

    /// Manage price alerts
    #[command(subcommand)]
    Alert(AlertCommand),

    /// Alerts that have fired
    #[command(subcommand)]
    Triggered(TriggeredCommand),

    /// Poll prices and evaluate alerts until interrupted
    Watch {
        /// Poll interval in seconds (defaults to WATCH_INTERVAL_SECS)
        #[arg(long, value_parser = clap::value_parser!(u64).range(1..))]
        interval: Option<u64>,
    },
}

#[derive(Debug, Subcommand)]
pub enum AlertCommand {
    /// Create or replace the alert for an asset
    Set {
        asset_id: String,

        /// Target price, e.g. `50000` or `0.0042`
        #[arg(long)]
        price: String,

        /// `above` or `below`
        #[arg(long)]
        direction: Direction,

        /// Display name; looked up from the detail endpoint when omitted
        #[arg(long)]
        name: Option<String>,
    },

    /// Show the alert for an asset
    Get { asset_id: String },

    /// List all alerts
    List,

    /// Delete an alert by id
    Delete { alert_id: AlertId },
}

#[derive(Debug, Subcommand)]
pub enum TriggeredCommand {
    /// Show fired alerts and the unread badge
    List,

    /// Empty the fired-alert log
    Clear,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum WindowCli {
    #[value(name = "1d")]
    OneDay,
    #[value(name = "7d")]
    SevenDays,
    #[value(name = "30d")]
    ThirtyDays,
    #[value(name = "1y")]
    OneYear,
}

/// Convert CLI window selection → chart window
pub fn cli_to_chart_window(w: WindowCli) -> ChartWindow {
    match w {
        WindowCli::OneDay => ChartWindow::OneDay,
        WindowCli::SevenDays => ChartWindow::SevenDays,
        WindowCli::ThirtyDays => ChartWindow::ThirtyDays,
        WindowCli::OneYear => ChartWindow::OneYear,
    }
}
