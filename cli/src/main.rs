use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use clap::Parser;
use tracing::Instrument;

use alerts::store::sqlite_store::SqliteKvStore;
use common::logger::{TraceId, init_tracing, root_span};
use market::coingecko::CoinGeckoClient;
use market::{MarketDataService, MarketError, SystemClock};

use coinwatch::app::App;
use coinwatch::cli::{AlertCommand, Cli, Command, TriggeredCommand, cli_to_chart_window};
use coinwatch::config::AppConfig;
use coinwatch::{render, watch};

/// Connects the durable store and the upstream client and wires the services.
async fn build_app(cfg: &AppConfig) -> anyhow::Result<App> {
    let kv = SqliteKvStore::new(&cfg.database_url)
        .await
        .with_context(|| format!("failed to open alert store at {}", cfg.database_url))?;

    let client = CoinGeckoClient::new(
        cfg.coingecko_url.clone(),
        cfg.vs_currency.clone(),
        cfg.http_timeout,
    )
    .context("failed to build CoinGecko client")?;

    let clock = Arc::new(SystemClock);
    let market = MarketDataService::new(
        Arc::new(client),
        clock.clone(),
        cfg.ttls,
        cfg.top_list_limit,
    );

    Ok(App::new(Arc::new(market), Arc::new(kv), clock))
}

/// Prints a market read, or the explicit no-data state when nothing was ever
/// loaded for it.
fn print_market<T>(res: Result<T, MarketError>, view: impl FnOnce(&T) -> String) {
    match res {
        Ok(v) => print!("{}", view(&v)),
        Err(e) => {
            tracing::warn!(error = %e, "market read failed");
            println!("{}", render::NO_DATA);
        }
    }
}

async fn run(cmd: Command, app: &App, cfg: &AppConfig) -> anyhow::Result<()> {
    match cmd {
        Command::Top => {
            print_market(app.top().await, |r| {
                render::top_list(&r.observation.value, &cfg.vs_currency)
            });
        }

        Command::Detail { asset_id } => {
            print_market(app.detail(&asset_id).await, |r| {
                render::detail(&r.observation.value, &cfg.vs_currency)
            });
        }

        Command::Chart { asset_id, window } => {
            let window = cli_to_chart_window(window);
            print_market(app.chart(&asset_id, window).await, |obs| {
                render::chart(window, &obs.value)
            });
        }

        Command::Alert(AlertCommand::Set {
            asset_id,
            price,
            direction,
            name,
        }) => {
            let alert = app.set_alert(&asset_id, name, &price, direction).await?;
            println!("saved {}", render::alert(&alert, &cfg.vs_currency));
        }

        Command::Alert(AlertCommand::Get { asset_id }) => match app.get_alert(&asset_id).await? {
            Some(alert) => println!("{}", render::alert(&alert, &cfg.vs_currency)),
            None => println!("no alert for {asset_id}"),
        },

        Command::Alert(AlertCommand::List) => {
            for alert in app.list_alerts().await? {
                println!("{}", render::alert(&alert, &cfg.vs_currency));
            }
        }

        Command::Alert(AlertCommand::Delete { alert_id }) => {
            if app.delete_alert(alert_id).await? {
                println!("deleted {alert_id}");
            } else {
                println!("no alert with id {alert_id}");
            }
        }

        Command::Triggered(TriggeredCommand::List) => {
            if let Some(badge) = render::badge(app.unread_count().await?) {
                println!("[{badge} new]");
            }
            for t in app.triggered().await? {
                println!("{}", render::triggered(&t, &cfg.vs_currency));
            }
        }

        Command::Triggered(TriggeredCommand::Clear) => {
            app.clear_triggered().await?;
            println!("triggered alerts cleared");
        }

        Command::Watch { interval } => {
            let every = interval
                .map(Duration::from_secs)
                .unwrap_or(cfg.watch_interval);
            let shutdown = async {
                if let Err(e) = tokio::signal::ctrl_c().await {
                    tracing::error!(error = ?e, "failed to listen for ctrl-c");
                }
            };

            watch::run_watch(app, every, shutdown, |t| {
                println!("ALERT {}", render::triggered(t, &cfg.vs_currency));
            })
            .await;
        }
    }

    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let cfg = AppConfig::from_env()?;

    init_tracing("coinwatch", cfg.json_logs);

    let app = build_app(&cfg).await?;

    let trace_id = TraceId::default();
    run(cli.command, &app, &cfg)
        .instrument(root_span("command", &trace_id))
        .await
}
