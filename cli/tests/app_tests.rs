use std::sync::Arc;
use std::time::Duration;

use rust_decimal_macros::dec;
use tokio::test;

use alerts::store::memory::InMemoryKvStore;
use alerts::{AlertError, Direction};
use market::types::ChartWindow;
use market::{CacheTtls, Freshness, ManualClock, MarketDataService, MarketError};

use coinwatch::app::App;
use coinwatch::watch::run_watch;

use mock_provider::MockProvider;

struct Fixture {
    provider: Arc<MockProvider>,
    clock: Arc<ManualClock>,
    kv: Arc<InMemoryKvStore>,
    app: App,
}

fn fixture(provider: MockProvider, top_limit: usize) -> Fixture {
    let provider = Arc::new(provider);
    let clock = Arc::new(ManualClock::new(0));
    let kv = Arc::new(InMemoryKvStore::new());
    let market = MarketDataService::new(
        provider.clone(),
        clock.clone(),
        CacheTtls::default(),
        top_limit,
    );
    let app = App::new(Arc::new(market), kv.clone(), clock.clone());

    Fixture {
        provider,
        clock,
        kv,
        app,
    }
}

#[test]
async fn live_detail_fetch_fires_alert() -> anyhow::Result<()> {
    let f = fixture(MockProvider::with_prices(&[("bitcoin", dec!(50500))]), 10);
    f.app
        .set_alert("bitcoin", Some("Bitcoin".into()), "50000", Direction::Above)
        .await?;

    let r = f.app.detail("bitcoin").await?;

    assert_eq!(r.observation.freshness, Freshness::Live);
    assert_eq!(r.fired.len(), 1);
    assert_eq!(r.fired[0].triggered_price, dec!(50500));
    assert!(f.app.has_unread().await?);
    Ok(())
}

#[test]
async fn cached_detail_is_not_re_evaluated_until_ttl_expires() -> anyhow::Result<()> {
    let f = fixture(MockProvider::with_prices(&[("bitcoin", dec!(49000))]), 10);
    f.app
        .set_alert("bitcoin", Some("Bitcoin".into()), "50000", Direction::Above)
        .await?;

    assert!(f.app.detail("bitcoin").await?.fired.is_empty());

    f.provider.set_price("bitcoin", dec!(51000));
    f.clock.advance_ms(29_999);
    let cached = f.app.detail("bitcoin").await?;
    assert_eq!(cached.observation.freshness, Freshness::Cached);
    assert!(cached.fired.is_empty());

    f.clock.advance_ms(1);
    let live = f.app.detail("bitcoin").await?;
    assert_eq!(live.observation.value.current_price, dec!(51000));
    assert_eq!(live.fired.len(), 1);
    Ok(())
}

#[test]
async fn live_top_list_evaluates_every_listed_asset() -> anyhow::Result<()> {
    let f = fixture(
        MockProvider::with_prices(&[
            ("bitcoin", dec!(50500)),
            ("ethereum", dec!(1900)),
            ("solana", dec!(150)),
        ]),
        10,
    );
    f.app
        .set_alert("bitcoin", None, "50000", Direction::Above)
        .await?;
    f.app
        .set_alert("ethereum", None, "2000", Direction::Below)
        .await?;
    f.app
        .set_alert("solana", None, "200", Direction::Above)
        .await?;

    let r = f.app.top().await?;

    let mut fired: Vec<_> = r.fired.iter().map(|t| t.alert.asset_id.as_str()).collect();
    fired.sort();
    assert_eq!(fired, ["bitcoin", "ethereum"]);
    assert_eq!(f.app.unread_count().await?, 2);
    Ok(())
}

#[test]
async fn stale_list_is_served_without_evaluation() -> anyhow::Result<()> {
    let f = fixture(MockProvider::with_prices(&[("bitcoin", dec!(40000))]), 10);
    f.app.top().await?;

    f.app
        .set_alert("bitcoin", Some("Bitcoin".into()), "30000", Direction::Above)
        .await?;
    f.provider.set_offline(true);
    f.clock.advance_ms(31 * 60 * 1000);

    let r = f.app.top().await?;

    assert_eq!(r.observation.freshness, Freshness::Stale);
    assert_eq!(r.observation.value[0].current_price, dec!(40000));
    assert!(r.fired.is_empty());
    assert!(f.app.triggered().await?.is_empty());
    Ok(())
}

#[test]
async fn cold_outage_is_no_data() -> anyhow::Result<()> {
    let f = fixture(MockProvider::with_prices(&[("bitcoin", dec!(1))]), 10);
    f.provider.set_offline(true);

    let err = f.app.chart("bitcoin", ChartWindow::ThirtyDays).await.unwrap_err();

    assert!(matches!(err, MarketError::NoDataAvailable { .. }));
    Ok(())
}

#[test]
async fn chart_uses_window_days() -> anyhow::Result<()> {
    let f = fixture(MockProvider::with_prices(&[("bitcoin", dec!(1))]), 10);

    let obs = f.app.chart("bitcoin", ChartWindow::SevenDays).await?;

    assert_eq!(obs.value.len(), 8);
    Ok(())
}

#[test]
async fn set_alert_rejects_bad_price_and_falls_back_to_id_for_name() -> anyhow::Result<()> {
    let f = fixture(MockProvider::default(), 10);

    let err = f
        .app
        .set_alert("bitcoin", None, "-3", Direction::Below)
        .await
        .unwrap_err();
    assert!(matches!(err, AlertError::Validation(_)));
    assert_eq!(f.provider.detail_calls(), 0);

    f.provider.set_offline(true);
    let alert = f
        .app
        .set_alert("bitcoin", None, "100", Direction::Below)
        .await?;
    assert_eq!(alert.asset_name, "bitcoin");
    Ok(())
}

#[test]
async fn set_alert_looks_up_display_name() -> anyhow::Result<()> {
    let f = fixture(MockProvider::with_prices(&[("ethereum", dec!(2500))]), 10);

    let alert = f
        .app
        .set_alert("ethereum", None, "3000", Direction::Above)
        .await?;

    assert_eq!(alert.asset_name, "Ethereum");
    assert_eq!(f.app.get_alert("ethereum").await?, Some(alert));
    Ok(())
}

#[test]
async fn poll_reads_detail_for_alerted_assets_outside_top_list() -> anyhow::Result<()> {
    let f = fixture(
        MockProvider::with_prices(&[("bitcoin", dec!(60000)), ("dogecoin", dec!(0.2))]),
        1,
    );
    f.app
        .set_alert("dogecoin", Some("Dogecoin".into()), "0.15", Direction::Above)
        .await?;

    let fired = f.app.poll_once().await?;

    assert_eq!(fired.len(), 1);
    assert_eq!(fired[0].alert.asset_id, "dogecoin");
    assert_eq!(f.provider.detail_calls(), 1);
    Ok(())
}

#[test]
async fn poll_with_cached_list_still_evaluates_via_detail() -> anyhow::Result<()> {
    let f = fixture(MockProvider::with_prices(&[("bitcoin", dec!(49000))]), 10);
    f.app
        .set_alert("bitcoin", Some("Bitcoin".into()), "50000", Direction::Above)
        .await?;
    assert!(f.app.poll_once().await?.is_empty());

    f.provider.set_price("bitcoin", dec!(50000));
    f.clock.advance_ms(60_000);
    let fired = f.app.poll_once().await?;

    assert_eq!(fired.len(), 1);
    assert_eq!(fired[0].triggered_price, dec!(50000));
    Ok(())
}

#[test]
async fn triggered_view_survives_app_restart_and_clear_is_final() -> anyhow::Result<()> {
    let f = fixture(MockProvider::with_prices(&[("bitcoin", dec!(50500))]), 10);
    f.app
        .set_alert("bitcoin", Some("Bitcoin".into()), "50000", Direction::Above)
        .await?;
    f.app.detail("bitcoin").await?;
    f.app.clear_triggered().await?;

    let clock = Arc::new(ManualClock::new(0));
    let market = MarketDataService::new(
        f.provider.clone(),
        clock.clone(),
        CacheTtls::default(),
        10,
    );
    let restarted = App::new(Arc::new(market), f.kv.clone(), clock);
    f.provider.set_price("bitcoin", dec!(51000));

    let r = restarted.detail("bitcoin").await?;

    assert!(r.fired.is_empty());
    assert!(restarted.triggered().await?.is_empty());
    assert!(!restarted.has_unread().await?);
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn watch_polls_until_shutdown_and_reports_each_trigger_once() {
    let f = fixture(MockProvider::with_prices(&[("bitcoin", dec!(50500))]), 10);
    f.app
        .set_alert("bitcoin", Some("Bitcoin".into()), "50000", Direction::Above)
        .await
        .unwrap();

    let mut seen = Vec::new();
    run_watch(
        &f.app,
        Duration::from_secs(60),
        tokio::time::sleep(Duration::from_secs(150)),
        |t| seen.push(t.alert.asset_id.clone()),
    )
    .await;

    assert_eq!(seen, ["bitcoin"]);
    assert_eq!(f.app.triggered().await.unwrap().len(), 1);
}
