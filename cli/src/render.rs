//! Plain-text views printed by the commands.

use std::fmt::Write;

use alerts::{Alert, TriggeredAlert};
use market::format::{format_market_cap, format_percentage_change, format_price};
use market::types::{ChartDataPoint, ChartWindow, Cryptocurrency, CryptocurrencyDetail};

pub const NO_DATA: &str = "data not available";

/// Badge text for the unread count: hidden at zero, capped at "99+".
pub fn badge(count: usize) -> Option<String> {
    match count {
        0 => None,
        1..=99 => Some(count.to_string()),
        _ => Some("99+".to_string()),
    }
}

fn change(pct: Option<f64>) -> String {
    pct.map(format_percentage_change)
        .unwrap_or_else(|| "-".to_string())
}

pub fn top_list(coins: &[Cryptocurrency], currency: &str) -> String {
    let mut out = String::new();
    for c in coins {
        let rank = c
            .market_cap_rank
            .map(|r| r.to_string())
            .unwrap_or_else(|| "-".to_string());
        let _ = writeln!(
            out,
            "{rank:>4}  {:<8} {:<20} {:>16} {:>9} {:>10}",
            c.symbol.to_uppercase(),
            c.name,
            format_price(c.current_price, currency),
            change(c.price_change_percentage_24h),
            format_market_cap(c.market_cap, currency),
        );
    }
    out
}

pub fn detail(d: &CryptocurrencyDetail, currency: &str) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{} ({})", d.name, d.symbol.to_uppercase());
    let _ = writeln!(out, "  price       {}", format_price(d.current_price, currency));
    let _ = writeln!(out, "  24h         {}", change(d.price_change_percentage_24h));
    let _ = writeln!(out, "  7d          {}", change(d.price_change_percentage_7d));
    let _ = writeln!(out, "  30d         {}", change(d.price_change_percentage_30d));
    let _ = writeln!(out, "  market cap  {}", format_market_cap(d.market_cap, currency));
    let _ = writeln!(out, "  volume      {}", format_market_cap(d.total_volume, currency));
    if let (Some(hi), Some(lo)) = (d.high_24h, d.low_24h) {
        let _ = writeln!(
            out,
            "  24h range   {} - {}",
            format_price(lo, currency),
            format_price(hi, currency)
        );
    }
    if let Some(supply) = d.circulating_supply {
        let _ = writeln!(out, "  circulating {supply:.0}");
    }
    out
}

pub fn chart(window: ChartWindow, points: &[ChartDataPoint]) -> String {
    let (Some(first), Some(last)) = (points.first(), points.last()) else {
        return format!("{}: {NO_DATA}\n", window.label());
    };

    let (lo, hi) = points
        .iter()
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), p| {
            (lo.min(p.value), hi.max(p.value))
        });
    let change_pct = if first.value != 0.0 {
        (last.value - first.value) / first.value * 100.0
    } else {
        0.0
    };

    format!(
        "{}: {} points, {} .. {}\n  low {:.2}  high {:.2}  last {:.2}  change {}\n",
        window.label(),
        points.len(),
        first.date.format("%Y-%m-%d %H:%M"),
        last.date.format("%Y-%m-%d %H:%M"),
        lo,
        hi,
        last.value,
        format_percentage_change(change_pct),
    )
}

pub fn alert(a: &Alert, currency: &str) -> String {
    format!(
        "{}  {} ({})  {} {}  created {}",
        a.id,
        a.asset_name,
        a.asset_id,
        a.direction,
        format_price(a.target_price, currency),
        a.created_at.format("%Y-%m-%d %H:%M:%S"),
    )
}

pub fn triggered(t: &TriggeredAlert, currency: &str) -> String {
    format!(
        "{} crossed {} {} at {} ({})",
        t.alert.asset_name,
        t.alert.direction,
        format_price(t.alert.target_price, currency),
        format_price(t.triggered_price, currency),
        t.triggered_at.format("%Y-%m-%d %H:%M:%S"),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn badge_hides_zero_and_caps_at_99() {
        assert_eq!(badge(0), None);
        assert_eq!(badge(7).as_deref(), Some("7"));
        assert_eq!(badge(99).as_deref(), Some("99"));
        assert_eq!(badge(100).as_deref(), Some("99+"));
    }

    #[test]
    fn empty_chart_reports_no_data() {
        assert_eq!(chart(ChartWindow::OneDay, &[]), "1D: data not available\n");
    }

    #[test]
    fn prices_follow_the_quote_currency() {
        let coin = Cryptocurrency {
            id: "bitcoin".into(),
            symbol: "btc".into(),
            name: "Bitcoin".into(),
            image: String::new(),
            current_price: dec!(45000),
            market_cap: 8.8e11,
            market_cap_rank: Some(1),
            price_change_percentage_24h: Some(-1.25),
        };

        let eur = top_list(std::slice::from_ref(&coin), "eur");
        assert!(eur.contains("€45,000.00"), "{eur}");
        assert!(eur.contains("€880.00B"), "{eur}");
        assert!(!eur.contains('$'), "{eur}");

        let chf = top_list(&[coin], "chf");
        assert!(chf.contains("45,000.00 CHF"), "{chf}");
    }
}
