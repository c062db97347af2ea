//! Display helpers shared by every surface that prints market data.

use rust_decimal::{Decimal, RoundingStrategy};

/// Price in `currency` with thousands separators and 2 to 6 fraction
/// digits, e.g. `$50,123.45`, `€0.000123` or `1,250.00 CHF`.
pub fn format_price(price: Decimal, currency: &str) -> String {
    let rounded = price
        .round_dp_with_strategy(6, RoundingStrategy::MidpointAwayFromZero)
        .normalize();

    let sign = if rounded.is_sign_negative() && !rounded.is_zero() {
        "-"
    } else {
        ""
    };
    let text = rounded.abs().to_string();
    let (int_part, frac_part) = text.split_once('.').unwrap_or((&text, ""));

    let mut frac = frac_part.to_string();
    while frac.len() < 2 {
        frac.push('0');
    }

    let amount = format!("{}.{frac}", group_thousands(int_part));
    with_currency(sign, &amount, currency)
}

/// Market cap in `currency`, abbreviated to trillions, billions or millions.
pub fn format_market_cap(market_cap: f64, currency: &str) -> String {
    let amount = if market_cap >= 1e12 {
        format!("{:.2}T", market_cap / 1e12)
    } else if market_cap >= 1e9 {
        format!("{:.2}B", market_cap / 1e9)
    } else if market_cap >= 1e6 {
        format!("{:.2}M", market_cap / 1e6)
    } else {
        group_thousands(&format!("{:.0}", market_cap.max(0.0)))
    };
    with_currency("", &amount, currency)
}

/// Signed percentage with two decimals, e.g. `+2.50%` / `-0.75%`.
pub fn format_percentage_change(change: f64) -> String {
    let sign = if change >= 0.0 { '+' } else { '-' };
    format!("{sign}{:.2}%", change.abs())
}

fn currency_symbol(currency: &str) -> Option<&'static str> {
    match currency.to_ascii_lowercase().as_str() {
        "usd" => Some("$"),
        "eur" => Some("€"),
        "gbp" => Some("£"),
        "jpy" => Some("¥"),
        _ => None,
    }
}

/// Known currencies get a leading symbol, the rest a trailing code.
fn with_currency(sign: &str, amount: &str, currency: &str) -> String {
    match currency_symbol(currency) {
        Some(symbol) => format!("{sign}{symbol}{amount}"),
        None => format!("{sign}{amount} {}", currency.to_ascii_uppercase()),
    }
}

fn group_thousands(digits: &str) -> String {
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn prices_keep_between_two_and_six_decimals() {
        assert_eq!(format_price(dec!(50123.4), "usd"), "$50,123.40");
        assert_eq!(format_price(dec!(1234567), "usd"), "$1,234,567.00");
        assert_eq!(format_price(dec!(0.000123456789), "usd"), "$0.000123");
        assert_eq!(format_price(dec!(0.5), "usd"), "$0.50");
    }

    #[test]
    fn market_caps_are_abbreviated() {
        assert_eq!(format_market_cap(1.5e12, "usd"), "$1.50T");
        assert_eq!(format_market_cap(2.346e9, "usd"), "$2.35B");
        assert_eq!(format_market_cap(7.0e6, "usd"), "$7.00M");
        assert_eq!(format_market_cap(950_000.0, "usd"), "$950,000");
    }

    #[test]
    fn quote_currency_selects_the_symbol() {
        assert_eq!(format_price(dec!(45000.5), "eur"), "€45,000.50");
        assert_eq!(format_price(dec!(-3), "GBP"), "-£3.00");
        assert_eq!(format_market_cap(1.5e12, "jpy"), "¥1.50T");
    }

    #[test]
    fn unknown_currency_is_written_as_a_code() {
        assert_eq!(format_price(dec!(1250), "chf"), "1,250.00 CHF");
        assert_eq!(format_market_cap(7.0e6, "btc"), "7.00M BTC");
    }

    #[test]
    fn percentage_change_is_signed() {
        assert_eq!(format_percentage_change(2.5), "+2.50%");
        assert_eq!(format_percentage_change(-0.754), "-0.75%");
        assert_eq!(format_percentage_change(0.0), "+0.00%");
    }
}
