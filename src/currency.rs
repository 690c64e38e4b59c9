//! Currency table, locale defaults, and money formatting

use rust_decimal::Decimal;

/// One supported currency.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Currency {
    pub code: &'static str,
    pub symbol: &'static str,
    pub name: &'static str,
}

/// Supported currencies, in display order.
pub const CURRENCIES: &[Currency] = &[
    Currency { code: "USD", symbol: "$", name: "US Dollar" },
    Currency { code: "EUR", symbol: "€", name: "Euro" },
    Currency { code: "GBP", symbol: "£", name: "British Pound" },
    Currency { code: "JPY", symbol: "¥", name: "Japanese Yen" },
    Currency { code: "CAD", symbol: "CA$", name: "Canadian Dollar" },
    Currency { code: "AUD", symbol: "A$", name: "Australian Dollar" },
    Currency { code: "CHF", symbol: "CHF", name: "Swiss Franc" },
    Currency { code: "SEK", symbol: "kr", name: "Swedish Krona" },
    Currency { code: "INR", symbol: "₹", name: "Indian Rupee" },
    Currency { code: "BRL", symbol: "R$", name: "Brazilian Real" },
];

/// Language-part of a locale tag mapped to a default currency code.
const LOCALE_DEFAULTS: &[(&str, &str)] = &[
    ("en-US", "USD"),
    ("en-GB", "GBP"),
    ("en-CA", "CAD"),
    ("en-AU", "AUD"),
    ("de", "EUR"),
    ("fr", "EUR"),
    ("es", "EUR"),
    ("it", "EUR"),
    ("nl", "EUR"),
    ("ja", "JPY"),
    ("sv", "SEK"),
    ("hi", "INR"),
    ("pt-BR", "BRL"),
];

/// Look up a currency by its three-letter code.
pub fn find_currency(code: &str) -> Option<&'static Currency> {
    CURRENCIES.iter().find(|c| c.code == code)
}

/// Symbol for a code, falling back to the code itself.
pub fn symbol_for(code: &str) -> &str {
    match find_currency(code) {
        Some(c) => c.symbol,
        None => code,
    }
}

/// Default currency code for a locale tag such as `en-GB` or `de_DE.UTF-8`.
///
/// Matching tries the full `lang-REGION` tag first, then the bare language;
/// anything unmatched falls back to USD.
pub fn default_currency_for_locale(locale: &str) -> &'static str {
    let tag = normalize_locale(locale);
    if let Some((_, code)) = LOCALE_DEFAULTS.iter().find(|(l, _)| *l == tag) {
        return code;
    }
    let lang = tag.split('-').next().unwrap_or("");
    LOCALE_DEFAULTS
        .iter()
        .find(|(l, _)| *l == lang)
        .map(|(_, code)| *code)
        .unwrap_or("USD")
}

/// Current locale from the environment (`LC_ALL` beats `LANG`), if any.
pub fn system_locale() -> Option<String> {
    std::env::var("LC_ALL")
        .or_else(|_| std::env::var("LANG"))
        .ok()
        .filter(|v| !v.is_empty() && v != "C" && v != "POSIX")
}

/// Reduce `de_DE.UTF-8` style env locales to a `de-DE` style tag.
fn normalize_locale(locale: &str) -> String {
    let base = locale.split('.').next().unwrap_or(locale);
    base.replace('_', "-")
}

/// Format an amount as `symbol SPACE amount` with two decimals and
/// thousands grouping. Negative amounts use the matching `-symbol SPACE
/// amount` pattern.
pub fn format_money(amount: Decimal, currency_code: &str) -> String {
    let symbol = symbol_for(currency_code);
    let negative = amount.is_sign_negative();
    let rounded = amount.abs().round_dp(2);

    let as_text = format!("{rounded:.2}");
    let (whole, frac) = as_text.split_once('.').unwrap_or((as_text.as_str(), "00"));
    let grouped = group_thousands(whole);

    if negative {
        format!("-{symbol} {grouped}.{frac}")
    } else {
        format!("{symbol} {grouped}.{frac}")
    }
}

fn group_thousands(digits: &str) -> String {
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    let chars: Vec<char> = digits.chars().collect();
    for (i, c) in chars.iter().enumerate() {
        if i > 0 && (chars.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(*c);
    }
    out
}
