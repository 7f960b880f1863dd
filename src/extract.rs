//! Field extractors over ordered candidate lists.
//!
//! Each extractor takes the candidate texts for one field, highest-priority
//! first, and returns the first non-empty successfully-parsed value or a
//! defined default. Document-level wrappers collect the candidates from a
//! parsed page via CSS selector lists.

use rust_decimal::Decimal;
use scraper::{Html, Selector};
use std::str::FromStr;

use crate::rules::StockRule;

/// Placeholder line when no description candidate yields text. This is the
/// extractor-level default; render-time "no description" handling is the
/// consumer's concern.
pub const NO_DESCRIPTION: &str = "No description available";

/// Currency symbols recognized in price text, checked per candidate by
/// earliest occurrence.
const CURRENCY_SYMBOLS: [char; 4] = ['₹', '$', '£', '€'];

/// First candidate that strips to a strictly positive decimal wins.
/// Unparseable and non-positive candidates are skipped; the all-miss default
/// is zero, which callers must treat as "unknown".
pub fn price_from_candidates<S: AsRef<str>>(candidates: &[S]) -> Decimal {
    for candidate in candidates {
        let cleaned: String = candidate
            .as_ref()
            .chars()
            .filter(|c| c.is_ascii_digit() || *c == '.')
            .collect();
        if cleaned.is_empty() {
            continue;
        }
        if let Ok(price) = Decimal::from_str(&cleaned) {
            if price > Decimal::ZERO {
                return price;
            }
        }
    }
    Decimal::ZERO
}

/// Scan candidates for a known currency symbol; earliest symbol in the first
/// matching candidate wins, otherwise the configured fallback.
pub fn currency_from_candidates<S: AsRef<str>>(candidates: &[S], fallback: &str) -> String {
    for candidate in candidates {
        if let Some(symbol) = candidate
            .as_ref()
            .chars()
            .find(|c| CURRENCY_SYMBOLS.contains(c))
        {
            return symbol.to_string();
        }
    }
    fallback.to_string()
}

/// Trim candidates, drop empties, keep order. All-empty input yields the
/// single-element placeholder sequence.
pub fn description_from_candidates<S: AsRef<str>>(candidates: &[S]) -> Vec<String> {
    let lines: Vec<String> = candidates
        .iter()
        .map(|c| c.as_ref().trim().to_string())
        .filter(|line| !line.is_empty())
        .collect();
    if lines.is_empty() {
        vec![NO_DESCRIPTION.to_string()]
    } else {
        lines
    }
}

/// Digits of the first candidate containing any, parsed as an integer
/// percentage and clamped to 100. Defaults to 0.
pub fn discount_from_candidates<S: AsRef<str>>(candidates: &[S]) -> u32 {
    for candidate in candidates {
        let digits: String = candidate
            .as_ref()
            .chars()
            .filter(char::is_ascii_digit)
            .collect();
        if digits.is_empty() {
            continue;
        }
        if let Ok(rate) = digits.parse::<u32>() {
            return rate.min(100);
        }
    }
    0
}

/// Collect the trimmed text of every element matched by the selector list,
/// in list order then document order. Invalid selectors are skipped.
pub fn collect_texts(document: &Html, selectors: &[&str]) -> Vec<String> {
    let mut texts = Vec::new();
    for selector in selectors {
        let Ok(parsed) = Selector::parse(selector) else {
            continue;
        };
        for element in document.select(&parsed) {
            texts.push(
                element
                    .text()
                    .collect::<Vec<_>>()
                    .join(" ")
                    .trim()
                    .to_string(),
            );
        }
    }
    texts
}

/// First non-empty trimmed text across the selector list.
pub fn first_text(document: &Html, selectors: &[&str]) -> Option<String> {
    collect_texts(document, selectors)
        .into_iter()
        .find(|text| !text.is_empty())
}

/// First non-empty value of `attribute` across the (selector, attribute)
/// candidate list.
pub fn first_attr(document: &Html, candidates: &[(&str, &str)]) -> Option<String> {
    for (selector, attribute) in candidates {
        let Ok(parsed) = Selector::parse(selector) else {
            continue;
        };
        for element in document.select(&parsed) {
            if let Some(value) = element.value().attr(attribute) {
                if !value.is_empty() {
                    return Some(value.to_string());
                }
            }
        }
    }
    None
}

pub fn extract_price(document: &Html, selectors: &[&str]) -> Decimal {
    price_from_candidates(&collect_texts(document, selectors))
}

pub fn extract_currency(document: &Html, selectors: &[&str], fallback: &str) -> String {
    currency_from_candidates(&collect_texts(document, selectors), fallback)
}

pub fn extract_description(document: &Html, selectors: &[&str]) -> Vec<String> {
    description_from_candidates(&collect_texts(document, selectors))
}

pub fn extract_discount_rate(document: &Html, selectors: &[&str]) -> u32 {
    discount_from_candidates(&collect_texts(document, selectors))
}

/// Stock status: either a presence test over "unavailable" selectors, or a
/// text-containment check against one element.
pub fn is_out_of_stock(document: &Html, rule: &StockRule) -> bool {
    match rule {
        StockRule::SelectorPresent(selectors) => selectors.iter().any(|selector| {
            Selector::parse(selector)
                .map(|parsed| document.select(&parsed).next().is_some())
                .unwrap_or(false)
        }),
        StockRule::TextContains { selector, needle } => first_text(document, &[selector])
            .map(|text| text.to_lowercase().contains(needle))
            .unwrap_or(false),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(&["", "$12.99", "$9.99"], "12.99")]
    #[case(&["", "abc", "$9.99"], "9.99")]
    #[case(&["₹1,299.00"], "1299.00")]
    #[case(&["$0.00", "$5.00"], "5.00")]
    #[case(&["", "abc", ""], "0")]
    #[case(&[], "0")]
    fn test_price_from_candidates(#[case] candidates: &[&str], #[case] expected: &str) {
        let expected = Decimal::from_str(expected).unwrap();
        assert_eq!(price_from_candidates(candidates), expected);
    }

    #[test]
    fn test_price_skips_multi_dot_garbage() {
        // "v1.2.3" strips to "1.2.3" which does not parse
        assert_eq!(
            price_from_candidates(&["v1.2.3", "$7.50"]),
            Decimal::from_str("7.50").unwrap()
        );
    }

    #[rstest]
    #[case(&["₹499"], "₹")]
    #[case(&["", "$ 12.99"], "$")]
    #[case(&["EUR €50"], "€")]
    #[case(&["499.00"], "₹")]
    #[case(&[], "₹")]
    fn test_currency_from_candidates(#[case] candidates: &[&str], #[case] expected: &str) {
        assert_eq!(currency_from_candidates(candidates, "₹"), expected);
    }

    #[test]
    fn test_currency_uses_configured_fallback() {
        assert_eq!(currency_from_candidates(&["no symbol here"], "$"), "$");
    }

    #[test]
    fn test_description_drops_empty_lines() {
        let result = description_from_candidates(&["  ", "Line 1", "Line 2"]);
        assert_eq!(result, vec!["Line 1", "Line 2"]);
    }

    #[test]
    fn test_description_all_empty_yields_placeholder() {
        let result = description_from_candidates(&["", "   "]);
        assert_eq!(result, vec![NO_DESCRIPTION]);
    }

    #[rstest]
    #[case(&["-23%"], 23)]
    #[case(&["", "17% off"], 17)]
    #[case(&["no digits"], 0)]
    #[case(&["250%"], 100)]
    #[case(&[], 0)]
    fn test_discount_from_candidates(#[case] candidates: &[&str], #[case] expected: u32) {
        assert_eq!(discount_from_candidates(candidates), expected);
    }

    const PAGE: &str = r#"
        <html><body>
            <h1 id="title">  Widget Deluxe </h1>
            <div class="price">₹1,499.00</div>
            <div class="price">₹999.00</div>
            <span class="strike">₹1,999.00</span>
            <img id="photo" src="https://img.example/w.jpg">
            <ul><li class="feature">Fast</li><li class="feature">  </li></ul>
            <div id="availability"><span>Currently unavailable.</span></div>
        </body></html>
    "#;

    #[test]
    fn test_collect_texts_orders_by_selector_priority() {
        let document = Html::parse_document(PAGE);
        let texts = collect_texts(&document, &[".strike", ".price"]);
        assert_eq!(texts, vec!["₹1,999.00", "₹1,499.00", "₹999.00"]);
    }

    #[test]
    fn test_first_text_and_first_attr() {
        let document = Html::parse_document(PAGE);

        assert_eq!(
            first_text(&document, &["#missing", "#title"]).as_deref(),
            Some("Widget Deluxe")
        );
        assert_eq!(
            first_attr(&document, &[("#photo", "data-src"), ("#photo", "src")]).as_deref(),
            Some("https://img.example/w.jpg")
        );
    }

    #[test]
    fn test_extract_price_prefers_first_selector() {
        let document = Html::parse_document(PAGE);
        assert_eq!(
            extract_price(&document, &[".price", ".strike"]),
            Decimal::from_str("1499.00").unwrap()
        );
    }

    #[test]
    fn test_stock_rules() {
        let document = Html::parse_document(PAGE);

        assert!(is_out_of_stock(
            &document,
            &StockRule::TextContains {
                selector: "#availability span",
                needle: "currently unavailable",
            }
        ));
        assert!(!is_out_of_stock(
            &document,
            &StockRule::SelectorPresent(&[".soldOut", ".out-of-stock"])
        ));
        assert!(is_out_of_stock(
            &document,
            &StockRule::SelectorPresent(&[".soldOut", ".price"])
        ));
    }

    #[test]
    fn test_extract_description_from_document() {
        let document = Html::parse_document(PAGE);
        assert_eq!(extract_description(&document, &[".feature"]), vec!["Fast"]);
        assert_eq!(
            extract_description(&document, &[".no-such"]),
            vec![NO_DESCRIPTION]
        );
    }
}
