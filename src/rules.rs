//! Per-retailer extraction rulesets.
//!
//! Each supported retailer maps to one `SourceRules` value: ordered candidate
//! selectors per field plus the render/wait policy. Adding a retailer means
//! adding a ruleset and a thin adapter; extractor logic stays untouched.

use serde::{Deserialize, Serialize};
use url::Url;

/// How a source signals "out of stock".
#[derive(Debug, Clone)]
pub enum StockRule {
    /// Any of these selectors present in the document.
    SelectorPresent(&'static [&'static str]),
    /// One element whose lowercased text contains the needle.
    TextContains {
        selector: &'static str,
        needle: &'static str,
    },
}

/// Where an image URL lives.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageRule {
    /// Plain attribute value, first match wins.
    Attr,
    /// Attribute holds a JSON object keyed by image URL; take the first key.
    JsonKeys,
}

#[derive(Debug, Clone)]
pub struct SourceRules {
    pub title: &'static [&'static str],
    pub current_price: &'static [&'static str],
    pub original_price: &'static [&'static str],
    pub currency: &'static [&'static str],
    pub image: &'static [(&'static str, &'static str)],
    pub image_rule: ImageRule,
    pub description: &'static [&'static str],
    pub discount: &'static [&'static str],
    pub out_of_stock: StockRule,
    /// Selector list the rendered page must satisfy before extraction.
    /// `None` for static-HTML sources.
    pub wait_for: Option<&'static str>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Retailer {
    Amazon,
    Flipkart,
    Snapdeal,
}

impl Retailer {
    /// Dispatch by URL host. The adapter itself does not re-validate that a
    /// URL belongs to its retailer.
    pub fn from_url(url: &str) -> Option<Retailer> {
        let parsed = Url::parse(url).ok()?;
        let host = parsed.host_str()?.to_lowercase();
        if host.contains("amazon") {
            Some(Retailer::Amazon)
        } else if host.contains("flipkart") {
            Some(Retailer::Flipkart)
        } else if host.contains("snapdeal") {
            Some(Retailer::Snapdeal)
        } else {
            None
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Retailer::Amazon => "amazon",
            Retailer::Flipkart => "flipkart",
            Retailer::Snapdeal => "snapdeal",
        }
    }

    /// Whether the source needs a rendered DOM before extraction.
    pub fn requires_render(&self) -> bool {
        self.rules().wait_for.is_some()
    }

    pub fn rules(&self) -> &'static SourceRules {
        match self {
            Retailer::Amazon => &AMAZON,
            Retailer::Flipkart => &FLIPKART,
            Retailer::Snapdeal => &SNAPDEAL,
        }
    }
}

static AMAZON: SourceRules = SourceRules {
    title: &["#productTitle"],
    current_price: &[
        ".priceToPay span.a-price-whole",
        ".aok-offscreen",
        ".apexPriceToPay .a-offscreen",
        ".a.size.base.a-color-price",
        ".a-button-selected .a-color-base",
        "#corePrice_feature_div .a-price-whole",
    ],
    original_price: &[
        "#priceblock_ourprice",
        ".a-price.a-text-price span.a-offscreen",
        "#listPrice",
        "#priceblock_dealprice",
        ".a-size-base.a-color-price",
        "#corePriceDisplay_desktop_feature_div .a-text-strike",
    ],
    currency: &[".a-price-symbol"],
    image: &[
        ("#imgBlkFront", "data-a-dynamic-image"),
        ("#landingImage", "data-a-dynamic-image"),
    ],
    image_rule: ImageRule::JsonKeys,
    description: &[
        "#productDescription p",
        "#feature-bullets ul li span.a-list-item",
    ],
    discount: &[".savingsPercentage"],
    out_of_stock: StockRule::TextContains {
        selector: "#availability span",
        needle: "currently unavailable",
    },
    wait_for: None,
};

static FLIPKART: SourceRules = SourceRules {
    title: &[".C7fE3F", ".B_NuCI", ".Nx9bqj", ".s1Q9rs"],
    current_price: &["._16Jk6d", "._30jeq3", "._1_WHN1", ".Nx9bqj"],
    original_price: &["._3I9_wc", "._3qQ9m1", "._1V_ZGU"],
    currency: &["._16Jk6d", "._30jeq3", "._1_WHN1"],
    image: &[
        ("._2r_T1I", "src"),
        ("._396cs4", "src"),
        (".CXW8mj img", "src"),
        (".K4WLMj img", "src"),
    ],
    image_rule: ImageRule::Attr,
    description: &[
        ".X3BRps .row",
        "._1xgFaf .row",
        "._2o-xpa ._2vZ0mK",
        "._1AtVbE",
    ],
    discount: &["._3Ay6Sb span", "._1V_ZGU span"],
    out_of_stock: StockRule::SelectorPresent(&["._16FRp0", "._1lRcqv", ".aMaAEs"]),
    wait_for: Some(".C7fE3F, .B_NuCI, .Nx9bqj, .s1Q9rs"),
};

static SNAPDEAL: SourceRules = SourceRules {
    title: &[
        ".pdp-e-i-head",
        ".pdp-product-name",
        ".pdp-title",
        ".product-title",
    ],
    current_price: &[".payBlkBig", ".pdp-final-price", ".product-price"],
    original_price: &[".pdpCutPrice", ".strike", ".pdp-mrp", ".pdp-original-price"],
    currency: &[".payBlkBig", ".pdp-final-price", ".product-price"],
    image: &[
        (".cloudzoom", "src"),
        (".pdp-main-img", "src"),
        (".product-image img", "src"),
    ],
    image_rule: ImageRule::Attr,
    description: &[
        ".detailssubbox .p-key-features li",
        ".pdp-desc",
        ".product-desc .desc-text",
    ],
    discount: &[".pdp-discount", ".discount-value", ".pdp-offer"],
    out_of_stock: StockRule::SelectorPresent(&[".soldOut", ".out-of-stock", ".not-available"]),
    wait_for: Some(".pdp-e-i-head, .pdp-product-name, .pdp-title, .product-title"),
};
