use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

/// A product normalized from one of the mall API's listing shapes.
///
/// Lists of these are cached verbatim, so the field names are part of the
/// persisted format. Prices are decimal strings exactly as the API returned
/// them, e.g. `"12900.00"`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductRecord {
    pub product_no: String,
    pub product_name: String,
    pub summary_description: String,
    pub price: String,
    pub list_image: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sale_price: Option<String>,
    /// Price after applying the configured coupons.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub benefit_price: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub benefit_percentage: Option<String>,
}

/// The single pricing block shown for a product card.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PricePresentation {
    Plain {
        price: Decimal,
    },
    Sale {
        original: Decimal,
        sale: Decimal,
        percent: Option<u32>,
    },
    Benefit {
        original: Decimal,
        benefit: Decimal,
        percent: Option<u32>,
    },
}

/// Parses a price string, tolerating thousands separators and surrounding
/// whitespace. Returns `None` for anything that is not a number.
#[must_use]
pub fn parse_amount(raw: &str) -> Option<Decimal> {
    let cleaned: String = raw.trim().chars().filter(|c| *c != ',').collect();
    if cleaned.is_empty() {
        return None;
    }
    cleaned.parse::<Decimal>().ok()
}

fn round_percent(value: Decimal) -> Option<u32> {
    value
        .round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero)
        .to_u32()
        .filter(|p| *p > 0)
}

fn percent_off(original: Decimal, reduced: Decimal) -> Option<u32> {
    if original <= Decimal::ZERO || reduced >= original || reduced < Decimal::ZERO {
        return None;
    }
    round_percent((original - reduced) / original * Decimal::ONE_HUNDRED)
}

/// Discount percentage to display for `product`.
///
/// Priority: the API's explicit `benefit_percentage`, then the reduction of
/// `benefit_price` against `price`, then the reduction of `sale_price`
/// against `price`. Each candidate is rounded to the nearest whole percent;
/// zero or unparseable candidates fall through to the next.
#[must_use]
pub fn discount_percent(product: &ProductRecord) -> Option<u32> {
    if let Some(pct) = product
        .benefit_percentage
        .as_deref()
        .and_then(parse_amount)
        .and_then(round_percent)
    {
        return Some(pct);
    }

    let original = parse_amount(&product.price)?;

    let from_price = |raw: Option<&str>| raw.and_then(parse_amount).and_then(|p| percent_off(original, p));

    from_price(product.benefit_price.as_deref())
        .or_else(|| from_price(product.sale_price.as_deref()))
}

impl ProductRecord {
    /// Chooses exactly one pricing presentation.
    ///
    /// A coupon benefit below the list price wins over a sale price; a sale
    /// price below the list price wins over the plain price. Returns `None`
    /// when `price` itself cannot be parsed.
    #[must_use]
    pub fn price_presentation(&self) -> Option<PricePresentation> {
        let original = parse_amount(&self.price)?;
        let percent = discount_percent(self);

        let below_original = |raw: Option<&str>| {
            raw.and_then(parse_amount)
                .filter(|p| *p >= Decimal::ZERO && *p < original)
        };

        if let Some(benefit) = below_original(self.benefit_price.as_deref()) {
            return Some(PricePresentation::Benefit {
                original,
                benefit,
                percent,
            });
        }

        if let Some(sale) = below_original(self.sale_price.as_deref()) {
            return Some(PricePresentation::Sale {
                original,
                sale,
                percent,
            });
        }

        Some(PricePresentation::Plain { price: original })
    }

    /// Returns `true` when the upstream payload carried no product number.
    #[must_use]
    pub fn is_placeholder(&self) -> bool {
        self.product_no.is_empty()
    }
}
