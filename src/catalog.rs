//! Catalog
//!
//! A catalog is an ordered, read-only mapping from item name to unit price, built from a plain
//! text price list such as:
//!
//! ```text
//! Suco R$ 10,00
//! Água R$ 3,00
//! ```

use std::str::FromStr;

use rust_decimal::Decimal;
use rustc_hash::FxHashMap;
use rusty_money::{
    Money,
    iso::{self, Currency},
};
use thiserror::Error;
use tracing::{debug, warn};

/// Separator between an item name and its price in a price list.
pub const DEFAULT_MARKER: &str = "R$ ";

/// Largest price or payment total accepted from text input.
pub const MAX_AMOUNT: Decimal = Decimal::from_parts(1_000_000_000, 0, 0, false, 0);

/// Non-fatal problems found while parsing a price list.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum CatalogWarning {
    /// The line did not split into exactly a name and a price.
    #[error("line {line}: invalid menu line format: '{text}'")]
    InvalidFormat {
        /// 1-based line number
        line: usize,
        /// Offending line
        text: String,
    },

    /// The line had no item name before the marker.
    #[error("line {line}: missing item name")]
    MissingName {
        /// 1-based line number
        line: usize,
    },

    /// The price fragment was not a number.
    #[error("line {line}: invalid price '{price}' for '{name}'")]
    InvalidPrice {
        /// 1-based line number
        line: usize,
        /// Item name
        name: String,
        /// Unparsed price fragment
        price: String,
    },

    /// The price was below zero.
    #[error("line {line}: negative price {price} for '{name}'")]
    NegativePrice {
        /// 1-based line number
        line: usize,
        /// Item name
        name: String,
        /// Parsed price
        price: Decimal,
    },

    /// The price was above [`MAX_AMOUNT`].
    #[error("line {line}: price {price} for '{name}' is above {max}", max = MAX_AMOUNT)]
    PriceOutOfRange {
        /// 1-based line number
        line: usize,
        /// Item name
        name: String,
        /// Parsed price
        price: Decimal,
    },
}

/// A single priced catalog entry.
#[derive(Debug, Clone, PartialEq)]
pub struct MenuItem {
    name: String,
    price: Money<'static, Currency>,
}

impl MenuItem {
    /// Item name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Unit price
    pub fn price(&self) -> &Money<'static, Currency> {
        &self.price
    }
}

/// Ordered mapping from item name to unit price.
#[derive(Debug, Clone)]
pub struct Catalog {
    items: Vec<MenuItem>,
    index: FxHashMap<String, usize>,
    currency: &'static Currency,
}

impl Catalog {
    /// Create an empty catalog priced in the given currency.
    pub fn new(currency: &'static Currency) -> Self {
        Self {
            items: Vec::new(),
            index: FxHashMap::default(),
            currency,
        }
    }

    /// Insert an item, replacing the price of an existing item with the same name.
    ///
    /// A replaced item keeps its original position. The amount is interpreted in the catalog's
    /// currency.
    pub fn insert(&mut self, name: impl Into<String>, amount: Decimal) {
        let name = name.into();
        let price = Money::from_decimal(amount, self.currency);

        if let Some(existing) = self
            .index
            .get(&name)
            .and_then(|&idx| self.items.get_mut(idx))
        {
            debug!(item = %name, "replacing duplicate catalog item");
            existing.price = price;
            return;
        }

        self.index.insert(name.clone(), self.items.len());
        self.items.push(MenuItem { name, price });
    }

    /// Look up an item's unit price.
    pub fn price(&self, name: &str) -> Option<&Money<'static, Currency>> {
        self.get(name).map(MenuItem::price)
    }

    /// Unit price amount for an item, or zero when the item is unknown.
    pub fn unit_amount(&self, name: &str) -> Decimal {
        self.price(name).map_or(Decimal::ZERO, |price| *price.amount())
    }

    /// Item at a position in insertion order.
    pub fn get_index(&self, idx: usize) -> Option<&MenuItem> {
        self.items.get(idx)
    }

    /// Look up an item by name.
    pub fn get(&self, name: &str) -> Option<&MenuItem> {
        self.index.get(name).and_then(|&idx| self.items.get(idx))
    }

    /// Whether the catalog lists an item with this name.
    pub fn contains(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    /// Iterate items in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = &MenuItem> {
        self.items.iter()
    }

    /// Item names in insertion order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.items.iter().map(MenuItem::name)
    }

    /// Number of items in the catalog.
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Whether the catalog has no items.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Currency every price in this catalog is expressed in.
    pub fn currency(&self) -> &'static Currency {
        self.currency
    }

    /// Express an amount as money in the catalog's currency.
    pub fn money(&self, amount: Decimal) -> Money<'static, Currency> {
        Money::from_decimal(amount, self.currency)
    }
}

/// Result of parsing a price list.
#[derive(Debug, Clone)]
pub struct ParsedCatalog {
    /// Items that parsed successfully
    pub catalog: Catalog,

    /// Lines that were skipped
    pub warnings: Vec<CatalogWarning>,
}

/// Price list parser.
#[derive(Debug, Clone)]
pub struct CatalogParser<'m> {
    marker: &'m str,
    currency: &'static Currency,
}

impl Default for CatalogParser<'_> {
    fn default() -> Self {
        Self::new(iso::BRL)
    }
}

impl<'m> CatalogParser<'m> {
    /// Create a parser for prices in the given currency, using [`DEFAULT_MARKER`].
    pub fn new(currency: &'static Currency) -> Self {
        Self {
            marker: DEFAULT_MARKER,
            currency,
        }
    }

    /// Use a different separator between item names and prices.
    #[must_use]
    pub fn with_marker(mut self, marker: &'m str) -> Self {
        self.marker = marker;
        self
    }

    /// Parse a price list.
    ///
    /// Blank lines are ignored. Malformed lines are skipped, logged and reported in
    /// [`ParsedCatalog::warnings`]; they never abort the parse.
    pub fn parse(&self, text: &str) -> ParsedCatalog {
        let mut catalog = Catalog::new(self.currency);
        let mut warnings = Vec::new();

        for (idx, raw) in text.lines().enumerate() {
            let line = raw.trim();

            if line.is_empty() {
                continue;
            }

            match self.parse_line(idx + 1, line) {
                Ok((name, amount)) => catalog.insert(name, amount),
                Err(warning) => {
                    warn!("{warning}; ignoring line");
                    warnings.push(warning);
                }
            }
        }

        ParsedCatalog { catalog, warnings }
    }

    fn parse_line<'l>(
        &self,
        line: usize,
        text: &'l str,
    ) -> Result<(&'l str, Decimal), CatalogWarning> {
        let mut parts = text.split(self.marker);

        let (Some(name), Some(price), None) = (parts.next(), parts.next(), parts.next()) else {
            return Err(CatalogWarning::InvalidFormat {
                line,
                text: text.to_string(),
            });
        };

        let name = name.trim();

        if name.is_empty() {
            return Err(CatalogWarning::MissingName { line });
        }

        let amount = parse_amount(price).ok_or_else(|| CatalogWarning::InvalidPrice {
            line,
            name: name.to_string(),
            price: price.trim().to_string(),
        })?;

        if amount.is_sign_negative() && !amount.is_zero() {
            return Err(CatalogWarning::NegativePrice {
                line,
                name: name.to_string(),
                price: amount,
            });
        }

        if amount > MAX_AMOUNT {
            return Err(CatalogWarning::PriceOutOfRange {
                line,
                name: name.to_string(),
                price: amount,
            });
        }

        Ok((name, amount))
    }
}

/// Parse a price list priced in BRL, using [`DEFAULT_MARKER`].
pub fn parse_catalog(text: &str) -> ParsedCatalog {
    CatalogParser::default().parse(text)
}

/// Parse a decimal amount, accepting a comma as the decimal separator.
pub fn parse_amount(text: &str) -> Option<Decimal> {
    Decimal::from_str(&text.trim().replace(',', ".")).ok()
}
