//! Configuration
//!
//! Allocation settings are read from YAML:
//!
//! ```yaml
//! currency: BRL
//! primary_percent: 20
//! max_iterations: 10000
//! filler:
//!   item: Cebola
//! primary:
//!   label: Bebidas
//!   menu: |
//!     Suco R$ 10,00
//! secondary:
//!   label: Sanduíches
//!   menu: |
//!     X Salada Simples R$ 18,00
//!     Cebola R$ 0.50
//! ```

use std::{fs, path::Path};

use decimal_percentage::Percentage;
use rust_decimal::Decimal;
use rusty_money::{Findable, iso::Currency};
use serde::Deserialize;
use thiserror::Error;

use crate::{
    allocation::{Allocator, DEFAULT_FILLER_UNITS, Filler, GapPolicy, Menu},
    catalog::{CatalogParser, CatalogWarning, DEFAULT_MARKER, parse_amount},
    search::SearchSettings,
};

/// Configuration errors
#[derive(Debug, Error)]
pub enum ConfigError {
    /// IO error reading a config file
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    /// YAML parsing error
    #[error("Failed to parse YAML: {0}")]
    Yaml(#[from] serde_norway::Error),

    /// Unknown currency code
    #[error("Unknown currency code: {0}")]
    UnknownCurrency(String),

    /// Percentage outside 0 to 100
    #[error("Primary percentage must be between 0 and 100, got {0}")]
    InvalidPercent(u8),

    /// Amount that could not be parsed
    #[error("Invalid amount: {0}")]
    InvalidAmount(String),

    /// Menu asking for no items per combination
    #[error("Menu '{0}' must use a subset size of at least 1")]
    ZeroSubsetSize(String),

    /// Menu without any valid items
    #[error("Menu '{0}' has no valid items")]
    EmptyMenu(String),
}

fn default_currency() -> String {
    "BRL".to_string()
}

fn default_primary_percent() -> u8 {
    20
}

fn default_max_iterations() -> usize {
    10_000
}

fn default_restarts() -> usize {
    1
}

fn default_subset_size() -> usize {
    5
}

fn default_marker() -> String {
    DEFAULT_MARKER.to_string()
}

fn default_filler_units() -> u32 {
    DEFAULT_FILLER_UNITS
}

/// Menu section of the config
#[derive(Debug, Clone, Deserialize)]
pub struct MenuConfig {
    /// Display label
    pub label: String,

    /// Price list, one `<name> R$ <price>` per line
    pub menu: String,

    /// Distinct items per starting combination
    #[serde(default = "default_subset_size")]
    pub subset_size: usize,
}

/// Filler section of the config
#[derive(Debug, Clone, Deserialize)]
pub struct FillerConfig {
    /// Filler item name in the secondary menu
    pub item: String,

    /// Most units that may be added
    #[serde(default = "default_filler_units")]
    pub max_units: u32,
}

/// Allocation config
#[derive(Debug, Clone, Deserialize)]
pub struct TallyConfig {
    /// ISO currency code for every price
    #[serde(default = "default_currency")]
    pub currency: String,

    /// Separator between item names and prices
    #[serde(default = "default_marker")]
    pub marker: String,

    /// Share of each total given to the primary menu, in percent
    #[serde(default = "default_primary_percent")]
    pub primary_percent: u8,

    /// Iterations per search trajectory
    #[serde(default = "default_max_iterations")]
    pub max_iterations: usize,

    /// Search trajectories per menu
    #[serde(default = "default_restarts")]
    pub restarts: usize,

    /// Largest accepted gap, as an amount string; any gap is accepted when absent
    #[serde(default)]
    pub gap_tolerance: Option<String>,

    /// Optional filler item
    #[serde(default)]
    pub filler: Option<FillerConfig>,

    /// Primary menu, such as drinks
    pub primary: MenuConfig,

    /// Secondary menu, such as sandwiches
    pub secondary: MenuConfig,
}

/// Allocator built from a config, with any price list warnings.
#[derive(Debug)]
pub struct LoadedConfig {
    /// Ready to use allocator
    pub allocator: Allocator,

    /// Currency of both menus
    pub currency: &'static Currency,

    /// Skipped lines across both menus
    pub warnings: Vec<CatalogWarning>,
}

impl TallyConfig {
    /// Parse a config from YAML.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Yaml`] if the YAML is invalid.
    pub fn from_yaml_str(yaml: &str) -> Result<Self, ConfigError> {
        Ok(serde_norway::from_str(yaml)?)
    }

    /// Read a config from a YAML file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let contents = fs::read_to_string(path)?;

        Self::from_yaml_str(&contents)
    }

    /// Currency named by the config.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::UnknownCurrency`] for an unrecognised code.
    pub fn currency(&self) -> Result<&'static Currency, ConfigError> {
        Currency::find(&self.currency)
            .ok_or_else(|| ConfigError::UnknownCurrency(self.currency.clone()))
    }

    /// Share of each total given to the primary menu.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidPercent`] above 100.
    pub fn primary_share(&self) -> Result<Percentage, ConfigError> {
        if self.primary_percent > 100 {
            return Err(ConfigError::InvalidPercent(self.primary_percent));
        }

        Ok(Percentage::from(
            Decimal::from(self.primary_percent) / Decimal::ONE_HUNDRED,
        ))
    }

    /// Gap policy named by the config.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidAmount`] if the tolerance is not a non-negative amount.
    pub fn gap_policy(&self) -> Result<GapPolicy, ConfigError> {
        let Some(raw) = self.gap_tolerance.as_deref() else {
            return Ok(GapPolicy::Accept);
        };

        match parse_amount(raw) {
            Some(tolerance) if !tolerance.is_sign_negative() => Ok(GapPolicy::Tolerance(tolerance)),
            _ => Err(ConfigError::InvalidAmount(raw.to_string())),
        }
    }

    /// Build the allocator described by this config.
    ///
    /// # Errors
    ///
    /// Returns an error if any setting is invalid or a menu has no valid items.
    pub fn load(&self) -> Result<LoadedConfig, ConfigError> {
        let currency = self.currency()?;
        let parser = CatalogParser::new(currency).with_marker(&self.marker);
        let mut warnings = Vec::new();

        let primary = self.menu(&self.primary, &parser, &mut warnings)?;
        let secondary = self.menu(&self.secondary, &parser, &mut warnings)?;

        let mut allocator = Allocator::new(primary, secondary, self.primary_share()?)
            .with_gap_policy(self.gap_policy()?);

        if let Some(filler) = &self.filler {
            allocator = allocator.with_filler(Filler {
                item: filler.item.clone(),
                max_units: filler.max_units,
            });
        }

        Ok(LoadedConfig {
            allocator,
            currency,
            warnings,
        })
    }

    fn menu(
        &self,
        config: &MenuConfig,
        parser: &CatalogParser<'_>,
        warnings: &mut Vec<CatalogWarning>,
    ) -> Result<Menu, ConfigError> {
        if config.subset_size == 0 {
            return Err(ConfigError::ZeroSubsetSize(config.label.clone()));
        }

        let parsed = parser.parse(&config.menu);
        warnings.extend(parsed.warnings);

        if parsed.catalog.is_empty() {
            return Err(ConfigError::EmptyMenu(config.label.clone()));
        }

        Ok(Menu {
            label: config.label.clone(),
            catalog: parsed.catalog,
            search: SearchSettings::new(config.subset_size, self.max_iterations)
                .with_restarts(self.restarts),
        })
    }
}
