//! Report

use std::io;

use rust_decimal::Decimal;
use tabled::{
    builder::Builder,
    grid::config::HorizontalLine,
    settings::{
        Alignment, Color, Style, Theme,
        object::{Columns, Rows},
    },
};
use thiserror::Error;

use crate::{
    allocation::{Allocation, Allocator, Menu, MenuAllocation},
    catalog::Catalog,
};

/// Errors that can occur when writing a report.
#[derive(Debug, Error)]
pub enum ReportError {
    /// Writing to the output failed.
    #[error("failed to write report: {0}")]
    Io(#[from] io::Error),
}

/// Printable breakdown of one allocation.
#[derive(Debug)]
pub struct AllocationReport<'a> {
    title: &'a str,
    allocation: &'a Allocation,
    allocator: &'a Allocator,
}

impl<'a> AllocationReport<'a> {
    /// Create a report for an allocation produced by `allocator`.
    pub fn new(title: &'a str, allocation: &'a Allocation, allocator: &'a Allocator) -> Self {
        Self {
            title,
            allocation,
            allocator,
        }
    }

    /// Write the report as a table followed by a summary.
    ///
    /// # Errors
    ///
    /// Returns a [`ReportError`] if the output cannot be written.
    pub fn write_to(&self, mut out: impl io::Write) -> Result<(), ReportError> {
        let catalog = &self.allocator.primary().catalog;

        writeln!(
            out,
            "\n\x1b[1m{}\x1b[0m (Total: {})",
            self.title,
            catalog.money(self.allocation.total)
        )?;

        let mut builder = Builder::default();
        let mut section_rows = Vec::with_capacity(2);

        builder.push_record(["Qty", "Item", "Unit Price", "Line Total"]);

        let mut row = 1;

        // Filler units only ever land in the secondary order.
        let filler = self
            .allocator
            .filler()
            .filter(|_| self.allocation.filler_units > 0)
            .map(|filler| filler.item.as_str());

        for (menu, result, filler) in [
            (self.allocator.primary(), &self.allocation.primary, None),
            (self.allocator.secondary(), &self.allocation.secondary, filler),
        ] {
            section_rows.push(row);
            row += push_menu_rows(&mut builder, menu, result, filler);
        }

        let mut table = builder.build();
        let mut theme = Theme::from(Style::modern_rounded());
        let separator = HorizontalLine::new(Some('─'), Some('┼'), Some('├'), Some('┤'));

        theme.remove_horizontal_lines();

        for &section_row in &section_rows {
            theme.insert_horizontal_line(section_row, separator);
        }

        table.with(theme);
        table.modify(Rows::first(), Color::BOLD);
        table.modify(Columns::new(2..4), Alignment::right());

        writeln!(out, "{table}")?;

        write_summary(&mut out, self.allocation, catalog)?;

        Ok(())
    }
}

/// Push a section heading and one row per ordered item, returning the number of rows added.
///
/// The row for `filler` is labelled as a filler adjustment.
fn push_menu_rows(
    builder: &mut Builder,
    menu: &Menu,
    result: &MenuAllocation,
    filler: Option<&str>,
) -> usize {
    let catalog = &menu.catalog;

    builder.push_record([
        String::new(),
        format!("{} (target {})", result.label, catalog.money(result.target)),
        String::new(),
        catalog.money(result.amount).to_string(),
    ]);

    if result.order.is_empty() {
        builder.push_record([
            String::new(),
            "No items".to_string(),
            String::new(),
            String::new(),
        ]);

        return 2;
    }

    for (name, units) in result.order.iter() {
        let unit_price = catalog.unit_amount(name);
        let label = if filler == Some(name) {
            format!("{name} (filler)")
        } else {
            name.to_string()
        };

        builder.push_record([
            units.to_string(),
            label,
            catalog.money(unit_price).to_string(),
            catalog
                .money(unit_price.saturating_mul(Decimal::from(units)))
                .to_string(),
        ]);
    }

    result.order.len() + 1
}

fn write_summary(
    out: &mut impl io::Write,
    allocation: &Allocation,
    catalog: &Catalog,
) -> Result<(), ReportError> {
    let lines = [
        (" Allocated:", catalog.money(allocation.allocated()).to_string()),
        (" Filler units:", allocation.filler_units.to_string()),
        (" Gap:", catalog.money(allocation.gap).to_string()),
    ];

    let label_width = lines.iter().map(|(label, _)| label.len()).max().unwrap_or(0);
    let value_width = lines.iter().map(|(_, value)| value.len()).max().unwrap_or(0);

    for (label, value) in lines {
        writeln!(out, "{label:<label_width$} {value:>value_width$}")?;
    }

    writeln!(out)?;

    Ok(())
}
