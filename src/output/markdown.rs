//! Markdown stock report generation
//!
//! The report lists every item grouped by category badge. Each parent row is
//! followed by the rows of its variations.

use crate::catalog::CatalogItem;
use crate::output::stats::RunStatistics;
use crate::output::OutputResult;
use crate::state::{Badge, StockStatus};
use std::fs::File;
use std::io::Write;
use std::path::Path;

/// Writes the markdown report for `items` to `output_path`
pub fn write_stock_report(
    catalog_name: &str,
    items: &[CatalogItem],
    output_path: &Path,
) -> OutputResult<()> {
    let markdown = format_stock_report(catalog_name, items);

    if let Some(parent) = output_path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }

    let mut file = File::create(output_path)?;
    file.write_all(markdown.as_bytes())?;

    Ok(())
}

/// Formats the stock report as markdown
pub fn format_stock_report(catalog_name: &str, items: &[CatalogItem]) -> String {
    let stats = RunStatistics::from_items(items);
    let mut md = String::new();

    md.push_str(&format!("# {} Stock Report\n\n", catalog_name));

    md.push_str("## Summary\n\n");
    md.push_str(&format!("- **Items**: {}\n", stats.total_items));
    for status in [
        StockStatus::InStock,
        StockStatus::PartiallyOutOfStock,
        StockStatus::OutOfStock,
        StockStatus::ComingSoon,
    ] {
        let count = stats.count_for_status(status);
        if count > 0 {
            md.push_str(&format!("- **{}**: {}\n", status, count));
        }
    }
    md.push_str(&format!(
        "- **Variations**: {} ({} out of stock)\n\n",
        stats.total_variations, stats.out_of_stock_variations
    ));

    for badge in Badge::all() {
        let group: Vec<&CatalogItem> = items.iter().filter(|i| i.badge == badge).collect();
        if group.is_empty() {
            continue;
        }

        md.push_str(&format!("## {} ({})\n\n", badge, group.len()));
        md.push_str("| Product | ID | Status | Page | Position |\n");
        md.push_str("|---------|----|--------|------|----------|\n");

        for item in group {
            md.push_str(&format!(
                "| [{}]({}) | {} | {} | {} | {} |\n",
                escape_cell(&item.name),
                item.source_url,
                item.product_id,
                item.stock_status,
                item.page_number,
                item.position_on_page
            ));

            for variation in &item.variations {
                md.push_str(&format!(
                    "| &nbsp;&nbsp;↳ {} | {} | {} | | |\n",
                    escape_cell(&variation.name),
                    variation.variant_id,
                    variation.stock_status
                ));
            }
        }
        md.push('\n');
    }

    md
}

fn escape_cell(text: &str) -> String {
    text.replace('|', "\\|")
}
