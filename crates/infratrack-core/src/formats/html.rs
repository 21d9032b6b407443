//! HTML table import, for reports exported from web portals

use async_trait::async_trait;
use scraper::{ElementRef, Html, Selector};

use crate::error::{InfraTrackError, Result};
use crate::formats::tabular::network_from_records;
use crate::formats::{FormatImporter, ImportContext, ImportOutcome};
use crate::schema::{records_from_rows, CellValue};

/// Reads the first `<table>` of a page as a header row plus data rows
pub struct HtmlTableImporter;

fn selector(css: &str) -> Result<Selector> {
    Selector::parse(css).map_err(|e| InfraTrackError::format("HTML table", format!("bad selector {}: {:?}", css, e)))
}

fn cell_text(cell: ElementRef<'_>) -> String {
    cell.text().collect::<String>().trim().to_string()
}

/// Whether `row` belongs to `table` itself rather than a table nested in it
fn owned_by(row: &ElementRef<'_>, table: &ElementRef<'_>) -> bool {
    row.ancestors()
        .filter_map(ElementRef::wrap)
        .find(|e| e.value().name() == "table")
        .is_some_and(|owner| owner.id() == table.id())
}

/// Direct child cells of a row whose tag is one of `tags`
fn cells<'a>(row: ElementRef<'a>, tags: &'a [&'a str]) -> impl Iterator<Item = ElementRef<'a>> + 'a {
    row.children()
        .filter_map(ElementRef::wrap)
        .filter(move |c| tags.contains(&c.value().name()))
}

#[async_trait]
impl FormatImporter for HtmlTableImporter {
    fn import(&self, content: &[u8], ctx: &ImportContext) -> Result<ImportOutcome> {
        let text = String::from_utf8_lossy(content);
        let doc = Html::parse_document(&text);

        let table_sel = selector("table")?;
        let row_sel = selector("tr")?;

        let Some(table) = doc.select(&table_sel).next() else {
            tracing::debug!("No <table> element found");
            return network_from_records(&[], self.format_name(), ctx);
        };

        let mut rows = table.select(&row_sel).filter(|row| owned_by(row, &table));
        let Some(header_row) = rows.next() else {
            return network_from_records(&[], self.format_name(), ctx);
        };

        let headers: Vec<String> = cells(header_row, &["th", "td"]).map(cell_text).collect();
        let data: Vec<Vec<CellValue>> = rows
            .map(|row| cells(row, &["td"]).map(|c| CellValue::from(cell_text(c))).collect())
            .collect();

        let records = records_from_rows(&headers, data);
        network_from_records(&records, self.format_name(), ctx)
    }

    fn supported_extensions(&self) -> &[&str] {
        &["html", "htm"]
    }

    fn format_name(&self) -> &str {
        "HTML table"
    }
}
