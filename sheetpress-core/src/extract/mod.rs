//! Product context extraction from materialized sheet rows

use rayon::prelude::*;
use serde::Serialize;
use std::collections::BTreeMap;

use crate::error::IngestError;
use crate::reader::{self, CellValue, SheetData, Workbook};

pub mod mapping;
pub mod specs;

pub use mapping::{ColumnMapping, ResolvedColumns};
pub use specs::{SpecValue, Specifications, mine_specifications};

/// Separator between a product's name and the rest of its description
const NAME_SEPARATOR: &str = " - ";

/// Structured record derived from one spreadsheet row
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProductContext {
    pub product_name: String,
    pub product_number: String,
    pub description: String,
    /// Name of the sheet the row came from
    pub category: String,
    pub warranty: String,
    /// Raw price cell, never coerced
    pub price: Option<CellValue>,
    pub metadata: ProductMetadata,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProductMetadata {
    pub is_subscription: bool,
    pub is_service: bool,
    pub specifications: Specifications,
}

/// Extract one context per data row that has at least one non-blank cell
pub fn extract_contexts(
    sheet: &SheetData,
    category: &str,
    mapping: &ColumnMapping,
) -> Vec<ProductContext> {
    let columns = mapping.resolve(&sheet.headers);

    sheet
        .rows
        .iter()
        .filter(|row| !row.iter().all(|cell| cell.is_falsy()))
        .map(|row| build_context(row, &columns, category))
        .collect()
}

/// Extract contexts for every sheet of a workbook, keyed by sheet name.
///
/// Sheets that cannot be materialized are returned as errors in place.
pub fn extract_workbook_contexts(
    workbook: &Workbook,
    mapping: &ColumnMapping,
) -> BTreeMap<String, Result<Vec<ProductContext>, IngestError>> {
    workbook
        .sheet_names()
        .par_iter()
        .map(|name| {
            let contexts = reader::materialize(workbook, name)
                .map(|sheet| extract_contexts(&sheet, name, mapping));
            (name.to_string(), contexts)
        })
        .collect()
}

fn build_context(row: &[CellValue], columns: &ResolvedColumns, category: &str) -> ProductContext {
    let product_number = text_field(row, columns.product_number);
    let description = text_field(row, columns.description);
    let warranty = text_field(row, columns.warranty);
    let price = columns
        .price
        .and_then(|col| row.get(col))
        .filter(|cell| !cell.is_falsy())
        .cloned();

    let lowered = description.to_lowercase();
    let metadata = ProductMetadata {
        is_subscription: lowered.contains("subscription"),
        is_service: lowered.contains("service"),
        specifications: mine_specifications(&description),
    };

    ProductContext {
        product_name: product_name(&description, &product_number),
        product_number,
        description,
        category: category.to_string(),
        warranty,
        price,
        metadata,
    }
}

/// Cell text at `col`, or an empty string when absent or blank
fn text_field(row: &[CellValue], col: Option<usize>) -> String {
    col.and_then(|c| row.get(c))
        .filter(|cell| !cell.is_falsy())
        .map(|cell| cell.to_string())
        .unwrap_or_default()
}

/// Text before the first separator, else the product number
fn product_name(description: &str, product_number: &str) -> String {
    match description.split_once(NAME_SEPARATOR) {
        Some((name, _)) if !name.is_empty() => name.to_string(),
        _ => product_number.to_string(),
    }
}

/// Display summary of one sheet's extracted contexts
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SheetSummary {
    pub total_products: usize,
    /// Distinct categories, first-seen order
    pub categories: Vec<String>,
    pub columns_used: Vec<String>,
    /// Key facts of the first product
    pub important_points: Vec<String>,
}

impl SheetSummary {
    pub fn new(headers: &[String], contexts: &[ProductContext]) -> Self {
        let mut categories: Vec<String> = Vec::new();
        for context in contexts {
            if !categories.contains(&context.category) {
                categories.push(context.category.clone());
            }
        }

        Self {
            total_products: contexts.len(),
            categories,
            columns_used: headers.to_vec(),
            important_points: contexts.first().map(important_points).unwrap_or_default(),
        }
    }
}

fn important_points(first: &ProductContext) -> Vec<String> {
    let mut points = Vec::new();
    let fields = [
        ("Product Name", first.product_name.clone()),
        ("Product Number", first.product_number.clone()),
        ("Category", first.category.clone()),
        (
            "Price",
            first.price.as_ref().map(|p| p.to_string()).unwrap_or_default(),
        ),
        ("Warranty", first.warranty.clone()),
        ("Description", first.description.clone()),
    ];
    for (label, value) in fields {
        if !value.is_empty() {
            points.push(format!("{}: \"{}\"", label, value));
        }
    }
    points
}

#[cfg(test)]
mod tests {
    use super::*;

    fn text(s: &str) -> CellValue {
        CellValue::Text(s.to_string())
    }

    fn headers() -> Vec<String> {
        ["Product Number", "Description", "Price", "Warranty"]
            .iter()
            .map(|s| s.to_string())
            .collect()
    }

    fn extract(rows: Vec<Vec<CellValue>>) -> Vec<ProductContext> {
        let sheet = SheetData::new("Laptops", headers(), rows);
        extract_contexts(&sheet, "Laptops", &ColumnMapping::default())
    }

    #[test]
    fn test_product_name_from_description() {
        let contexts = extract(vec![vec![
            text("PN-001"),
            text("Laptop X1 - 14in"),
            CellValue::Number(1299.0),
            text("3 Year"),
        ]]);

        assert_eq!(contexts.len(), 1);
        let ctx = &contexts[0];
        assert_eq!(ctx.product_name, "Laptop X1");
        assert_eq!(ctx.product_number, "PN-001");
        assert_eq!(ctx.description, "Laptop X1 - 14in");
        assert_eq!(ctx.category, "Laptops");
        assert_eq!(ctx.warranty, "3 Year");
        assert_eq!(ctx.price, Some(CellValue::Number(1299.0)));
    }

    #[test]
    fn test_product_name_falls_back_to_number() {
        let contexts = extract(vec![
            vec![text("PN-001"), text("")],
            vec![text("PN-002"), text("Docking station")],
            vec![text("PN-003"), text(" - spare part")],
        ]);

        let names: Vec<_> = contexts.iter().map(|c| c.product_name.as_str()).collect();
        assert_eq!(names, vec!["PN-001", "PN-002", "PN-003"]);
    }

    #[test]
    fn test_blank_rows_are_skipped() {
        let contexts = extract(vec![
            vec![CellValue::Empty, text(""), CellValue::Number(0.0)],
            Vec::new(),
            vec![text("PN-001")],
        ]);
        assert_eq!(contexts.len(), 1);
        assert_eq!(contexts[0].product_number, "PN-001");
    }

    #[test]
    fn test_error_only_rows_are_skipped() {
        let contexts = extract(vec![
            vec![
                CellValue::Error("#N/A".to_string()),
                CellValue::Error("#REF!".to_string()),
            ],
            vec![
                text("PN-001"),
                text("Dock"),
                CellValue::Error("#VALUE!".to_string()),
                CellValue::Error("#N/A".to_string()),
            ],
        ]);

        assert_eq!(contexts.len(), 1);
        assert_eq!(contexts[0].product_number, "PN-001");
        assert_eq!(contexts[0].price, None);
        assert_eq!(contexts[0].warranty, "");
    }

    #[test]
    fn test_price_is_verbatim() {
        let contexts = extract(vec![
            vec![text("PN-001"), text("A"), text("$1,299")],
            vec![text("PN-002"), text("B")],
        ]);
        assert_eq!(contexts[0].price, Some(text("$1,299")));
        assert_eq!(contexts[1].price, None);
    }

    #[test]
    fn test_metadata_flags() {
        let contexts = extract(vec![
            vec![text("SUB-1"), text("Cloud Subscription - 1 year")],
            vec![text("SVC-1"), text("On-site SERVICE pack")],
        ]);
        assert!(contexts[0].metadata.is_subscription);
        assert!(!contexts[0].metadata.is_service);
        assert!(contexts[1].metadata.is_service);
        assert!(!contexts[1].metadata.is_subscription);
    }

    #[test]
    fn test_unmapped_headers_yield_empty_fields() {
        let sheet = SheetData::new(
            "Misc",
            vec!["SKU".to_string(), "Details".to_string()],
            vec![vec![text("X-1"), text("Cable - 2m")]],
        );
        let contexts = extract_contexts(&sheet, "Misc", &ColumnMapping::default());

        assert_eq!(contexts.len(), 1);
        assert_eq!(contexts[0].product_number, "");
        assert_eq!(contexts[0].description, "");
        assert_eq!(contexts[0].product_name, "");
        assert_eq!(contexts[0].price, None);
    }

    #[test]
    fn test_custom_mapping() {
        let sheet = SheetData::new(
            "Misc",
            vec!["SKU".to_string(), "Details".to_string()],
            vec![vec![text("X-1"), text("Cable - 2m, USB")]],
        );
        let mapping = ColumnMapping {
            product_number: vec!["SKU".to_string()],
            description: vec!["Details".to_string()],
            ..ColumnMapping::default()
        };
        let contexts = extract_contexts(&sheet, "Misc", &mapping);

        assert_eq!(contexts[0].product_name, "Cable");
        assert_eq!(contexts[0].metadata.specifications.features(), &["USB"]);
    }

    #[test]
    fn test_numeric_product_number_is_text() {
        let contexts = extract(vec![vec![CellValue::Number(1001.0)]]);
        assert_eq!(contexts[0].product_number, "1001");
        assert_eq!(contexts[0].product_name, "1001");
    }

    #[test]
    fn test_summary() {
        let contexts = extract(vec![
            vec![text("PN-001"), text("Laptop X1 - 14in"), CellValue::Number(1299.0)],
            vec![text("PN-002"), text("Dock")],
        ]);
        let summary = SheetSummary::new(&headers(), &contexts);

        assert_eq!(summary.total_products, 2);
        assert_eq!(summary.categories, vec!["Laptops"]);
        assert_eq!(summary.columns_used.len(), 4);
        assert_eq!(
            summary.important_points,
            vec![
                "Product Name: \"Laptop X1\"",
                "Product Number: \"PN-001\"",
                "Category: \"Laptops\"",
                "Price: \"1299\"",
                "Description: \"Laptop X1 - 14in\"",
            ]
        );
    }

    #[test]
    fn test_context_json_shape() {
        let contexts = extract(vec![vec![text("PN-001"), text("Laptop"), CellValue::Number(5.0)]]);
        let json = serde_json::to_value(&contexts[0]).unwrap();
        assert_eq!(json["price"], 5.0);
        assert_eq!(json["metadata"]["is_service"], false);
        assert!(json["metadata"]["specifications"].is_object());
    }
}
