//! Output formatters for sheets, findings, contexts and history

use anyhow::Result;
use colored::*;
use serde::Serialize;
use sheetpress_core::extract::{SpecValue, SheetSummary};
use sheetpress_core::history::HistoryItem;
use sheetpress_core::{
    FindingKind, GateDecision, IngestError, PreviewSession, ProductContext, Severity,
    ValidationFinding,
};
use std::collections::BTreeMap;
use std::path::Path;

/// Widest a preview column is allowed to get
const MAX_CELL_WIDTH: usize = 24;

pub fn print_sheets(file_path: &Path, names: &[&str]) {
    println!("{}", format!("Workbook: {}", file_path.display()).bold());
    for (i, name) in names.iter().enumerate() {
        println!("  {} {}", format!("{}.", i + 1).bright_black(), name.cyan());
    }
}

/// Print findings grouped by kind, followed by the gate outcome
pub fn print_findings(file_path: &Path, session: &PreviewSession, decision: &GateDecision) {
    print!("{}", format!("Validating: {}", file_path.display()).bold());
    if let Some(sheet) = session.selected_sheet() {
        print!(" {} {}", "Sheet:".bold(), sheet.cyan().bold());
    }
    println!();
    println!();

    let findings = session.findings();
    if findings.is_empty() {
        println!("{}", "✓ No issues found!".green().bold());
        return;
    }

    let mut by_kind: BTreeMap<&str, Vec<&ValidationFinding>> = BTreeMap::new();
    for finding in findings {
        by_kind.entry(kind_title(finding.kind)).or_default().push(finding);
    }
    for (title, group) in &by_kind {
        println!("{}", title.bold().underline());
        for finding in group {
            print_finding(finding, 1);
        }
        println!();
    }

    println!("{}", "Summary:".bold().underline());
    println!("  {} {}", "Findings:".bold(), findings.len());
    match decision {
        GateDecision::Proceed => println!("  {}", "Conversion allowed".green()),
        GateDecision::Blocked(blocking) => println!(
            "  {} {}",
            "Conversion blocked by".red().bold(),
            blocking.len()
        ),
    }
}

fn kind_title(kind: FindingKind) -> &'static str {
    match kind {
        FindingKind::EmptyColumn => "Empty columns:",
        FindingKind::FormatError => "Format errors:",
    }
}

fn severity_label(severity: Severity) -> ColoredString {
    match severity {
        Severity::Error => "ERROR".red().bold(),
        Severity::Warning => "WARN".yellow().bold(),
        Severity::Info => "INFO".blue().bold(),
    }
}

fn print_finding(finding: &ValidationFinding, indent: usize) {
    let indent_str = "  ".repeat(indent);
    print!(
        "{}{} [{}] {}",
        indent_str,
        severity_label(finding.severity),
        finding.rule_id.bright_black(),
        finding.message
    );
    if let Some(rows) = &finding.affected_rows {
        let rows: Vec<String> = rows.iter().map(|r| r.to_string()).collect();
        print!(" {}", format!("(rows {})", rows.join(", ")).bright_black());
    }
    println!();
}

/// Print findings in JSON format
pub fn print_findings_json(
    file_path: &Path,
    session: &PreviewSession,
    decision: &GateDecision,
) -> Result<()> {
    let findings = session.findings();
    let output = serde_json::json!({
        "file": file_path.display().to_string(),
        "sheet": session.selected_sheet(),
        "findings": findings,
        "blocked": decision.is_blocked(),
        "summary": {
            "total": findings.len(),
            "empty": findings.iter().filter(|f| f.kind == FindingKind::EmptyColumn).count(),
            "format": findings.iter().filter(|f| f.kind == FindingKind::FormatError).count(),
        }
    });

    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}

/// Print the previewed sheet as a table. Cells of flagged rows are shown in
/// red, columns reported empty get a yellow header.
pub fn print_preview(session: &PreviewSession, max_rows: usize) {
    let Some(sheet) = session.preview() else {
        for finding in session.findings() {
            print_finding(finding, 0);
        }
        return;
    };
    let findings = session.findings();

    println!(
        "{} {} {}",
        "Sheet:".bold(),
        sheet.name.cyan().bold(),
        format!("({} rows)", sheet.rows.len()).bright_black()
    );
    let others: Vec<&str> = session
        .sheet_names()
        .into_iter()
        .filter(|name| *name != sheet.name)
        .collect();
    if !others.is_empty() {
        println!("{} {}", "Other sheets:".bright_black(), others.join(", "));
    }
    println!();

    let widths: Vec<usize> = sheet
        .headers
        .iter()
        .enumerate()
        .map(|(col, header)| {
            sheet
                .column(col)
                .take(max_rows)
                .map(|cell| cell.to_string().chars().count())
                .chain(std::iter::once(header.chars().count()))
                .max()
                .unwrap_or(0)
                .min(MAX_CELL_WIDTH)
        })
        .collect();

    let header_line: Vec<String> = sheet
        .headers
        .iter()
        .zip(&widths)
        .map(|(header, width)| {
            let text = pad(header, *width);
            let empty = findings
                .iter()
                .any(|f| f.kind == FindingKind::EmptyColumn && &f.column == header);
            if empty {
                text.yellow().bold().to_string()
            } else {
                text.bold().to_string()
            }
        })
        .collect();
    println!("{}", header_line.join(" │ "));

    for (index, _) in sheet.rows.iter().enumerate().take(max_rows) {
        let row_number = index as u32 + 1;
        let cells: Vec<String> = sheet
            .headers
            .iter()
            .zip(&widths)
            .enumerate()
            .map(|(col, (header, width))| {
                let text = pad(&sheet.cell(index, col).to_string(), *width);
                let flagged = findings
                    .iter()
                    .any(|f| &f.column == header && f.covers_row(row_number));
                if flagged {
                    text.red().to_string()
                } else {
                    text
                }
            })
            .collect();
        println!("{}", cells.join(" │ "));
    }

    if sheet.rows.len() > max_rows {
        println!(
            "{}",
            format!("… {} more rows", sheet.rows.len() - max_rows).bright_black()
        );
    }

    if !findings.is_empty() {
        println!();
        for finding in findings {
            print_finding(finding, 0);
        }
    }
}

fn pad(text: &str, width: usize) -> String {
    let count = text.chars().count();
    if count > width {
        let truncated: String = text.chars().take(width.saturating_sub(1)).collect();
        format!("{}…", truncated)
    } else {
        format!("{}{}", text, " ".repeat(width - count))
    }
}

pub fn print_contexts(contexts: &[ProductContext]) {
    if contexts.is_empty() {
        println!("{}", "No products found".yellow());
        return;
    }

    for context in contexts {
        println!(
            "{} {}",
            context.product_name.cyan().bold(),
            format!("[{}]", context.product_number).bright_black()
        );
        if let Some(price) = &context.price {
            println!("  {} {}", "Price:".bold(), price);
        }
        if !context.warranty.is_empty() {
            println!("  {} {}", "Warranty:".bold(), context.warranty);
        }
        let mut flags = Vec::new();
        if context.metadata.is_subscription {
            flags.push("subscription");
        }
        if context.metadata.is_service {
            flags.push("service");
        }
        if !flags.is_empty() {
            println!("  {} {}", "Type:".bold(), flags.join(", "));
        }
        for (key, value) in context.metadata.specifications.iter() {
            let value = match value {
                SpecValue::Text(text) => text.clone(),
                SpecValue::List(list) => list.join(", "),
            };
            println!("  {} {}", format!("{}:", key).bright_black(), value);
        }
    }
    println!();
}

#[derive(Serialize)]
struct ContextsOutput<'a> {
    contexts: &'a [ProductContext],
    summary: Option<SheetSummary>,
}

/// Sheet entry of the workbook-wide JSON output
#[derive(Serialize)]
#[serde(untagged)]
enum SheetOutput<'a> {
    Contexts { contexts: &'a [ProductContext] },
    Error { error: String },
}

// Serialized straight from the structs so specification keys keep their order
pub fn print_contexts_json(contexts: &[ProductContext], summary: Option<SheetSummary>) -> Result<()> {
    let output = ContextsOutput { contexts, summary };
    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}

pub fn print_workbook_contexts(by_sheet: &BTreeMap<String, Result<Vec<ProductContext>, IngestError>>) {
    for (sheet, contexts) in by_sheet {
        println!("{} {}", "Sheet:".bold(), sheet.cyan().bold());
        match contexts {
            Ok(contexts) => print_contexts(contexts),
            Err(e) => println!("  {} {}\n", severity_label(Severity::Error), e),
        }
    }
}

pub fn print_workbook_contexts_json(
    by_sheet: &BTreeMap<String, Result<Vec<ProductContext>, IngestError>>,
) -> Result<()> {
    let output: BTreeMap<&str, SheetOutput> = by_sheet
        .iter()
        .map(|(sheet, contexts)| {
            let entry = match contexts {
                Ok(contexts) => SheetOutput::Contexts { contexts },
                Err(e) => SheetOutput::Error {
                    error: e.to_string(),
                },
            };
            (sheet.as_str(), entry)
        })
        .collect();
    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}

pub fn print_summary(summary: &SheetSummary) {
    println!("{}", "Summary:".bold().underline());
    println!("  {} {}", "Products:".bold(), summary.total_products);
    println!("  {} {}", "Categories:".bold(), summary.categories.join(", "));
    println!("  {} {}", "Columns:".bold(), summary.columns_used.join(", "));
    for point in &summary.important_points {
        println!("  {} {}", "•".bright_black(), point);
    }
}

/// Explain why conversion was refused
pub fn print_blocked(session: &PreviewSession) {
    eprintln!(
        "{}",
        "Please fix validation errors before converting".red().bold()
    );
    if let GateDecision::Blocked(blocking) = session.gate() {
        for finding in &blocking {
            print_finding(finding, 1);
        }
    }
}

pub fn print_published(item: &HistoryItem) {
    println!("{} {}", "✓ Published".green().bold(), item.title.bold());
    if let Some(url) = &item.url {
        println!("  {} {}", "URL:".bold(), url.underline());
    }
}

pub fn print_history(items: &[HistoryItem]) {
    if items.is_empty() {
        println!("{}", "No published pages yet".bright_black());
        return;
    }
    for item in items {
        println!(
            "{} {} {}",
            item.id.bright_black(),
            item.title.bold(),
            item.date.bright_black()
        );
        if let Some(url) = &item.url {
            println!("  {}", url.underline());
        }
    }
}

pub fn print_success(message: &str) {
    println!("{}", format!("✓ {}", message).green());
}

pub fn print_error(message: &str) {
    eprintln!("{} {}", "error:".red().bold(), message);
}
