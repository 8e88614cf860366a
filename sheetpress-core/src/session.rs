//! Preview session: current file, selected sheet, findings and the
//! convert → publish sequencing.
//!
//! Loads are tagged with a monotonically increasing [`LoadTicket`]. A load
//! completed with anything but the most recent ticket is discarded, so a slow
//! earlier read can never overwrite the result of a later one.

use anyhow::Result;
use log::{debug, warn};

use crate::config::PressConfig;
use crate::error::SessionError;
use crate::extract::{ProductContext, SheetSummary, extract_contexts};
use crate::finding::ValidationFinding;
use crate::policy::GateDecision;
use crate::reader::{self, SheetData, Workbook};
use crate::validator::Validator;

type FindingsObserver = Box<dyn FnMut(&[ValidationFinding]) + Send>;

/// Token identifying one load request
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct LoadTicket(u64);

/// What happened to a completed load
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadOutcome {
    Applied,
    /// A newer load was requested meanwhile; the result was dropped
    Stale,
}

struct LoadedFile {
    name: String,
    bytes: Vec<u8>,
    workbook: Option<Workbook>,
}

pub struct PreviewSession {
    config: PressConfig,
    validator: Validator,
    observer: Option<FindingsObserver>,
    latest_ticket: u64,
    file: Option<LoadedFile>,
    selected_sheet: Option<String>,
    preview: Option<SheetData>,
    findings: Vec<ValidationFinding>,
    converted: bool,
}

impl PreviewSession {
    pub fn new(config: PressConfig) -> Self {
        let validator = Validator::with_config(config.clone());
        Self {
            config,
            validator,
            observer: None,
            latest_ticket: 0,
            file: None,
            selected_sheet: None,
            preview: None,
            findings: Vec::new(),
            converted: false,
        }
    }

    /// Register the callback invoked with the findings of every (re)load
    pub fn on_validation_complete<F>(mut self, observer: F) -> Self
    where
        F: FnMut(&[ValidationFinding]) + Send + 'static,
    {
        self.observer = Some(Box::new(observer));
        self
    }

    /// Start a load request; only the most recent ticket can be applied
    pub fn begin_load(&mut self) -> LoadTicket {
        self.latest_ticket += 1;
        LoadTicket(self.latest_ticket)
    }

    /// Apply the bytes read for `ticket`, unless a newer load was started.
    ///
    /// `sheet` selects the sheet to preview; `None` keeps the current
    /// selection when the new workbook has it, else uses the first sheet.
    /// Unreadable files and sheets become a single finding, never an error.
    pub fn complete_load(
        &mut self,
        ticket: LoadTicket,
        file_name: &str,
        bytes: Vec<u8>,
        sheet: Option<&str>,
    ) -> Result<LoadOutcome> {
        if ticket.0 != self.latest_ticket {
            warn!(
                "discarding stale load of '{}' (ticket {}, latest {})",
                file_name, ticket.0, self.latest_ticket
            );
            return Ok(LoadOutcome::Stale);
        }

        let is_new_file = self
            .file
            .as_ref()
            .is_none_or(|f| f.name != file_name || f.bytes != bytes);
        if is_new_file {
            self.converted = false;
        }

        let workbook = match reader::load_workbook(&bytes) {
            Ok(workbook) => Some(workbook),
            Err(e) => {
                warn!("failed to read '{}': {}", file_name, e);
                None
            }
        };
        self.file = Some(LoadedFile {
            name: file_name.to_string(),
            bytes,
            workbook,
        });

        // A remembered selection carries over only if the new workbook has it
        let remembered = self
            .selected_sheet
            .clone()
            .filter(|name| self.has_sheet(name));
        let requested = sheet.map(str::to_string).or(remembered);
        self.show_sheet(requested)?;
        Ok(LoadOutcome::Applied)
    }

    /// Load a file synchronously, showing `sheet` or the first sheet
    pub fn open_file(&mut self, file_name: &str, bytes: Vec<u8>, sheet: Option<&str>) -> Result<()> {
        self.selected_sheet = None;
        let ticket = self.begin_load();
        self.complete_load(ticket, file_name, bytes, sheet)?;
        Ok(())
    }

    /// Switch the previewed sheet of the current file
    pub fn select_sheet(&mut self, sheet: &str) -> Result<()> {
        if self.file.is_none() {
            return Err(SessionError::NoFile.into());
        }
        // A pending load for the previous selection must not win
        self.begin_load();
        self.show_sheet(Some(sheet.to_string()))
    }

    fn has_sheet(&self, name: &str) -> bool {
        self.workbook().is_some_and(|w| w.get_sheet(name).is_some())
    }

    fn workbook(&self) -> Option<&Workbook> {
        self.file.as_ref().and_then(|f| f.workbook.as_ref())
    }

    /// Materialize and validate `requested`, or the first sheet when `None`
    fn show_sheet(&mut self, requested: Option<String>) -> Result<()> {
        self.preview = None;

        let Some(workbook) = self.workbook() else {
            self.selected_sheet = None;
            self.report(vec![ValidationFinding::unreadable_file()]);
            return Ok(());
        };

        let Some(sheet_name) = requested.or_else(|| workbook.first_sheet_name().map(str::to_string))
        else {
            self.selected_sheet = None;
            self.report(vec![ValidationFinding::unreadable_file()]);
            return Ok(());
        };

        match reader::materialize(workbook, &sheet_name) {
            Ok(sheet) => {
                debug!("previewing sheet '{}'", sheet_name);
                let findings = self.validator.validate(&sheet)?;
                self.selected_sheet = Some(sheet_name);
                self.preview = Some(sheet);
                self.report(findings);
            }
            Err(e) => {
                warn!("{}", e);
                self.report(vec![ValidationFinding::unloadable_sheet(&sheet_name)]);
                self.selected_sheet = Some(sheet_name);
            }
        }
        Ok(())
    }

    fn report(&mut self, findings: Vec<ValidationFinding>) {
        if let Some(observer) = self.observer.as_mut() {
            observer(&findings);
        }
        self.findings = findings;
    }

    pub fn file_name(&self) -> Option<&str> {
        self.file.as_ref().map(|f| f.name.as_str())
    }

    pub fn file_bytes(&self) -> Option<&[u8]> {
        self.file.as_ref().map(|f| f.bytes.as_slice())
    }

    /// Sheet names of the loaded workbook (empty if unreadable)
    pub fn sheet_names(&self) -> Vec<&str> {
        self.file
            .as_ref()
            .and_then(|f| f.workbook.as_ref())
            .map(|w| w.sheet_names())
            .unwrap_or_default()
    }

    pub fn selected_sheet(&self) -> Option<&str> {
        self.selected_sheet.as_deref()
    }

    /// Materialized rows of the selected sheet, if it loaded
    pub fn preview(&self) -> Option<&SheetData> {
        self.preview.as_ref()
    }

    pub fn findings(&self) -> &[ValidationFinding] {
        &self.findings
    }

    pub fn gate(&self) -> GateDecision {
        self.config.gate.evaluate(&self.findings)
    }

    /// Check that the current file may be sent for conversion
    pub fn ensure_convertible(&self) -> Result<(), SessionError> {
        if self.file.is_none() {
            return Err(SessionError::NoFile);
        }
        match self.gate() {
            GateDecision::Proceed => Ok(()),
            GateDecision::Blocked(blocking) => Err(SessionError::Blocked(blocking.len())),
        }
    }

    /// Record the backend's successful conversion of the current file
    pub fn mark_converted(&mut self) -> Result<(), SessionError> {
        if self.file.is_none() {
            return Err(SessionError::NoFile);
        }
        self.converted = true;
        Ok(())
    }

    pub fn is_converted(&self) -> bool {
        self.converted
    }

    /// Check that publishing may proceed with `title`
    pub fn ensure_publishable(&self, title: &str) -> Result<(), SessionError> {
        if self.file.is_none() {
            return Err(SessionError::NoFile);
        }
        if !self.converted {
            return Err(SessionError::NotConverted);
        }
        if title.trim().is_empty() {
            return Err(SessionError::MissingTitle);
        }
        Ok(())
    }

    /// Product contexts of the previewed sheet; available only once converted
    pub fn contexts(&self) -> Option<Vec<ProductContext>> {
        if !self.converted {
            return None;
        }
        let sheet = self.preview.as_ref()?;
        Some(extract_contexts(sheet, &sheet.name, &self.config.columns))
    }

    pub fn summary(&self) -> Option<SheetSummary> {
        let contexts = self.contexts()?;
        let sheet = self.preview.as_ref()?;
        Some(SheetSummary::new(&sheet.headers, &contexts))
    }

    /// Title suggested for publishing: the file name up to its first dot
    pub fn default_title(&self) -> Option<String> {
        self.file_name().map(default_title)
    }
}

/// File name up to its first `.`
pub fn default_title(file_name: &str) -> String {
    file_name.split('.').next().unwrap_or(file_name).to_string()
}
