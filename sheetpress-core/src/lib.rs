//! sheetpress-core: product price-list ingestion for spreadsheet publishing
//!
//! Loads a workbook, materializes one sheet as header + rows, validates its
//! columns, and derives structured product contexts from the rows. The
//! conversion to HTML and the publication happen on a remote backend, reached
//! through [`client::BackendClient`].

pub mod config;
pub mod error;
pub mod extract;
pub mod finding;
pub mod history;
pub mod policy;
pub mod reader;
pub mod rules;
pub mod session;
pub mod validator;

#[cfg(feature = "backend")]
pub mod client;

pub use config::PressConfig;
pub use error::{IngestError, SessionError};
pub use extract::{ColumnMapping, ProductContext, SheetSummary, Specifications};
pub use finding::{FindingKind, Severity, ValidationFinding};
pub use policy::{GateDecision, GatePolicy};
pub use reader::{CellValue, SheetData, Workbook};
pub use rules::ColumnRule;
pub use session::{LoadOutcome, LoadTicket, PreviewSession};
pub use validator::Validator;

#[cfg(feature = "backend")]
pub use error::TransportError;
