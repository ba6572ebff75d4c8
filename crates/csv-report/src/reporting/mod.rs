//! Report composition and markup.
//!
//! [`ReportComposer`] turns the profiler output, a bounded row preview and the
//! optional chart into a [`ReportDocument`](crate::types::ReportDocument).
//! [`HtmlRenderer`] turns that document into a self-contained HTML page,
//! either for the browser or as input for the document exporter.
//!
//! # Example
//!
//! ```rust,ignore
//! use csv_report::reporting::{HtmlRenderer, ReportComposer};
//!
//! let composer = ReportComposer::new("Quarterly numbers", 30);
//! let document = composer.compose(&id, profile, &dataset, selection, chart);
//! let html = HtmlRenderer::screen().render(&document);
//! ```

mod composer;
mod html;

pub use composer::ReportComposer;
pub use html::{HtmlRenderer, HtmlTarget, format_stat};
