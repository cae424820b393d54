//! Language-specific analysis passes.

pub mod css;
pub mod generic;
pub mod html;
pub mod javascript;
pub mod python;

pub use css::{CssAnalysis, CssPropertyIssue};
pub use generic::GenericAnalysis;
pub use html::{HtmlAnalysis, TagLocation, TagSnippet};
pub use javascript::{JavaScriptAnalysis, NamedLocation, NumberLiteral, TodoComment};
pub use python::{
    ComplexityInfo, LineIssue, PrintStatement, PythonAnalysis, UnusedImport, UnusedWrites,
};
