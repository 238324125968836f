//! Record-agnostic tabular browsing.
//!
//! Pages describe their data with [`ColumnDef`]s and [`FilterDef`]s, and the
//! browser turns a cached row set plus a [`BrowserState`] into the rows of the
//! current page via [`derive`]. Nothing here knows what a record means.

mod column;
pub mod export;
mod pipeline;
pub mod state;

pub use column::{ALL, ColumnDef, FilterDef, FilterOption, Format, RowAction, RowCommand, Tone};
pub use pipeline::{BrowserView, derive};
pub use state::{BrowserState, SortDirection};
