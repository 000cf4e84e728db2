//! Output sinks for harvested articles.
//!
//! # Submodules
//!
//! - [`table`]: Appends article rows to a CSV spreadsheet
//!
//! # Append Semantics
//!
//! The sink never rewrites or removes rows. It has no memory of earlier runs,
//! so harvesting overlapping date ranges twice stores the overlapping
//! articles twice, even though each run deduplicates its own results.

pub mod table;
