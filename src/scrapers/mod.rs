//! Site-specific search flows.
//!
//! A site module knows the site's markup (as CSS selectors) and the sequence of
//! UI steps that turns a set of search parameters into a rendered result
//! list. Everything after that point (pagination, collection, images,
//! persistence) is site-agnostic and only needs the selectors it exports.
//!
//! # Supported Sites
//!
//! | Site | Module | Notes |
//! |------|--------|-------|
//! | New York Times | [`nyt`] | Search with section and date-range filters |

pub mod nyt;
