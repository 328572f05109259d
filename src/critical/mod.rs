//! Critical-Resource Extractor
//!
//! Computes the critical CSS for a document snapshot and inlines it.

mod document;
mod extractor;
mod minify;
mod specificity;
mod stylesheet;

pub use document::{DocumentSnapshot, ElementSnapshot};
pub use extractor::{
    inline_critical, CriticalCssExtractor, CriticalCssResult, ExtractorConfig, SizeStats,
};
pub use minify::minify_css;
pub use specificity::{Selector, SelectorTokens};
pub use stylesheet::{parse_declarations, parse_stylesheet, Declaration, StyleItem, StyleRule};
