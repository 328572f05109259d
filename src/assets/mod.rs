//! Asset Module
//!
//! Preloading of static binary assets into the static-asset cache.

mod preloader;
mod record;

pub use preloader::{
    asset_url, format_size, variant_url, AssetPreloader, PreloadConfig, PreloadOutcome,
    PreloadStatus, DEFAULT_CRITICAL_ASSETS,
};
pub use record::{AssetRecord, MediaKind};
