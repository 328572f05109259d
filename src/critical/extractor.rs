//! Critical CSS Extractor
//!
//! Partitions a stylesheet into the rules needed by the visible part of a
//! document and everything else.

use serde::Serialize;
use tracing::debug;

use crate::critical::minify::minify_css;
use crate::critical::specificity::Selector;
use crate::critical::stylesheet::{parse_stylesheet, StyleItem, StyleRule};
use crate::critical::DocumentSnapshot;

// == Extractor Config ==
#[derive(Debug, Clone)]
pub struct ExtractorConfig {
    /// Minify both partitions before returning
    pub minify: bool,
}

impl Default for ExtractorConfig {
    fn default() -> Self {
        Self { minify: true }
    }
}

// == Result ==
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SizeStats {
    /// Bytes of the input stylesheet
    pub original: usize,
    pub critical: usize,
    pub deferred: usize,
    /// `original - critical`, floored at zero
    pub savings: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CriticalCssResult {
    /// Descending specificity; equal specificity keeps source order
    pub critical_rules: Vec<StyleRule>,
    /// Non-critical rules and passthrough at-rules in source order
    pub deferred_rules: Vec<StyleItem>,
    pub critical_css: String,
    pub deferred_css: String,
    pub size: SizeStats,
}

// == Extractor ==
#[derive(Debug, Clone, Default)]
pub struct CriticalCssExtractor {
    config: ExtractorConfig,
}

impl CriticalCssExtractor {
    pub fn new(config: ExtractorConfig) -> Self {
        Self { config }
    }

    /// Splits `css` against the visible elements of `document`.
    pub fn extract(&self, document: &DocumentSnapshot, css: &str) -> CriticalCssResult {
        let visible = document.visible_selectors();
        let mut critical_rules = Vec::new();
        let mut deferred_rules = Vec::new();

        for item in parse_stylesheet(css) {
            match item {
                StyleItem::Rule(rule) if Selector::parse(&rule.selector).is_critical(&visible) => {
                    critical_rules.push(rule)
                }
                other => deferred_rules.push(other),
            }
        }

        // Stable sort keeps source order among equal specificity
        critical_rules.sort_by(|a, b| b.specificity.cmp(&a.specificity));

        let critical_css = self.emit(critical_rules.iter().map(StyleRule::render));
        let deferred_css = self.emit(deferred_rules.iter().map(StyleItem::render));

        let size = SizeStats {
            original: css.len(),
            critical: critical_css.len(),
            deferred: deferred_css.len(),
            savings: css.len().saturating_sub(critical_css.len()),
        };
        debug!(
            "[CriticalCSS] {} critical, {} deferred, {} bytes saved",
            critical_rules.len(),
            deferred_rules.len(),
            size.savings
        );

        CriticalCssResult {
            critical_rules,
            deferred_rules,
            critical_css,
            deferred_css,
            size,
        }
    }

    /// Convenience wrapper scanning `html` into a snapshot first.
    pub fn extract_from_html(&self, html: &str, css: &str) -> CriticalCssResult {
        self.extract(&DocumentSnapshot::from_html(html), css)
    }

    fn emit(&self, blocks: impl Iterator<Item = String>) -> String {
        let text = blocks.collect::<Vec<_>>().join("\n\n");
        if self.config.minify {
            minify_css(&text)
        } else {
            text
        }
    }
}

// == Inlining ==
/// Inserts `css` as `<style data-critical="true">` at the start of `<head>`.
/// Documents without a head get one in front of the body, or at the top.
pub fn inline_critical(html: &str, css: &str) -> String {
    let style = format!("<style data-critical=\"true\">{}</style>", css);
    let lower = html.to_ascii_lowercase();

    if let Some(head) = find_open_tag(&lower, "head") {
        let insert_at = lower[head..].find('>').map(|i| head + i + 1).unwrap_or(html.len());
        return format!("{}{}{}", &html[..insert_at], style, &html[insert_at..]);
    }
    match find_open_tag(&lower, "body") {
        Some(body) => format!("{}<head>{}</head>{}", &html[..body], style, &html[body..]),
        None => format!("{}{}", style, html),
    }
}

/// Position of `<name` followed by `>` or whitespace.
fn find_open_tag(lower: &str, name: &str) -> Option<usize> {
    let needle = format!("<{}", name);
    lower.match_indices(&needle).map(|(i, _)| i).find(|&i| {
        lower[i + needle.len()..]
            .chars()
            .next()
            .map(|c| c == '>' || c.is_whitespace())
            .unwrap_or(false)
    })
}
