//! Stylesheet parsing
//!
//! Splits style text into ordered style rules and verbatim at-rules.

use std::sync::OnceLock;

use regex::Regex;

use crate::critical::specificity::Selector;

// == Declaration ==
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Declaration {
    pub property: String,
    pub value: String,
}

// == Style Rule ==
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StyleRule {
    pub selector: String,
    pub declarations: Vec<Declaration>,
    /// Enclosing `@media` query, without the `@media` keyword
    pub media: Option<String>,
    pub specificity: u32,
}

impl StyleRule {
    pub fn new(selector: &str, declarations: Vec<Declaration>, media: Option<String>) -> Self {
        let selector = selector.split_whitespace().collect::<Vec<_>>().join(" ");
        Self {
            specificity: Selector::parse(&selector).specificity(),
            selector,
            declarations,
            media,
        }
    }

    /// Emits the rule, wrapped in its media query when it has one.
    pub fn render(&self) -> String {
        let body: String = self
            .declarations
            .iter()
            .map(|d| format!("  {}: {};\n", d.property, d.value))
            .collect();
        let rule = format!("{} {{\n{}}}", self.selector, body);
        match &self.media {
            Some(query) => format!("@media {} {{\n{}\n}}", query, rule),
            None => rule,
        }
    }
}

// == Stylesheet Item ==
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StyleItem {
    Rule(StyleRule),
    /// `@font-face`, `@keyframes`, `@import` and friends, kept verbatim
    AtRule(String),
}

impl StyleItem {
    pub fn render(&self) -> String {
        match self {
            StyleItem::Rule(rule) => rule.render(),
            StyleItem::AtRule(text) => text.clone(),
        }
    }
}

fn comment_regex() -> &'static Regex {
    static REGEX: OnceLock<Regex> = OnceLock::new();
    REGEX.get_or_init(|| Regex::new(r"(?s)/\*.*?\*/").expect("Invalid regex"))
}

// == Parser ==
/// Parses style text into items in source order. Comments are dropped and
/// an unterminated block runs to the end of input.
pub fn parse_stylesheet(css: &str) -> Vec<StyleItem> {
    let css = comment_regex().replace_all(css, "");
    let mut items = Vec::new();
    parse_block(&css, None, &mut items);
    items
}

fn parse_block(css: &str, media: Option<&str>, items: &mut Vec<StyleItem>) {
    let mut rest = css;

    loop {
        rest = rest.trim_start();
        if rest.is_empty() {
            break;
        }

        let Some(delim) = rest.find(|c: char| c == '{' || c == ';' || c == '}') else {
            break;
        };
        let prelude = rest[..delim].trim();

        match rest.as_bytes()[delim] {
            // Stray closing brace or statement outside any block
            b'}' => {
                rest = &rest[delim + 1..];
            }
            b';' => {
                if prelude.starts_with('@') {
                    items.push(StyleItem::AtRule(wrap_media(media, &format!("{};", prelude))));
                }
                rest = &rest[delim + 1..];
            }
            _ => {
                let body_start = delim + 1;
                let body_end = matching_brace(rest, delim);
                let body = &rest[body_start..body_end];
                rest = rest.get(body_end + 1..).unwrap_or("");

                if let Some(query) = prelude.strip_prefix("@media") {
                    let query = query.trim();
                    parse_block(body, Some(query), items);
                } else if prelude.starts_with('@') {
                    let text = format!("{} {{{}}}", prelude, body.trim_end());
                    items.push(StyleItem::AtRule(wrap_media(media, &text)));
                } else if !prelude.is_empty() {
                    items.push(StyleItem::Rule(StyleRule::new(
                        prelude,
                        parse_declarations(body),
                        media.map(str::to_string),
                    )));
                }
            }
        }
    }
}

/// Index of the brace closing the one at `open`, or the input length.
fn matching_brace(text: &str, open: usize) -> usize {
    let mut depth = 0usize;
    for (i, byte) in text.bytes().enumerate().skip(open) {
        match byte {
            b'{' => depth += 1,
            b'}' => {
                depth -= 1;
                if depth == 0 {
                    return i;
                }
            }
            _ => {}
        }
    }
    text.len()
}

fn wrap_media(media: Option<&str>, text: &str) -> String {
    match media {
        Some(query) => format!("@media {} {{\n{}\n}}", query, text),
        None => text.to_string(),
    }
}

/// `prop: value; ...` pairs; entries without a colon are dropped.
pub fn parse_declarations(body: &str) -> Vec<Declaration> {
    body.split(';')
        .filter_map(|entry| {
            let (property, value) = entry.split_once(':')?;
            let property = property.trim();
            let value = value.trim();
            if property.is_empty() || value.is_empty() {
                return None;
            }
            Some(Declaration {
                property: property.to_string(),
                value: value.to_string(),
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rules(items: &[StyleItem]) -> Vec<&StyleRule> {
        items
            .iter()
            .filter_map(|item| match item {
                StyleItem::Rule(rule) => Some(rule),
                StyleItem::AtRule(_) => None,
            })
            .collect()
    }

    #[test]
    fn test_parses_rules_in_order() {
        let items = parse_stylesheet(".x { color: red; }\n/* note */ .y{color:blue;margin : 0}");
        let rules = rules(&items);

        assert_eq!(rules.len(), 2);
        assert_eq!(rules[0].selector, ".x");
        assert_eq!(rules[1].selector, ".y");
        assert_eq!(
            rules[1].declarations,
            vec![
                Declaration {
                    property: "color".to_string(),
                    value: "blue".to_string()
                },
                Declaration {
                    property: "margin".to_string(),
                    value: "0".to_string()
                },
            ]
        );
    }

    #[test]
    fn test_media_rules_keep_query() {
        let items = parse_stylesheet("@media (max-width: 640px) { .nav { display: none; } p { margin: 0; } }");
        let rules = rules(&items);

        assert_eq!(rules.len(), 2);
        assert_eq!(rules[0].media.as_deref(), Some("(max-width: 640px)"));
        assert!(rules[1].render().starts_with("@media (max-width: 640px) {"));
    }

    #[test]
    fn test_other_at_rules_pass_through() {
        let items = parse_stylesheet(
            "@import url(base.css);\n@keyframes spin { from { transform: rotate(0); } to { transform: rotate(360deg); } }\n@font-face { font-family: Inter; }\nbody { margin: 0; }",
        );

        assert_eq!(items.len(), 4);
        assert_eq!(items[0], StyleItem::AtRule("@import url(base.css);".to_string()));
        match &items[1] {
            StyleItem::AtRule(text) => {
                assert!(text.starts_with("@keyframes spin {"));
                assert!(text.contains("rotate(360deg)"));
            }
            other => panic!("expected at-rule, got {:?}", other),
        }
        assert!(matches!(&items[2], StyleItem::AtRule(t) if t.starts_with("@font-face")));
        assert!(matches!(&items[3], StyleItem::Rule(r) if r.selector == "body"));
    }

    #[test]
    fn test_render_rule() {
        let rule = StyleRule::new(".x", parse_declarations("color: red"), None);
        assert_eq!(rule.render(), ".x {\n  color: red;\n}");
    }

    #[test]
    fn test_unterminated_block_runs_to_end() {
        let items = parse_stylesheet(".a { color: red; } .b { color: blue");
        let rules = rules(&items);
        assert_eq!(rules.len(), 2);
        assert_eq!(rules[1].declarations[0].value, "blue");
    }
}
