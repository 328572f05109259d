//! Selector tokens and specificity
//!
//! A compound selector is reduced to the simple tokens it names. The
//! extractor matches on tokens alone, never on combinator structure.

use std::collections::HashSet;

// == Selector Tokens ==
/// Tokens of a single comma-free selector alternative.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SelectorTokens {
    pub ids: Vec<String>,
    pub classes: Vec<String>,
    /// Lowercase type selectors
    pub tags: Vec<String>,
    pub attributes: u32,
    pub pseudo_classes: u32,
    pub pseudo_elements: u32,
    pub universal: bool,
}

impl SelectorTokens {
    /// ids x 100 + (classes, attributes, pseudo-classes) x 10 + (types, pseudo-elements) x 1
    pub fn specificity(&self) -> u32 {
        self.ids.len() as u32 * 100
            + (self.classes.len() as u32 + self.attributes + self.pseudo_classes) * 10
            + self.tags.len() as u32
            + self.pseudo_elements
    }

    fn parse(alternative: &str) -> Self {
        let mut tokens = Self::default();
        let chars: Vec<char> = alternative.chars().collect();
        let mut i = 0;
        // True at the start of a compound selector, where a type name may appear
        let mut compound_start = true;

        while i < chars.len() {
            let c = chars[i];
            match c {
                '#' | '.' => {
                    let (name, next) = read_ident(&chars, i + 1);
                    if !name.is_empty() {
                        if c == '#' {
                            tokens.ids.push(name);
                        } else {
                            tokens.classes.push(name);
                        }
                    }
                    i = next;
                    compound_start = false;
                }
                '[' => {
                    tokens.attributes += 1;
                    i = skip_until(&chars, i + 1, ']');
                    compound_start = false;
                }
                ':' => {
                    let element = chars.get(i + 1) == Some(&':');
                    let start = if element { i + 2 } else { i + 1 };
                    let (name, next) = read_ident(&chars, start);
                    i = next;
                    if chars.get(i) == Some(&'(') {
                        i = skip_until(&chars, i + 1, ')');
                    }
                    let legacy_element = matches!(
                        name.to_ascii_lowercase().as_str(),
                        "before" | "after" | "first-line" | "first-letter"
                    );
                    if element || legacy_element {
                        tokens.pseudo_elements += 1;
                    } else if !name.is_empty() {
                        tokens.pseudo_classes += 1;
                    }
                    compound_start = false;
                }
                '*' => {
                    tokens.universal = true;
                    i += 1;
                    compound_start = false;
                }
                c if c.is_whitespace() || c == '>' || c == '+' || c == '~' => {
                    i += 1;
                    compound_start = true;
                }
                c if compound_start && (c.is_alphabetic() || c == '_') => {
                    let (name, next) = read_ident(&chars, i);
                    tokens.tags.push(name.to_ascii_lowercase());
                    i = next;
                    compound_start = false;
                }
                _ => i += 1,
            }
        }

        tokens
    }

    /// True when any token appears in `visible`.
    fn matches_any(&self, visible: &HashSet<String>) -> bool {
        self.tags.iter().any(|t| visible.contains(t))
            || self.classes.iter().any(|c| visible.contains(&format!(".{}", c)))
            || self.ids.iter().any(|id| visible.contains(&format!("#{}", id)))
    }
}

/// Reads an identifier starting at `start`, honouring `\` escapes.
fn read_ident(chars: &[char], start: usize) -> (String, usize) {
    let mut name = String::new();
    let mut i = start;
    while i < chars.len() {
        let c = chars[i];
        if c == '\\' && i + 1 < chars.len() {
            name.push(chars[i + 1]);
            i += 2;
        } else if c.is_alphanumeric() || c == '-' || c == '_' {
            name.push(c);
            i += 1;
        } else {
            break;
        }
    }
    (name, i)
}

fn skip_until(chars: &[char], start: usize, close: char) -> usize {
    chars[start.min(chars.len())..]
        .iter()
        .position(|&c| c == close)
        .map(|n| start + n + 1)
        .unwrap_or(chars.len())
}

// == Selector ==
/// A selector list, split on top-level commas.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Selector {
    alternatives: Vec<SelectorTokens>,
}

impl Selector {
    pub fn parse(selector: &str) -> Self {
        Self {
            alternatives: split_alternatives(selector)
                .into_iter()
                .map(SelectorTokens::parse)
                .collect(),
        }
    }

    pub fn alternatives(&self) -> &[SelectorTokens] {
        &self.alternatives
    }

    /// Maximum specificity over the alternatives.
    pub fn specificity(&self) -> u32 {
        self.alternatives
            .iter()
            .map(SelectorTokens::specificity)
            .max()
            .unwrap_or(0)
    }

    /// Permissive match: any single token of any alternative names a
    /// visible element. `*` matches whenever something is visible.
    pub fn is_critical(&self, visible: &HashSet<String>) -> bool {
        self.alternatives
            .iter()
            .any(|alt| alt.matches_any(visible) || (alt.universal && !visible.is_empty()))
    }
}

/// Commas inside parentheses or brackets do not split.
fn split_alternatives(selector: &str) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut depth = 0i32;
    let mut start = 0;
    for (i, c) in selector.char_indices() {
        match c {
            '(' | '[' => depth += 1,
            ')' | ']' => depth -= 1,
            ',' if depth == 0 => {
                parts.push(selector[start..i].trim());
                start = i + 1;
            }
            _ => {}
        }
    }
    parts.push(selector[start..].trim());
    parts.into_iter().filter(|p| !p.is_empty()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn set(tokens: &[&str]) -> HashSet<String> {
        tokens.iter().map(|t| t.to_string()).collect()
    }

    #[test]
    fn test_specificity_weights() {
        assert_eq!(Selector::parse("div").specificity(), 1);
        assert_eq!(Selector::parse(".card").specificity(), 10);
        assert_eq!(Selector::parse("#hero").specificity(), 100);
        assert_eq!(Selector::parse("#hero .card > p").specificity(), 111);
        assert_eq!(Selector::parse("a[href]:hover").specificity(), 21);
        assert_eq!(Selector::parse("p::before").specificity(), 2);
        assert_eq!(Selector::parse("*").specificity(), 0);
    }

    #[test]
    fn test_specificity_is_max_over_alternatives() {
        assert_eq!(Selector::parse("h1, .title, #main h2").specificity(), 101);
    }

    #[test]
    fn test_tokens() {
        let selector = Selector::parse("nav.menu #top-bar > LI.item\\:active");
        let tokens = &selector.alternatives()[0];
        assert_eq!(tokens.tags, vec!["nav", "li"]);
        assert_eq!(tokens.classes, vec!["menu", "item:active"]);
        assert_eq!(tokens.ids, vec!["top-bar"]);
    }

    #[test]
    fn test_permissive_token_matching() {
        let visible = set(&["div", ".x"]);
        assert!(Selector::parse(".x").is_critical(&visible));
        assert!(Selector::parse(".x .y").is_critical(&visible));
        assert!(Selector::parse("section, div").is_critical(&visible));
        assert!(!Selector::parse(".y").is_critical(&visible));
        assert!(!Selector::parse("#x").is_critical(&visible));
    }

    #[test]
    fn test_universal_needs_visible_elements() {
        assert!(Selector::parse("*").is_critical(&set(&["p"])));
        assert!(!Selector::parse("*").is_critical(&HashSet::new()));
    }

    #[test]
    fn test_commas_in_functions_do_not_split() {
        let selector = Selector::parse(":is(.a, .b) p, span");
        assert_eq!(selector.alternatives().len(), 2);
    }
}
