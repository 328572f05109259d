//! Document snapshots
//!
//! The flattened element list the extractor matches style rules against.

use std::collections::HashSet;

/// Elements whose content never renders.
const NON_RENDERED: [&str; 8] = [
    "head", "script", "style", "template", "title", "meta", "link", "base",
];

/// Elements that never have a closing tag.
const VOID_ELEMENTS: [&str; 14] = [
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "param",
    "source", "track", "wbr",
];

// == Element Snapshot ==
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ElementSnapshot {
    /// Lowercase tag name
    pub tag: String,
    pub id: Option<String>,
    pub classes: Vec<String>,
    /// False when the computed display is `none` or visibility is `hidden`
    pub visible: bool,
}

impl ElementSnapshot {
    pub fn new(tag: &str) -> Self {
        Self {
            tag: tag.to_ascii_lowercase(),
            id: None,
            classes: Vec::new(),
            visible: true,
        }
    }

    pub fn with_id(mut self, id: &str) -> Self {
        self.id = Some(id.to_string());
        self
    }

    pub fn with_class(mut self, class: &str) -> Self {
        self.classes.push(class.to_string());
        self
    }

    pub fn hidden(mut self) -> Self {
        self.visible = false;
        self
    }

    /// Selector tokens this element answers to: `tag`, `.class`, `#id`.
    pub fn selector_tokens(&self) -> impl Iterator<Item = String> + '_ {
        std::iter::once(self.tag.clone())
            .chain(self.classes.iter().map(|c| format!(".{}", c)))
            .chain(self.id.iter().map(|id| format!("#{}", id)))
    }
}

// == Document Snapshot ==
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DocumentSnapshot {
    elements: Vec<ElementSnapshot>,
}

impl DocumentSnapshot {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, element: ElementSnapshot) {
        self.elements.push(element);
    }

    pub fn with_element(mut self, element: ElementSnapshot) -> Self {
        self.push(element);
        self
    }

    pub fn elements(&self) -> &[ElementSnapshot] {
        &self.elements
    }

    pub fn visible_elements(&self) -> impl Iterator<Item = &ElementSnapshot> {
        self.elements.iter().filter(|e| e.visible)
    }

    pub fn has_visible_elements(&self) -> bool {
        self.visible_elements().next().is_some()
    }

    /// Union of the selector tokens of every visible element.
    pub fn visible_selectors(&self) -> HashSet<String> {
        self.visible_elements()
            .flat_map(|e| e.selector_tokens())
            .collect()
    }

    // == HTML Scanner ==
    /// Builds a snapshot from markup with a tolerant tag scanner.
    ///
    /// Invisibility (`hidden`, `display:none`, `visibility:hidden`, or a
    /// non-rendered element such as `<head>`) is inherited by descendants.
    /// Unclosed elements are closed at the end of input.
    pub fn from_html(html: &str) -> Self {
        let mut snapshot = Self::new();
        let mut open: Vec<(String, bool)> = Vec::new();
        let mut rest = html;

        while let Some(start) = rest.find('<') {
            rest = &rest[start..];

            if let Some(after) = rest.strip_prefix("<!--") {
                rest = after.find("-->").map(|i| &after[i + 3..]).unwrap_or("");
                continue;
            }
            if rest.starts_with("<!") || rest.starts_with("<?") {
                rest = rest.find('>').map(|i| &rest[i + 1..]).unwrap_or("");
                continue;
            }
            if let Some(after) = rest.strip_prefix("</") {
                let end = after.find('>').unwrap_or(after.len());
                let name = after[..end].trim().to_ascii_lowercase();
                if let Some(pos) = open.iter().rposition(|(tag, _)| *tag == name) {
                    open.truncate(pos);
                }
                rest = after.get(end + 1..).unwrap_or("");
                continue;
            }

            let Some(tag) = scan_tag(&rest[1..]) else {
                rest = &rest[1..];
                continue;
            };
            rest = &rest[1 + tag.consumed..];

            let parent_visible = open.last().map(|(_, visible)| *visible).unwrap_or(true);
            let visible = parent_visible
                && !NON_RENDERED.contains(&tag.name.as_str())
                && !tag.is_hidden();

            snapshot.push(ElementSnapshot {
                tag: tag.name.clone(),
                id: tag.attribute("id").map(str::to_string),
                classes: tag
                    .attribute("class")
                    .map(|c| c.split_whitespace().map(str::to_string).collect())
                    .unwrap_or_default(),
                visible,
            });

            if tag.name == "script" || tag.name == "style" {
                let closing = format!("</{}", tag.name);
                rest = find_ascii_ci(rest, &closing)
                    .map(|i| &rest[i..])
                    .unwrap_or("");
                continue;
            }
            if !tag.self_closing && !VOID_ELEMENTS.contains(&tag.name.as_str()) {
                open.push((tag.name, visible));
            }
        }

        snapshot
    }
}

struct ScannedTag {
    name: String,
    attributes: Vec<(String, String)>,
    self_closing: bool,
    /// Bytes consumed after the opening `<`
    consumed: usize,
}

impl ScannedTag {
    fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_str())
    }

    fn is_hidden(&self) -> bool {
        if self.attribute("hidden").is_some() {
            return true;
        }
        match self.attribute("style") {
            Some(style) => {
                let compact: String = style
                    .chars()
                    .filter(|c| !c.is_whitespace())
                    .collect::<String>()
                    .to_ascii_lowercase();
                compact.contains("display:none") || compact.contains("visibility:hidden")
            }
            None => false,
        }
    }
}

/// Scans `name attr="v" ...>` following a `<`. Returns `None` when the
/// text is not a tag.
fn scan_tag(input: &str) -> Option<ScannedTag> {
    let bytes = input.as_bytes();
    let name_len = input
        .find(|c: char| !(c.is_ascii_alphanumeric() || c == '-'))
        .unwrap_or(input.len());
    if name_len == 0 || !bytes[0].is_ascii_alphabetic() {
        return None;
    }

    let name = input[..name_len].to_ascii_lowercase();
    let mut attributes = Vec::new();
    let mut i = name_len;
    let mut self_closing = false;

    while i < bytes.len() {
        match bytes[i] {
            b'>' => {
                return Some(ScannedTag {
                    name,
                    attributes,
                    self_closing,
                    consumed: i + 1,
                })
            }
            b'/' => {
                self_closing = true;
                i += 1;
            }
            c if c.is_ascii_whitespace() => i += 1,
            _ => {
                self_closing = false;
                let attr_end = input[i..]
                    .find(|c: char| c.is_whitespace() || c == '=' || c == '>' || c == '/')
                    .map(|n| i + n)
                    .unwrap_or(bytes.len());
                let attr_name = input[i..attr_end].to_ascii_lowercase();
                i = attr_end;

                let mut value = String::new();
                if i < bytes.len() && bytes[i] == b'=' {
                    i += 1;
                    match bytes.get(i) {
                        Some(&quote) if quote == b'"' || quote == b'\'' => {
                            let close = input[i + 1..]
                                .find(quote as char)
                                .map(|n| i + 1 + n)
                                .unwrap_or(bytes.len());
                            value = input[i + 1..close].to_string();
                            i = (close + 1).min(bytes.len());
                        }
                        _ => {
                            let end = input[i..]
                                .find(|c: char| c.is_whitespace() || c == '>')
                                .map(|n| i + n)
                                .unwrap_or(bytes.len());
                            value = input[i..end].to_string();
                            i = end;
                        }
                    }
                }
                attributes.push((attr_name, value));
            }
        }
    }

    // Unterminated tag at end of input
    Some(ScannedTag {
        name,
        attributes,
        self_closing,
        consumed: input.len(),
    })
}

fn find_ascii_ci(haystack: &str, needle: &str) -> Option<usize> {
    haystack
        .to_ascii_lowercase()
        .find(&needle.to_ascii_lowercase())
}
