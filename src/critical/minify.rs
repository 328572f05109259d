//! CSS minification: comment stripping and whitespace collapsing.

use std::sync::OnceLock;

use regex::Regex;

struct MinifyPatterns {
    comments: Regex,
    whitespace: Regex,
    punctuation: Regex,
}

fn patterns() -> &'static MinifyPatterns {
    static PATTERNS: OnceLock<MinifyPatterns> = OnceLock::new();
    PATTERNS.get_or_init(|| MinifyPatterns {
        comments: Regex::new(r"(?s)/\*.*?\*/").expect("Invalid regex"),
        whitespace: Regex::new(r"\s+").expect("Invalid regex"),
        punctuation: Regex::new(r"\s*([{}:;,])\s*").expect("Invalid regex"),
    })
}

/// Deterministic minification. Applying it twice changes nothing.
pub fn minify_css(css: &str) -> String {
    let patterns = patterns();
    let without_comments = patterns.comments.replace_all(css, "");
    let collapsed = patterns.whitespace.replace_all(&without_comments, " ");
    let tight = patterns.punctuation.replace_all(&collapsed, "$1");
    tight.trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_minify() {
        let css = "/* header */\n.x {\n  color: red;\n}\n\nh1, h2 {\n  margin : 0 ;\n}\n";
        assert_eq!(minify_css(css), ".x{color:red;}h1,h2{margin:0;}");
    }

    #[test]
    fn test_minify_is_idempotent() {
        let once = minify_css("@media (max-width: 640px) {\n.nav {\n  display: none;\n}\n}");
        assert_eq!(once, "@media (max-width:640px){.nav{display:none;}}");
        assert_eq!(minify_css(&once), once);
    }

    #[test]
    fn test_minify_empty() {
        assert_eq!(minify_css("  \n "), "");
    }
}
