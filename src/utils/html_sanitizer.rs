//! Markup stripping for JSON request bodies.
//!
//! Every string leaf of a JSON document is reduced to plain text: script
//! blocks are removed together with their bodies, comments and tags are
//! removed, and the surrounding text is kept. Keys, numbers, booleans and
//! null pass through untouched.

use std::sync::LazyLock;

use regex::Regex;
use serde_json::{Map, Value};

/// Default nesting limit for request bodies.
pub const DEFAULT_MAX_DEPTH: usize = 32;

/// Upper bound on strip passes for one string. Nested constructions such as
/// `<scr<script></script>ipt>` need more than one pass.
const MAX_PASSES: usize = 8;

/// `<script ...> ... </script>`; an unclosed block runs to the end of input.
static SCRIPT_BLOCK: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?is)<script\b[^>]*>.*?(?:</script\s*>|$)").expect("valid script regex")
});

static COMMENT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)<!--.*?(?:-->|$)").expect("valid comment regex"));

/// Opening, closing, declaration and processing-instruction tags. Quoted
/// attribute values may contain `>`. Only a closed tag matches; a bare `<`
/// followed by a letter is left for [`TAG_OPEN`] to escape.
static TAG: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"<[A-Za-z!/?](?:"[^"]*"|'[^']*'|[^'">])*>"#).expect("valid tag regex")
});

/// A `<` that could still start a tag.
static TAG_OPEN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"<([A-Za-z!/?])").expect("valid tag-open regex"));

/// Errors raised while sanitizing a JSON document.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SanitizeError {
    #[error("Request body is nested too deeply (max depth {max_depth})")]
    DepthExceeded { max_depth: usize },
}

/// Recursive JSON sanitizer with a nesting limit.
#[derive(Debug, Clone, Copy)]
pub struct Sanitizer {
    max_depth: usize,
}

impl Sanitizer {
    pub fn new(max_depth: usize) -> Self {
        Self { max_depth }
    }

    pub fn max_depth(&self) -> usize {
        self.max_depth
    }

    /// Returns a sanitized copy of `value`.
    ///
    /// # Errors
    ///
    /// Returns [`SanitizeError::DepthExceeded`] if arrays/objects nest deeper
    /// than the configured limit. The top-level value is depth 1.
    pub fn sanitize(&self, value: &Value) -> Result<Value, SanitizeError> {
        self.sanitize_at(value, 1)
    }

    fn sanitize_at(&self, value: &Value, depth: usize) -> Result<Value, SanitizeError> {
        match value {
            Value::String(s) => Ok(Value::String(strip_markup(s))),
            Value::Array(items) => {
                self.check_depth(depth)?;
                items
                    .iter()
                    .map(|item| self.sanitize_at(item, depth + 1))
                    .collect::<Result<Vec<_>, _>>()
                    .map(Value::Array)
            }
            Value::Object(fields) => {
                self.check_depth(depth)?;
                let mut sanitized = Map::with_capacity(fields.len());
                for (key, field) in fields {
                    sanitized.insert(key.clone(), self.sanitize_at(field, depth + 1)?);
                }
                Ok(Value::Object(sanitized))
            }
            Value::Number(_) | Value::Bool(_) | Value::Null => Ok(value.clone()),
        }
    }

    fn check_depth(&self, depth: usize) -> Result<(), SanitizeError> {
        if depth > self.max_depth {
            return Err(SanitizeError::DepthExceeded {
                max_depth: self.max_depth,
            });
        }
        Ok(())
    }
}

impl Default for Sanitizer {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_DEPTH)
    }
}

/// Sanitizes with [`DEFAULT_MAX_DEPTH`].
pub fn sanitize(value: &Value) -> Result<Value, SanitizeError> {
    Sanitizer::default().sanitize(value)
}

/// Reduces a string to plain text.
///
/// Stripping repeats until nothing changes or [`MAX_PASSES`] is reached.
/// A tag opener that is still left, e.g. a `<` in running text, a tag cut
/// off by the end of input, or input built to outlast the pass limit, is
/// escaped as `&lt;` and the text after it is kept.
/// The output therefore never contains a tag and stripping it again is a no-op.
pub fn strip_markup(input: &str) -> String {
    let mut current = input.to_string();

    for _ in 0..MAX_PASSES {
        let next = strip_once(&current);
        if next == current {
            break;
        }
        current = next;
    }

    TAG_OPEN.replace_all(&current, "&lt;$1").into_owned()
}

fn strip_once(input: &str) -> String {
    if !input.contains('<') {
        return input.to_string();
    }
    let without_scripts = SCRIPT_BLOCK.replace_all(input, "");
    let without_comments = COMMENT.replace_all(&without_scripts, "");
    TAG.replace_all(&without_comments, "").into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_strips_tag_and_attributes_keeping_text() {
        let input = json!({"comment": "<img src=x onerror=alert(1)>hello"});
        assert_eq!(sanitize(&input).unwrap(), json!({"comment": "hello"}));
    }

    #[test]
    fn test_script_only_string_becomes_empty() {
        assert_eq!(strip_markup("<script>alert('xss')</script>"), "");
        assert_eq!(strip_markup("<SCRIPT type=\"text/javascript\">x()</SCRIPT >"), "");
    }

    #[test]
    fn test_script_body_removed_with_surrounding_text_kept() {
        let out = strip_markup("before<script>steal(document.cookie)</script>after");
        assert_eq!(out, "beforeafter");
        assert!(!out.contains("steal"));
    }

    #[test]
    fn test_unclosed_script_swallows_rest() {
        assert_eq!(strip_markup("ok<script>evil()"), "ok");
    }

    #[test]
    fn test_empty_and_plain_strings() {
        assert_eq!(strip_markup(""), "");
        assert_eq!(strip_markup("plain text"), "plain text");
        assert_eq!(strip_markup("3 < 4 and 5 > 2"), "3 < 4 and 5 > 2");
    }

    #[test]
    fn test_nested_and_malformed_tags() {
        assert_eq!(strip_markup("<b><i>bold</i></b>"), "bold");
        assert_eq!(strip_markup("<scr<script>x</script>ipt>alert(1)</script>"), "alert(1)");
        assert_eq!(
            strip_markup("text<img src=x onerror=alert(1)"),
            "text&lt;img src=x onerror=alert(1)"
        );
        assert_eq!(strip_markup("<a title=\"1 > 0\">link</a>"), "link");
        assert_eq!(strip_markup("<!-- hidden -->shown"), "shown");
    }

    #[test]
    fn test_bare_angle_bracket_keeps_following_text() {
        assert_eq!(strip_markup("use a<b comparison"), "use a&lt;b comparison");
        assert_eq!(
            strip_markup("temp<hot zone, pick up friday"),
            "temp&lt;hot zone, pick up friday"
        );
        assert_eq!(strip_markup("3 < 4 and 5<6"), "3 < 4 and 5<6");

        let out = strip_markup("pallets<wrapped in film");
        assert_eq!(strip_markup(&out), out);
    }

    #[test]
    fn test_unterminated_quote_is_escaped() {
        let out = strip_markup("<a href=\"javascript:x");
        assert!(!out.contains('<'));
        assert_eq!(strip_markup(&out), out);
    }

    #[test]
    fn test_structure_is_preserved() {
        let input = json!({
            "title": "<h1>Scrap copper</h1>",
            "tags": ["<b>metal</b>", "wire", 3, null],
            "quantity": 12.5,
            "urgent": true,
            "meta": {"note": "<script>x</script>call first", "empty": ""}
        });

        let expected = json!({
            "title": "Scrap copper",
            "tags": ["metal", "wire", 3, null],
            "quantity": 12.5,
            "urgent": true,
            "meta": {"note": "call first", "empty": ""}
        });

        assert_eq!(sanitize(&input).unwrap(), expected);
    }

    #[test]
    fn test_non_string_leaves_unchanged() {
        for value in [json!(0), json!(-1.25), json!(true), json!(false), json!(null)] {
            assert_eq!(sanitize(&value).unwrap(), value);
        }
    }

    #[test]
    fn test_idempotent() {
        let samples = [
            json!("<<b>script>alert(1)<</b>/script>"),
            json!({"a": ["<p>x</p>", {"b": "<a href='x'>y"}]}),
            json!("a<b"),
            json!("<scr<scr<scr<scr<scr<scr<scr<scr<script></script>ipt>ipt>ipt>ipt>ipt>ipt>ipt>ipt>"),
        ];

        for sample in samples {
            let once = sanitize(&sample).unwrap();
            let twice = sanitize(&once).unwrap();
            assert_eq!(once, twice, "not idempotent for {sample}");
        }
    }

    #[test]
    fn test_depth_limit() {
        let sanitizer = Sanitizer::new(3);

        assert!(sanitizer.sanitize(&json!({"a": {"b": {"c": 1}}})).is_ok());
        assert_eq!(
            sanitizer.sanitize(&json!({"a": {"b": {"c": {"d": 1}}}})),
            Err(SanitizeError::DepthExceeded { max_depth: 3 })
        );
        assert!(sanitizer.sanitize(&json!([[["deep"]]])).is_ok());
        assert!(sanitizer.sanitize(&json!([[[["too deep"]]]])).is_err());
    }

    #[test]
    fn test_scalars_ignore_depth() {
        let sanitizer = Sanitizer::new(0);
        assert_eq!(sanitizer.sanitize(&json!("x")).unwrap(), json!("x"));
        assert!(sanitizer.sanitize(&json!({})).is_err());
    }
}
