//! Placeholder tag extraction
//!
//! Recognizes only the simple `{{ identifier }}` form. Block helpers, paths
//! (`{{a.b}}`), helper calls with arguments and other control syntax are not
//! understood, so a tag set is a best-effort list of the plain variables a
//! template body needs, not a full static analysis of it.
//!
//! The Handlebars keywords `else` and `this` match the pattern but are never
//! reported as tags; they belong to block syntax, not to the caller's values.

use std::borrow::Cow;
use std::collections::BTreeSet;
use std::sync::LazyLock;

use regex::{Captures, Regex};

const RESERVED: &[&str] = &["else", "this"];

static TAG_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    // Literal pattern, cannot fail to compile
    Regex::new(r"\{\{\s*([A-Za-z_][A-Za-z0-9_]*)\s*\}\}").expect("tag pattern is valid")
});

/// Extract the distinct placeholder names referenced by a template body
pub fn extract_tags(body: &str) -> BTreeSet<String> {
    TAG_PATTERN
        .captures_iter(body)
        .filter_map(|caps| caps.get(1))
        .map(|m| m.as_str())
        .filter(|name| !is_reserved(name))
        .map(String::from)
        .collect()
}

/// Replace every placeholder that [`extract_tags`] reports with `f(name)`
///
/// Everything else in the body, reserved words included, is left as written.
pub fn replace_tags<'a>(body: &'a str, mut f: impl FnMut(&str) -> String) -> Cow<'a, str> {
    TAG_PATTERN.replace_all(body, |caps: &Captures| {
        let name = &caps[1];
        if is_reserved(name) {
            caps[0].to_string()
        } else {
            f(name)
        }
    })
}

fn is_reserved(name: &str) -> bool {
    RESERVED.contains(&name)
}
