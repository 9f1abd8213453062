// SPDX-License-Identifier: Apache-2.0
// Copyright (C) 2025 Michael Dippery <michael@monkey-robot.com>

//! Helpful utilities for working with text.

use htmlentity::entity::{self, ICodedDataTrait};
use regex::Regex;
use std::sync::LazyLock;

static WHITESPACE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s+").expect("invalid whitespace pattern"));

/// Flattens a comment onto a single line.
///
/// Newlines are replaced by spaces and every run of whitespace is
/// collapsed into a single space, which keeps each comment on one line
/// of a CSV file. Leading and trailing whitespace is preserved (as a
/// single space), so normalizing is idempotent.
///
/// # Examples
///
/// ```
/// use subscrape::text::normalize;
/// assert_eq!(normalize("ok\nfine"), "ok fine");
/// assert_eq!(normalize("first paragraph\n\nsecond  paragraph"), "first paragraph second paragraph");
/// assert_eq!(normalize("already normal"), "already normal");
/// assert_eq!(normalize(""), "");
/// ```
pub fn normalize(text: &str) -> String {
    WHITESPACE.replace_all(text, " ").into_owned()
}

/// Converts HTML entities into their single-character equivalents.
///
/// For example, Reddit returns "&" as "&amp;", ">" as "&gt;",
/// and "<" as "&lt;"; this function will convert those HTML
/// entities into single, human-readable characters.
///
/// # Examples
///
/// ```
/// use subscrape::text::convert_html_entities;
/// let raw = "&lt;This &amp; That&gt;";
/// let converted = convert_html_entities(raw);
/// assert_eq!(converted, "<This & That>");
/// ```
///
/// ```
/// use subscrape::text::convert_html_entities;
/// let raw = "A Plaintext Post";
/// let converted = convert_html_entities(raw);
/// assert_eq!(converted, raw);
/// ```
pub fn convert_html_entities(text: &str) -> String {
    entity::decode(text.as_bytes())
        .to_string()
        .unwrap_or(text.to_string())
}
