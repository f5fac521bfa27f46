// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::LazyLock;
use url::Url;

use crate::{DEFAULT_THUMBNAIL_WIDTH, RawValue};

pub const DEFAULT_DISPLAY_NAME: &str = "User";

const THUMBNAIL_ENDPOINT: &str = "https://drive.google.com/thumbnail";
const CONTENT_HOST: &str = "https://lh3.googleusercontent.com";
const EXPORT_ENDPOINT: &str = "https://drive.google.com/uc";

// Tried in order; the first pattern that matches supplies the file id.
static FILE_ID_PATTERNS: LazyLock<[Regex; 3]> = LazyLock::new(|| {
    [
        Regex::new(r"/file/d/([A-Za-z0-9_-]+)").expect("file path pattern is valid"),
        Regex::new(r"id=([A-Za-z0-9_-]+)").expect("id query pattern is valid"),
        Regex::new(r"/d/([A-Za-z0-9_-]+)").expect("bare path pattern is valid"),
    ]
});

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageFieldValue {
    pub url: String,
    pub display_name: String,
}

/// Ordered alternate addresses for one image, most reliable first.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CandidateList(Vec<String>);

impl CandidateList {
    pub fn new(urls: Vec<String>) -> Self {
        Self(urls)
    }

    pub fn get(&self, index: usize) -> Option<&str> {
        self.0.get(index).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }

    pub fn as_slice(&self) -> &[String] {
        &self.0
    }
}

/// Splits an image field into its url and display name.
///
/// Accepted shapes are `url,name`, a bare url starting with `http`, or a
/// bare name. One leading and one trailing double quote are dropped first.
pub fn parse_image_field(raw: Option<&RawValue>) -> ImageFieldValue {
    let text = raw
        .filter(|value| value.is_truthy())
        .map(RawValue::display)
        .unwrap_or_default();
    let unquoted = strip_quotes(&text);

    let (url, display_name) = if let Some((url, name)) = unquoted.split_once(',') {
        (url.trim(), name.trim())
    } else if unquoted.starts_with("http") {
        (unquoted.trim(), "")
    } else {
        ("", unquoted.trim())
    };

    let display_name = if display_name.is_empty() {
        DEFAULT_DISPLAY_NAME
    } else {
        display_name
    };

    ImageFieldValue {
        url: url.to_owned(),
        display_name: display_name.to_owned(),
    }
}

pub fn extract_file_id(url: &str) -> Option<&str> {
    FILE_ID_PATTERNS.iter().find_map(|pattern| {
        pattern
            .captures(url)
            .and_then(|captures| captures.get(1))
            .map(|id| id.as_str())
    })
}

pub fn derive_candidates(url: &str) -> CandidateList {
    derive_candidates_sized(url, DEFAULT_THUMBNAIL_WIDTH)
}

/// Candidate urls for `url`, requesting `width`-pixel renditions from the
/// thumbnail endpoints.
///
/// An empty url has no candidates. A url with no recognizable file id is
/// trusted verbatim. Otherwise the thumbnail endpoint comes first, then the
/// content host, then the export view, and the original url last.
pub fn derive_candidates_sized(url: &str, width: u32) -> CandidateList {
    if url.is_empty() {
        return CandidateList::default();
    }

    let Some(file_id) = extract_file_id(url) else {
        return CandidateList::new(vec![url.to_owned()]);
    };

    let mut urls = [
        thumbnail_url(file_id, width),
        content_host_url(file_id, width),
        export_view_url(file_id),
    ]
    .into_iter()
    .flatten()
    .collect::<Vec<_>>();
    urls.push(url.to_owned());
    CandidateList::new(urls)
}

fn thumbnail_url(file_id: &str, width: u32) -> Option<String> {
    let size = format!("w{width}");
    Url::parse_with_params(THUMBNAIL_ENDPOINT, [("id", file_id), ("sz", size.as_str())])
        .ok()
        .map(String::from)
}

fn content_host_url(file_id: &str, width: u32) -> Option<String> {
    let base = Url::parse(CONTENT_HOST).ok()?;
    base.join(&format!("/d/{file_id}=w{width}"))
        .ok()
        .map(String::from)
}

fn export_view_url(file_id: &str) -> Option<String> {
    Url::parse_with_params(EXPORT_ENDPOINT, [("export", "view"), ("id", file_id)])
        .ok()
        .map(String::from)
}

fn strip_quotes(value: &str) -> &str {
    let value = value.strip_prefix('"').unwrap_or(value);
    value.strip_suffix('"').unwrap_or(value)
}

#[cfg(test)]
mod tests {
    use super::{
        CandidateList, derive_candidates, derive_candidates_sized, extract_file_id,
        parse_image_field,
    };
    use crate::RawValue;

    fn parse(value: &str) -> (String, String) {
        let parsed = parse_image_field(Some(&RawValue::text(value)));
        (parsed.url, parsed.display_name)
    }

    #[test]
    fn parse_url_and_name_pair() {
        let (url, name) = parse("https://x/file/d/ABC123/view,  Jane Doe ");
        assert_eq!(url, "https://x/file/d/ABC123/view");
        assert_eq!(name, "Jane Doe");
    }

    #[test]
    fn parse_splits_on_first_comma_only() {
        let (url, name) = parse("https://x/img.png, Doe, Jane");
        assert_eq!(url, "https://x/img.png");
        assert_eq!(name, "Doe, Jane");
    }

    #[test]
    fn parse_strips_surrounding_quotes() {
        let (url, name) = parse("\"https://x/a.png,Ada\"");
        assert_eq!(url, "https://x/a.png");
        assert_eq!(name, "Ada");
    }

    #[test]
    fn parse_bare_url_defaults_name() {
        let (url, name) = parse("https://x/a.png ");
        assert_eq!(url, "https://x/a.png");
        assert_eq!(name, "User");
    }

    #[test]
    fn parse_bare_name_has_no_url() {
        let (url, name) = parse(" Grace Hopper ");
        assert_eq!(url, "");
        assert_eq!(name, "Grace Hopper");
    }

    #[test]
    fn parse_missing_or_falsy_value() {
        let parsed = parse_image_field(None);
        assert_eq!(parsed.url, "");
        assert_eq!(parsed.display_name, "User");

        let zero = parse_image_field(Some(&RawValue::Number(0.0)));
        assert_eq!(zero.display_name, "User");

        let (url, name) = parse("https://x/a.png,   ");
        assert_eq!(url, "https://x/a.png");
        assert_eq!(name, "User");
    }

    #[test]
    fn extract_file_id_patterns_in_order() {
        let cases = [
            ("https://drive.google.com/file/d/ABC123/view", Some("ABC123")),
            ("https://drive.google.com/open?id=Q-w_9&usp=sharing", Some("Q-w_9")),
            ("https://docs.google.com/d/XYZ/edit", Some("XYZ")),
            ("https://example.com/file/d/FIRST/view?id=SECOND", Some("FIRST")),
            ("https://cdn.example.com/avatar.png", None),
        ];
        for (url, expected) in cases {
            assert_eq!(extract_file_id(url), expected, "url {url}");
        }
    }

    #[test]
    fn derive_candidates_for_recognized_id() {
        let url = "https://x/file/d/ABC123/view";
        let candidates = derive_candidates(url);
        assert_eq!(
            candidates.as_slice(),
            [
                "https://drive.google.com/thumbnail?id=ABC123&sz=w400",
                "https://lh3.googleusercontent.com/d/ABC123=w400",
                "https://drive.google.com/uc?export=view&id=ABC123",
                "https://x/file/d/ABC123/view",
            ]
        );
    }

    #[test]
    fn derive_candidates_orders_thumbnail_before_export_before_original() {
        let url = "https://drive.google.com/open?id=ID9";
        let candidates = derive_candidates(url);
        let position = |needle: &str| {
            candidates
                .iter()
                .position(|candidate| candidate.contains(needle))
                .expect("candidate present")
        };
        assert!(position("thumbnail") < position("export=view"));
        assert!(position("export=view") < candidates.len() - 1);
        assert_eq!(candidates.get(candidates.len() - 1), Some(url));
    }

    #[test]
    fn derive_candidates_is_deterministic() {
        let url = "https://drive.google.com/file/d/ABC/view";
        assert_eq!(derive_candidates(url), derive_candidates(url));
    }

    #[test]
    fn derive_candidates_honors_width() {
        let candidates = derive_candidates_sized("https://x/d/ABC", 120);
        assert_eq!(
            candidates.get(0),
            Some("https://drive.google.com/thumbnail?id=ABC&sz=w120")
        );
        assert_eq!(
            candidates.get(1),
            Some("https://lh3.googleusercontent.com/d/ABC=w120")
        );
    }

    #[test]
    fn derive_candidates_trusts_unrecognized_url() {
        let url = "https://cdn.example.com/avatar.png";
        assert_eq!(
            derive_candidates(url),
            CandidateList::new(vec![url.to_owned()])
        );
    }

    #[test]
    fn derive_candidates_empty_url_has_none() {
        assert!(derive_candidates("").is_empty());
    }
}
