//! Check the tag scanner against the documents in `test-vectors/`.
//!
//! Each vector names a document and the fields read from it. The `ofp`
//! section parses whole dispatch answers into `OfpInfo`, compared through
//! serde so field order in the file does not matter.

use ofp_core::extract::{extract_field, extract_nested};
use ofp_core::OfpInfo;

const DEFAULT_MAX_LEN: usize = 100;

fn vectors() -> serde_json::Value {
    let raw = include_str!("../../test-vectors/extract.json");
    serde_json::from_str(raw).unwrap()
}

// ---------------------------------------------------------------------------
// Single fields
// ---------------------------------------------------------------------------

#[test]
fn field_test_vectors() {
    let vectors = vectors();
    for case in vectors["cases"].as_array().unwrap() {
        let name = case["name"].as_str().unwrap();
        let document = case["document"].as_str().unwrap().as_bytes();

        for field in case["fields"].as_array().unwrap() {
            let tag = field["tag"].as_str().unwrap();
            let max_len = field["max_len"].as_u64().map_or(DEFAULT_MAX_LEN, |n| n as usize);
            let value = match field["container"].as_str() {
                Some(container) => extract_nested(document, container, tag, max_len),
                None => extract_field(document, tag, max_len),
            };
            assert_eq!(value, field["expected"].as_str().unwrap(), "{name}: {tag}");
        }
    }
}

/// The scanner must never read past the slice it was given, so run every
/// document again from an exactly-sized heap copy and from every prefix.
#[test]
fn prefixes_never_panic() {
    let vectors = vectors();
    for case in vectors["cases"].as_array().unwrap() {
        let document = case["document"].as_str().unwrap().as_bytes();
        for end in 0..=document.len() {
            let exact: Box<[u8]> = document[..end].into();
            for field in case["fields"].as_array().unwrap() {
                let tag = field["tag"].as_str().unwrap();
                let value = extract_field(&exact, tag, DEFAULT_MAX_LEN);
                assert!(value.len() < DEFAULT_MAX_LEN);
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Whole documents
// ---------------------------------------------------------------------------

#[test]
fn ofp_test_vectors() {
    let vectors = vectors();
    for case in vectors["ofp"].as_array().unwrap() {
        let name = case["name"].as_str().unwrap();
        let info = OfpInfo::from_document(case["document"].as_str().unwrap().as_bytes());

        let expected: OfpInfo = serde_json::from_value(case["expected"].clone()).unwrap();
        assert_eq!(info, expected, "{name}: parsed record");

        let url = case["download_url"].as_str().unwrap();
        assert_eq!(info.download_url(), url, "{name}: download url");
    }
}
