//! Bounded tag scanner for flat dispatch documents.
//!
//! # Design
//! The dispatch service emits templated markup, not schema-validated XML,
//! so this is a scanner and not a parser. For each requested tag it finds
//! the first opening token, skips to the end of that token, and copies up
//! to the matching closer. Every search is bounded by the slice it runs
//! on: an opening tag with no closer before the end of the document is
//! "absent", never a runaway copy.
//!
//! Values get four entities decoded (`&lt;` `&gt;` `&amp;` `&quot;`) and
//! are truncated to `max_len - 1` bytes, the width of the field they land
//! in. A missing field is always the empty string.

/// One value to pull out of a document into a record of type `R`.
pub struct FieldSpec<R> {
    /// Optional enclosing element that bounds the search for `tag`.
    pub container: Option<&'static str>,
    pub tag: &'static str,
    /// Field width including the terminator slot; values keep at most
    /// `max_len - 1` bytes.
    pub max_len: usize,
    pub field: fn(&mut R) -> &mut String,
}

impl<R> FieldSpec<R> {
    pub const fn leaf(tag: &'static str, max_len: usize, field: fn(&mut R) -> &mut String) -> Self {
        Self {
            container: None,
            tag,
            max_len,
            field,
        }
    }

    pub const fn nested(
        container: &'static str,
        tag: &'static str,
        max_len: usize,
        field: fn(&mut R) -> &mut String,
    ) -> Self {
        Self {
            container: Some(container),
            tag,
            max_len,
            field,
        }
    }
}

/// Fill `record` from `document` according to `specs`.
///
/// Every listed field is overwritten, found or not.
pub fn extract_fields<R>(document: &[u8], specs: &[FieldSpec<R>], record: &mut R) {
    for spec in specs {
        let value = match spec.container {
            Some(container) => extract_nested(document, container, spec.tag, spec.max_len),
            None => extract_field(document, spec.tag, spec.max_len),
        };
        *(spec.field)(record) = value;
    }
}

/// Value of the first `<tag>` in `document`, or `""` if absent.
pub fn extract_field(document: &[u8], tag: &str, max_len: usize) -> String {
    match element_content(document, tag) {
        Some(raw) => bounded_value(raw, max_len),
        None => String::new(),
    }
}

/// Value of `<tag>` inside the first `<container>`.
///
/// A container that holds plain text and no child markup is its own value,
/// so `<origin>KJFK</origin>` and `<origin><icao_code>KJFK</icao_code></origin>`
/// read the same.
pub fn extract_nested(document: &[u8], container: &str, tag: &str, max_len: usize) -> String {
    let Some(scope) = element_content(document, container) else {
        return String::new();
    };
    if let Some(raw) = element_content(scope, tag) {
        return bounded_value(raw, max_len);
    }
    if !scope.contains(&b'<') {
        return bounded_value(scope, max_len);
    }
    String::new()
}

/// Raw bytes between the first `<tag ...>` and its `</tag>`.
fn element_content<'a>(document: &'a [u8], tag: &str) -> Option<&'a [u8]> {
    let (start, self_closing) = open_tag_end(document, tag)?;
    if self_closing {
        return Some(&document[start..start]);
    }
    let closer = closing_token(tag);
    let len = find(&document[start..], &closer)?;
    Some(&document[start..start + len])
}

/// Offset just past the `>` of the first opening token for `tag`, and
/// whether that token was `<tag/>`.
fn open_tag_end(document: &[u8], tag: &str) -> Option<(usize, bool)> {
    let name = tag.as_bytes();
    let mut from = 0;
    while let Some(rel) = find(&document[from..], b"<") {
        let lt = from + rel;
        let after_name = lt + 1 + name.len();
        if document[lt + 1..].starts_with(name) {
            match document.get(after_name) {
                Some(b'>') => return Some((after_name + 1, false)),
                Some(b) if *b == b'/' || b.is_ascii_whitespace() => {
                    // First occurrence decides; an unterminated token is absent.
                    let gt = after_name + find(&document[after_name..], b">")?;
                    let self_closing = document[gt - 1] == b'/';
                    return Some((gt + 1, self_closing));
                }
                // `<tagname...>` is a different element; keep scanning.
                _ => {}
            }
        }
        from = lt + 1;
    }
    None
}

fn closing_token(tag: &str) -> Vec<u8> {
    let mut closer = Vec::with_capacity(tag.len() + 3);
    closer.extend_from_slice(b"</");
    closer.extend_from_slice(tag.as_bytes());
    closer.push(b'>');
    closer
}

fn find(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    if needle.is_empty() || needle.len() > haystack.len() {
        return None;
    }
    haystack.windows(needle.len()).position(|w| w == needle)
}

fn bounded_value(raw: &[u8], max_len: usize) -> String {
    let decoded = decode_entities(raw);
    let mut value = String::from_utf8_lossy(&decoded).into_owned();
    truncate_to(&mut value, max_len.saturating_sub(1));
    value
}

/// Truncate to at most `limit` bytes without splitting a character.
fn truncate_to(value: &mut String, limit: usize) {
    if value.len() <= limit {
        return;
    }
    let mut cut = limit;
    while !value.is_char_boundary(cut) {
        cut -= 1;
    }
    value.truncate(cut);
}

const ENTITIES: [(&[u8], u8); 4] = [
    (b"&lt;" as &[u8], b'<'),
    (b"&gt;" as &[u8], b'>'),
    (b"&amp;" as &[u8], b'&'),
    (b"&quot;" as &[u8], b'"'),
];

/// Single left-to-right pass, so `&amp;lt;` decodes to `&lt;`.
pub fn decode_entities(raw: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(raw.len());
    let mut i = 0;
    'outer: while i < raw.len() {
        if raw[i] == b'&' {
            for (entity, byte) in ENTITIES {
                if raw[i..].starts_with(entity) {
                    out.push(byte);
                    i += entity.len();
                    continue 'outer;
                }
            }
        }
        out.push(raw[i]);
        i += 1;
    }
    out
}

/// Inverse of `decode_entities`; used to build documents.
pub fn encode_entities(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '&' => out.push_str("&amp;"),
            '"' => out.push_str("&quot;"),
            _ => out.push(c),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct Pair {
        a: String,
        b: String,
    }

    const PAIR: [FieldSpec<Pair>; 2] = [
        FieldSpec::<Pair>::leaf("a", 16, |r| &mut r.a),
        FieldSpec::<Pair>::leaf("b", 16, |r| &mut r.b),
    ];

    #[test]
    fn extracts_inner_text() {
        assert_eq!(extract_field(b"<origin>KJFK</origin>", "origin", 10), "KJFK");
    }

    #[test]
    fn decodes_the_four_entities() {
        let doc = b"<status>a &lt;b&gt; &amp; &quot;c&quot;</status>";
        assert_eq!(extract_field(doc, "status", 100), "a <b> & \"c\"");
    }

    #[test]
    fn other_entities_are_copied_verbatim() {
        let doc = b"<status>&apos;&#65;&amp</status>";
        assert_eq!(extract_field(doc, "status", 100), "&apos;&#65;&amp");
    }

    #[test]
    fn missing_tag_overwrites_sentinel_with_empty() {
        let mut rec = Pair {
            a: "\u{7f}".repeat(15),
            b: "\u{7f}".repeat(15),
        };
        extract_fields(b"<a>x</a>", &PAIR, &mut rec);
        assert_eq!(rec.a, "x");
        assert!(rec.b.is_empty());
    }

    #[test]
    fn unterminated_tag_is_absent() {
        let doc = b"<status>Success".to_vec().into_boxed_slice();
        assert_eq!(extract_field(&doc, "status", 100), "");
    }

    #[test]
    fn unterminated_open_token_is_absent() {
        assert_eq!(extract_field(b"<status id=\"1\"", "status", 100), "");
        assert_eq!(extract_field(b"<status", "status", 100), "");
    }

    #[test]
    fn first_occurrence_wins() {
        assert_eq!(extract_field(b"<leg>A</leg><leg>B</leg>", "leg", 10), "A");
    }

    #[test]
    fn unterminated_first_occurrence_does_not_fall_through() {
        assert_eq!(extract_field(b"<leg attr=\"x\"", "leg", 10), "");
        assert_eq!(extract_field(b"<leg>A<leg>B", "leg", 10), "");
    }

    #[test]
    fn attributes_are_skipped() {
        let doc = b"<link type=\"xpe\" rel=\"x\">plan.fms</link>";
        assert_eq!(extract_field(doc, "link", 50), "plan.fms");
    }

    #[test]
    fn longer_tag_names_do_not_match() {
        let doc = b"<status_text>nope</status_text><status>Success</status>";
        assert_eq!(extract_field(doc, "status", 100), "Success");
    }

    #[test]
    fn self_closing_tag_is_empty() {
        assert_eq!(extract_field(b"<static_id/><x>1</x>", "static_id", 10), "");
        assert_eq!(extract_field(b"<static_id />", "static_id", 10), "");
    }

    #[test]
    fn truncates_to_max_len_minus_one() {
        assert_eq!(extract_field(b"<o>ABCDEFGHIJ</o>", "o", 5), "ABCD");
        assert_eq!(extract_field(b"<o>ABC</o>", "o", 1), "");
        assert_eq!(extract_field(b"<o>ABC</o>", "o", 0), "");
    }

    #[test]
    fn truncation_keeps_utf8_boundaries() {
        let doc = "<o>aé</o>".as_bytes();
        assert_eq!(extract_field(doc, "o", 3), "a");
    }

    #[test]
    fn nested_reads_child_inside_container() {
        let doc = b"<destination><iata_code>BOS</iata_code><icao_code>KBOS</icao_code></destination>\
                    <alternate><icao_code>KPVD</icao_code></alternate>";
        assert_eq!(extract_nested(doc, "destination", "icao_code", 10), "KBOS");
        assert_eq!(extract_nested(doc, "alternate", "icao_code", 10), "KPVD");
    }

    #[test]
    fn nested_falls_back_to_plain_container_text() {
        assert_eq!(extract_nested(b"<origin>KJFK</origin>", "origin", "icao_code", 10), "KJFK");
    }

    #[test]
    fn nested_does_not_leak_past_container() {
        let doc = b"<origin><name>JFK</name></origin><icao_code>KBOS</icao_code>";
        assert_eq!(extract_nested(doc, "origin", "icao_code", 10), "");
    }

    #[test]
    fn entity_round_trip() {
        let value = "A&B <x> \"q\" &amp; ~!@#$%^*()_+{}|:?";
        let doc = format!("<v>{}</v>", encode_entities(value));
        assert_eq!(extract_field(doc.as_bytes(), "v", 200), value);
    }

    #[test]
    fn empty_document_yields_empty_fields() {
        let mut rec = Pair::default();
        extract_fields(b"", &PAIR, &mut rec);
        assert!(rec.a.is_empty() && rec.b.is_empty());
    }
}
