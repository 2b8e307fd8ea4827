// src/robots/parser.rs
// =============================================================================
// Turns a robots.txt body into the ordered list of URLs to probe.
//
// How it works:
// 1. Read the body line by line
// 2. Split each line on the literal marker "Disallow: /"
// 3. The text after the marker is a path fragment (leading slash already
//    consumed by the marker)
// 4. Check the fragment is a well-formed URL reference (percent escapes,
//    scheme, control characters), then resolve it against the robots.txt
//    address
//
// Only Disallow lines matter. Allow, User-agent groups, comments and
// Crawl-delay are ignored, and wildcards are probed literally.
//
// Entries keep the order they appear in the file and duplicates are kept:
// the list is the schedule for the pipeline.
// =============================================================================

use crate::error::{FragmentError, ScanError};
use std::io::BufRead;
use tracing::debug;
use url::Url;

/// The marker every probed line must contain
pub const DISALLOW_MARKER: &str = "Disallow: /";

#[derive(Debug, Clone)]
pub struct RobotsParser {
    base: Url,
}

impl RobotsParser {
    /// `base` is the robots.txt URL itself, used for relative resolution
    pub fn new(base: Url) -> Self {
        Self { base }
    }

    /// Parses a robots.txt stream into absolute URLs.
    ///
    /// Fails fast: the first fragment that is not a valid URL reference
    /// aborts the parse and nothing collected so far is returned.
    pub fn parse<R: BufRead>(&self, mut reader: R) -> Result<Vec<Url>, ScanError> {
        let mut entries = Vec::new();
        let mut raw = Vec::new();
        let mut line_number = 0;

        loop {
            raw.clear();
            if reader.read_until(b'\n', &mut raw)? == 0 {
                break;
            }
            line_number += 1;

            // Servers do not always send valid UTF-8; the marker is ASCII
            let line = String::from_utf8_lossy(&raw);
            let line = line.trim_end_matches(['\n', '\r']);

            if let Some(resolved) = self.parse_line(line, line_number)? {
                debug!(url = %resolved, line = line_number, "resolved disallowed entry");
                entries.push(resolved);
            }
        }

        Ok(entries)
    }

    // Returns the resolved URL for a matching line, None for anything else
    fn parse_line(&self, line: &str, line_number: usize) -> Result<Option<Url>, ScanError> {
        // The remainder is what sits between the first and second marker
        let fragment = match line.split(DISALLOW_MARKER).nth(1) {
            Some(fragment) if !fragment.is_empty() => fragment,
            _ => return Ok(None),
        };

        let resolved = check_reference(fragment)
            .and_then(|()| self.base.join(fragment).map_err(FragmentError::from))
            .map_err(|source| ScanError::Parse {
                line: line_number,
                fragment: fragment.to_string(),
                source,
            })?;

        Ok(Some(resolved))
    }
}

// Url::join is lenient: it percent-encodes stray '%' and accepts a bare
// ':' prefix. Those references are rejected here instead.
fn check_reference(fragment: &str) -> Result<(), FragmentError> {
    if fragment.bytes().any(|b| b < 0x20 || b == 0x7f) {
        return Err(FragmentError::ControlCharacter);
    }

    let (reference, anchor) = match fragment.split_once('#') {
        Some((reference, anchor)) => (reference, Some(anchor)),
        None => (fragment, None),
    };
    // The query is passed through untouched
    let path = reference.split_once('?').map_or(reference, |(path, _)| path);

    check_escapes(path)?;
    if let Some(anchor) = anchor {
        check_escapes(anchor)?;
    }
    check_scheme(path)
}

// Every '%' must start a two hex digit escape
fn check_escapes(text: &str) -> Result<(), FragmentError> {
    let bytes = text.as_bytes();
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] != b'%' {
            i += 1;
            continue;
        }
        let valid = bytes
            .get(i + 1..i + 3)
            .is_some_and(|hex| hex.iter().all(u8::is_ascii_hexdigit));
        if !valid {
            let escape: String = text[i..].chars().take(3).collect();
            return Err(FragmentError::BadEscape(escape));
        }
        i += 3;
    }
    Ok(())
}

// A scheme is letters followed by letters, digits, '+', '-' or '.', then ':'.
// Without one, the first path segment may not contain a colon.
fn check_scheme(path: &str) -> Result<(), FragmentError> {
    for (i, c) in path.char_indices() {
        match c {
            c if c.is_ascii_alphabetic() => {}
            '0'..='9' | '+' | '-' | '.' if i > 0 => {}
            ':' if i == 0 => return Err(FragmentError::MissingScheme),
            ':' => return Ok(()),
            _ => break,
        }
    }

    let first_segment = path.split('/').next().unwrap_or_default();
    if first_segment.contains(':') {
        return Err(FragmentError::ColonInFirstSegment);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parser() -> RobotsParser {
        RobotsParser::new(Url::parse("http://example.com/robots.txt").unwrap())
    }

    fn as_strings(entries: &[Url]) -> Vec<String> {
        entries.iter().map(|u| u.to_string()).collect()
    }

    #[test]
    fn test_basic_disallow_entries() {
        let body = "User-agent: *\nDisallow: /admin\nDisallow: /secret\n";
        let entries = parser().parse(body.as_bytes()).unwrap();
        assert_eq!(
            as_strings(&entries),
            vec!["http://example.com/admin", "http://example.com/secret"]
        );
    }

    #[test]
    fn test_order_and_duplicates_preserved() {
        let body = "Disallow: /b\nDisallow: /a\nDisallow: /b\n";
        let entries = parser().parse(body.as_bytes()).unwrap();
        assert_eq!(
            as_strings(&entries),
            vec![
                "http://example.com/b",
                "http://example.com/a",
                "http://example.com/b"
            ]
        );
    }

    #[test]
    fn test_empty_remainder_is_skipped() {
        let body = "Disallow: /\nDisallow: /private/\n";
        let entries = parser().parse(body.as_bytes()).unwrap();
        assert_eq!(as_strings(&entries), vec!["http://example.com/private/"]);
    }

    #[test]
    fn test_other_directives_ignored() {
        let body = "# comment\nAllow: /public\nUser-agent: bot\nCrawl-delay: 10\nSitemap: http://example.com/s.xml\n";
        let entries = parser().parse(body.as_bytes()).unwrap();
        assert!(entries.is_empty());
    }

    #[test]
    fn test_crlf_line_endings() {
        let body = "User-agent: *\r\nDisallow: /admin\r\nDisallow: /tmp\r\n";
        let entries = parser().parse(body.as_bytes()).unwrap();
        assert_eq!(
            as_strings(&entries),
            vec!["http://example.com/admin", "http://example.com/tmp"]
        );
    }

    #[test]
    fn test_query_and_wildcard_kept_literally() {
        let body = "Disallow: /search?q=1\nDisallow: /*.php\n";
        let entries = parser().parse(body.as_bytes()).unwrap();
        assert_eq!(entries[0].as_str(), "http://example.com/search?q=1");
        assert_eq!(entries[1].path(), "/*.php");
    }

    #[test]
    fn test_resolves_against_https_base() {
        let parser = RobotsParser::new(Url::parse("https://example.org:8443/robots.txt").unwrap());
        let entries = parser.parse("Disallow: /cgi-bin/\n".as_bytes()).unwrap();
        assert_eq!(entries[0].as_str(), "https://example.org:8443/cgi-bin/");
    }

    #[test]
    fn test_malformed_fragment_fails_fast() {
        // the remainder "//example.org:99999/x" has an invalid port
        let body = "Disallow: /ok\nDisallow: ///example.org:99999/x\nDisallow: /later\n";
        let err = parser().parse(body.as_bytes()).unwrap_err();
        match err {
            ScanError::Parse { line, fragment, .. } => {
                assert_eq!(line, 2);
                assert_eq!(fragment, "//example.org:99999/x");
            }
            other => panic!("expected parse error, got {other:?}"),
        }
    }

    #[test]
    fn test_bad_percent_escape_fails() {
        for (body, escape) in [("Disallow: /%zz\n", "%zz"), ("Disallow: /a%\n", "%")] {
            let err = parser().parse(body.as_bytes()).unwrap_err();
            match err {
                ScanError::Parse { line, source, .. } => {
                    assert_eq!(line, 1);
                    assert_eq!(source, FragmentError::BadEscape(escape.to_string()));
                }
                other => panic!("expected parse error, got {other:?}"),
            }
        }
    }

    #[test]
    fn test_valid_percent_escape_kept() {
        let entries = parser().parse("Disallow: /a%20b\n".as_bytes()).unwrap();
        assert_eq!(entries[0].as_str(), "http://example.com/a%20b");
    }

    #[test]
    fn test_query_escapes_not_checked() {
        let entries = parser().parse("Disallow: /search?q=100%\n".as_bytes()).unwrap();
        assert_eq!(entries.len(), 1);
    }

    #[test]
    fn test_leading_colon_fails() {
        let body = "Disallow: /ok\nDisallow: /:foo\n";
        let err = parser().parse(body.as_bytes()).unwrap_err();
        match err {
            ScanError::Parse {
                line,
                fragment,
                source,
            } => {
                assert_eq!(line, 2);
                assert_eq!(fragment, ":foo");
                assert_eq!(source, FragmentError::MissingScheme);
            }
            other => panic!("expected parse error, got {other:?}"),
        }
    }

    #[test]
    fn test_colon_in_first_segment_fails() {
        let err = parser().parse("Disallow: /1a:b\n".as_bytes()).unwrap_err();
        assert!(matches!(
            err,
            ScanError::Parse {
                source: FragmentError::ColonInFirstSegment,
                ..
            }
        ));
        // a colon after the first slash is an ordinary path character
        let entries = parser().parse("Disallow: /a/b:c\n".as_bytes()).unwrap();
        assert_eq!(entries[0].as_str(), "http://example.com/a/b:c");
    }

    #[test]
    fn test_control_character_fails() {
        let err = parser().parse("Disallow: /a\tb\n".as_bytes()).unwrap_err();
        assert!(matches!(
            err,
            ScanError::Parse {
                source: FragmentError::ControlCharacter,
                ..
            }
        ));
    }

    #[test]
    fn test_invalid_utf8_does_not_abort() {
        let body: &[u8] = b"Disallow: /caf\xe9\nDisallow: /next\n";
        let entries = parser().parse(body).unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[1].as_str(), "http://example.com/next");
    }

    #[test]
    fn test_empty_body() {
        assert!(parser().parse("".as_bytes()).unwrap().is_empty());
    }
}
