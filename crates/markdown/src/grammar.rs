//! Line grammar shared by the exporters and both importers.

use once_cell::sync::Lazy;
use regex::Regex;

static ANNOTATION: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^<!--\s*hierarchy:\s*([\d.]+)\s+level:\s*(\d+)\s*-->$")
        .expect("annotation pattern is valid")
});

static HEADING: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(#{1,6}) (.+)$").expect("heading pattern is valid"));

static BULLET: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^( *)- (.+)$").expect("bullet pattern is valid"));

/// Classification of a single input line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Line<'a> {
    Blank,
    /// Annotation marker; `path` is `None` when a segment is not a number.
    Annotation {
        path: Option<Vec<u64>>,
        level: usize,
    },
    Heading {
        depth: usize,
        title: &'a str,
    },
    Bullet {
        indent: usize,
        title: &'a str,
    },
    Text(&'a str),
}

/// Renders the annotation line written before every exported node.
pub(crate) fn annotation(path: &str, level: usize) -> String {
    format!("<!-- hierarchy: {path} level: {level} -->")
}

pub(crate) fn is_annotation(line: &str) -> bool {
    ANNOTATION.is_match(line.trim())
}

pub(crate) fn classify(line: &str) -> Line<'_> {
    let trimmed = line.trim();
    if trimmed.is_empty() {
        return Line::Blank;
    }
    if let Some(caps) = ANNOTATION.captures(trimmed) {
        let path = parse_path(&caps[1]);
        let level = caps[2].parse().unwrap_or(usize::MAX);
        return Line::Annotation { path, level };
    }

    let line = line.trim_end();
    if let Some(caps) = HEADING.captures(line) {
        let title = caps.get(2).map_or("", |m| m.as_str()).trim();
        if !title.is_empty() {
            return Line::Heading {
                depth: caps[1].len(),
                title,
            };
        }
    }
    if let Some(caps) = BULLET.captures(line) {
        let title = caps.get(2).map_or("", |m| m.as_str()).trim();
        if !title.is_empty() {
            return Line::Bullet {
                indent: caps[1].len(),
                title,
            };
        }
    }
    Line::Text(trimmed)
}

/// Zero segments are kept; only ordering depends on the values.
fn parse_path(raw: &str) -> Option<Vec<u64>> {
    raw.split('.')
        .map(|segment| segment.parse::<u64>().ok())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recognises_annotations() {
        assert_eq!(
            classify("  <!-- hierarchy: 2.1.3 level: 2 -->  "),
            Line::Annotation {
                path: Some(vec![2, 1, 3]),
                level: 2
            }
        );
        assert_eq!(
            classify("<!--hierarchy:1..2 level:1-->"),
            Line::Annotation {
                path: None,
                level: 1
            }
        );
        assert_eq!(
            classify("<!-- hierarchy: 0 level: 0 -->"),
            Line::Annotation {
                path: Some(vec![0]),
                level: 0
            }
        );
        assert!(is_annotation(&annotation("1.4", 1)));
        assert!(!is_annotation("<!-- comment -->"));
    }

    #[test]
    fn recognises_headings_and_bullets() {
        assert_eq!(
            classify("### Plot"),
            Line::Heading {
                depth: 3,
                title: "Plot"
            }
        );
        assert_eq!(
            classify("    - nested"),
            Line::Bullet {
                indent: 4,
                title: "nested"
            }
        );
        assert_eq!(classify("####### too deep"), Line::Text("####### too deep"));
        assert_eq!(classify("#nospace"), Line::Text("#nospace"));
        assert_eq!(classify("   plain  "), Line::Text("plain"));
        assert_eq!(classify(" \t "), Line::Blank);
    }
}
