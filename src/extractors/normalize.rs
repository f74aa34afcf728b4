// src/extractors/normalize.rs
use once_cell::sync::Lazy;
use regex::Regex;
use scraper::{node::Node, Html};

// Unicode-aware, so non-breaking spaces from `&nbsp;` collapse too.
static WHITESPACE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\s+").expect("Failed to compile WHITESPACE_RE"));

const SKIPPED_ELEMENTS: [&str; 2] = ["script", "style"];

/// Reduces filing markup to visible text with whitespace collapsed to single spaces.
///
/// Text nodes are concatenated in document order without separators, so
/// `<td>Item</td><td>1A</td>` reads as `Item1A`. Script and style content is
/// dropped entirely. The HTML parser is error-tolerant; any input yields text.
pub fn normalize_markup(raw: &str) -> String {
    let document = Html::parse_document(raw);
    let mut text = String::with_capacity(raw.len() / 2);
    push_visible_text(&document, &mut text);
    collapse_whitespace(&text)
}

fn push_visible_text(html: &Html, out: &mut String) {
    for node in html.tree.root().descendants() {
        let Node::Text(fragment) = node.value() else {
            continue;
        };
        let hidden = node.ancestors().any(|ancestor| {
            ancestor
                .value()
                .as_element()
                .is_some_and(|el| SKIPPED_ELEMENTS.contains(&el.name()))
        });
        if hidden {
            continue;
        }

        // With scripting enabled the parser keeps <noscript> content as one
        // raw text node, tags included.
        let in_noscript = node
            .parent()
            .and_then(|parent| parent.value().as_element())
            .is_some_and(|el| el.name() == "noscript");
        if in_noscript {
            push_visible_text(&Html::parse_fragment(fragment), out);
        } else {
            out.push_str(fragment);
        }
    }
}

pub fn collapse_whitespace(text: &str) -> String {
    WHITESPACE_RE.replace_all(text, " ").trim().to_string()
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::*;

    fn has_whitespace_run(text: &str) -> bool {
        let chars: Vec<char> = text.chars().collect();
        chars.windows(2).any(|w| w[0].is_whitespace() && w[1].is_whitespace())
    }

    #[test]
    fn strips_script_and_style() {
        let html = r#"<html><head><style>.x { color: red; }</style>
            <script>var itemCount = 3;</script></head>
            <body><p>Item 1.   Business</p><script>alert("Item 1A")</script></body></html>"#;
        let text = normalize_markup(html);
        assert_eq!(text, "Item 1. Business");
    }

    #[test]
    fn collapses_newlines_tabs_and_nbsp() {
        let html = "<body>\n  <div>Item&nbsp;1A.\t\tRisk</div>\n\n<p>Factors  here </p>  </body>";
        let text = normalize_markup(html);
        assert_eq!(text, "Item 1A. Risk Factors here");
        assert!(!has_whitespace_run(&text));
    }

    #[test]
    fn adjacent_cells_concatenate() {
        let html = "<table><tr><td>Item</td><td>1A</td></tr></table>";
        assert_eq!(normalize_markup(html), "Item1A");
    }

    #[test]
    fn tolerates_garbage_bytes() {
        let raw = [0xff, 0xfe, b'<', b'p', b'>', b'o', b'k', 0x00, b' ', b' ', b'<', b'/', b'x'];
        let text = normalize_markup(&String::from_utf8_lossy(&raw));
        assert!(text.contains("ok"));
        assert!(!has_whitespace_run(&text));
    }

    #[test]
    fn plain_text_passes_through() {
        assert_eq!(normalize_markup("  just   text\n"), "just text");
        assert_eq!(normalize_markup(""), "");
    }

    #[test]
    fn noscript_content_is_reduced_to_text() {
        let html = r#"<body><p>A.</p><noscript><img src="x"><span>B</span></noscript></body>"#;
        assert_eq!(normalize_markup(html), "A.B");
    }

    #[test]
    fn noscript_in_head_leaks_no_tags() {
        let html = r#"<html><head><noscript><style>p{}</style><link rel="x"></noscript></head><body>Item 1.</body></html>"#;
        let text = normalize_markup(html);
        assert_eq!(text, "Item 1.");
    }

    #[test]
    fn mixed_documents_are_trimmed() {
        let samples = [
            "<p> a </p>\n\n<p> b </p>",
            "<div>\u{2003}x\u{00a0}\u{00a0}y\r\n</div>",
            "<pre>\n\n\tcode\n\n</pre><!-- comment -->",
            "<<<>>> < p >",
        ];
        for sample in samples {
            let text = normalize_markup(sample);
            assert!(!has_whitespace_run(&text), "run found in {text:?}");
            assert_eq!(text, text.trim());
        }
    }

    fn markup_piece() -> impl Strategy<Value = String> {
        prop_oneof![
            Just("<p>".to_string()),
            Just("</p>".to_string()),
            Just("<div>".to_string()),
            Just("</div>".to_string()),
            Just("<td>".to_string()),
            Just("<br>".to_string()),
            Just("&nbsp;".to_string()),
            Just("<noscript><span> n </span></noscript>".to_string()),
            Just("<script>var x = 1;</script>".to_string()),
            prop::string::string_regex("[a-zA-Z0-9.!? \t\n\u{a0}\u{2028}]{0,16}").unwrap(),
        ]
    }

    fn markup_document() -> impl Strategy<Value = String> {
        prop::collection::vec(markup_piece(), 0..40).prop_map(|pieces| pieces.concat())
    }

    proptest! {
        #[test]
        fn no_whitespace_runs_on_generated_markup(html in markup_document()) {
            let text = normalize_markup(&html);
            prop_assert!(!has_whitespace_run(&text), "run found in {:?}", text);
            prop_assert_eq!(text.trim(), text.as_str());
            prop_assert!(!text.contains('<'), "tag text leaked: {:?}", text);
        }

        #[test]
        fn collapse_is_idempotent(raw in "[a-z \t\n\u{a0}\u{2028}]{0,64}") {
            let once = collapse_whitespace(&raw);
            prop_assert_eq!(collapse_whitespace(&once), once.clone());
            prop_assert!(!has_whitespace_run(&once));
        }
    }
}
