//! Chapter markup → display lines and geocoded references.

use std::sync::LazyLock;

use mapscrip_core::ChapterDocument;
use quick_xml::escape::{resolve_html5_entity, unescape_with};
use regex::{Captures, Regex};

static SCRIPT_OR_STYLE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?is)<script\b.*?</script\s*>|<style\b.*?</style\s*>").expect("valid regex")
});
static LINE_BREAK: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)<br\s*/?>|</(?:p|div|li|h[1-6]|ul|ol|tr|table|blockquote)\s*>")
        .expect("valid regex")
});
static WHITESPACE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+").expect("valid regex"));
static TAG: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?s)<[^>]*>").expect("valid regex"));
static ONCLICK: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)\bonclick\s*=\s*(?:"([^"]*)"|'([^']*)')"#).expect("valid regex")
});
static ENTITY: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"&(#[xX][0-9a-fA-F]+|#[0-9]+|[a-zA-Z]+);").expect("valid regex"));

pub fn extract_document(markup: &str) -> ChapterDocument {
    ChapterDocument {
        lines: extract_lines(markup),
        references: extract_references(markup),
    }
}

/// Every `onclick` handler in document order. Handlers that are not place
/// references are left for the marker parser to discard.
pub fn extract_references(markup: &str) -> Vec<String> {
    ONCLICK
        .captures_iter(markup)
        .filter_map(|caps| caps.get(1).or_else(|| caps.get(2)))
        .map(|m| decode_entities(m.as_str()).trim().to_string())
        .filter(|handler| !handler.is_empty())
        .collect()
}

pub fn extract_lines(markup: &str) -> Vec<String> {
    let text = SCRIPT_OR_STYLE.replace_all(markup, "");
    // Source line breaks mean nothing; only block elements start a new line.
    let text = WHITESPACE.replace_all(&text, " ");
    let text = LINE_BREAK.replace_all(&text, "\n");
    let text = TAG.replace_all(&text, "");
    let text = decode_entities(&text);

    text.lines()
        .map(|line| line.split_whitespace().collect::<Vec<_>>().join(" "))
        .filter(|line| !line.is_empty())
        .collect()
}

/// Resolves character references and HTML named entities. Anything quick-xml
/// cannot resolve is kept as written.
pub fn decode_entities(text: &str) -> String {
    ENTITY
        .replace_all(text, |caps: &Captures| {
            let raw = &caps[0];
            match unescape_with(raw, resolve_html5_entity) {
                Ok(decoded) => decoded.into_owned(),
                Err(err) => {
                    log::trace!("leaving {raw} as is: {err}");
                    raw.to_string()
                }
            }
        })
        .into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    const CHAPTER: &str = r#"
        <div class="chapterheading">Genesis 12</div>
        <script>var x = "<b>not text</b>";</script>
        <ul class="versesblock">
          <li><span class="verse">1</span>Now the Lord had said unto Abram&mdash;Get thee out</li>
          <li><span class="verse">6</span>And Abram passed through the land unto the place of
              <a onclick="showLocation(711,'Sichem',32.2137,35.2823,32.2137,35.2823,0,0,5000,0,'')">Sichem</a>,
              unto the plain of <a onclick="showLocation(466,'Moreh',32.5,35.3,32.5,35.3,0,0,5000,0,'')">Moreh</a>.</li>
          <li><span class="verse">8</span>Bethel &amp; Hai<br/>second line</li>
        </ul>
        <a onclick="changeHash('1:101:13')">Next</a>
    "#;

    #[test]
    fn lines_drop_markup_and_scripts() {
        let lines = extract_lines(CHAPTER);
        assert_eq!(lines[0], "Genesis 12");
        assert_eq!(lines[1], "1Now the Lord had said unto Abram—Get thee out");
        assert_eq!(
            lines[2],
            "6And Abram passed through the land unto the place of Sichem, unto the plain of Moreh."
        );
        assert!(lines.iter().any(|l| l == "8Bethel & Hai"));
        assert!(lines.iter().any(|l| l == "second line"));
        assert!(lines.iter().all(|l| !l.contains("not text")));
    }

    #[test]
    fn references_keep_document_order() {
        let refs = extract_references(CHAPTER);
        assert_eq!(refs.len(), 3);
        assert!(refs[0].starts_with("showLocation(711,'Sichem'"));
        assert!(refs[1].contains("'Moreh'"));
        assert_eq!(refs[2], "changeHash('1:101:13')");
    }

    #[test]
    fn encoded_quotes_in_handlers_are_decoded() {
        let refs = extract_references(
            r#"<a onclick="showLocation(1,&#39;Zion&#39;,31.77,35.22,31.77,35.22,0,0,900,0,&#39;&#39;)">Zion</a>"#,
        );
        assert_eq!(
            refs,
            vec!["showLocation(1,'Zion',31.77,35.22,31.77,35.22,0,0,900,0,'')"]
        );
    }

    #[test]
    fn entities_decode_or_pass_through() {
        assert_eq!(
            decode_entities("a&nbsp;b &#65;&#x42; &bogus; &#xZZ;"),
            "a\u{a0}b AB &bogus; &#xZZ;"
        );
    }

    #[test]
    fn accented_names_and_symbols_decode() {
        assert_eq!(
            decode_entities("Ca&iacute;n &rarr; Zo&euml;r &sect;3"),
            "Caín → Zoër §3"
        );
        assert_eq!(
            extract_lines("<p>Ca&iacute;n&nbsp;&amp;&nbsp;Abel</p>"),
            vec!["Caín & Abel"]
        );
    }
}
