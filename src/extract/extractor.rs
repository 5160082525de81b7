//! Visible-text, title and link extraction over the html5ever token stream
//!
//! The extractor is a small automaton driven by tag events:
//!
//! | State | On `<script>`/`<style>` | On matching close | Text goes to |
//! |-------|-------------------------|-------------------|--------------|
//! | `Text` | `Ignored(1)` | (ignored) | content |
//! | `Ignored(n)` | `Ignored(n + 1)` | `Ignored(n - 1)` / `Text` | nowhere |
//! | `Title` | - | `Text` | title |
//!
//! Close tags that do not match the current state are dropped, so markup
//! like `</script>` without an opening tag cannot derail capture. Without a
//! tree builder the tokenizer does not know about raw-text elements, so the
//! sink switches it into the right raw mode whenever one opens.

use super::ExtractedPage;
use crate::url::resolve;
use html5ever::tendril::StrTendril;
use html5ever::tokenizer::states::RawKind;
use html5ever::tokenizer::{
    BufferQueue, Tag, TagKind, Token, TokenSink, TokenSinkResult, Tokenizer, TokenizerOpts,
};
use html5ever::Attribute;
use std::collections::BTreeSet;

/// Elements whose content never reaches the extracted text
const IGNORED_ELEMENTS: &[&str] = &["script", "style", "textarea"];

#[derive(Debug, Clone, PartialEq, Eq)]
enum State {
    Text,
    Title,
    Ignored { element: String, depth: usize },
}

/// Accumulates whitespace-normalized text
///
/// Whitespace and markup boundaries both become a single pending space that
/// is only written before the next visible character.
#[derive(Debug, Default)]
struct TextBuffer {
    text: String,
    pending_space: bool,
}

impl TextBuffer {
    fn push(&mut self, run: &str) {
        for c in run.chars() {
            if c.is_whitespace() {
                self.pending_space = true;
                continue;
            }
            if self.pending_space && !self.text.is_empty() {
                self.text.push(' ');
            }
            self.pending_space = false;
            self.text.push(c);
        }
    }

    fn boundary(&mut self) {
        self.pending_space = true;
    }
}

/// Tokenizer mode for the content of an element that was just opened
fn raw_kind(element: &str) -> Option<RawKind> {
    match element {
        "script" => Some(RawKind::ScriptData),
        "style" => Some(RawKind::Rawtext),
        "title" | "textarea" => Some(RawKind::Rcdata),
        _ => None,
    }
}

/// Token sink holding the extraction state of one page
#[derive(Debug)]
struct PageSink {
    base_url: String,
    state: State,
    content: TextBuffer,
    title: Option<TextBuffer>,
    title_done: bool,
    links: BTreeSet<String>,
}

impl TokenSink for PageSink {
    type Handle = ();

    fn process_token(&mut self, token: Token, _line_number: u64) -> TokenSinkResult<()> {
        match token {
            Token::CharacterTokens(text) => self.text(&text),
            Token::TagToken(tag) => {
                self.content.boundary();
                return self.tag(tag);
            }
            Token::CommentToken(_) | Token::DoctypeToken(_) => self.content.boundary(),
            Token::NullCharacterToken | Token::EOFToken | Token::ParseError(_) => {}
        }
        TokenSinkResult::Continue
    }
}

impl PageSink {
    fn text(&mut self, text: &str) {
        match &self.state {
            State::Text => self.content.push(text),
            State::Title => {
                if let Some(title) = self.title.as_mut() {
                    title.push(text);
                }
            }
            State::Ignored { .. } => {}
        }
    }

    fn tag(&mut self, tag: Tag) -> TokenSinkResult<()> {
        let name: &str = &tag.name;

        match tag.kind {
            TagKind::StartTag => {
                if name == "a" {
                    self.collect_link(&tag.attrs);
                }
                if tag.self_closing {
                    return TokenSinkResult::Continue;
                }
                self.open(name);
                match raw_kind(name) {
                    Some(kind) => TokenSinkResult::RawData(kind),
                    None => TokenSinkResult::Continue,
                }
            }
            TagKind::EndTag => {
                self.close(name);
                TokenSinkResult::Continue
            }
        }
    }

    fn open(&mut self, name: &str) {
        match &mut self.state {
            State::Text if IGNORED_ELEMENTS.contains(&name) => {
                self.state = State::Ignored {
                    element: name.to_string(),
                    depth: 1,
                };
            }
            // Only the first title names the page; later ones (e.g. inside SVG) are noise
            State::Text if name == "title" && !self.title_done => {
                self.title = Some(TextBuffer::default());
                self.state = State::Title;
            }
            State::Text if name == "title" => {
                self.state = State::Ignored {
                    element: name.to_string(),
                    depth: 1,
                };
            }
            State::Ignored { element, depth } if element.as_str() == name => *depth += 1,
            _ => {}
        }
    }

    fn close(&mut self, name: &str) {
        match &mut self.state {
            State::Title if name == "title" => {
                self.title_done = true;
                self.state = State::Text;
            }
            State::Ignored { element, depth } if element.as_str() == name => {
                *depth -= 1;
                if *depth == 0 {
                    self.state = State::Text;
                }
            }
            // Unmatched close tags are dropped
            _ => {}
        }
    }

    fn collect_link(&mut self, attrs: &[Attribute]) {
        let href = attrs
            .iter()
            .find(|attr| &*attr.name.local == "href")
            .map(|attr| attr.value.trim());

        if let Some(href) = href.filter(|h| !h.is_empty()) {
            self.links.insert(resolve(&self.base_url, href));
        }
    }
}

/// Streaming extractor for one HTML page
///
/// # Example
///
/// ```
/// use course_search::extract::HtmlExtractor;
///
/// let mut extractor = HtmlExtractor::new("http://valid.null/");
/// extractor.feed("<title>Test Page</title><a href=\"//partial.null/\">Cogito</a>");
/// extractor.feed(" ergo sum<script>alert('x')</script>");
/// let page = extractor.finish();
///
/// assert_eq!(page.title.as_deref(), Some("Test Page"));
/// assert_eq!(page.content, "Cogito ergo sum");
/// assert!(page.links.contains("http://partial.null/"));
/// ```
pub struct HtmlExtractor {
    tokenizer: Tokenizer<PageSink>,
    input: BufferQueue,
}

impl HtmlExtractor {
    /// Creates an extractor resolving links against `base_url`
    pub fn new(base_url: &str) -> Self {
        let sink = PageSink {
            base_url: base_url.to_string(),
            state: State::Text,
            content: TextBuffer::default(),
            title: None,
            title_done: false,
            links: BTreeSet::new(),
        };

        Self {
            tokenizer: Tokenizer::new(sink, TokenizerOpts::default()),
            input: BufferQueue::new(),
        }
    }

    /// Feeds the next chunk of markup
    ///
    /// Tags and character references split across chunks are held back
    /// until the rest arrives.
    pub fn feed(&mut self, chunk: &str) {
        self.input.push_back(StrTendril::from_slice(chunk));
        // The sink never hands control back for scripts, so this always runs to completion
        let _ = self.tokenizer.feed(&mut self.input);
    }

    /// Visible text extracted so far
    pub fn content(&self) -> &str {
        &self.tokenizer.sink.content.text
    }

    /// Links collected so far
    pub fn links(&self) -> &BTreeSet<String> {
        &self.tokenizer.sink.links
    }

    /// Flushes buffered input and returns the extracted page
    pub fn finish(mut self) -> ExtractedPage {
        self.tokenizer.end();
        let sink = &mut self.tokenizer.sink;

        let title = sink
            .title
            .take()
            .map(|buffer| buffer.text)
            .filter(|title| !title.is_empty());

        ExtractedPage {
            title,
            content: std::mem::take(&mut sink.content.text),
            links: std::mem::take(&mut sink.links),
        }
    }
}

/// Extracts title, visible text and links from a complete document
pub fn extract_page(html: &str, base_url: &str) -> ExtractedPage {
    let mut extractor = HtmlExtractor::new(base_url);
    extractor.feed(html);
    extractor.finish()
}

#[cfg(test)]
mod tests {
    use super::*;

    const VALID_PAGE_URL: &str = "http://valid.null/";
    const VALID_PAGE: &str = r#"<html>
                  <head>
                     <title>Test Page</title>
                     <script>
                         alert('test');
                     </script>
                     <style>
                         body {
                           font-size: 12px;
                         }
                     </style>
                     </head>
                 <body>
                     Lorem ipsum <strong> dolor </strong> sit.
                     <a href="index.php?query=bibi%20quid">Ago gratias tibi</a>.
                     <a>Cogito ergo sum.</a>
                     <a href="//partial.null/"> Partial link </a>
                     <a href="ftp://absolute.null/"> Absolute link </a>
                 </body>
             </html>"#;

    fn valid_page() -> ExtractedPage {
        extract_page(VALID_PAGE, VALID_PAGE_URL)
    }

    #[test]
    fn test_found_tokens() {
        let page = valid_page();
        for text in ["Lorem", "ipsum", "dolor", "Cogito ergo sum"] {
            assert!(page.content.contains(text), "missing {:?}", text);
        }
    }

    #[test]
    fn test_no_false_matches() {
        let page = valid_page();
        for text in ["Loremipsum", "ipsumdolor", "tibiCogito", "sit.Ago"] {
            assert!(!page.content.contains(text), "found {:?}", text);
        }
    }

    #[test]
    fn test_ignored_fields() {
        let page = valid_page();
        for text in ["alert", "font-size", "body", "script", "style"] {
            assert!(!page.content.contains(text), "found {:?}", text);
        }
    }

    #[test]
    fn test_title_not_in_content() {
        let page = valid_page();
        assert_eq!(page.title.as_deref(), Some("Test Page"));
        assert!(!page.content.contains("Test Page"));
    }

    #[test]
    fn test_links() {
        let page = valid_page();
        assert!(page
            .links
            .contains("http://valid.null/index.php?query=bibi%20quid"));
        assert!(page.links.contains("http://partial.null/"));
        assert!(page.links.contains("ftp://absolute.null/"));
        assert_eq!(page.links.len(), 3);
    }

    #[test]
    fn test_whitespace_normalized() {
        let page = valid_page();
        assert!(page.content.starts_with("Lorem ipsum dolor sit. Ago gratias tibi"));
        assert!(!page.content.contains("  "));
        assert!(!page.content.contains('\n'));
        assert_eq!(page.content, page.content.trim());
    }

    #[test]
    fn test_tag_boundary_separates_words() {
        let page = extract_page("<a>Cogito</a>ergo<b>sum</b>", "");
        assert_eq!(page.content, "Cogito ergo sum");
    }

    #[test]
    fn test_no_separator_mid_run() {
        let mut extractor = HtmlExtractor::new("");
        extractor.feed("<p>Cog");
        extractor.feed("ito</p>");
        assert_eq!(extractor.finish().content, "Cogito");
    }

    #[test]
    fn test_unopened_tag() {
        let page = extract_page("Lorem ipsum </script> dolor sit.", "");
        assert_eq!(page.content, "Lorem ipsum dolor sit.");
    }

    #[test]
    fn test_unclosed_script_excluded() {
        let page = extract_page("visible <script>var hidden = 1;", "");
        assert_eq!(page.content, "visible");
    }

    #[test]
    fn test_nested_markup_in_script_excluded() {
        let page = extract_page(
            "a<script>document.write('<b>secret</b>')</script>b<style>p{}</style>c",
            "",
        );
        assert_eq!(page.content, "a b c");
    }

    #[test]
    fn test_close_without_open_then_real_script() {
        let page = extract_page("x</style>y<script>z</script>w", "");
        assert_eq!(page.content, "x y w");
    }

    #[test]
    fn test_anchor_without_href_contributes_nothing() {
        let page = extract_page("<a>one</a><a name=x>two</a><a href=\"\">three</a>", VALID_PAGE_URL);
        assert!(page.links.is_empty());
    }

    #[test]
    fn test_duplicate_links_collapse() {
        let page = extract_page(
            r#"<a href="/p">1</a><a href="http://valid.null/p">2</a><a href=" /p ">3</a>"#,
            VALID_PAGE_URL,
        );
        assert_eq!(page.links.len(), 1);
        assert!(page.links.contains("http://valid.null/p"));
    }

    #[test]
    fn test_only_anchor_hrefs_collected() {
        let page = extract_page(
            r#"<link rel="stylesheet" href="/s.css"><img src="/i.png"><area href="/m">"#,
            VALID_PAGE_URL,
        );
        assert!(page.links.is_empty());
    }

    #[test]
    fn test_entities_decoded() {
        let page = extract_page("<title>Q&amp;A</title>Tom &amp; Jerry&nbsp;&lt;3", "");
        assert_eq!(page.title.as_deref(), Some("Q&A"));
        assert_eq!(page.content, "Tom & Jerry <3");
    }

    #[test]
    fn test_named_references_decoded() {
        let page = extract_page(
            "<p>caf&eacute; na&iuml;ve &euro;5 M&uuml;ller &szlig; &hearts;</p>",
            "",
        );
        assert_eq!(page.content, "café naïve €5 Müller ß ♥");
    }

    #[test]
    fn test_numeric_references_decoded() {
        let page = extract_page("caf&#233; &#x2014; &#8364;", "");
        assert_eq!(page.content, "café — €");
    }

    #[test]
    fn test_reference_in_href_decoded() {
        let page = extract_page(r#"<a href="/p?a=1&amp;b=2">x</a>"#, VALID_PAGE_URL);
        assert!(page.links.contains("http://valid.null/p?a=1&b=2"));
    }

    #[test]
    fn test_reference_split_across_chunks() {
        let mut extractor = HtmlExtractor::new("");
        extractor.feed("<p>caf&eac");
        extractor.feed("ute;</p>");
        assert_eq!(extractor.finish().content, "café");
    }

    #[test]
    fn test_title_is_not_markup() {
        let page = extract_page("<title>a <b> c</title>body", "");
        assert_eq!(page.title.as_deref(), Some("a <b> c"));
        assert_eq!(page.content, "body");
    }

    #[test]
    fn test_first_title_wins() {
        let page = extract_page(
            "<title>  First\n  Title </title><svg><title>Icon</title></svg>Body",
            "",
        );
        assert_eq!(page.title.as_deref(), Some("First Title"));
        assert_eq!(page.content, "Body");
    }

    #[test]
    fn test_missing_title() {
        let page = extract_page("<p>No title here</p>", "");
        assert_eq!(page.title, None);
    }

    #[test]
    fn test_streaming_matches_single_feed() {
        let whole = valid_page();
        let mut extractor = HtmlExtractor::new(VALID_PAGE_URL);
        for chunk in VALID_PAGE.as_bytes().chunks(11) {
            // The fixture is ASCII, so byte chunks are valid UTF-8
            extractor.feed(std::str::from_utf8(chunk).unwrap());
        }
        let streamed = extractor.finish();
        assert_eq!(streamed, whole);
    }

    #[test]
    fn test_progress_accessors() {
        let mut extractor = HtmlExtractor::new(VALID_PAGE_URL);
        extractor.feed("<p>Hello</p><a href=\"/x\">");
        assert_eq!(extractor.content(), "Hello");
        assert_eq!(extractor.links().len(), 1);
    }
}
