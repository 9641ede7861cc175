//! CommonMark → Jira wiki markup.
//!
//! The Markdown is parsed with `pulldown-cmark` and its event stream is walked
//! once. `Start` events are node entry and `End` events node exit; each
//! writes into the output buffer of a [`RenderState`] that lives for exactly
//! one [`render_markdown`] call.

use pulldown_cmark::{CodeBlockKind, Event, Options, Parser, Tag, TagEnd};

use crate::mention::rewrite_mentions;

/// Language declared on `{code}` blocks that have none.
pub const DEFAULT_CODE_LANGUAGE: &str = "java";

/// Marker repeated once per nesting level at the start of a list item.
const LIST_MARKER: char = '*';

/// Converts a Markdown document into Jira wiki markup.
///
/// Headings, emphasis, strikethrough, inline code, fenced and indented code
/// blocks, links, images, rules, line breaks and (nested) lists are
/// converted; raw HTML, tables and block quotes contribute only their text.
/// `@name` mentions in ordinary text become `[~name]`. The result is trimmed.
pub fn render_markdown(markdown: &str) -> String {
    let parser = Parser::new_ext(
        markdown,
        Options::ENABLE_STRIKETHROUGH | Options::ENABLE_TABLES,
    );
    let mut state = RenderState::with_capacity(markdown.len());
    for event in parser {
        state.apply(event);
    }
    state.finish()
}

/// Walk state for one render.
#[derive(Debug, Default)]
struct RenderState {
    out: String,
    list_depth: usize,
    in_list: bool,
    in_code_block: bool,
    /// Link and image targets, written when the node closes.
    destinations: Vec<String>,
}

impl RenderState {
    fn with_capacity(capacity: usize) -> Self {
        Self {
            out: String::with_capacity(capacity),
            ..Self::default()
        }
    }

    fn apply(&mut self, event: Event<'_>) {
        match event {
            Event::Start(tag) => self.enter(tag),
            Event::End(tag) => self.exit(tag),
            Event::Text(text) if self.in_code_block => self.out.push_str(&text),
            Event::Text(text) => self.out.push_str(&rewrite_mentions(&text)),
            Event::Code(code) => {
                self.out.push_str("{{");
                self.out.push_str(&code);
                self.out.push_str("}}");
            }
            Event::SoftBreak => self.out.push(' '),
            Event::HardBreak => self.out.push('\n'),
            Event::Rule => self.out.push_str("----\n"),
            // Raw HTML, footnote references, math: dropped.
            _ => {}
        }
    }

    fn enter(&mut self, tag: Tag<'_>) {
        match tag {
            Tag::Heading { level, .. } => {
                self.separate_block();
                self.out.push('h');
                self.out.push_str(&(level as usize).to_string());
                self.out.push_str(". ");
            }
            Tag::Paragraph => {
                if !self.in_list {
                    self.separate_block();
                }
            }
            Tag::List(_) => {
                self.in_list = true;
                self.list_depth += 1;
            }
            Tag::Item => {
                if !self.out.is_empty() && !self.out.ends_with('\n') {
                    self.out.push('\n');
                }
                self.out
                    .extend(std::iter::repeat(LIST_MARKER).take(self.list_depth));
                self.out.push(' ');
            }
            Tag::Strong => self.out.push('*'),
            Tag::Emphasis => self.out.push('_'),
            Tag::Strikethrough => self.out.push('-'),
            Tag::CodeBlock(kind) => {
                self.in_code_block = true;
                let language = match &kind {
                    CodeBlockKind::Fenced(info) => info.split_whitespace().next(),
                    CodeBlockKind::Indented => None,
                }
                .unwrap_or(DEFAULT_CODE_LANGUAGE);
                self.separate_block();
                self.out.push_str("{code:language=");
                self.out.push_str(language);
                self.out.push_str("}\n");
            }
            Tag::Link { dest_url, .. } => {
                self.out.push('[');
                self.destinations.push(dest_url.to_string());
            }
            Tag::Image { dest_url, .. } => {
                self.out.push('!');
                self.destinations.push(dest_url.to_string());
            }
            // Block quotes, tables, HTML blocks, footnotes: markers suppressed.
            _ => {}
        }
    }

    fn exit(&mut self, tag: TagEnd) {
        match tag {
            TagEnd::Heading(_) | TagEnd::Paragraph => self.out.push('\n'),
            TagEnd::List(_) => {
                self.list_depth = self.list_depth.saturating_sub(1);
                if self.list_depth == 0 {
                    self.in_list = false;
                    self.out.push('\n');
                }
            }
            TagEnd::Strong => self.out.push('*'),
            TagEnd::Emphasis => self.out.push('_'),
            TagEnd::Strikethrough => self.out.push('-'),
            TagEnd::CodeBlock => {
                self.in_code_block = false;
                self.out.push_str("{code}");
            }
            TagEnd::Link => {
                self.out.push('|');
                self.out.push_str(&self.destinations.pop().unwrap_or_default());
                self.out.push(']');
            }
            TagEnd::Image => {
                self.out.push('|');
                self.out.push_str(&self.destinations.pop().unwrap_or_default());
                self.out.push('!');
            }
            _ => {}
        }
    }

    /// Blank-line separator before a block, unless it is the first output.
    fn separate_block(&mut self) {
        if !self.out.is_empty() {
            self.out.push('\n');
        }
    }

    fn finish(self) -> String {
        self.out.trim().to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn simple_paragraph() {
        assert_eq!(render_markdown("This is a simple paragraph."), "This is a simple paragraph.");
    }

    #[test]
    fn heading_carries_its_level() {
        assert_eq!(render_markdown("# Heading 1"), "h1. Heading 1");
        assert_eq!(render_markdown("### Heading 3"), "h3. Heading 3");
    }

    #[test]
    fn inline_emphasis() {
        assert_eq!(render_markdown("**bold**"), "*bold*");
        assert_eq!(render_markdown("**bold text**"), "*bold text*");
        assert_eq!(render_markdown("*italic text*"), "_italic text_");
        assert_eq!(render_markdown("~~strikethrough~~"), "-strikethrough-");
    }

    #[test]
    fn inline_code_is_wrapped_and_not_rewritten() {
        assert_eq!(render_markdown("`inline code`"), "{{inline code}}");
        assert_eq!(render_markdown("ping `@user`"), "ping {{@user}}");
    }

    #[test]
    fn links_and_images() {
        assert_eq!(
            render_markdown("[example](http://example.com)"),
            "[example|http://example.com]"
        );
        assert_eq!(
            render_markdown("![logo](http://example.com/logo.png)"),
            "!logo|http://example.com/logo.png!"
        );
    }

    #[test]
    fn flat_lists() {
        assert_eq!(render_markdown("- a\n- b"), "* a\n* b");
        assert_eq!(render_markdown("- item 1\n- item 2"), "* item 1\n* item 2");
        assert_eq!(render_markdown("* item 1\n* item 2"), "* item 1\n* item 2");
    }

    #[test]
    fn loose_list_items_do_not_get_blank_lines() {
        assert_eq!(render_markdown("- a\n\n- b"), "* a\n* b");
    }

    #[test]
    fn nesting_depth_sets_marker_count() {
        assert_eq!(
            render_markdown("* item 1\n  * nested\n* item 2"),
            "* item 1\n** nested\n* item 2"
        );
        assert_eq!(
            render_markdown("* a\n  * b\n    * c"),
            "* a\n** b\n*** c"
        );
    }

    #[test]
    fn list_items_with_inline_markup() {
        assert_eq!(
            render_markdown("* item with [link](http://example.com)\n* item with `code`"),
            "* item with [link|http://example.com]\n* item with {{code}}"
        );
        assert_eq!(
            render_markdown("* item with **bold** text\n* item with _italic_ text"),
            "* item with *bold* text\n* item with _italic_ text"
        );
    }

    #[test]
    fn fenced_code_block_keeps_content_verbatim() {
        assert_eq!(
            render_markdown("```go\ncode block\n```"),
            "{code:language=go}\ncode block\n{code}"
        );
        assert_eq!(
            render_markdown("```rust\nlet who = \"@user\";\n```"),
            "{code:language=rust}\nlet who = \"@user\";\n{code}"
        );
    }

    #[test]
    fn code_block_without_language_defaults_to_java() {
        assert_eq!(
            render_markdown("```\nint x;\n```"),
            "{code:language=java}\nint x;\n{code}"
        );
        assert_eq!(
            render_markdown("    indented();\n"),
            "{code:language=java}\nindented();\n{code}"
        );
    }

    #[test]
    fn code_block_after_paragraph_is_separated() {
        assert_eq!(
            render_markdown("Run:\n\n```sh\nmake\n```"),
            "Run:\n\n{code:language=sh}\nmake\n{code}"
        );
    }

    #[test]
    fn paragraphs_are_separated_by_blank_line() {
        assert_eq!(render_markdown("one\n\ntwo"), "one\n\ntwo");
    }

    #[test]
    fn heading_after_paragraph() {
        assert_eq!(render_markdown("intro\n\n## Next"), "intro\n\nh2. Next");
    }

    #[test]
    fn breaks_and_rules() {
        assert_eq!(render_markdown("line one\nline two"), "line one line two");
        assert_eq!(render_markdown("line one  \nline two"), "line one\nline two");
        assert_eq!(render_markdown("---"), "----");
    }

    #[test]
    fn html_is_dropped() {
        assert_eq!(render_markdown("<div>hidden</div>"), "");
        assert_eq!(render_markdown("a <b>b</b> c"), "a b c");
    }

    #[test]
    fn table_cells_contribute_only_their_text() {
        assert_eq!(render_markdown("| a | b |\n|---|---|\n| 1 | 2 |"), "ab12");
    }

    #[test]
    fn block_quote_renders_its_paragraphs_without_markers() {
        assert_eq!(render_markdown("> quoted"), "quoted");
        assert_eq!(render_markdown("> quoted\n\nafter"), "quoted\n\nafter");
    }

    #[test]
    fn mentions_in_text_are_rewritten() {
        assert_eq!(render_markdown("thanks @alice"), "thanks [~alice]");
    }

    #[test]
    fn ci_notification_comment() {
        let markdown = "🧑‍💻 @appleboy push code to repository \
                        {color:#ff8b00}**davinci/rag-service**{color} \
                        {color:#00875A}**refs/heads/GAIS-4223**{color} branch.\n\n\
                        See the detailed information from [commit link](http://exampl.com).\n\n\
                        improve logging and error handling for PDF page count validation";
        let expected = "🧑‍💻 [~appleboy] push code to repository \
                        {color:#ff8b00}*davinci/rag-service*{color} \
                        {color:#00875A}*refs/heads/GAIS-4223*{color} branch.\n\n\
                        See the detailed information from [commit link|http://exampl.com].\n\n\
                        improve logging and error handling for PDF page count validation";
        assert_eq!(render_markdown(markdown), expected);
    }

    #[test]
    fn empty_input_renders_empty() {
        assert_eq!(render_markdown(""), "");
        assert_eq!(render_markdown("   \n\n"), "");
    }
}
