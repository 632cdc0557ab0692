//! Markdown rendering for AI replies using pulldown-cmark.

use pulldown_cmark::{Event, HeadingLevel, Options, Parser, Tag, TagEnd};
use ratatui::{
    style::{Color, Modifier, Style},
    text::{Line, Span},
};

const HEADING: Style = Style::new().fg(Color::Cyan).add_modifier(Modifier::BOLD);
const SUBHEADING: Style = Style::new().fg(Color::Cyan);
const EMPHASIS: Style = Style::new().add_modifier(Modifier::ITALIC);
const STRONG: Style = Style::new().add_modifier(Modifier::BOLD);
const STRIKETHROUGH: Style = Style::new().add_modifier(Modifier::CROSSED_OUT);
const CODE: Style = Style::new().fg(Color::Yellow);
const CODE_BLOCK: Style = Style::new().fg(Color::Green);
const LINK: Style = Style::new().fg(Color::Blue).add_modifier(Modifier::UNDERLINED);
const LIST_MARKER: Style = Style::new().fg(Color::DarkGray);
const QUOTE: Style = Style::new().fg(Color::DarkGray).add_modifier(Modifier::ITALIC);

/// Render markdown text to styled ratatui Lines.
pub fn render_markdown(input: &str) -> Vec<Line<'static>> {
    let mut options = Options::empty();
    options.insert(Options::ENABLE_STRIKETHROUGH);
    options.insert(Options::ENABLE_TASKLISTS);

    let mut renderer = MarkdownRenderer::default();
    for event in Parser::new_ext(input, options) {
        renderer.handle_event(event);
    }
    renderer.flush_line();

    // Paragraph ends leave a trailing blank line
    while renderer.lines.last().is_some_and(|line| line.spans.is_empty()) {
        renderer.lines.pop();
    }
    renderer.lines
}

#[derive(Default)]
struct MarkdownRenderer {
    lines: Vec<Line<'static>>,
    style_stack: Vec<Style>,
    current_spans: Vec<Span<'static>>,
    /// One entry per open list: `Some(next number)` for ordered lists.
    lists: Vec<Option<u64>>,
    in_code_block: bool,
    quote_depth: usize,
    pending_marker: Option<String>,
}

impl MarkdownRenderer {
    fn handle_event(&mut self, event: Event<'_>) {
        match event {
            Event::Start(Tag::Heading { level, .. }) => {
                self.flush_line();
                let style = if level == HeadingLevel::H1 || level == HeadingLevel::H2 {
                    HEADING
                } else {
                    SUBHEADING
                };
                self.style_stack.push(style);
            }
            Event::End(TagEnd::Heading(_)) => {
                self.flush_line();
                self.style_stack.pop();
            }

            Event::Start(Tag::Emphasis) => self.style_stack.push(EMPHASIS),
            Event::Start(Tag::Strong) => self.style_stack.push(STRONG),
            Event::Start(Tag::Strikethrough) => self.style_stack.push(STRIKETHROUGH),
            Event::Start(Tag::Link { .. }) => self.style_stack.push(LINK),
            Event::End(TagEnd::Emphasis | TagEnd::Strong | TagEnd::Strikethrough | TagEnd::Link) => {
                self.style_stack.pop();
            }

            Event::Start(Tag::CodeBlock(_)) => {
                self.flush_line();
                self.in_code_block = true;
            }
            Event::End(TagEnd::CodeBlock) => {
                self.flush_line();
                self.in_code_block = false;
                self.lines.push(Line::default());
            }

            Event::Start(Tag::List(start)) => {
                self.flush_line();
                self.lists.push(start);
            }
            Event::End(TagEnd::List(_)) => {
                self.lists.pop();
                if self.lists.is_empty() {
                    self.lines.push(Line::default());
                }
            }
            Event::Start(Tag::Item) => {
                self.flush_line();
                let indent = "  ".repeat(self.lists.len().saturating_sub(1));
                let marker = match self.lists.last_mut() {
                    Some(Some(number)) => {
                        let marker = format!("{indent}{number}. ");
                        *number += 1;
                        marker
                    }
                    _ => format!("{indent}• "),
                };
                self.pending_marker = Some(marker);
            }
            Event::End(TagEnd::Item) => self.flush_line(),
            Event::TaskListMarker(checked) => {
                self.push_marker();
                self.current_spans.push(Span::raw(if checked { "[x] " } else { "[ ] " }));
            }

            Event::Start(Tag::BlockQuote) => {
                self.flush_line();
                self.quote_depth += 1;
            }
            Event::End(TagEnd::BlockQuote) => {
                self.flush_line();
                self.quote_depth = self.quote_depth.saturating_sub(1);
            }

            Event::End(TagEnd::Paragraph) => {
                self.flush_line();
                if self.lists.is_empty() {
                    self.lines.push(Line::default());
                }
            }

            Event::Text(text) => self.add_text(&text),
            Event::Code(code) => {
                self.push_marker();
                self.current_spans.push(Span::styled(code.into_string(), CODE));
            }
            Event::SoftBreak => self.add_text(" "),
            Event::HardBreak => self.flush_line(),
            Event::Rule => {
                self.flush_line();
                self.lines.push(Line::styled("─".repeat(20), LIST_MARKER));
            }

            _ => {}
        }
    }

    fn add_text(&mut self, text: &str) {
        if self.in_code_block {
            for line in text.lines() {
                self.current_spans.push(Span::styled(format!("  {line}"), CODE_BLOCK));
                self.flush_line();
            }
            return;
        }

        self.push_marker();
        let style = self.current_style();
        self.current_spans.push(Span::styled(text.to_string(), style));
    }

    fn push_marker(&mut self) {
        if let Some(marker) = self.pending_marker.take() {
            self.current_spans.push(Span::styled(marker, LIST_MARKER));
        }
    }

    fn current_style(&self) -> Style {
        let base = if self.quote_depth > 0 { QUOTE } else { Style::default() };
        self.style_stack.iter().fold(base, |acc, style| acc.patch(*style))
    }

    fn flush_line(&mut self) {
        if self.current_spans.is_empty() {
            return;
        }
        let mut spans = Vec::with_capacity(self.current_spans.len() + 1);
        if self.quote_depth > 0 {
            spans.push(Span::styled("│ ".repeat(self.quote_depth), QUOTE));
        }
        spans.append(&mut self.current_spans);
        self.lines.push(Line::from(spans));
    }
}
