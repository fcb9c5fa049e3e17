// ABOUTME: HTML generation module for the deckview application
// ABOUTME: Renders the slide deck, reveal attributes, controls and view runtime into one document

use std::fs;
use std::path::Path;

use comrak::nodes::{AstNode, NodeValue};
use comrak::{format_html, parse_document, Arena, ComrakOptions};
use log::{info, warn};

use crate::config::{CANVAS_HEIGHT, CANVAS_WIDTH};
use crate::errors::Result;
use crate::reveal::{reveal_classes, RevealTimer};
use crate::slides::{Slide, SlideDeck};
use crate::utils;
use crate::view::slide_counter;

const STYLES: &str = include_str!("../assets/deck.css");
const RUNTIME: &str = include_str!("../assets/deck.js");

/// Options for rendering the deck document
#[derive(Debug, Clone, Default)]
pub struct HtmlOptions {
    /// Websocket the page reports input to; `None` renders a standalone page
    pub socket_url: Option<String>,
    /// Slide active when the page first paints
    pub initial_index: usize,
    pub reveal: RevealTimer,
}

/// Generate the complete deck document
pub fn generate_html(deck: &SlideDeck, options: &HtmlOptions) -> String {
    info!("Generating HTML for {} slides", deck.len());
    let initial = options.initial_index.min(deck.len().saturating_sub(1));

    let mut html_doc = String::from("<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n");
    html_doc.push_str("<meta charset=\"UTF-8\">\n");
    html_doc.push_str(
        "<meta name=\"viewport\" content=\"width=device-width, initial-scale=1.0\">\n",
    );
    html_doc.push_str(&format!("<title>{}</title>\n", escape_html(deck.title)));
    html_doc.push_str(&format!("<style>{}</style>\n", STYLES));
    html_doc.push_str("</head>\n<body>\n");

    html_doc.push_str("<div class=\"deck-wrap\" id=\"deck-wrap\">\n");
    html_doc.push_str(&format!(
        "<div id=\"deck\" class=\"deck bgfx\" role=\"region\" aria-label=\"Presentation slides\" \
         style=\"width:{}px;height:{}px\">\n",
        CANVAS_WIDTH, CANVAS_HEIGHT
    ));
    html_doc.push_str(&format!(
        "<div class=\"brandbar\"><span class=\"brandtitle\">{}</span>\
         <span id=\"slidenum\" class=\"slide-num\" aria-live=\"polite\">{}</span></div>\n",
        escape_html(deck.title),
        slide_counter(initial, deck.len())
    ));
    html_doc.push_str("<div class=\"slides\">\n");
    for (index, slide) in deck.slides().iter().enumerate() {
        html_doc.push_str(&render_slide(slide, index, index == initial, &options.reveal));
    }
    html_doc.push_str("</div>\n</div>\n</div>\n");

    if let Some(text) = deck.modal_text() {
        html_doc.push_str(&render_modal(text));
    }
    html_doc.push_str(CONTROLS);

    let socket = match &options.socket_url {
        Some(url) => format!("\"{}\"", escape_html(url)),
        None => "null".to_string(),
    };
    html_doc.push_str(&format!(
        "<script>window.DECK = {{ socket: {}, index: {}, len: {} }};\n{}</script>\n",
        socket,
        initial,
        deck.len(),
        RUNTIME
    ));
    html_doc.push_str("</body>\n</html>");

    html_doc
}

/// Render one slide section with every top-level block wrapped as a reveal element.
///
/// Blocks get steps 1, 2, 3... in document order. A `<!-- d=N -->` comment
/// sets the step of the block that follows it.
pub fn render_slide(slide: &Slide, index: usize, active: bool, reveal: &RevealTimer) -> String {
    let arena = Arena::new();
    let mut options = ComrakOptions::default();
    options.render.unsafe_ = true; // Allow raw HTML
    let root = parse_document(&arena, slide.markdown, &options);

    let mut section = format!(
        "<section id=\"slide-{}\" class=\"slide{}\" aria-roledescription=\"slide\" aria-label=\"{}\"{}>\n",
        index,
        if active { " is-active" } else { "" },
        escape_html(slide.label),
        if active { "" } else { " hidden" }
    );

    let mut next_step = 1;
    let mut pinned: Option<u32> = None;
    for node in root.children() {
        if let Some(step) = step_marker(node) {
            pinned = Some(step);
            continue;
        }
        let step = pinned.take().unwrap_or(next_step);
        next_step += 1;

        let mut block = Vec::new();
        if let Err(e) = format_html(node, &options, &mut block) {
            warn!("Failed to render a block of slide {}: {}", index + 1, e);
            continue;
        }
        section.push_str(&format!(
            "<div class=\"{}\" data-d=\"{}\" style=\"{}\">{}</div>\n",
            reveal_classes(active),
            step,
            reveal.style(step),
            String::from_utf8_lossy(&block).trim()
        ));
    }

    section.push_str("</section>\n");
    section
}

fn step_marker<'a>(node: &'a AstNode<'a>) -> Option<u32> {
    match &node.data.borrow().value {
        NodeValue::HtmlBlock(block) => parse_step_marker(&block.literal),
        _ => None,
    }
}

fn parse_step_marker(literal: &str) -> Option<u32> {
    let inner = literal
        .trim()
        .strip_prefix("<!--")?
        .strip_suffix("-->")?
        .trim();
    inner.strip_prefix("d=")?.trim().parse().ok()
}

fn render_modal(text: &str) -> String {
    format!(
        "<div id=\"modal\" class=\"modal\" role=\"dialog\" aria-modal=\"true\" hidden>\n\
         <div class=\"modal-body\"><h3>Full Cover Letter</h3><pre>{}</pre>\n\
         <div class=\"modal-actions\"><button class=\"btn btn-alt\" data-action=\"close-modal\">Close</button>\
         <button class=\"btn\" data-copy=\"modalLetter\">Copy Letter</button></div></div>\n</div>\n",
        escape_html(text)
    )
}

const CONTROLS: &str = "<div class=\"controls\" role=\"toolbar\" aria-label=\"Slide controls\">\
<button class=\"btn btn-alt\" data-action=\"prev\" aria-label=\"Previous slide\">&#8249;</button>\
<button class=\"btn\" data-action=\"next\" aria-label=\"Next slide\">&#8250;</button>\
<button class=\"btn btn-alt\" data-action=\"export-one\" data-export aria-label=\"Export current slide as PNG\">PNG</button>\
<button class=\"btn btn-alt\" data-action=\"export-all\" data-export aria-label=\"Export all slides as PNGs\">All PNGs</button>\
<button class=\"btn btn-alt\" data-action=\"fullscreen\" aria-label=\"Toggle fullscreen\">&#x26F6;</button>\
</div>\n";

fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

/// Utility function to write HTML content to a file
pub fn write_html_to_file(html_content: &str, output_path: &Path) -> Result<()> {
    info!("Writing HTML to file: {:?}", output_path);
    utils::ensure_parent_directory_exists(output_path)?;
    fs::write(output_path, html_content)?;
    Ok(())
}
