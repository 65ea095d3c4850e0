//! Markdown → flat block list.
//!
//! Only the structure the extractors look at survives: top-level headings,
//! tables, paragraphs and preformatted blocks, with the plain text and the
//! hyperlinks of every inline run. Anything nested in a list or blockquote
//! collapses into a single `Block::Other` so it still separates its
//! neighbours.
use pulldown_cmark::{Event, Options, Parser, Tag, TagEnd};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Link {
    pub href: String,
    pub text: String,
}

/// Plain text of an inline run plus the links inside it, in document order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Inline {
    pub text: String,
    pub links: Vec<Link>,
}

impl Inline {
    pub fn first_link(&self) -> Option<&Link> {
        self.links.first()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Heading {
    pub level: u8,
    pub text: String,
    pub id: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Table {
    pub header: Vec<Inline>,
    pub rows: Vec<Vec<Inline>>,
}

impl Table {
    pub fn header_texts(&self) -> Vec<&str> {
        self.header.iter().map(|c| c.text.as_str()).collect()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Block {
    Heading(Heading),
    Table(Table),
    Paragraph(Inline),
    Preformatted(String),
    Other,
}

#[derive(Debug, Clone, Default)]
pub struct Document {
    /// Path relative to the docs root, `/`-separated. Keys the per-file rename tables.
    pub path: String,
    pub markdown: String,
    pub blocks: Vec<Block>,
}

impl Document {
    pub fn parse(path: impl Into<String>, markdown: impl Into<String>) -> Self {
        let markdown = markdown.into();
        let blocks = parse_blocks(&markdown);
        Self { path: path.into(), markdown, blocks }
    }

    pub fn headings(&self) -> impl Iterator<Item = (usize, &Heading)> {
        self.blocks.iter().enumerate().filter_map(|(ix, block)| match block {
            Block::Heading(h) => Some((ix, h)),
            _ => None,
        })
    }

    /// The table bound to the heading at `ix`: the first table before the next
    /// heading of the same or a higher level.
    pub fn table_for(&self, ix: usize) -> Option<&Table> {
        let level = self.heading_level(ix)?;
        self.section_after(ix, level).find_map(|block| match block {
            Block::Table(t) => Some(t),
            _ => None,
        })
    }

    /// First preformatted block before any further heading.
    pub fn preformatted_for(&self, ix: usize) -> Option<&str> {
        self.blocks.iter().skip(ix + 1)
            .take_while(|b| !matches!(b, Block::Heading(_)))
            .find_map(|block| match block {
                Block::Preformatted(text) => Some(text.as_str()),
                _ => None,
            })
    }

    /// The paragraph immediately following the block at `ix`, if any.
    pub fn paragraph_after(&self, ix: usize) -> Option<&Inline> {
        match self.blocks.get(ix + 1)? {
            Block::Paragraph(p) => Some(p),
            _ => None,
        }
    }

    fn heading_level(&self, ix: usize) -> Option<u8> {
        match self.blocks.get(ix)? {
            Block::Heading(h) => Some(h.level),
            _ => None,
        }
    }

    fn section_after(&self, ix: usize, level: u8) -> impl Iterator<Item = &Block> {
        self.blocks.iter().skip(ix + 1).take_while(move |b| match b {
            Block::Heading(h) => h.level > level,
            _ => true,
        })
    }
}

/// Parse a markdown fragment and return its inline content (text + links),
/// ignoring block boundaries. Used on sentences cut out of raw markdown.
pub fn parse_inline(markdown: &str) -> Inline {
    let mut out = Inline::default();
    let mut open_links: Vec<(String, usize)> = Vec::new();
    for event in Parser::new_ext(markdown, options()) {
        match event {
            Event::Start(Tag::Link { dest_url, .. }) => {
                open_links.push((dest_url.to_string(), out.text.len()));
            }
            Event::End(TagEnd::Link) => {
                if let Some((href, start)) = open_links.pop() {
                    let text = out.text[start..].trim().to_string();
                    out.links.push(Link { href, text });
                }
            }
            Event::Text(t) | Event::Code(t) => out.text.push_str(&t),
            Event::SoftBreak | Event::HardBreak => out.text.push(' '),
            Event::End(TagEnd::Paragraph) => out.text.push(' '),
            _ => {}
        }
    }
    out.text = out.text.trim().to_string();
    out
}

/// Heading anchor as the docs site generates it: lowercase, non-alphanumeric runs → `-`.
pub fn slug(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut dash = false;
    for c in text.chars() {
        if c.is_alphanumeric() {
            out.extend(c.to_lowercase());
            dash = false;
        } else if !dash && !out.is_empty() {
            out.push('-');
            dash = true;
        }
    }
    while out.ends_with('-') {
        out.pop();
    }
    out
}

// ————————————————————————————————————————————————————————————————————————————
// INTERNAL HELPERS
// ————————————————————————————————————————————————————————————————————————————

fn options() -> Options {
    let mut options = Options::empty();
    options.insert(Options::ENABLE_TABLES);
    options.insert(Options::ENABLE_STRIKETHROUGH);
    options
}

enum Frame {
    Container,
    Heading(u8),
    Paragraph,
    Table,
    TableHead,
    TableRow,
    TableCell,
    Code,
    Link(String, usize),
    Other,
}

#[derive(Default)]
struct BlockBuilder {
    blocks: Vec<Block>,
    stack: Vec<Frame>,
    depth: usize,
    inline: Option<Inline>,
    code: Option<String>,
    table: Option<Table>,
    row: Vec<Inline>,
    in_head: bool,
}

impl BlockBuilder {
    fn top_level(&self) -> bool {
        self.depth == 0
    }

    fn start(&mut self, tag: Tag<'_>) {
        let frame = match tag {
            Tag::List(_) | Tag::Item | Tag::BlockQuote(_) | Tag::FootnoteDefinition(_) => {
                if self.top_level() {
                    self.blocks.push(Block::Other);
                }
                self.depth += 1;
                Frame::Container
            }
            Tag::Heading { level, .. } if self.top_level() => {
                self.inline = Some(Inline::default());
                Frame::Heading(level as u8)
            }
            Tag::Paragraph if self.top_level() && self.table.is_none() => {
                self.inline = Some(Inline::default());
                Frame::Paragraph
            }
            Tag::Table(_) if self.top_level() => {
                self.table = Some(Table::default());
                Frame::Table
            }
            Tag::TableHead if self.table.is_some() => {
                self.in_head = true;
                Frame::TableHead
            }
            Tag::TableRow if self.table.is_some() => {
                self.row.clear();
                Frame::TableRow
            }
            Tag::TableCell if self.table.is_some() => {
                self.inline = Some(Inline::default());
                Frame::TableCell
            }
            Tag::CodeBlock(_) if self.top_level() => {
                self.code = Some(String::new());
                Frame::Code
            }
            Tag::Link { dest_url, .. } => {
                let offset = self.inline.as_ref().map_or(0, |i| i.text.len());
                Frame::Link(dest_url.to_string(), offset)
            }
            _ => Frame::Other,
        };
        self.stack.push(frame);
    }

    fn end(&mut self) {
        let Some(frame) = self.stack.pop() else { return };
        match frame {
            Frame::Container => self.depth = self.depth.saturating_sub(1),
            Frame::Heading(level) => {
                if let Some(inline) = self.inline.take() {
                    let text = inline.text.trim().to_string();
                    let id = slug(&text);
                    self.blocks.push(Block::Heading(Heading { level, text, id }));
                }
            }
            Frame::Paragraph => {
                if let Some(mut inline) = self.inline.take() {
                    inline.text = inline.text.trim().to_string();
                    self.blocks.push(Block::Paragraph(inline));
                }
            }
            Frame::Table => {
                if let Some(table) = self.table.take() {
                    self.blocks.push(Block::Table(table));
                }
            }
            Frame::TableHead => self.in_head = false,
            Frame::TableRow => {
                let row = std::mem::take(&mut self.row);
                if let Some(table) = self.table.as_mut() {
                    table.rows.push(row);
                }
            }
            Frame::TableCell => {
                let mut cell = self.inline.take().unwrap_or_default();
                cell.text = cell.text.trim().to_string();
                if self.in_head {
                    if let Some(table) = self.table.as_mut() {
                        table.header.push(cell);
                    }
                } else {
                    self.row.push(cell);
                }
            }
            Frame::Code => {
                if let Some(code) = self.code.take() {
                    self.blocks.push(Block::Preformatted(code));
                }
            }
            Frame::Link(href, offset) => {
                if let Some(inline) = self.inline.as_mut() {
                    let text = inline.text.get(offset..).unwrap_or("").trim().to_string();
                    inline.links.push(Link { href, text });
                }
            }
            Frame::Other => {}
        }
    }

    fn text(&mut self, text: &str) {
        if let Some(code) = self.code.as_mut() {
            code.push_str(text);
        } else if let Some(inline) = self.inline.as_mut() {
            inline.text.push_str(text);
        }
    }
}

fn parse_blocks(markdown: &str) -> Vec<Block> {
    let mut builder = BlockBuilder::default();
    for event in Parser::new_ext(markdown, options()) {
        match event {
            Event::Start(tag) => builder.start(tag),
            Event::End(_) => builder.end(),
            Event::Text(t) | Event::Code(t) => builder.text(&t),
            Event::SoftBreak | Event::HardBreak => builder.text(" "),
            Event::Rule if builder.top_level() => builder.blocks.push(Block::Other),
            _ => {}
        }
    }
    builder.blocks
}

// ------------------------------- Tests ------------------------------------ //
