//! Flows a visual tree into positioned paint operations.
//!
//! A deliberately small box model: blocks stack vertically, `flex` containers
//! holding blocks lay out as a single row, and consecutive inline nodes form a
//! run that is greedy word-wrapped against the static font metrics. Inline
//! elements with a background or border become unbreakable chips.
//! CPU-bound: callers on the async runtime must use `spawn_blocking`.

use crate::layout::font_metrics::{get_metrics, FontFace};
use crate::layout::paint::{Frame, Paint, Rect, Rgba};
use crate::render::node::{Align, BorderSide, Element, Node, Tag};

/// A4 width at 96 dpi.
pub const VIEWPORT_WIDTH: f32 = 794.0;

const LINE_HEIGHT: f32 = 1.4;
const BLOCK_GAP: f32 = 12.0;
const ROW_GAP: f32 = 24.0;
const INLINE_GAP: f32 = 8.0;
const CHIP_PAD_X: f32 = 10.0;
const CHIP_PAD_Y: f32 = 4.0;
const RULE_GAP: f32 = 8.0;
const ROOT_TEXT: Rgba = Rgba::rgb(0x0f, 0x17, 0x2a);

pub fn flow(tree: &Node, viewport_width: f32) -> Frame {
    let mut flow = Flow::default();
    let height = flow.node(tree, 0.0, 0.0, viewport_width, TextStyle::root());
    Frame {
        width: viewport_width,
        height: height.max(1.0).ceil(),
        ops: flow.ops,
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Text style inheritance
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq)]
struct TextStyle {
    size: f32,
    bold: bool,
    color: Rgba,
    align: Align,
}

impl TextStyle {
    fn root() -> Self {
        Self {
            size: 14.0,
            bold: false,
            color: ROOT_TEXT,
            align: Align::Left,
        }
    }

    fn for_element(&self, el: &Element) -> Self {
        let (tag_size, heading) = match el.tag {
            Tag::H1 => (Some(32.0), true),
            Tag::H2 => (Some(22.0), true),
            Tag::H3 => (Some(17.0), true),
            Tag::P => (Some(14.0), false),
            _ => (None, false),
        };
        let class_bold = el
            .class
            .split_whitespace()
            .any(|t| matches!(t, "font-bold" | "font-black" | "font-semibold"));
        let inherit_bold = el.tag.is_inline() && self.bold;

        Self {
            size: el.style.font_size.or(tag_size).unwrap_or(self.size),
            bold: heading || class_bold || inherit_bold,
            color: el
                .style
                .color
                .as_deref()
                .and_then(Rgba::parse_hex)
                .unwrap_or(self.color),
            align: if el.style.align == Align::Center {
                Align::Center
            } else {
                self.align
            },
        }
    }

    fn line_box(&self) -> f32 {
        self.size * LINE_HEIGHT
    }

    fn measure(&self, text: &str) -> f32 {
        get_metrics(FontFace::from_bold(self.bold)).measure_px(text, self.size)
    }

    fn space(&self) -> f32 {
        get_metrics(FontFace::from_bold(self.bold)).space_width * self.size
    }

    /// Baseline for a line box whose top edge is at `top`.
    fn baseline(&self, top: f32) -> f32 {
        top + (self.line_box() - self.size) / 2.0 + self.size * 0.8
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Class helpers
// ────────────────────────────────────────────────────────────────────────────

fn has_class(el: &Element, token: &str) -> bool {
    el.class.split_whitespace().any(|t| t == token)
}

fn corner_radius(el: &Element, w: f32, h: f32) -> f32 {
    el.class
        .split_whitespace()
        .filter_map(|t| match t {
            "rounded-full" => Some(w.min(h) / 2.0),
            "rounded-3xl" => Some(24.0),
            "rounded-2xl" => Some(16.0),
            "rounded-xl" => Some(12.0),
            "rounded-lg" => Some(8.0),
            "rounded-md" => Some(6.0),
            "rounded" => Some(4.0),
            _ => None,
        })
        .fold(0.0, f32::max)
}

fn is_inline_node(node: &Node) -> bool {
    match node {
        Node::Text(_) => true,
        Node::Element(el) => el.tag.is_inline(),
        Node::Qr(_) => false,
    }
}

fn is_row(el: &Element) -> bool {
    has_class(el, "flex")
        && !has_class(el, "flex-col")
        && el.children.iter().any(|c| !is_inline_node(c))
}

/// Scales a fixed `(w, h)` box down to fit `available` width.
fn fit(size: (f32, f32), available: f32) -> (f32, f32) {
    let (w, h) = size;
    if w <= available || w <= 0.0 {
        (w, h)
    } else {
        (available, h * available / w)
    }
}

/// Width a node insists on, or `None` when it stretches to fill.
fn intrinsic_width(node: &Node, parent: TextStyle) -> Option<f32> {
    match node {
        Node::Qr(qr) => Some(qr.size),
        Node::Text(text) => Some(parent.measure(text)),
        Node::Element(el) => {
            if let Some((w, _)) = el.style.size {
                return Some(w);
            }
            let style = parent.for_element(el);
            let text_only = el.children.iter().all(|c| matches!(c, Node::Text(_)));
            if text_only && el.tag != Tag::Div {
                return el
                    .children
                    .iter()
                    .map(|c| intrinsic_width(c, style))
                    .sum::<Option<f32>>();
            }
            let wraps_fixed = el.children.iter().any(|c| match c {
                Node::Qr(_) => true,
                Node::Element(e) => {
                    e.style.size.is_some()
                        || (e.tag == Tag::Div && intrinsic_width(c, style).is_some())
                }
                Node::Text(_) => false,
            });
            if el.tag == Tag::Div && (has_class(el, "flex-col") || el.children.len() == 1) && wraps_fixed {
                let inner = el
                    .children
                    .iter()
                    .map(|c| intrinsic_width(c, style))
                    .try_fold(0.0_f32, |acc, w| w.map(|w| acc.max(w)))?;
                return Some(inner + 2.0 * el.style.padding.unwrap_or(0.0));
            }
            None
        }
    }
}

fn shift(ops: &mut [Paint], dx: f32, dy: f32) {
    for op in ops {
        match op {
            Paint::Fill { rect, .. }
            | Paint::Stroke { rect, .. }
            | Paint::Image { rect, .. }
            | Paint::Qr { rect, .. } => {
                rect.x += dx;
                rect.y += dy;
            }
            Paint::Text { x, baseline, .. } => {
                *x += dx;
                *baseline += dy;
            }
        }
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Inline runs
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug)]
enum ItemKind {
    Word,
    Chip {
        fill: Option<Rgba>,
        stroke: Option<(f32, Rgba)>,
        radius: f32,
    },
}

#[derive(Debug)]
struct Item {
    text: String,
    style: TextStyle,
    width: f32,
    height: f32,
    kind: ItemKind,
}

fn collect_items(node: &Node, style: TextStyle, items: &mut Vec<Item>) {
    match node {
        Node::Text(text) => {
            for word in text.split_whitespace() {
                items.push(Item {
                    text: word.to_string(),
                    style,
                    width: style.measure(word),
                    height: style.line_box(),
                    kind: ItemKind::Word,
                });
            }
        }
        Node::Element(el) => {
            let child_style = style.for_element(el);
            let fill = el.style.background.as_deref().and_then(Rgba::parse_hex);
            let stroke = el
                .style
                .border
                .as_ref()
                .and_then(|b| Rgba::parse_hex(&b.color).map(|c| (b.width, c)));
            if fill.is_some() || stroke.is_some() {
                let text = Node::Element(el.clone()).text_content();
                let border = stroke.map(|(w, _)| w).unwrap_or(0.0);
                let width = child_style.measure(&text) + 2.0 * (CHIP_PAD_X + border);
                let height = child_style.line_box() + 2.0 * (CHIP_PAD_Y + border);
                items.push(Item {
                    text,
                    style: child_style,
                    width,
                    height,
                    kind: ItemKind::Chip {
                        fill,
                        stroke,
                        radius: corner_radius(el, width, height),
                    },
                });
            } else {
                for child in &el.children {
                    collect_items(child, child_style, items);
                }
            }
        }
        Node::Qr(_) => {}
    }
}

struct Line {
    /// (item index, x offset within the line)
    placed: Vec<(usize, f32)>,
    width: f32,
    height: f32,
    has_chip: bool,
}

/// Greedy wrap: an item goes on the current line unless it would overflow and
/// the line already holds something.
fn break_lines(items: &[Item], max_width: f32) -> Vec<Line> {
    let mut lines = Vec::new();
    let mut current = Line {
        placed: vec![],
        width: 0.0,
        height: 0.0,
        has_chip: false,
    };

    for (index, item) in items.iter().enumerate() {
        let separator = match current.placed.last() {
            None => 0.0,
            Some((prev, _)) => match (&items[*prev].kind, &item.kind) {
                (ItemKind::Word, ItemKind::Word) => items[*prev].style.space(),
                _ => INLINE_GAP,
            },
        };

        if !current.placed.is_empty() && current.width + separator + item.width > max_width {
            lines.push(std::mem::replace(
                &mut current,
                Line {
                    placed: vec![],
                    width: 0.0,
                    height: 0.0,
                    has_chip: false,
                },
            ));
            current.placed.push((index, 0.0));
            current.width = item.width;
        } else {
            current.placed.push((index, current.width + separator));
            current.width += separator + item.width;
        }
        current.height = current.height.max(item.height);
        current.has_chip |= matches!(item.kind, ItemKind::Chip { .. });
    }
    if !current.placed.is_empty() {
        lines.push(current);
    }
    lines
}

// ────────────────────────────────────────────────────────────────────────────
// Flow pass
// ────────────────────────────────────────────────────────────────────────────

#[derive(Default)]
struct Flow {
    ops: Vec<Paint>,
}

impl Flow {
    fn node(&mut self, node: &Node, x: f32, y: f32, width: f32, parent: TextStyle) -> f32 {
        match node {
            Node::Qr(qr) => {
                let size = qr.size.min(width);
                self.ops.push(Paint::Qr {
                    rect: Rect::new(x, y, size, size),
                    block: qr.clone(),
                });
                size
            }
            Node::Text(_) => self.inline_run(&[node], x, y, width, parent),
            Node::Element(el) if el.tag.is_inline() => self.inline_run(&[node], x, y, width, parent),
            Node::Element(el) => self.block(el, x, y, width, parent),
        }
    }

    fn block(&mut self, el: &Element, x: f32, y: f32, width: f32, parent: TextStyle) -> f32 {
        let style = parent.for_element(el);
        let fixed = el.style.size.map(|size| fit(size, width));
        let box_w = fixed.map(|(w, _)| w).unwrap_or(width);

        if el.tag == Tag::Img {
            let (w, h) = fixed.unwrap_or((box_w, box_w * 0.5));
            let w = if has_class(el, "w-full") { width } else { w };
            if let Some(src) = el.get_attr("src") {
                self.ops.push(Paint::Image {
                    rect: Rect::new(x, y, w, h),
                    source: src.to_string(),
                    radius: corner_radius(el, w, h),
                });
            }
            return h;
        }

        let pad = el.style.padding.unwrap_or(0.0);
        let (mut inset_l, mut inset_t, mut inset_r, mut inset_b) = (pad, pad, pad, pad);
        if let Some(border) = &el.style.border {
            match border.side {
                BorderSide::All => {
                    inset_l += border.width;
                    inset_t += border.width;
                    inset_r += border.width;
                    inset_b += border.width;
                }
                BorderSide::Left => inset_l += border.width + RULE_GAP * 2.0,
                BorderSide::Bottom => inset_b += border.width + RULE_GAP,
            }
        }

        let start = self.ops.len();
        let inner_w = (box_w - inset_l - inset_r).max(0.0);
        let content_h = self.children(el, x + inset_l, y + inset_t, inner_w, style);

        let height = match fixed {
            Some((_, h)) => {
                if style.align == Align::Center {
                    let free = h - inset_t - inset_b - content_h;
                    shift(&mut self.ops[start..], 0.0, (free / 2.0).max(0.0));
                }
                h
            }
            None => content_h + inset_t + inset_b,
        };

        let rect = Rect::new(x, y, box_w, height);
        let radius = corner_radius(el, box_w, height);
        let mut decoration = Vec::new();
        if let Some(fill) = el.style.background.as_deref().and_then(Rgba::parse_hex) {
            decoration.push(Paint::Fill {
                rect,
                color: fill,
                radius,
            });
        }
        if let Some(border) = &el.style.border {
            if let Some(color) = Rgba::parse_hex(&border.color) {
                let w = border.width;
                decoration.push(match border.side {
                    BorderSide::All => Paint::Stroke {
                        rect,
                        width: w,
                        color,
                        radius,
                    },
                    BorderSide::Left => Paint::Fill {
                        rect: Rect::new(x, y, w, height),
                        color,
                        radius: 0.0,
                    },
                    BorderSide::Bottom => Paint::Fill {
                        rect: Rect::new(x, y + height - w, box_w, w),
                        color,
                        radius: 0.0,
                    },
                });
            }
        }
        // Fills go under the content, strokes over it.
        let (under, over): (Vec<_>, Vec<_>) = decoration
            .into_iter()
            .partition(|op| matches!(op, Paint::Fill { .. }));
        for (i, op) in under.into_iter().enumerate() {
            self.ops.insert(start + i, op);
        }
        self.ops.extend(over);

        height
    }

    fn children(&mut self, el: &Element, x: f32, y: f32, width: f32, style: TextStyle) -> f32 {
        if is_row(el) {
            return self.row(el, x, y, width, style);
        }

        let mut cursor = y;
        let mut placed_any = false;
        let mut run: Vec<&Node> = Vec::new();

        for child in &el.children {
            if is_inline_node(child) {
                run.push(child);
                continue;
            }
            if !run.is_empty() {
                if placed_any {
                    cursor += BLOCK_GAP;
                }
                cursor += self.inline_run(&run, x, cursor, width, style);
                run.clear();
                placed_any = true;
            }
            if placed_any {
                cursor += BLOCK_GAP;
            }
            // Text blocks center their own lines; only boxes are offset here.
            let box_w = match child {
                Node::Element(e) if e.tag != Tag::Div && e.style.size.is_none() => None,
                _ => intrinsic_width(child, style),
            };
            let (offset, avail) = match (style.align, box_w) {
                (Align::Center, Some(w)) if w < width => ((width - w) / 2.0, w),
                _ => (0.0, width),
            };
            cursor += self.node(child, x + offset, cursor, avail, style);
            placed_any = true;
        }
        if !run.is_empty() {
            if placed_any {
                cursor += BLOCK_GAP;
            }
            cursor += self.inline_run(&run, x, cursor, width, style);
        }
        cursor - y
    }

    fn row(&mut self, el: &Element, x: f32, y: f32, width: f32, style: TextStyle) -> f32 {
        let widths: Vec<Option<f32>> = el
            .children
            .iter()
            .map(|c| intrinsic_width(c, style).map(|w| w.min(width)))
            .collect();
        let count = el.children.len();
        let gaps = ROW_GAP * count.saturating_sub(1) as f32;
        let fixed: f32 = widths.iter().flatten().sum();
        let flexible = widths.iter().filter(|w| w.is_none()).count();
        let flex_w = if flexible > 0 {
            ((width - fixed - gaps) / flexible as f32).max(0.0)
        } else {
            0.0
        };

        let total = fixed + gaps + flex_w * flexible as f32;
        let centered = has_class(el, "justify-center") || style.align == Align::Center;
        let mut cx = x;
        if flexible == 0 && centered {
            cx += ((width - total) / 2.0).max(0.0);
        }

        let mut spans = Vec::with_capacity(count);
        for (child, w) in el.children.iter().zip(&widths) {
            let child_w = w.unwrap_or(flex_w);
            let start = self.ops.len();
            let h = self.node(child, cx, y, child_w, style);
            spans.push((start, self.ops.len(), h));
            cx += child_w + ROW_GAP;
        }

        let row_h = spans.iter().map(|(_, _, h)| *h).fold(0.0, f32::max);
        if has_class(el, "items-center") {
            for (start, end, h) in spans {
                shift(&mut self.ops[start..end], 0.0, (row_h - h) / 2.0);
            }
        }
        row_h
    }

    fn inline_run(&mut self, nodes: &[&Node], x: f32, y: f32, width: f32, style: TextStyle) -> f32 {
        let mut items = Vec::new();
        for node in nodes {
            collect_items(node, style, &mut items);
        }
        if items.is_empty() {
            return 0.0;
        }

        let lines = break_lines(&items, width);
        let mut top = y;
        for (n, line) in lines.iter().enumerate() {
            if n > 0 && line.has_chip {
                top += INLINE_GAP;
            }
            let offset = if style.align == Align::Center {
                ((width - line.width) / 2.0).max(0.0)
            } else {
                0.0
            };

            // Consecutive words sharing a style merge into one text op.
            let mut pending: Option<(f32, f32, TextStyle, String)> = None;
            for &(index, ix) in &line.placed {
                let item = &items[index];
                let item_top = top + (line.height - item.height) / 2.0;
                let item_x = x + offset + ix;
                match &item.kind {
                    ItemKind::Word => {
                        let merged = match &mut pending {
                            Some((_, _, s, text)) if *s == item.style => {
                                text.push(' ');
                                text.push_str(&item.text);
                                true
                            }
                            _ => false,
                        };
                        if !merged {
                            if let Some(done) = pending.take() {
                                self.push_text(done);
                            }
                            pending = Some((
                                item_x,
                                item.style.baseline(item_top),
                                item.style,
                                item.text.clone(),
                            ));
                        }
                    }
                    ItemKind::Chip {
                        fill,
                        stroke,
                        radius,
                    } => {
                        if let Some(done) = pending.take() {
                            self.push_text(done);
                        }
                        let rect = Rect::new(item_x, item_top, item.width, item.height);
                        if let Some(color) = fill {
                            self.ops.push(Paint::Fill {
                                rect,
                                color: *color,
                                radius: *radius,
                            });
                        }
                        let border = stroke.map(|(w, _)| w).unwrap_or(0.0);
                        if let Some((w, color)) = stroke {
                            self.ops.push(Paint::Stroke {
                                rect,
                                width: *w,
                                color: *color,
                                radius: *radius,
                            });
                        }
                        self.push_text((
                            item_x + CHIP_PAD_X + border,
                            item.style.baseline(item_top + CHIP_PAD_Y + border),
                            item.style,
                            item.text.clone(),
                        ));
                    }
                }
            }
            if let Some(done) = pending.take() {
                self.push_text(done);
            }
            top += line.height;
        }
        top - y
    }

    fn push_text(&mut self, (x, baseline, style, text): (f32, f32, TextStyle, String)) {
        if text.is_empty() {
            return;
        }
        self.ops.push(Paint::Text {
            x,
            baseline,
            size: style.size,
            bold: style.bold,
            color: style.color,
            text,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::node::Style;
    use crate::render::qr::{QrBlock, QrLevel};

    fn texts(frame: &Frame) -> Vec<String> {
        frame.text_runs().map(str::to_string).collect()
    }

    #[test]
    fn test_short_paragraph_is_one_text_run() {
        let tree: Node = Element::new(Tag::P).text("Jean Dupont").into();
        let frame = flow(&tree, 400.0);
        assert_eq!(texts(&frame), vec!["Jean Dupont"]);
        assert!((frame.height - (14.0 * LINE_HEIGHT).ceil()).abs() < 1e-3);
    }

    #[test]
    fn test_long_paragraph_wraps_within_width() {
        let bio = "Passionné par les systèmes distribués et la performance, \
                   il conçoit des services robustes depuis plus de dix ans.";
        let tree: Node = Element::new(Tag::P).text(bio).into();
        let frame = flow(&tree, 200.0);
        let lines = texts(&frame);
        assert!(lines.len() > 1);
        let metrics = get_metrics(FontFace::Helvetica);
        for line in &lines {
            assert!(metrics.measure_px(line, 14.0) <= 200.0 + 1e-3, "{line}");
        }
        assert_eq!(lines.join(" "), bio.split_whitespace().collect::<Vec<_>>().join(" "));
    }

    #[test]
    fn test_chips_get_fill_and_text() {
        let tree: Node = Element::new(Tag::Div)
            .class("flex flex-wrap gap-2")
            .child(
                Element::new(Tag::Span)
                    .class("rounded-full")
                    .style(Style::default().background("#3b82f620").color("#3b82f6"))
                    .text("Rust"),
            )
            .into();
        let frame = flow(&tree, 400.0);
        assert!(matches!(frame.ops[0], Paint::Fill { .. }));
        assert!(matches!(&frame.ops[1], Paint::Text { text, .. } if text == "Rust"));
    }

    #[test]
    fn test_background_is_painted_under_content() {
        let tree: Node = Element::new(Tag::Div)
            .style(Style::default().background("#000000").padding(10.0))
            .child(Element::new(Tag::P).text("x"))
            .into();
        let frame = flow(&tree, 300.0);
        match &frame.ops[0] {
            Paint::Fill { rect, .. } => {
                assert_eq!(rect.w, 300.0);
                assert!((rect.h - frame.height).abs() < 1.0);
            }
            other => panic!("expected fill, got {other:?}"),
        }
    }

    #[test]
    fn test_row_places_fixed_and_flexible_children_side_by_side() {
        let qr = QrBlock::encode("https://x/y", 100.0, "#000000", QrLevel::M).unwrap();
        let tree: Node = Element::new(Tag::Header)
            .class("flex items-center")
            .child(Element::new(Tag::Div).child(Element::new(Tag::H1).text("Name")))
            .child(qr)
            .into();
        let frame = flow(&tree, 600.0);
        let qr_rect = frame
            .ops
            .iter()
            .find_map(|op| match op {
                Paint::Qr { rect, .. } => Some(*rect),
                _ => None,
            })
            .unwrap();
        assert!((qr_rect.right() - 600.0).abs() < 1e-3);
        assert_eq!(frame.height, 100.0);
    }

    #[test]
    fn test_centered_line_is_offset() {
        let tree: Node = Element::new(Tag::P)
            .style(Style::default().centered())
            .text("Hi")
            .into();
        let frame = flow(&tree, 400.0);
        match &frame.ops[0] {
            Paint::Text { x, .. } => assert!(*x > 150.0),
            other => panic!("expected text, got {other:?}"),
        }
    }
}
