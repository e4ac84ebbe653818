//! Rebuilds gridded tables from positioned glyphs.
//!
//! [`GlyphCollector`] is a [`pdf_extract::OutputDev`] that records where
//! every visible glyph lands on the page instead of flattening the page to
//! text. [`build_pages`] then groups glyphs into lines by baseline, splits
//! each line into cells on wide horizontal gaps, and groups consecutive
//! lines into tables on wide vertical gaps.
//!
//! Cells are placed into columns by their left edge against boundaries
//! taken from the table's widest row, so a missing cell comes out as
//! `None` in its own column rather than shifting its neighbours left. A
//! table narrower than the widest table seen earlier in the document (a
//! continuation page whose rows all lack some cell) reuses the earlier
//! columns.

use pdf_extract::{MediaBox, OutputDev, OutputError, Transform};

use crate::{Cell, PdfPage, RawTable, TableRow};

/// Baselines closer than this many ems belong to the same line.
const LINE_TOLERANCE_EMS: f64 = 0.5;

/// A horizontal gap wider than this many ems separates two cells.
const CELL_GAP_EMS: f64 = 1.0;

/// A horizontal gap wider than this many ems inside a cell is a space.
const WORD_GAP_EMS: f64 = 0.1;

/// A vertical gap wider than this many ems may end a table.
const TABLE_GAP_EMS: f64 = 3.0;

/// Once a table has a row pitch, a gap must also exceed this multiple of
/// it to end the table.
const TABLE_PITCH_FACTOR: f64 = 1.8;

/// One visible glyph in page space, measured from the top-left corner.
#[derive(Debug, Clone, PartialEq)]
pub struct Glyph {
    /// Left edge.
    pub x: f64,
    /// Baseline, growing downwards.
    pub y: f64,
    /// Advance width.
    pub width: f64,
    /// Effective font size.
    pub size: f64,
    pub text: String,
}

/// Collects the glyphs of every page of a document.
#[derive(Debug, Default)]
pub struct GlyphCollector {
    pages: Vec<Vec<Glyph>>,
    current: Vec<Glyph>,
    page_top: f64,
}

impl GlyphCollector {
    /// Glyphs per page in document order.
    #[must_use]
    pub fn into_pages(self) -> Vec<Vec<Glyph>> {
        self.pages
    }
}

impl OutputDev for GlyphCollector {
    fn begin_page(
        &mut self,
        _page_num: u32,
        media_box: &MediaBox,
        _art_box: Option<(f64, f64, f64, f64)>,
    ) -> Result<(), OutputError> {
        self.current.clear();
        self.page_top = media_box.ury;
        Ok(())
    }

    fn end_page(&mut self) -> Result<(), OutputError> {
        self.pages.push(std::mem::take(&mut self.current));
        Ok(())
    }

    fn output_character(
        &mut self,
        trm: &Transform,
        width: f64,
        _spacing: f64,
        font_size: f64,
        glyph: &str,
    ) -> Result<(), OutputError> {
        if glyph.trim().is_empty() {
            return Ok(());
        }

        let scale = trm.m11.mul_add(trm.m22, -(trm.m12 * trm.m21)).abs().sqrt();
        let size = if scale > 0.0 {
            font_size * scale
        } else {
            font_size
        };

        self.current.push(Glyph {
            x: trm.m31,
            y: self.page_top - trm.m32,
            width: width * size,
            size,
            text: glyph.to_owned(),
        });
        Ok(())
    }

    fn begin_word(&mut self) -> Result<(), OutputError> {
        Ok(())
    }

    fn end_word(&mut self) -> Result<(), OutputError> {
        Ok(())
    }

    fn end_line(&mut self) -> Result<(), OutputError> {
        Ok(())
    }
}

/// A run of glyphs on one line with no wide gap inside it.
#[derive(Debug, Clone)]
struct Span {
    x0: f64,
    x1: f64,
    text: String,
}

#[derive(Debug)]
struct Line {
    y: f64,
    size: f64,
    spans: Vec<Span>,
}

/// Builds the tables of every page, carrying column boundaries forward
/// across tables of the same document.
#[must_use]
pub fn build_pages(pages: &[Vec<Glyph>]) -> Vec<PdfPage> {
    let mut carried: Vec<Span> = Vec::new();

    pages
        .iter()
        .map(|glyphs| {
            let tables = group_tables(group_lines(glyphs))
                .into_iter()
                .filter(|lines| lines.iter().any(|line| line.spans.len() >= 2))
                .map(|lines| {
                    let own = widest_row(&lines);
                    if own.len() >= carried.len() {
                        carried = own;
                    }
                    align(&lines, &carried)
                })
                .collect();
            PdfPage::new(tables)
        })
        .collect()
}

fn group_lines(glyphs: &[Glyph]) -> Vec<Line> {
    let mut sorted: Vec<&Glyph> = glyphs.iter().collect();
    sorted.sort_by(|a, b| a.y.total_cmp(&b.y).then(a.x.total_cmp(&b.x)));

    let mut lines: Vec<(f64, f64, Vec<&Glyph>)> = Vec::new();
    for glyph in sorted {
        match lines.last_mut() {
            Some((y, size, members))
                if (glyph.y - *y).abs() <= LINE_TOLERANCE_EMS * glyph.size.max(*size) =>
            {
                *size = size.max(glyph.size);
                members.push(glyph);
            }
            _ => lines.push((glyph.y, glyph.size, vec![glyph])),
        }
    }

    lines
        .into_iter()
        .map(|(y, size, mut members)| {
            members.sort_by(|a, b| a.x.total_cmp(&b.x));
            Line {
                y,
                size,
                spans: split_spans(&members),
            }
        })
        .collect()
}

fn split_spans(glyphs: &[&Glyph]) -> Vec<Span> {
    let mut spans: Vec<Span> = Vec::new();

    for glyph in glyphs {
        let end = glyph.x + glyph.width;
        match spans.last_mut() {
            Some(span) if glyph.x - span.x1 <= CELL_GAP_EMS * glyph.size => {
                if glyph.x - span.x1 > WORD_GAP_EMS * glyph.size {
                    span.text.push(' ');
                }
                span.text.push_str(&glyph.text);
                span.x1 = span.x1.max(end);
            }
            _ => spans.push(Span {
                x0: glyph.x,
                x1: end,
                text: glyph.text.clone(),
            }),
        }
    }

    spans
}

fn group_tables(lines: Vec<Line>) -> Vec<Vec<Line>> {
    let mut tables: Vec<Vec<Line>> = Vec::new();
    let mut pitch: Option<f64> = None;

    for line in lines {
        let Some(previous) = tables.last().and_then(|table| table.last()) else {
            tables.push(vec![line]);
            continue;
        };

        let gap = line.y - previous.y;
        let wide = gap > TABLE_GAP_EMS * line.size.max(previous.size)
            && pitch.is_none_or(|pitch| gap > TABLE_PITCH_FACTOR * pitch);

        if wide {
            pitch = None;
            tables.push(vec![line]);
        } else {
            pitch = Some(pitch.map_or(gap, |pitch| pitch.min(gap)));
            if let Some(table) = tables.last_mut() {
                table.push(line);
            }
        }
    }

    tables
}

/// The spans of the first row with the most cells.
fn widest_row(lines: &[Line]) -> Vec<Span> {
    lines
        .iter()
        .fold(None::<&Line>, |best, line| match best {
            Some(best) if best.spans.len() >= line.spans.len() => Some(best),
            _ => Some(line),
        })
        .map(|line| line.spans.clone())
        .unwrap_or_default()
}

/// Places every span into the column its left edge falls in.
fn align(lines: &[Line], columns: &[Span]) -> RawTable {
    let boundaries: Vec<f64> = columns
        .windows(2)
        .map(|pair| f64::midpoint(pair[0].x1, pair[1].x0))
        .collect();

    lines
        .iter()
        .map(|line| {
            let mut row: TableRow = vec![None; columns.len().max(1)];
            for span in &line.spans {
                let index = boundaries.partition_point(|boundary| *boundary <= span.x0);
                append(&mut row[index], &span.text);
            }
            row
        })
        .collect()
}

fn append(cell: &mut Cell, text: &str) {
    match cell {
        Some(existing) => {
            existing.push(' ');
            existing.push_str(text);
        }
        None => *cell = Some(text.to_owned()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SIZE: f64 = 12.0;
    const ADVANCE: f64 = 6.0;

    /// Glyphs for `text` starting at `x`, one fixed advance per character.
    fn word(text: &str, x: f64, y: f64) -> Vec<Glyph> {
        let mut pos = x;
        let mut glyphs = Vec::new();
        for c in text.chars() {
            if c != ' ' {
                glyphs.push(Glyph {
                    x: pos,
                    y,
                    width: ADVANCE,
                    size: SIZE,
                    text: c.to_string(),
                });
            }
            pos += ADVANCE;
        }
        glyphs
    }

    const COLUMNS: [f64; 5] = [50.0, 90.0, 210.0, 330.0, 460.0];

    fn row(y: f64, cells: &[&str]) -> Vec<Glyph> {
        COLUMNS
            .iter()
            .zip(cells)
            .flat_map(|(x, text)| word(text, *x, y))
            .collect()
    }

    fn texts(row: &TableRow) -> Vec<&str> {
        row.iter().map(|c| c.as_deref().unwrap_or("")).collect()
    }

    fn header(y: f64) -> Vec<Glyph> {
        row(y, &["No", "Last Name", "First Name", "Middle", "Sex"])
    }

    #[test]
    fn empty_middle_cell_keeps_its_column() {
        let glyphs = [header(100.0), row(120.0, &["1", "Cruz", "Ana", "", "F"])].concat();

        let pages = build_pages(&[glyphs]);

        let table = &pages[0].tables[0];
        assert_eq!(table.len(), 2);
        assert_eq!(table[1][3], None);
        assert_eq!(table[1][4].as_deref(), Some("F"));
        assert_eq!(texts(&table[1]), vec!["1", "Cruz", "Ana", "", "F"]);
    }

    #[test]
    fn narrow_gaps_join_words_in_one_cell() {
        let glyphs = [header(100.0), row(120.0, &["1", "Dela Cruz", "Juan", "", "M"])].concat();

        let pages = build_pages(&[glyphs]);

        let table = &pages[0].tables[0];
        assert_eq!(table[0][1].as_deref(), Some("Last Name"));
        assert_eq!(table[1][1].as_deref(), Some("Dela Cruz"));
    }

    #[test]
    fn distant_caption_is_not_part_of_the_table() {
        let glyphs = [
            word("Seminar Attendance", 50.0, 40.0),
            header(100.0),
            row(120.0, &["1", "Cruz", "Ana", "B", "F"]),
        ]
        .concat();

        let pages = build_pages(&[glyphs]);

        assert_eq!(pages[0].tables.len(), 1);
        assert_eq!(pages[0].tables[0][0][1].as_deref(), Some("Last Name"));
    }

    #[test]
    fn wide_gap_after_steady_rows_splits_tables() {
        let glyphs = [
            header(100.0),
            row(120.0, &["1", "Cruz", "Ana", "", "F"]),
            header(300.0),
            row(320.0, &["2", "Reyes", "Maria", "", "F"]),
        ]
        .concat();

        let pages = build_pages(&[glyphs]);

        assert_eq!(pages[0].tables.len(), 2);
        assert_eq!(pages[0].tables[1][1][1].as_deref(), Some("Reyes"));
    }

    #[test]
    fn single_cell_lines_are_prose() {
        let glyphs = [
            word("This certifies that", 50.0, 100.0),
            word("the students attended.", 50.0, 114.0),
        ]
        .concat();

        let pages = build_pages(&[glyphs]);

        assert_eq!(pages.len(), 1);
        assert!(pages[0].tables.is_empty());
    }

    #[test]
    fn continuation_page_reuses_wider_columns() {
        let first = [header(100.0), row(120.0, &["1", "Cruz", "Ana", "B", "F"])].concat();
        let second = row(100.0, &["2", "Reyes", "Maria", "", "F"]);

        let pages = build_pages(&[first, second]);

        let continued = &pages[1].tables[0];
        assert_eq!(continued.len(), 1);
        assert_eq!(texts(&continued[0]), vec!["2", "Reyes", "Maria", "", "F"]);
    }

    #[test]
    fn collector_records_glyph_positions_from_the_top() {
        let media_box = MediaBox {
            llx: 0.0,
            lly: 0.0,
            urx: 612.0,
            ury: 792.0,
        };
        let mut collector = GlyphCollector::default();

        collector.begin_page(1, &media_box, None).unwrap();
        let trm = Transform::row_major(1.0, 0.0, 0.0, 1.0, 50.0, 700.0);
        collector.output_character(&trm, 0.5, 0.0, 12.0, "N").unwrap();
        collector.output_character(&trm, 0.25, 0.0, 12.0, " ").unwrap();
        collector.end_page().unwrap();

        let pages = collector.into_pages();
        assert_eq!(pages.len(), 1);
        assert_eq!(pages[0].len(), 1);
        let glyph = &pages[0][0];
        assert_eq!(glyph.text, "N");
        assert!((glyph.x - 50.0).abs() < 1e-9);
        assert!((glyph.y - 92.0).abs() < 1e-9);
        assert!((glyph.width - 6.0).abs() < 1e-9);
        assert!((glyph.size - 12.0).abs() < 1e-9);
    }
}
