use super::{ExtractError, Format, RawText};
use docx_rs::{
    DocumentChild, InsertChild, Paragraph, ParagraphChild, Run, RunChild, StructuredDataTag,
    StructuredDataTagChild, Table, TableCellContent, TableChild, TableRowChild,
};

/// Body paragraphs in document order; tables flattened one row per line with
/// cells joined by ` | `. Content controls and tracked insertions are read
/// through; tracked deletions are not.
pub(crate) fn extract(bytes: &[u8]) -> Result<RawText, ExtractError> {
    let doc = docx_rs::read_docx(bytes).map_err(|e| ExtractError::failure(Format::Docx, e))?;

    let mut lines = Vec::new();
    for child in &doc.document.children {
        match child {
            DocumentChild::Paragraph(para) => lines.push(paragraph_text(para)),
            DocumentChild::Table(table) => table_lines(table, &mut lines),
            DocumentChild::StructuredDataTag(sdt) => sdt_lines(sdt, &mut lines),
            _ => {}
        }
    }
    Ok(RawText::from(lines.join("\n")))
}

fn paragraph_text(para: &Paragraph) -> String {
    let mut out = String::new();
    push_children(&para.children, &mut out);
    out
}

fn push_children(children: &[ParagraphChild], out: &mut String) {
    for child in children {
        match child {
            ParagraphChild::Run(run) => push_run(run, out),
            ParagraphChild::Insert(ins) => {
                for c in &ins.children {
                    if let InsertChild::Run(run) = c {
                        push_run(run, out);
                    }
                }
            }
            ParagraphChild::Hyperlink(link) => push_children(&link.children, out),
            ParagraphChild::StructuredDataTag(sdt) => push_sdt_inline(sdt, out),
            _ => {}
        }
    }
}

fn push_run(run: &Run, out: &mut String) {
    for rc in &run.children {
        match rc {
            RunChild::Text(t) => out.push_str(&t.text),
            RunChild::Tab(_) | RunChild::PTab(_) => out.push('\t'),
            RunChild::Break(_) | RunChild::CarriageReturn(_) => out.push('\n'),
            _ => {}
        }
    }
}

fn push_sdt_inline(sdt: &StructuredDataTag, out: &mut String) {
    for child in &sdt.children {
        match child {
            StructuredDataTagChild::Run(run) => push_run(run, out),
            StructuredDataTagChild::Paragraph(p) => push_children(&p.children, out),
            StructuredDataTagChild::StructuredDataTag(inner) => push_sdt_inline(inner, out),
            _ => {}
        }
    }
}

fn sdt_lines(sdt: &StructuredDataTag, lines: &mut Vec<String>) {
    let mut inline = String::new();
    for child in &sdt.children {
        match child {
            StructuredDataTagChild::Run(run) => push_run(run, &mut inline),
            StructuredDataTagChild::Paragraph(p) => lines.push(paragraph_text(p)),
            StructuredDataTagChild::Table(t) => table_lines(t, lines),
            StructuredDataTagChild::StructuredDataTag(inner) => sdt_lines(inner, lines),
            _ => {}
        }
    }
    if !inline.is_empty() {
        lines.push(inline);
    }
}

fn cell_text(content: &[TableCellContent]) -> String {
    let mut parts = Vec::new();
    for c in content {
        match c {
            TableCellContent::Paragraph(p) => parts.push(paragraph_text(p)),
            TableCellContent::StructuredDataTag(sdt) => {
                let mut s = String::new();
                push_sdt_inline(sdt, &mut s);
                parts.push(s);
            }
            _ => {}
        }
    }
    parts.join(" ").trim().to_string()
}

fn table_lines(table: &Table, lines: &mut Vec<String>) {
    for row in &table.rows {
        let TableChild::TableRow(tr) = row;
        let cells: Vec<String> = tr
            .cells
            .iter()
            .map(|cell| {
                let TableRowChild::TableCell(tc) = cell;
                cell_text(&tc.children)
            })
            .collect();
        lines.push(cells.join(" | "));
    }
}
