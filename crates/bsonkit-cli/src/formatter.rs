use crate::stats::Stats;
use colored::Colorize;

pub struct Formatter {
    color: bool,
}

impl Formatter {
    pub fn new(color: bool) -> Self {
        Self { color }
    }

    /// dump 输出中每个文档前的标题行
    pub fn document_header(&self, index: usize, offset: usize, size: usize) -> String {
        let header = format!("# document {} (offset {}, {} bytes)", index, offset, size);
        if self.color {
            header.cyan().bold().to_string()
        } else {
            header
        }
    }

    pub fn stats(&self, stats: &Stats) -> String {
        let mut out = String::new();
        out.push_str(&format!("documents: {}\n", stats.documents));
        out.push_str(&format!("bytes:     {}\n", stats.bytes));
        out.push_str(&format!("elements:  {}\n", stats.elements));
        if stats.by_type.is_empty() {
            return out;
        }

        let headers = ["type".to_string(), "count".to_string()];
        let rows: Vec<Vec<String>> = stats
            .by_type
            .iter()
            .map(|(name, count)| vec![name.to_string(), count.to_string()])
            .collect();
        out.push('\n');
        out.push_str(&self.simple_table(&headers, &rows));
        out
    }

    fn simple_table(&self, headers: &[String], rows: &[Vec<String>]) -> String {
        let mut widths: Vec<usize> = headers.iter().map(|h| h.len()).collect();
        for row in rows {
            for (i, cell) in row.iter().enumerate() {
                if i < widths.len() {
                    widths[i] = widths[i].max(cell.len());
                }
            }
        }

        let separator: String = widths
            .iter()
            .map(|w| "-".repeat(*w + 2))
            .collect::<Vec<_>>()
            .join("+");

        // 宽度按未着色文本计算，着色放在填充之后
        let header_row: String = headers
            .iter()
            .enumerate()
            .map(|(i, h)| {
                let cell = format!(" {:width$} ", h, width = widths[i]);
                if self.color {
                    cell.cyan().bold().to_string()
                } else {
                    cell
                }
            })
            .collect::<Vec<_>>()
            .join("|");

        let mut out = String::new();
        out.push_str(&format!("+{}+\n", separator));
        out.push_str(&format!("|{}|\n", header_row));
        out.push_str(&format!("+{}+\n", separator));
        for row in rows {
            let row_str: String = row
                .iter()
                .enumerate()
                .map(|(i, cell)| {
                    format!(" {:width$} ", cell, width = widths.get(i).copied().unwrap_or(0))
                })
                .collect::<Vec<_>>()
                .join("|");
            out.push_str(&format!("|{}|\n", row_str));
        }
        out.push_str(&format!("+{}+\n", separator));
        out
    }
}
