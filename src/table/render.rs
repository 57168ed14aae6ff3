use crate::table::Table;

/// Renders the bordered text grid.
///
/// Column width is the widest of the header and every value in that column,
/// rounded up to an even count, plus four. Content is centered; an odd pad
/// leaves the extra space on the right. Every emitted line ends with `\n`.
/// Callers must have checked arity already.
pub(crate) fn text_grid(table: &Table) -> String {
    let cols = table.column_count();
    let mut out = String::new();
    if let Some(title) = table.title() {
        if !title.is_empty() {
            out.push_str(title);
            out.push('\n');
        }
    }
    if cols == 0 {
        return out;
    }

    let mut widths = vec![0usize; cols];
    if table.has_headers() {
        for (i, header) in table.headers().iter().enumerate() {
            widths[i] = widths[i].max(header.chars().count());
        }
    }
    for row in table.rows() {
        for (i, value) in row.iter().enumerate() {
            widths[i] = widths[i].max(value.to_text().chars().count());
        }
    }
    for width in &mut widths {
        *width = *width + 4 + *width % 2;
    }

    let border = border_line(&widths);
    out.push_str(&border);
    if table.has_headers() {
        out.push('|');
        for (i, header) in table.headers().iter().enumerate() {
            out.push_str(&centered(header, widths[i]));
            out.push('|');
        }
        out.push('\n');
        out.push_str(&border);
    }
    for row in table.rows() {
        out.push('|');
        for (i, width) in widths.iter().enumerate() {
            let text = row.get(i).map(|v| v.to_text()).unwrap_or_default();
            out.push_str(&centered(&text, *width));
            out.push('|');
        }
        out.push('\n');
    }
    out.push_str(&border);
    out
}

/// Renders comma-separated lines: headers first when present, then one line
/// per row. Fields containing the delimiter, quotes, or line breaks are
/// quoted with inner quotes doubled.
pub(crate) fn delimited(table: &Table) -> String {
    let mut out = String::new();
    if table.has_headers() {
        let line: Vec<String> = table.headers().iter().map(|h| escape_field(h)).collect();
        out.push_str(&line.join(","));
        out.push('\n');
    }
    for row in table.rows() {
        let line: Vec<String> = row.iter().map(|v| escape_field(&v.to_text())).collect();
        out.push_str(&line.join(","));
        out.push('\n');
    }
    out
}

fn border_line(widths: &[usize]) -> String {
    let mut line = String::from("+");
    for width in widths {
        line.push_str(&"-".repeat(*width));
        line.push('+');
    }
    line.push('\n');
    line
}

fn centered(text: &str, width: usize) -> String {
    let len = text.chars().count();
    let pad = width.saturating_sub(len);
    let left = pad / 2;
    let right = pad - left;
    format!("{}{}{}", " ".repeat(left), text, " ".repeat(right))
}

fn escape_field(field: &str) -> String {
    if field.contains(',') || field.contains('"') || field.contains('\n') || field.contains('\r') {
        format!("\"{}\"", field.replace('"', "\"\""))
    } else {
        field.to_string()
    }
}
