#[cfg(test)]
#[path = "markdown_table_test.rs"]
mod tests;

fn is_table_row(line: &str) -> bool {
    let trimmed = line.trim();
    return trimmed.len() > 1 && trimmed.starts_with('|') && trimmed.ends_with('|');
}

fn split_cells(line: &str) -> Vec<String> {
    let trimmed = line.trim();
    let inner = &trimmed[1..trimmed.len() - 1];

    return inner
        .split('|')
        .map(|cell| return cell.trim().to_string())
        .collect();
}

fn is_separator_cell(cell: &str) -> bool {
    let dashes = cell.trim_start_matches(':').trim_end_matches(':');
    return !dashes.is_empty() && dashes.chars().all(|c| return c == '-');
}

fn is_separator_row(cells: &[String]) -> bool {
    return !cells.is_empty() && cells.iter().all(|cell| return is_separator_cell(cell));
}

fn width(text: &str) -> usize {
    return text.chars().count();
}

fn pad(text: &str, len: usize) -> String {
    let fill = len.saturating_sub(width(text));
    return format!("{text}{}", " ".repeat(fill));
}

fn separator_cell(cell: &str, len: usize) -> String {
    // Cells are padded by one space each side, so the rule spans both.
    let total = len + 2;
    let left = cell.starts_with(':');
    let right = cell.ends_with(':');
    let dashes = total - usize::from(left) - usize::from(right);

    return format!(
        "{}{}{}",
        if left { ":" } else { "" },
        "-".repeat(dashes),
        if right { ":" } else { "" }
    );
}

fn format_table(rows: &[Vec<String>]) -> Vec<String> {
    let columns = rows.iter().map(|row| return row.len()).max().unwrap_or(0);
    let mut widths = vec![3; columns];

    for (idx, row) in rows.iter().enumerate() {
        if idx == 1 {
            continue;
        }
        for (col, cell) in row.iter().enumerate() {
            widths[col] = widths[col].max(width(cell));
        }
    }

    return rows
        .iter()
        .enumerate()
        .map(|(idx, row)| {
            let cells = (0..columns)
                .map(|col| {
                    let cell = row.get(col).map(|e| return e.as_str()).unwrap_or("");
                    if idx == 1 {
                        return separator_cell(cell, widths[col]);
                    }
                    return format!(" {} ", pad(cell, widths[col]));
                })
                .collect::<Vec<String>>();

            return format!("|{}|", cells.join("|"));
        })
        .collect();
}

/// Re-aligns pipe delimited markdown tables into padded, equal width columns.
/// A table is a header row followed by a separator row and any number of body
/// rows. Everything else, including tables inside fenced code blocks, passes
/// through untouched.
pub fn align_tables(text: &str) -> String {
    let lines = text.lines().collect::<Vec<&str>>();
    let mut res: Vec<String> = vec![];
    let mut in_codeblock = false;
    let mut idx = 0;

    while idx < lines.len() {
        let line = lines[idx];
        if line.trim().starts_with("```") {
            in_codeblock = !in_codeblock;
        }

        let starts_table = !in_codeblock
            && is_table_row(line)
            && idx + 1 < lines.len()
            && is_table_row(lines[idx + 1])
            && is_separator_row(&split_cells(lines[idx + 1]));

        if !starts_table {
            res.push(line.to_string());
            idx += 1;
            continue;
        }

        let mut rows = vec![split_cells(line), split_cells(lines[idx + 1])];
        idx += 2;
        while idx < lines.len() && is_table_row(lines[idx]) {
            rows.push(split_cells(lines[idx]));
            idx += 1;
        }

        res.extend(format_table(&rows));
    }

    return res.join("\n");
}
