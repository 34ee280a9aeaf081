use anyhow::Result;
use std::io::{BufRead, Write};
use tabled::{
    Table, Tabled,
    settings::{Alignment, Modify, Style, object::Columns},
};

/// Print `text` without a newline and read one line. `None` on end of input.
pub(crate) fn prompt<R: BufRead, W: Write>(
    input: &mut R,
    output: &mut W,
    text: &str,
) -> Result<Option<String>> {
    write!(output, "{text}")?;
    output.flush()?;
    let mut line = String::new();
    if input.read_line(&mut line)? == 0 {
        return Ok(None);
    }
    Ok(Some(line.trim().to_string()))
}

pub(crate) fn print_named_table(rows: impl IntoIterator<Item = (i64, String)>) {
    #[derive(Tabled)]
    struct NamedRow {
        #[tabled(rename = "ID")]
        id: i64,
        #[tabled(rename = "Name")]
        name: String,
    }

    let rows: Vec<NamedRow> = rows
        .into_iter()
        .map(|(id, name)| NamedRow { id, name })
        .collect();
    let table = Table::new(&rows)
        .with(Style::rounded())
        .with(Modify::new(Columns::new(0..1)).with(Alignment::right()))
        .to_string();
    println!("{table}");
}

pub(crate) fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let end = s.char_indices().nth(max - 3).map_or(s.len(), |(i, _)| i);
        format!("{}...", &s[..end])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn test_prompt_reads_trimmed_line() {
        let mut input = Cursor::new("  Pancakes \nnext\n");
        let mut output = Vec::new();
        let line = prompt(&mut input, &mut output, "Recipe name: ").unwrap();
        assert_eq!(line.as_deref(), Some("Pancakes"));
        assert_eq!(String::from_utf8(output).unwrap(), "Recipe name: ");
    }

    #[test]
    fn test_prompt_end_of_input() {
        let mut input = Cursor::new("");
        let mut output = Vec::new();
        assert!(prompt(&mut input, &mut output, "> ").unwrap().is_none());
    }

    #[test]
    fn test_truncate() {
        assert_eq!(truncate("hello", 10), "hello");
        assert_eq!(truncate("hello world this is long", 10), "hello w...");
    }

    #[test]
    fn test_truncate_utf8() {
        assert_eq!(truncate("Crème fraîche", 10), "Crème f...");
        assert_eq!(truncate("Müsli", 10), "Müsli");
    }
}
