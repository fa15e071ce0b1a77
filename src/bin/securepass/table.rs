//! Minimal column-aligned table output for history and cache listings.

use std::io::{self, Write};

use unicode_width::UnicodeWidthStr;

/// Render `rows` under `headers` with two-space column gutters, padding each
/// column to the widest cell in it.
pub(crate) fn render<const N: usize>(
    headers: [&str; N],
    rows: &[[String; N]],
    mut output: impl Write,
) -> io::Result<()> {
    let mut widths = headers.map(|header| header.width());
    for row in rows {
        for (width, cell) in widths.iter_mut().zip(row) {
            *width = std::cmp::max(*width, cell.width());
        }
    }

    write_row(&mut output, &widths, |i| headers[i])?;
    let dividers = widths.map(|w| "─".repeat(w));
    write_row(&mut output, &widths, |i| &dividers[i])?;
    for row in rows {
        write_row(&mut output, &widths, |i| &row[i])?;
    }
    Ok(())
}

fn write_row<'a, F>(mut output: impl Write, widths: &[usize], cell: F) -> io::Result<()>
where
    F: Fn(usize) -> &'a str,
{
    for (i, width) in widths.iter().enumerate() {
        if i > 0 {
            write!(output, "  ")?;
        }
        let text = cell(i);
        write!(output, "{text}")?;
        // The divider row is made of multi-byte characters; pad by display
        // width, not byte length.
        for _ in 0..width.saturating_sub(text.width()) {
            write!(output, " ")?;
        }
    }
    writeln!(output)?;
    Ok(())
}
