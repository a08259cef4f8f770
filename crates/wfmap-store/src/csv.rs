//! Minimal CSV writing (RFC 4180 quoting).

use std::io::{self, Write};

fn needs_quotes(field: &str) -> bool {
    field.contains(',') || field.contains('"') || field.contains('\n') || field.contains('\r')
}

/// Write a single CSV row, CRLF-terminated.
pub(crate) fn write_row<W: Write, S: AsRef<str>>(mut w: W, row: &[S]) -> io::Result<()> {
    for (i, cell) in row.iter().enumerate() {
        if i > 0 {
            w.write_all(b",")?;
        }
        let cell = cell.as_ref();
        if needs_quotes(cell) {
            write!(w, "\"{}\"", cell.replace('"', "\"\""))?;
        } else {
            w.write_all(cell.as_bytes())?;
        }
    }
    w.write_all(b"\r\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(cells: &[&str]) -> String {
        let mut buf = Vec::new();
        write_row(&mut buf, cells).unwrap();
        String::from_utf8(buf).unwrap()
    }

    #[test]
    fn test_plain_row() {
        assert_eq!(row(&["1234", "abbr"]), "1234,abbr\r\n");
    }

    #[test]
    fn test_header_with_spaces_is_unquoted() {
        assert_eq!(
            row(&["Chrome Status Entry", "Feature ID"]),
            "Chrome Status Entry,Feature ID\r\n"
        );
    }

    #[test]
    fn test_quotes_and_commas_are_escaped() {
        assert_eq!(row(&["a,b", "say \"hi\""]), "\"a,b\",\"say \"\"hi\"\"\"\r\n");
    }
}
