use std::io::{Result, Write};

use crate::parser::FilteredFields;

/// Joins the field values in key order, separated by single blanks.
///
/// Keys are compared as strings, so `a10` comes before `a2`. Returns
/// `None` for an empty map.
pub fn capture_line(fields: &FilteredFields) -> Option<String> {
    if fields.is_empty() {
        return None;
    }
    let values: Vec<&str> = fields.values().map(String::as_str).collect();
    Some(format!("CAPTURE: {}", values.join(" ")))
}

/// Line-oriented console output. Every line is flushed as soon as it
/// has been written.
pub struct Reporter<W: Write> {
    output: W,
    /// Print `key = value` lines, followed by two blank lines, before
    /// each capture
    pub dump_fields: bool,
    /// Print a line for every idle receive
    pub waiting: bool,
}

impl<W: Write> Reporter<W> {
    pub fn new(output: W) -> Self {
        Reporter {
            output,
            dump_fields: false,
            waiting: true,
        }
    }

    pub fn status(&mut self, message: &str) -> Result<()> {
        writeln!(self.output, "{}", message)?;
        self.output.flush()
    }

    pub fn idle(&mut self) -> Result<()> {
        if self.waiting {
            self.status("waiting")?;
        }
        Ok(())
    }

    /// Prints one capture line. Returns `false` if there was nothing
    /// to print.
    pub fn capture(&mut self, fields: &FilteredFields) -> Result<bool> {
        let line = match capture_line(fields) {
            Some(line) => line,
            None => return Ok(false),
        };
        if self.dump_fields {
            for (k, v) in fields {
                writeln!(self.output, "{} = {}", k, v)?;
            }
            self.output.write_all(b"\n\n")?;
        }
        writeln!(self.output, "{}", line)?;
        self.output.flush()?;
        Ok(true)
    }

    pub fn into_inner(self) -> W {
        self.output
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn fields(kv: &[(&str, &str)]) -> FilteredFields {
        kv.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect()
    }

    #[test]
    fn ordering() {
        assert_eq!(
            capture_line(&fields(&[("a0", "/bin/sh"), ("a1", "-c")])).as_deref(),
            Some("CAPTURE: /bin/sh -c")
        );
        assert_eq!(
            capture_line(&fields(&[("a2", "two"), ("a10", "ten"), ("a1", "one")])).as_deref(),
            Some("CAPTURE: one ten two")
        );
        assert_eq!(capture_line(&fields(&[])), None);
    }

    #[test]
    fn reporter() -> Result<()> {
        let mut r = Reporter::new(Vec::new());
        r.status("Connected socket")?;
        r.idle()?;
        assert!(r.capture(&fields(&[("a0", "ls"), ("a2", "-l")]))?);
        assert!(!r.capture(&fields(&[]))?);
        r.waiting = false;
        r.idle()?;
        assert_eq!(
            String::from_utf8_lossy(&r.into_inner()),
            "Connected socket\nwaiting\nCAPTURE: ls -l\n"
        );
        Ok(())
    }

    #[test]
    fn dump_fields() -> Result<()> {
        let mut r = Reporter::new(Vec::new());
        r.dump_fields = true;
        r.capture(&fields(&[("a1", "-c"), ("a0", "/bin/sh")]))?;
        assert_eq!(
            String::from_utf8_lossy(&r.into_inner()),
            "a0 = /bin/sh\na1 = -c\n\n\nCAPTURE: /bin/sh -c\n"
        );
        Ok(())
    }
}
