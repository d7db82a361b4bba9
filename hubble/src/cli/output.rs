//! Flow output for the CLI

use std::io::Write;

use hubble_common::{Endpoint, Flow};

use super::OutputFormat;

/// Writes flows to an output stream in the selected format
pub struct FlowPrinter<W: Write> {
    out: W,
    format: OutputFormat,
}

impl<W: Write> FlowPrinter<W> {
    pub fn new(out: W, format: OutputFormat) -> Self {
        Self { out, format }
    }

    /// Write one flow followed by a newline.
    ///
    /// # Errors
    /// Returns an error if serialization or the underlying write fails.
    pub fn print(&mut self, flow: &Flow) -> anyhow::Result<()> {
        match self.format {
            OutputFormat::Json => {
                serde_json::to_writer(&mut self.out, flow)?;
                writeln!(self.out)?;
            }
            OutputFormat::Compact => writeln!(self.out, "{}", compact_line(flow))?,
        }
        Ok(())
    }

    /// # Errors
    /// Returns an error if the underlying flush fails.
    pub fn flush(&mut self) -> std::io::Result<()> {
        self.out.flush()
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

/// `<time> [<node>]: <src> -> <dst> <verdict> <summary>`
fn compact_line(flow: &Flow) -> String {
    use std::fmt::Write as _;

    let endpoint = |e: Option<&Endpoint>| e.map_or_else(|| "?".to_string(), ToString::to_string);

    let mut line = flow.time.to_string();
    if let Some(node) = &flow.node_name {
        let _ = write!(line, " [{node}]");
    }
    let _ = write!(
        line,
        ": {} -> {} {}",
        endpoint(flow.source.as_ref()),
        endpoint(flow.destination.as_ref()),
        flow.verdict
    );
    if !flow.summary.is_empty() {
        line.push(' ');
        line.push_str(&flow.summary);
    }
    line
}

#[cfg(test)]
mod tests {
    use super::*;
    use hubble_common::{Timestamp, Verdict};

    fn sample_flow() -> Flow {
        Flow {
            time: Timestamp::new(10, 5),
            verdict: Verdict::Forwarded,
            source: Some(Endpoint { ip: "10.0.0.1".into(), port: Some(41000) }),
            destination: Some(Endpoint { ip: "10.0.0.2".into(), port: Some(80) }),
            node_name: Some("node-a".into()),
            summary: "TCP Flags: SYN".into(),
            ..Flow::default()
        }
    }

    #[test]
    fn test_compact_output() {
        let mut printer = FlowPrinter::new(Vec::new(), OutputFormat::Compact);
        printer.print(&sample_flow()).unwrap();
        let text = String::from_utf8(printer.into_inner()).unwrap();
        assert_eq!(
            text,
            "10.000000005 [node-a]: 10.0.0.1:41000 -> 10.0.0.2:80 FORWARDED TCP Flags: SYN\n"
        );
    }

    #[test]
    fn test_compact_output_without_endpoints() {
        let mut printer = FlowPrinter::new(Vec::new(), OutputFormat::Compact);
        printer.print(&Flow::at(Timestamp::from_secs(1))).unwrap();
        let text = String::from_utf8(printer.into_inner()).unwrap();
        assert_eq!(text, "1.000000000: ? -> ? UNKNOWN\n");
    }

    #[test]
    fn test_json_output_is_one_line_per_flow() {
        let mut printer = FlowPrinter::new(Vec::new(), OutputFormat::Json);
        printer.print(&sample_flow()).unwrap();
        printer.print(&Flow::at(Timestamp::from_secs(2))).unwrap();
        let text = String::from_utf8(printer.into_inner()).unwrap();

        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 2);
        let parsed: Flow = serde_json::from_str(lines[0]).unwrap();
        assert_eq!(parsed, sample_flow());
    }
}
