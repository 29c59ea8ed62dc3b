use super::ReportRow;
use crate::prelude::ScanResult;
use std::io::Write;

/// Append-only destination for report rows.
pub trait ReportSink {
    fn emit(&mut self, row: &ReportRow) -> ScanResult<()>;

    /// Called once after every complete report interval.
    fn flush(&mut self) -> ScanResult<()> {
        Ok(())
    }
}

/// Writes rows as text lines to any writer (stdout, a file, a buffer).
pub struct CsvSink<W: Write> {
    writer: W,
}

impl<W: Write> CsvSink<W> {
    pub fn new(writer: W) -> Self {
        Self { writer }
    }

    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl<W: Write> ReportSink for CsvSink<W> {
    fn emit(&mut self, row: &ReportRow) -> ScanResult<()> {
        writeln!(self.writer, "{}", row)?;
        Ok(())
    }

    fn flush(&mut self) -> ScanResult<()> {
        self.writer.flush()?;
        Ok(())
    }
}

impl ReportSink for Vec<ReportRow> {
    fn emit(&mut self, row: &ReportRow) -> ScanResult<()> {
        self.push(row.clone());
        Ok(())
    }
}

impl<A: ReportSink, B: ReportSink> ReportSink for (A, B) {
    fn emit(&mut self, row: &ReportRow) -> ScanResult<()> {
        self.0.emit(row)?;
        self.1.emit(row)
    }

    fn flush(&mut self) -> ScanResult<()> {
        self.0.flush()?;
        self.1.flush()
    }
}

/// An absent optional sink drops rows.
impl<S: ReportSink> ReportSink for Option<S> {
    fn emit(&mut self, row: &ReportRow) -> ScanResult<()> {
        match self {
            Some(sink) => sink.emit(row),
            None => Ok(()),
        }
    }

    fn flush(&mut self) -> ScanResult<()> {
        match self {
            Some(sink) => sink.flush(),
            None => Ok(()),
        }
    }
}

impl<S: ReportSink + ?Sized> ReportSink for &mut S {
    fn emit(&mut self, row: &ReportRow) -> ScanResult<()> {
        (**self).emit(row)
    }

    fn flush(&mut self) -> ScanResult<()> {
        (**self).flush()
    }
}

impl<S: ReportSink + ?Sized> ReportSink for Box<S> {
    fn emit(&mut self, row: &ReportRow) -> ScanResult<()> {
        (**self).emit(row)
    }

    fn flush(&mut self) -> ScanResult<()> {
        (**self).flush()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(low: i64) -> ReportRow {
        ReportRow {
            timestamp: "2024-05-01, 12:00:00".into(),
            low,
            high: low + 10,
            step: 1.0,
            samples: 4,
            dbm: vec![-1.0],
        }
    }

    #[test]
    fn csv_sink_writes_one_line_per_row() {
        let mut sink = CsvSink::new(Vec::new());
        sink.emit(&row(0)).unwrap();
        sink.emit(&row(10)).unwrap();
        sink.flush().unwrap();
        let text = String::from_utf8(sink.into_inner()).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[1].starts_with("2024-05-01, 12:00:00, 10, 20,"));
    }

    #[test]
    fn paired_sinks_fan_out() {
        let mut pair = (Vec::<ReportRow>::new(), CsvSink::new(Vec::new()));
        pair.emit(&row(5)).unwrap();
        let mut boxed: Box<dyn ReportSink> = Box::new(Vec::<ReportRow>::new());
        boxed.emit(&row(5)).unwrap();
        assert_eq!(pair.0, vec![row(5)]);
        assert!(!pair.1.into_inner().is_empty());
    }

    #[test]
    fn optional_sinks_are_skipped_when_absent() {
        let mut sinks: (Option<Vec<ReportRow>>, Option<Vec<ReportRow>>) = (Some(Vec::new()), None);
        sinks.emit(&row(1)).unwrap();
        sinks.flush().unwrap();
        assert_eq!(sinks.0.map(|rows| rows.len()), Some(1));
    }
}
