use crate::model::LogRecord;
use std::io::{self, Write};
use tabled::{
    settings::{object::Rows, Padding, Remove, Style},
    Table, Tabled,
};

#[derive(Tabled)]
struct LogRow {
    #[tabled(rename = "Timestamp")]
    timestamp: i64,
    #[tabled(rename = "Trace ID")]
    trace_id: String,
    #[tabled(rename = "Span ID")]
    span_id: String,
    #[tabled(rename = "Message")]
    message: String,
    #[tabled(rename = "Severity")]
    severity: String,
}

impl LogRow {
    fn from_record(record: &LogRecord) -> Self {
        LogRow {
            timestamp: record.timestamp,
            trace_id: single_line(&record.trace_id),
            span_id: single_line(&record.span_id),
            message: single_line(&record.message),
            severity: single_line(&record.severity),
        }
    }
}

/// Renders log records as an aligned table.
///
/// Columns are sized to the widest cell of the batch, padded by two spaces and
/// separated by `|`. Output is flushed after each batch.
pub struct Printer<W: Write> {
    out: W,
}

impl<W: Write> Printer<W> {
    pub fn new(out: W) -> Self {
        Printer { out }
    }

    pub fn get_ref(&self) -> &W {
        &self.out
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    pub fn print_batch(&mut self, records: &[LogRecord], with_header: bool) -> io::Result<()> {
        if records.is_empty() {
            return self.out.flush();
        }

        let mut table = Table::new(records.iter().map(LogRow::from_record));
        table
            .with(Style::empty().vertical('|'))
            .with(Padding::new(0, 2, 0, 0));
        if !with_header {
            table.with(Remove::row(Rows::first()));
        }

        for line in table.to_string().lines() {
            writeln!(self.out, "{}", line.trim_end())?;
        }
        self.out.flush()
    }
}

fn single_line(field: &str) -> String {
    field.replace(['\t', '\r', '\n'], " ")
}
