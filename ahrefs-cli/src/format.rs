//! Output formatting utilities for the CLI
//!
//! Renders response payloads and errors as JSON, a YAML-like tree, CSV or
//! an aligned table. Payloads are lowered to a [`Node`] first, so every
//! response model renders in every format without per-type code.

use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

use ahrefs_core::{Node, ResponseMeta, Shape};
use colored::*;
use serde::Serialize;
use tabled::builder::Builder;
use tabled::settings::{object::Segment, Modify, Padding, Style};
use thiserror::Error;

use crate::error::{ApiError, RequestError};

/// Column used for rows that are plain scalars
const VALUE_COLUMN: &str = "value";

/// Output format options
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum OutputFormat {
    #[default]
    Json,
    Yaml,
    Csv,
    Table,
}

/// Rendering failures
#[derive(Debug, Error)]
pub enum RenderError {
    #[error("CSV format requires array/slice data")]
    UnsupportedShape,

    #[error("failed to create output file {}", path.display())]
    Create {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to write output")]
    Io(#[from] io::Error),

    #[error("failed to encode JSON output")]
    Json(#[from] serde_json::Error),

    #[error("failed to write CSV output")]
    Csv(#[from] csv::Error),
}

/// Destination of rendered output
#[derive(Debug)]
pub enum Sink {
    Stdout(io::Stdout),
    File(BufWriter<File>),
}

impl Write for Sink {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        match self {
            Sink::Stdout(out) => out.write(buf),
            Sink::File(out) => out.write(buf),
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        match self {
            Sink::Stdout(out) => out.flush(),
            Sink::File(out) => out.flush(),
        }
    }
}

#[derive(Serialize)]
struct SuccessEnvelope<'a> {
    status: &'static str,
    data: &'a Node,
    #[serde(skip_serializing_if = "Option::is_none")]
    meta: Option<&'a ResponseMeta>,
}

#[derive(Serialize)]
struct ErrorEnvelope<'a> {
    status: &'static str,
    error: &'a Node,
}

/// Renders envelopes in the selected format into an owned sink
#[derive(Debug)]
pub struct Writer<W: Write = Sink> {
    format: OutputFormat,
    out: W,
}

impl Writer<Sink> {
    /// Open a writer on `output`, or on stdout when no path is given
    pub fn create(format: OutputFormat, output: Option<&Path>) -> Result<Self, RenderError> {
        let sink = match output {
            Some(path) => {
                let file = File::create(path).map_err(|source| RenderError::Create {
                    path: path.to_path_buf(),
                    source,
                })?;
                Sink::File(BufWriter::new(file))
            }
            None => Sink::Stdout(io::stdout()),
        };
        Ok(Self::new(format, sink))
    }

    pub fn stdout(format: OutputFormat) -> Self {
        Self::new(format, Sink::Stdout(io::stdout()))
    }
}

impl<W: Write> Writer<W> {
    pub fn new(format: OutputFormat, out: W) -> Self {
        Self { format, out }
    }

    /// Flush and hand back the sink
    pub fn finish(mut self) -> Result<W, RenderError> {
        self.out.flush()?;
        Ok(self.out)
    }

    /// Render a successful payload
    pub fn write_success<T: Shape + ?Sized>(
        &mut self,
        payload: &T,
        meta: Option<&ResponseMeta>,
    ) -> Result<(), RenderError> {
        let data = payload.shape();
        match self.format {
            OutputFormat::Json => self.write_json(&SuccessEnvelope {
                status: "success",
                data: &data,
                meta,
            }),
            OutputFormat::Yaml => {
                writeln!(self.out, "status: success")?;
                writeln!(self.out, "data:")?;
                write_yaml_value(&mut self.out, &data, 1)?;
                Ok(())
            }
            OutputFormat::Csv => self.write_csv(&data),
            OutputFormat::Table => self.write_table(&data),
        }
    }

    /// Render an error in the selected format
    pub fn write_error(&mut self, err: &anyhow::Error) -> Result<(), RenderError> {
        let error = format_error(err);
        match self.format {
            // CSV has no error shape
            OutputFormat::Json | OutputFormat::Csv => self.write_json(&ErrorEnvelope {
                status: "error",
                error: &error,
            }),
            OutputFormat::Yaml => {
                writeln!(self.out, "status: error")?;
                writeln!(self.out, "error:")?;
                write_yaml_value(&mut self.out, &error, 1)?;
                Ok(())
            }
            OutputFormat::Table => self.write_table_object(&error),
        }
    }

    fn write_json<T: Serialize>(&mut self, envelope: &T) -> Result<(), RenderError> {
        serde_json::to_writer_pretty(&mut self.out, envelope)?;
        writeln!(self.out)?;
        Ok(())
    }

    fn write_csv(&mut self, data: &Node) -> Result<(), RenderError> {
        let rows = row_set(data).ok_or(RenderError::UnsupportedShape)?;
        let Some(first) = rows.first() else {
            return Ok(());
        };

        let headers = extract_headers(first);
        let mut csv = csv::Writer::from_writer(&mut self.out);
        csv.write_record(&headers)?;
        for row in rows {
            csv.write_record(extract_row(row, &headers))?;
        }
        csv.flush()?;
        Ok(())
    }

    fn write_table(&mut self, data: &Node) -> Result<(), RenderError> {
        let Some(rows) = row_set(data) else {
            return self.write_table_object(data);
        };
        let Some(first) = rows.first() else {
            writeln!(self.out, "(no results)")?;
            return Ok(());
        };

        let headers = extract_headers(first);
        let separator = "-".repeat(headers.len() * 10);

        let mut builder = Builder::default();
        builder.push_record(headers.iter().map(|header| single_line(header)));
        for row in rows {
            let cells = extract_row(row, &headers);
            builder.push_record(cells.iter().map(|cell| single_line(cell)));
        }

        let aligned = align(builder);
        let mut lines = aligned.lines();
        if let Some(header) = lines.next() {
            writeln!(self.out, "{}", header)?;
        }
        writeln!(self.out, "{}", separator)?;
        for line in lines {
            writeln!(self.out, "{}", line)?;
        }
        Ok(())
    }

    /// Vertical key/value listing of a single object
    fn write_table_object(&mut self, data: &Node) -> Result<(), RenderError> {
        let mut builder = Builder::default();
        if matches!(data, Node::Map(_) | Node::Record(_)) {
            for (label, value) in data.entries() {
                builder.push_record([
                    format!("{}:", single_line(label)),
                    single_line(&value.to_string()),
                ]);
            }
        } else {
            builder.push_record(["Value:".to_string(), single_line(&data.to_string())]);
        }

        let aligned = align(builder);
        if !aligned.is_empty() {
            writeln!(self.out, "{}", aligned)?;
        }
        Ok(())
    }
}

/// Row-set of a payload: the payload itself when it is a sequence, else the
/// first sequence-valued entry of a mapping or record.
fn row_set(data: &Node) -> Option<&[Node]> {
    match data {
        Node::Seq(items) => Some(items),
        other => other.first_sequence(),
    }
}

/// Column names derived from the first row
fn extract_headers(first: &Node) -> Vec<String> {
    match first {
        Node::Map(entries) => entries.iter().map(|(key, _)| key.clone()).collect(),
        Node::Record(fields) => fields
            .iter()
            .filter(|field| field.is_visible())
            .map(|field| field.header_name().to_string())
            .collect(),
        _ => vec![VALUE_COLUMN.to_string()],
    }
}

/// Cells of `row` for each header; missing entries are empty
fn extract_row(row: &Node, headers: &[String]) -> Vec<String> {
    match row {
        Node::Map(_) | Node::Record(_) => headers
            .iter()
            .map(|header| row.get(header).map(Node::to_string).unwrap_or_default())
            .collect(),
        scalar => headers
            .iter()
            .map(|header| {
                if header == VALUE_COLUMN {
                    scalar.to_string()
                } else {
                    String::new()
                }
            })
            .collect(),
    }
}

/// Table cells must not span lines
fn single_line(text: &str) -> String {
    text.replace("\r\n", "\\n").replace(['\n', '\r'], "\\n")
}

/// Align columns with two spaces of padding and no borders
fn align(builder: Builder) -> String {
    let mut table = builder.build();
    table
        .with(Style::empty())
        .with(Modify::new(Segment::all()).with(Padding::new(0, 2, 0, 0)));

    table
        .to_string()
        .lines()
        .map(str::trim_end)
        .collect::<Vec<_>>()
        .join("\n")
}

fn write_yaml_value<W: Write>(out: &mut W, node: &Node, indent: usize) -> io::Result<()> {
    let prefix = "  ".repeat(indent);
    match node {
        Node::Seq(items) => {
            for item in items {
                writeln!(out, "{}-", prefix)?;
                write_yaml_value(out, item, indent + 1)?;
            }
        }
        Node::Map(_) | Node::Record(_) => {
            for (label, value) in node.entries() {
                writeln!(out, "{}{}:", prefix, label)?;
                write_yaml_value(out, value, indent + 1)?;
            }
        }
        Node::Null => writeln!(out, "{}null", prefix)?,
        scalar => writeln!(out, "{}{}", prefix, scalar)?,
    }
    Ok(())
}

fn find_api_error(err: &anyhow::Error) -> Option<&ApiError> {
    err.chain().find_map(|cause| {
        cause.downcast_ref::<ApiError>().or_else(|| {
            cause
                .downcast_ref::<RequestError>()
                .and_then(RequestError::api_error)
        })
    })
}

fn find_retries(err: &anyhow::Error) -> Option<u32> {
    err.chain().find_map(|cause| match cause.downcast_ref::<RequestError>() {
        Some(RequestError::Exhausted { retries, .. }) => Some(*retries),
        _ => None,
    })
}

/// Structured error object for the error envelope.
///
/// Classified API errors anywhere in the chain contribute their code,
/// status, suggestion and docs link; anything else is reported by message.
/// When retries ran out the message says so and `retries` is set.
pub fn format_error(err: &anyhow::Error) -> Node {
    let mut entries = Vec::new();
    match find_api_error(err) {
        Some(api) => {
            let retries = find_retries(err);
            if let Some(code) = api.code {
                entries.push(("code".to_string(), Node::Str(code.to_string())));
            }
            let message = match retries {
                Some(retries) => {
                    format!("request failed after {} retries: {}", retries, api.message)
                }
                None => api.message.clone(),
            };
            entries.push(("message".to_string(), Node::Str(message)));
            entries.push(("status_code".to_string(), Node::UInt(u64::from(api.status_code))));
            if let Some(retries) = retries {
                entries.push(("retries".to_string(), Node::UInt(u64::from(retries))));
            }
            if let Some(suggestion) = api.suggestion {
                entries.push(("suggestion".to_string(), Node::Str(suggestion.to_string())));
            }
            if let Some(docs_url) = api.docs_url {
                entries.push(("docs_url".to_string(), Node::Str(docs_url.to_string())));
            }
        }
        None => entries.push(("message".to_string(), Node::Str(format!("{:#}", err)))),
    }
    Node::Map(entries)
}

/// Format success message
pub fn format_success(message: &str) -> String {
    format!("{} {}", "✓".green().bold(), message)
}

/// Format error message for the terminal
pub fn format_failure(message: &str) -> String {
    format!("{} {}", "error:".red().bold(), message)
}
