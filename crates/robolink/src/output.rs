use std::io::{IsTerminal, Write};
use std::time::{SystemTime, UNIX_EPOCH};

use bytes::BytesMut;
use clap::ValueEnum;
use comfy_table::{presets::UTF8_FULL, ContentArrangement, Table};
use robolink_frame::{encode_frame, FrameKind, TelemetryFrame};
use robolink_session::{HttpReport, SessionReport};
use serde::Serialize;
use serde_json::{Map, Value};

/// Longest field value shown in table and pretty output.
const PREVIEW_LIMIT: usize = 64;

#[derive(Clone, Debug, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Json,
    Table,
    Pretty,
    Raw,
}

impl OutputFormat {
    pub fn default_for_stdout() -> Self {
        if std::io::stdout().is_terminal() {
            Self::Table
        } else {
            Self::Json
        }
    }
}

#[derive(Serialize)]
struct TelemetryOutput<'a> {
    kind: &'a str,
    peer: &'a str,
    received_at: f64,
    fields: &'a Map<String, Value>,
}

pub fn print_telemetry(frame: &TelemetryFrame, peer: &str, format: OutputFormat) {
    match format {
        OutputFormat::Json => {
            let out = TelemetryOutput {
                kind: frame.kind().as_str(),
                peer,
                received_at: now_unix_seconds(),
                fields: frame.fields(),
            };
            println!(
                "{}",
                serde_json::to_string(&out).unwrap_or_else(|_| "{}".to_string())
            );
        }
        OutputFormat::Table => {
            let mut table = Table::new();
            table
                .load_preset(UTF8_FULL)
                .set_content_arrangement(ContentArrangement::Dynamic)
                .set_header(vec![
                    format!("{} from {peer}", frame.kind().as_str()),
                    "VALUE".to_string(),
                ]);
            for (name, value) in frame.fields() {
                table.add_row(vec![name.clone(), value_preview(frame.kind(), name, value)]);
            }
            println!("{table}");
        }
        OutputFormat::Pretty => {
            let fields: Vec<String> = frame
                .fields()
                .iter()
                .map(|(name, value)| format!("{name}={}", value_preview(frame.kind(), name, value)))
                .collect();
            println!("{} peer={} {}", frame.kind().as_str(), peer, fields.join(" "));
        }
        OutputFormat::Raw => {
            let mut line = BytesMut::new();
            if encode_frame(&frame.to_wire(), &mut line).is_ok() {
                print_raw(&line);
            }
        }
    }
}

pub fn print_session_report(report: &SessionReport, format: OutputFormat) {
    let rows = [
        ("frames_sent", report.frames_sent.to_string()),
        ("bytes_sent", report.bytes_sent.to_string()),
        ("receive_active", report.receive_active.to_string()),
        ("uptime_secs", format!("{:.3}", report.uptime.as_secs_f64())),
    ];
    let json = serde_json::json!({
        "frames_sent": report.frames_sent,
        "bytes_sent": report.bytes_sent,
        "receive_active": report.receive_active,
        "uptime_secs": report.uptime.as_secs_f64(),
    });
    print_summary("SESSION", &rows, &json, format);
}

pub fn print_http_report(report: &HttpReport, format: OutputFormat) {
    let rows = [
        ("delivered", report.delivered.to_string()),
        ("rejected", report.rejected.to_string()),
        ("failed", report.failed.to_string()),
    ];
    let json = serde_json::json!({
        "delivered": report.delivered,
        "rejected": report.rejected,
        "failed": report.failed,
    });
    print_summary("HTTP", &rows, &json, format);
}

fn print_summary(title: &str, rows: &[(&str, String)], json: &Value, format: OutputFormat) {
    match format {
        OutputFormat::Json | OutputFormat::Raw => println!("{json}"),
        OutputFormat::Table => {
            let mut table = Table::new();
            table
                .load_preset(UTF8_FULL)
                .set_content_arrangement(ContentArrangement::Dynamic)
                .set_header(vec![title, "VALUE"]);
            for (name, value) in rows {
                table.add_row(vec![name.to_string(), value.clone()]);
            }
            println!("{table}");
        }
        OutputFormat::Pretty => {
            let fields: Vec<String> = rows
                .iter()
                .map(|(name, value)| format!("{name}={value}"))
                .collect();
            println!("{title} {}", fields.join(" "));
        }
    }
}

pub fn print_raw(data: &[u8]) {
    let mut out = std::io::stdout();
    let _ = out.write_all(data);
    let _ = out.flush();
}

/// Compact rendering of one field; image payloads are summarised.
fn value_preview(kind: FrameKind, name: &str, value: &Value) -> String {
    if kind == FrameKind::Image && name == "data" {
        if let Some(data) = value.as_str() {
            return format!("<base64 {} chars>", data.len());
        }
    }

    let text = match value {
        Value::String(text) => text.clone(),
        other => other.to_string(),
    };
    if text.chars().count() > PREVIEW_LIMIT {
        let cut: String = text.chars().take(PREVIEW_LIMIT).collect();
        format!("{cut}...")
    } else {
        text
    }
}

fn now_unix_seconds() -> f64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs_f64())
        .unwrap_or_default()
}
