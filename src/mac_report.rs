// Reporting: event logging, CSV export and result tables

use std::fmt::Write as _;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use log::debug;

use crate::mac_interface::{Event, EventSink, SlotTime, StationId};
use crate::mac_rng::seed_to_hex;
use crate::mac_runner::{Metric, RunResult, SweepResults};
use crate::mac_stats::{self, Summary};

// ============================================================================
// Logging Event Sink
// ============================================================================

/// Forwards engine events to the `log` facade at debug level
pub struct LoggingEventSink;

impl EventSink for LoggingEventSink {
    fn log(&mut self, slot: SlotTime, station: StationId, event: Event) {
        match event {
            Event::Delivered { size } => {
                debug!("{:>6} st:{:<4} delivered   size:{}", slot, station, size)
            }
            Event::Collision { participants } => {
                debug!("{:>6} st:{:<4} collision   with:{}", slot, station, participants)
            }
            Event::PacketLost { attempts, backoff } => debug!(
                "{:>6} st:{:<4} lost        attempts:{} backoff:{}",
                slot, station, attempts, backoff
            ),
            Event::BackoffStarted { backoff } => {
                debug!("{:>6} st:{:<4} backoff     slots:{}", slot, station, backoff)
            }
            Event::Deferred { backoff } => {
                debug!("{:>6} st:{:<4} deferred    slots:{}", slot, station, backoff)
            }
        }
    }
}

// ============================================================================
// CSV Export
// ============================================================================

pub const CSV_HEADER: &str = "protocol,stations,replication,seed,slots,throughput,collision_rate,\
mean_waiting_time,mean_lost_packets,delivered_packets,delivered_bits,attempts,collisions,\
collision_events,lost_packets,deferrals";

/// One CSV row per replication
pub struct CsvRunWriter<W: Write> {
    writer: W,
}

impl CsvRunWriter<BufWriter<File>> {
    pub fn create<P: AsRef<Path>>(path: P) -> std::io::Result<Self> {
        let file = File::create(path)?;
        Self::new(BufWriter::new(file))
    }
}

impl<W: Write> CsvRunWriter<W> {
    pub fn new(mut writer: W) -> std::io::Result<Self> {
        writeln!(writer, "{}", CSV_HEADER)?;
        Ok(Self { writer })
    }

    pub fn write_result(&mut self, r: &RunResult) -> std::io::Result<()> {
        // undefined collision rate stays an empty cell
        let collision_rate = r.collision_rate.map(|c| c.to_string()).unwrap_or_default();
        writeln!(
            self.writer,
            "{},{},{},{},{},{},{},{},{},{},{},{},{},{},{},{}",
            r.protocol.tag(),
            r.num_stations,
            r.replication,
            seed_to_hex(&r.seed),
            r.num_slots,
            r.throughput,
            collision_rate,
            r.mean_waiting_time,
            r.mean_lost_packets,
            r.delivered_packets,
            r.delivered_bits,
            r.transmission_attempts,
            r.collisions,
            r.collision_events,
            r.lost_packets,
            r.deferrals
        )
    }

    pub fn write_sweep(&mut self, sweep: &SweepResults) -> std::io::Result<()> {
        for r in sweep.iter() {
            self.write_result(r)?;
        }
        self.writer.flush()
    }

    pub fn into_inner(self) -> W {
        self.writer
    }
}

// ============================================================================
// Tables
// ============================================================================

/// Mean and standard deviation of `metric` per (protocol, population)
pub fn metric_table(sweep: &SweepResults, metric: Metric) -> String {
    let headers = [
        "protocol".to_string(),
        "# stations".to_string(),
        format!("avg {}", metric.name()),
        format!("std {}", metric.name()),
    ];

    let rows: Vec<[String; 4]> = sweep
        .runs
        .keys()
        .map(|&(protocol, n)| {
            let samples = sweep.samples(protocol, n, metric);
            [
                protocol.tag().to_string(),
                n.to_string(),
                format_opt(mac_stats::mean(&samples)),
                format_opt(mac_stats::std_dev(&samples)),
            ]
        })
        .collect();

    render_table(&headers, &rows)
}

/// Mean with its 95% interval, median and spread of `metric`
pub fn summary_table(sweep: &SweepResults, metric: Metric) -> String {
    let headers = [
        "protocol".to_string(),
        "# stations".to_string(),
        "n".to_string(),
        "mean".to_string(),
        "ci95".to_string(),
        "median".to_string(),
        "gini".to_string(),
    ];

    let rows: Vec<[String; 7]> = sweep
        .runs
        .keys()
        .map(|&(protocol, n)| {
            let samples = sweep.samples(protocol, n, metric);
            let row_head = [protocol.tag().to_string(), n.to_string()];
            match Summary::from_samples(&samples) {
                Some(s) => [
                    row_head[0].clone(),
                    row_head[1].clone(),
                    s.count.to_string(),
                    format!("{:.4}", s.mean),
                    s.ci95
                        .map(|(lo, hi)| format!("[{:.4}, {:.4}]", lo, hi))
                        .unwrap_or_else(|| "-".to_string()),
                    format!("{:.4}", s.median),
                    format_opt(s.gini),
                ],
                None => [
                    row_head[0].clone(),
                    row_head[1].clone(),
                    "0".to_string(),
                    "-".to_string(),
                    "-".to_string(),
                    "-".to_string(),
                    "-".to_string(),
                ],
            }
        })
        .collect();

    render_table(&headers, &rows)
}

fn format_opt(v: Option<f64>) -> String {
    v.map(|x| format!("{:.4}", x)).unwrap_or_else(|| "-".to_string())
}

/// Plain aligned table: text columns left, everything else right
fn render_table<const N: usize>(headers: &[String; N], rows: &[[String; N]]) -> String {
    let mut widths: [usize; N] = std::array::from_fn(|i| headers[i].len());
    for row in rows {
        for (w, cell) in widths.iter_mut().zip(row) {
            *w = (*w).max(cell.len());
        }
    }

    let mut out = String::new();
    let line = |cells: &[String; N], out: &mut String| {
        let mut first = true;
        for (i, cell) in cells.iter().enumerate() {
            if !first {
                out.push_str("  ");
            }
            first = false;
            if i == 0 {
                let _ = write!(out, "{:<width$}", cell, width = widths[i]);
            } else {
                let _ = write!(out, "{:>width$}", cell, width = widths[i]);
            }
        }
        out.push('\n');
    };

    line(headers, &mut out);
    let rule: [String; N] = widths.map(|w| "-".repeat(w));
    line(&rule, &mut out);
    for row in rows {
        line(row, &mut out);
    }
    out
}

/// Print every metric table of a sweep to stdout
pub fn print_sweep_summary(sweep: &SweepResults) {
    println!("\n╔════════════════════════════════════════════════════════╗");
    println!("║        ALOHA vs CSMA Simulation Results                ║");
    println!("╚════════════════════════════════════════════════════════╝\n");

    for metric in Metric::ALL {
        println!("{}", metric_table(sweep, metric));
    }

    println!("Throughput detail:");
    println!("{}", summary_table(sweep, Metric::Throughput));
}
