use crate::error::ConfigError;
use crate::parse_result::ParseResult;
use crate::pipeline::{Pipeline, StreamNormalizer};
use crate::statistics::{NormalizationStatistics, StatisticsMonitor};
use crossbeam_channel::{bounded, unbounded, Receiver, SendError, Sender};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::io::{BufRead, BufReader, Read};
use std::sync::Arc;
use std::thread;

/// Configuration for parallel stream processing
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParallelConfig {
    /// Number of worker threads to use (0 = rayon's default)
    pub num_threads: usize,
    /// Buffer size for reading from streams
    pub buffer_size: usize,
    /// Lines a live stream worker may have queued before senders block
    pub queue_capacity: usize,
    /// Treat every line as a structured JSON record
    pub structured: bool,
    /// Log periodic per-stream statistics reports
    pub enable_statistics: bool,
    /// Records between periodic reports
    pub statistics_report_interval: usize,
}

impl Default for ParallelConfig {
    fn default() -> Self {
        Self {
            num_threads: 0,
            buffer_size: 64 * 1024, // 64KB
            queue_capacity: 10000,
            structured: false,
            enable_statistics: false,
            statistics_report_interval: 10_000,
        }
    }
}

impl ParallelConfig {
    /// Statistics monitor for one stream
    pub fn monitor(&self) -> StatisticsMonitor {
        StatisticsMonitor::with_settings(self.enable_statistics, self.statistics_report_interval)
    }
}

/// Everything one stream produced
#[derive(Debug)]
pub struct StreamOutput {
    pub source: String,
    pub results: Vec<ParseResult>,
    pub statistics: NormalizationStatistics,
}

/// Runs independent streams through one shared pipeline in parallel.
///
/// Each stream gets its own aggregator; order is preserved within a stream
/// and nothing is promised across streams.
pub struct ParallelNormalizer {
    config: ParallelConfig,
    pipeline: Arc<Pipeline>,
    pool: Option<rayon::ThreadPool>,
}

impl ParallelNormalizer {
    pub fn new(pipeline: Arc<Pipeline>) -> Self {
        Self {
            config: ParallelConfig::default(),
            pipeline,
            pool: None,
        }
    }

    pub fn with_config(pipeline: Arc<Pipeline>, config: ParallelConfig) -> Result<Self, ConfigError> {
        let pool = if config.num_threads > 0 {
            let pool = rayon::ThreadPoolBuilder::new()
                .num_threads(config.num_threads)
                .build()
                .map_err(|e| ConfigError::ConfigurationError {
                    parameter: "num_threads".to_string(),
                    error_message: e.to_string(),
                })?;
            Some(pool)
        } else {
            None
        };
        Ok(Self { config, pipeline, pool })
    }

    /// Normalize several streams in parallel, returning outputs in input order
    pub fn normalize_streams<R: Read + Send>(
        &self,
        streams: Vec<(R, String)>, // (reader, source_name) pairs
    ) -> Result<Vec<StreamOutput>, std::io::Error> {
        let run = || {
            streams
                .into_par_iter()
                .map(|(reader, source)| self.normalize_reader(reader, &source))
                .collect::<Result<Vec<_>, _>>()
        };
        match &self.pool {
            Some(pool) => pool.install(run),
            None => run(),
        }
    }

    /// Normalize one stream on the calling thread
    pub fn normalize_reader<R: Read>(&self, reader: R, source: &str) -> Result<StreamOutput, std::io::Error> {
        let mut buf_reader = BufReader::with_capacity(self.config.buffer_size, reader);
        let mut stream = StreamNormalizer::new(Arc::clone(&self.pipeline));
        let mut monitor = self.config.monitor();
        let mut results = Vec::new();
        let mut buffer = Vec::new();
        let mut line_number = 0;

        loop {
            buffer.clear();
            if buf_reader.read_until(b'\n', &mut buffer)? == 0 {
                break; // End of stream
            }
            line_number += 1;
            let line = String::from_utf8_lossy(trim_line_ending(&buffer));

            let result = if self.config.structured {
                Some(self.pipeline.normalize_json_line(&line).with_line_number(line_number))
            } else {
                stream.push_line(&line)
            };
            if let Some(result) = result {
                monitor.record(&result);
                results.push(result);
            }
        }

        if let Some(result) = stream.finish() {
            monitor.record(&result);
            results.push(result);
        }
        monitor.record_lines(line_number);
        tracing::debug!(source = %source, lines = line_number, records = results.len(), "stream normalized");

        Ok(StreamOutput {
            source: source.to_string(),
            results,
            statistics: monitor.into_statistics(),
        })
    }
}

fn trim_line_ending(line: &[u8]) -> &[u8] {
    let line = line.strip_suffix(b"\n").unwrap_or(line);
    line.strip_suffix(b"\r").unwrap_or(line)
}

/// Handle to a live stream normalized on its own thread.
///
/// Lines go in through [`send_line`](Self::send_line); normalized records come
/// out of [`results`](Self::results). Closing the input flushes the pending
/// multiline record before the worker exits.
pub struct StreamWorker {
    lines: Sender<String>,
    results: Receiver<ParseResult>,
    handle: thread::JoinHandle<NormalizationStatistics>,
}

impl StreamWorker {
    pub fn send_line(&self, line: String) -> Result<(), SendError<String>> {
        self.lines.send(line)
    }

    pub fn results(&self) -> &Receiver<ParseResult> {
        &self.results
    }

    /// Close the input, drain every remaining record, and wait for the worker
    pub fn close(self) -> thread::Result<(Vec<ParseResult>, NormalizationStatistics)> {
        let StreamWorker { lines, results, handle } = self;
        drop(lines);
        let remaining: Vec<ParseResult> = results.iter().collect();
        let statistics = handle.join()?;
        Ok((remaining, statistics))
    }
}

pub fn spawn_stream_worker(pipeline: Arc<Pipeline>, config: &ParallelConfig) -> StreamWorker {
    let (line_sender, line_receiver): (Sender<String>, Receiver<String>) = bounded(config.queue_capacity.max(1));
    let mut monitor = config.monitor();
    let (result_sender, result_receiver): (Sender<ParseResult>, Receiver<ParseResult>) = unbounded();

    let handle = thread::spawn(move || {
        let mut stream = StreamNormalizer::new(pipeline);

        while let Ok(line) = line_receiver.recv() {
            if let Some(result) = stream.push_line(&line) {
                monitor.record(&result);
                if result_sender.send(result).is_err() {
                    break; // Receiver dropped
                }
            }
        }

        // input closed: flush what is still buffered
        if let Some(result) = stream.finish() {
            monitor.record(&result);
            let _ = result_sender.send(result);
        }
        monitor.record_lines(stream.lines_seen());
        monitor.into_statistics()
    });

    StreamWorker {
        lines: line_sender,
        results: result_receiver,
        handle,
    }
}
