use crate::cli::{GlobalArgs, NormalizeArgs};
use crate::commands::load_config;
use crate::commands::output::{print_stats_summary, OutputFormatter};
use crate::config::NormalizerConfig;
use crate::parallel::{ParallelConfig, ParallelNormalizer};
use crate::registry::AdapterRegistry;
use crate::statistics::SharedStatistics;
use glob::glob;
use std::fs::File;
use std::io::{stdin, stdout, Read, Write};
use std::path::{Path, PathBuf};

pub fn run_normalize(args: NormalizeArgs, global: &GlobalArgs) -> Result<(), Box<dyn std::error::Error>> {
    let config = load_config(global.config.as_deref())?;
    let registry = AdapterRegistry::from_config(&config)?;

    let adapter = args
        .adapter
        .clone()
        .or_else(|| config.default_adapter.clone())
        .ok_or("no adapter given; pass --adapter or set default_adapter in the configuration")?;
    let pipeline = registry.pipeline(&adapter)?;

    // Fall back to the adapter's own include paths
    let patterns: Vec<PathBuf> = if args.files.is_empty() {
        pipeline.include_paths().iter().map(PathBuf::from).collect()
    } else {
        args.files.clone()
    };
    let files = expand_globs(&patterns)?;

    if files.is_empty() {
        eprintln!("No files matched the given patterns");
        return Ok(());
    }

    let mut streams: Vec<(Box<dyn Read + Send>, String)> = Vec::with_capacity(files.len());
    for path in &files {
        streams.push((open_stream(path)?, path.to_string_lossy().to_string()));
    }
    tracing::info!(adapter = %adapter, streams = streams.len(), "normalizing");

    let normalizer = ParallelNormalizer::with_config(pipeline, parallel_config(&args, global, &config))?;
    let outputs = normalizer.normalize_streams(streams)?;

    let mut output: Box<dyn Write> = if let Some(ref path) = args.output_file {
        Box::new(File::create(path)?)
    } else {
        Box::new(stdout().lock())
    };

    let formatter = OutputFormatter::new(args.output).with_source(outputs.len() > 1);
    let statistics = SharedStatistics::new();
    let mut written = 0;

    formatter.print_header(&mut output)?;
    'streams: for stream in &outputs {
        statistics.merge(&stream.statistics);
        for result in &stream.results {
            if args.limit.is_some_and(|limit| written >= limit) {
                break 'streams;
            }
            formatter.write_result(&mut output, result, &stream.source, written == 0)?;
            written += 1;
        }
    }
    formatter.print_footer(&mut output)?;
    output.flush()?;

    if args.stats || config.enable_statistics {
        print_stats_summary(&statistics.snapshot());
    }

    Ok(())
}

fn parallel_config(args: &NormalizeArgs, global: &GlobalArgs, config: &NormalizerConfig) -> ParallelConfig {
    ParallelConfig {
        num_threads: global.parallel,
        structured: args.structured,
        enable_statistics: config.enable_statistics,
        statistics_report_interval: config.statistics_report_interval,
        ..Default::default()
    }
}

fn open_stream(path: &Path) -> Result<Box<dyn Read + Send>, std::io::Error> {
    if path == Path::new("-") {
        Ok(Box::new(stdin()))
    } else {
        Ok(Box::new(File::open(path)?))
    }
}

pub fn expand_globs(patterns: &[PathBuf]) -> Result<Vec<PathBuf>, Box<dyn std::error::Error>> {
    let mut files = Vec::new();
    for pattern in patterns {
        let pattern_str = pattern.to_string_lossy();
        if pattern_str.contains('*') || pattern_str.contains('?') || pattern_str.contains('[') {
            for entry in glob(&pattern_str)? {
                files.push(entry?);
            }
        } else {
            files.push(pattern.clone());
        }
    }
    Ok(files)
}
