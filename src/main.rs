//! Stribog CLI - command-line tool for game archive extraction and
//! database inspection.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Instant;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};
use regex::Regex;

use stribog::prelude::*;

/// Stribog - game archive extraction tool
#[derive(Parser)]
#[command(name = "stribog")]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List entries of a P4K archive
    List {
        /// Path to the P4K file
        #[arg(short, long, env = "INPUT_P4K")]
        p4k: PathBuf,

        /// Filter pattern (regex over entry names)
        #[arg(short, long)]
        filter: Option<String>,

        /// Show sizes and compression methods
        #[arg(short, long)]
        detailed: bool,

        /// Stop after this many matches
        #[arg(short, long, default_value_t = usize::MAX)]
        limit: usize,
    },

    /// Extract entries from a P4K archive
    Extract {
        /// Path to the P4K file
        #[arg(short, long, env = "INPUT_P4K")]
        p4k: PathBuf,

        /// Output directory
        #[arg(short, long, env = "OUTPUT_FOLDER")]
        output: PathBuf,

        /// Filter pattern (regex over entry names)
        #[arg(short, long)]
        filter: Option<String>,
    },

    /// Print aggregate statistics for a P4K archive
    Stats {
        /// Path to the P4K file
        #[arg(short, long, env = "INPUT_P4K")]
        p4k: PathBuf,
    },

    /// Convert a binary markup file to XML text
    CryxmlConvert {
        /// Input binary markup file
        #[arg(short, long)]
        input: PathBuf,

        /// Output XML file
        #[arg(short, long)]
        output: PathBuf,
    },

    /// Search records in a forge database
    ForgeSearch {
        /// Path to the forge database file
        #[arg(short, long)]
        input: PathBuf,

        /// Case-insensitive substring of the record name
        pattern: String,

        /// Maximum number of hits
        #[arg(short, long, default_value_t = 50)]
        limit: usize,
    },

    /// Dump one forge record as JSON
    ForgeDump {
        /// Path to the forge database file
        #[arg(short, long)]
        input: PathBuf,

        /// Record name (exact) or record index
        record: String,

        /// Pointer resolution depth
        #[arg(short, long, default_value_t = 8)]
        depth: u32,
    },
}

fn main() -> Result<()> {
    env_logger::init();
    let cli = Cli::parse();

    match cli.command {
        Commands::List {
            p4k,
            filter,
            detailed,
            limit,
        } => cmd_list(&p4k, filter.as_deref(), detailed, limit),
        Commands::Extract {
            p4k,
            output,
            filter,
        } => cmd_extract(&p4k, &output, filter.as_deref()),
        Commands::Stats { p4k } => cmd_stats(&p4k),
        Commands::CryxmlConvert { input, output } => cmd_cryxml_convert(&input, &output),
        Commands::ForgeSearch {
            input,
            pattern,
            limit,
        } => cmd_forge_search(&input, &pattern, limit),
        Commands::ForgeDump {
            input,
            record,
            depth,
        } => cmd_forge_dump(&input, &record, depth),
    }
}

fn open_archive(path: &Path) -> Result<P4kArchive> {
    let mut archive = P4kArchive::open(path)
        .with_context(|| format!("failed to open archive {}", path.display()))?;

    let bar = ProgressBar::new(archive.total_entries());
    bar.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} indexing [{bar:40.cyan/blue}] {pos}/{len} entries")?,
    );

    let token = CancelToken::new();
    archive
        .load_all_entries_with(|done, _total| bar.set_position(done), &token)
        .context("failed to index central directory")?;
    bar.finish_and_clear();

    Ok(archive)
}

fn compile_filter(filter: Option<&str>) -> Result<Option<Regex>> {
    filter
        .map(|f| Regex::new(f).with_context(|| format!("invalid filter pattern '{}'", f)))
        .transpose()
}

fn cmd_list(p4k: &Path, filter: Option<&str>, detailed: bool, limit: usize) -> Result<()> {
    let archive = open_archive(p4k)?;
    let pattern = compile_filter(filter)?;

    let mut shown = 0usize;
    for entry in archive.entries() {
        if shown >= limit {
            break;
        }
        if let Some(pattern) = &pattern {
            if !pattern.is_match(&entry.name) {
                continue;
            }
        }
        if detailed {
            println!(
                "{:>12}  {:>12}  {:<8}  {}",
                entry.uncompressed_size,
                entry.compressed_size,
                entry.compression_method().to_string(),
                entry.name
            );
        } else {
            println!("{}", entry.name);
        }
        shown += 1;
    }

    eprintln!("{} of {} entries shown", shown, archive.entries().len());
    Ok(())
}

fn cmd_extract(p4k: &Path, output: &Path, filter: Option<&str>) -> Result<()> {
    let archive = open_archive(p4k)?;
    let pattern = compile_filter(filter)?;

    let selected: Vec<&P4kEntry> = archive
        .entries()
        .iter()
        .filter(|e| !e.is_directory)
        .filter(|e| {
            pattern
                .as_ref()
                .map(|p| p.is_match(&e.name))
                .unwrap_or(true)
        })
        .collect();

    let bar = ProgressBar::new(selected.len() as u64);
    bar.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} {msg}")?,
    );

    let started = Instant::now();
    let mut extracted = 0usize;
    let mut failed = 0usize;

    for entry in selected {
        bar.set_message(entry.name.clone());
        match archive.read_entry(entry) {
            Ok(bytes) => {
                let relative = entry.name.replace('\\', "/");
                let target = output.join(relative);
                if let Some(parent) = target.parent() {
                    fs::create_dir_all(parent)
                        .with_context(|| format!("failed to create {}", parent.display()))?;
                }
                fs::write(&target, bytes)
                    .with_context(|| format!("failed to write {}", target.display()))?;
                extracted += 1;
            }
            // one bad entry must not stop the rest of the corpus
            Err(e) => {
                log::warn!("skipping '{}': {}", entry.name, e);
                failed += 1;
            }
        }
        bar.inc(1);
    }
    bar.finish_and_clear();

    println!(
        "extracted {} entries ({} failed) in {:.1?}",
        extracted,
        failed,
        started.elapsed()
    );
    Ok(())
}

fn cmd_stats(p4k: &Path) -> Result<()> {
    let archive = open_archive(p4k)?;
    let stats = archive.stats();

    println!("archive:        {}", p4k.display());
    println!("size on disk:   {} bytes", stats.file_size);
    println!("files:          {}", stats.total_files);
    println!("directories:    {}", stats.total_directories);
    println!("uncompressed:   {} bytes", stats.total_uncompressed);
    println!("compressed:     {} bytes", stats.total_compressed);
    println!("ratio:          {:.3}", stats.compression_ratio);

    println!("\ntop directories:");
    for (dir, count) in &stats.top_directories {
        println!("  {:>8}  {}", count, dir);
    }
    println!("\ntop extensions:");
    for (ext, count) in &stats.top_extensions {
        println!("  {:>8}  .{}", count, ext);
    }
    Ok(())
}

fn cmd_cryxml_convert(input: &Path, output: &Path) -> Result<()> {
    let data = fs::read(input).with_context(|| format!("failed to read {}", input.display()))?;

    match stribog::cryxml::parse(&data)? {
        Markup::Binary(root) => {
            let xml = root.to_xml_string()?;
            fs::write(output, xml)
                .with_context(|| format!("failed to write {}", output.display()))?;
        }
        Markup::Plain => {
            // already markup text, copy through unchanged
            fs::write(output, &data)
                .with_context(|| format!("failed to write {}", output.display()))?;
        }
    }

    println!("wrote {}", output.display());
    Ok(())
}

fn cmd_forge_search(input: &Path, pattern: &str, limit: usize) -> Result<()> {
    let forge = DataForge::open(input)
        .with_context(|| format!("failed to parse forge database {}", input.display()))?;

    let hits = forge.search_records(pattern, limit);
    for hit in &hits {
        println!("{}  {:<40}  {:<30}  {}", hit.guid, hit.name, hit.struct_type, hit.file_path);
    }
    eprintln!("{} records matched '{}'", hits.len(), pattern);
    Ok(())
}

fn cmd_forge_dump(input: &Path, record: &str, depth: u32) -> Result<()> {
    let forge = DataForge::open(input)
        .with_context(|| format!("failed to parse forge database {}", input.display()))?;

    let index = match forge
        .records()
        .iter()
        .position(|r| forge.record_name(r) == Some(record))
    {
        Some(index) => index,
        None => match record.parse::<usize>() {
            Ok(index) => index,
            Err(_) => bail!("no record named '{}'", record),
        },
    };

    let value = forge.read_record(index, depth)?;
    println!("{}", serde_json::to_string_pretty(&value)?);
    Ok(())
}
