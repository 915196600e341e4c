//! SlotKV CLI
//!
//! Command-line interface for inspecting and exercising a SlotKV directory.

use std::fs;
use std::io::Write;
use std::path::PathBuf;
use std::time::Instant;

use clap::{Parser, Subcommand};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use slotkv::{Config, Engine, Layout, SlotError, VALUE_LEN};
use tracing_subscriber::{fmt, EnvFilter};

/// SlotKV CLI
#[derive(Parser, Debug)]
#[command(name = "slotkv-cli")]
#[command(about = "CLI for the SlotKV fixed-slot key-value engine")]
#[command(version)]
struct Args {
    /// Data directory
    #[arg(short, long, default_value = "./slotkv_data")]
    dir: PathBuf,

    /// log2 of the number of value files
    #[arg(long, default_value = "8")]
    value_file_bits: u32,

    /// Blocks per value file
    #[arg(long, default_value = "128")]
    blocks_per_file: u32,

    /// Value slots per block
    #[arg(long, default_value = "2160")]
    slots_per_block: u32,

    /// Maximum number of key records
    #[arg(long, default_value = "64000000")]
    max_keys: u64,

    /// Flush mappings and fsync key logs on close
    #[arg(long)]
    sync: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Write one value
    Put {
        /// Key, decimal or 0x-prefixed hex
        key: String,

        /// Fill the value with this byte
        #[arg(long, default_value = "0", conflicts_with = "file")]
        fill: u8,

        /// Take the value from a file (zero-padded to 4096 bytes)
        #[arg(long)]
        file: Option<PathBuf>,
    },

    /// Read one value
    Get {
        /// Key, decimal or 0x-prefixed hex
        key: String,

        /// Write the raw value bytes to stdout
        #[arg(long)]
        raw: bool,
    },

    /// Scan the whole table and print a digest
    Scan {
        /// Print the first N keys
        #[arg(long, default_value = "0")]
        list: usize,
    },

    /// Write random keys from several threads
    Load {
        /// Writer threads
        #[arg(short, long, default_value = "8")]
        threads: usize,

        /// Keys per thread
        #[arg(short, long, default_value = "10000")]
        count: usize,

        /// Seed for the key stream
        #[arg(long, default_value = "42")]
        seed: u64,
    },

    /// Print what recovery found
    Stats,
}

fn main() {
    // Initialize tracing/logging
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,slotkv=debug"));

    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_ids(true)
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    tracing::info!("SlotKV CLI v{}", slotkv::VERSION);
    tracing::info!("Data directory: {}", args.dir.display());

    let layout = Layout {
        value_file_bits: args.value_file_bits,
        blocks_per_file: args.blocks_per_file,
        slots_per_block: args.slots_per_block,
        ..Layout::default()
    };
    let config = Config::builder()
        .data_dir(&args.dir)
        .layout(layout)
        .max_keys(args.max_keys)
        .sync_on_close(args.sync)
        .build();

    let engine = match Engine::open(config) {
        Ok(e) => e,
        Err(e) => {
            tracing::error!("Failed to open engine: {}", e);
            std::process::exit(1);
        }
    };

    let outcome = run(&engine, args.command);
    engine.close();

    if let Err(e) = outcome {
        tracing::error!("Command failed: {} ({:?})", e, e.code());
        std::process::exit(1);
    }
}

fn run(engine: &Engine, command: Commands) -> slotkv::Result<()> {
    match command {
        Commands::Put { key, fill, file } => {
            let key = parse_key(&key)?;
            let value = match file {
                Some(path) => {
                    let mut bytes = fs::read(&path)?;
                    if bytes.len() > VALUE_LEN {
                        return Err(SlotError::InvalidValue { len: bytes.len() });
                    }
                    bytes.resize(VALUE_LEN, 0);
                    bytes
                }
                None => vec![fill; VALUE_LEN],
            };
            engine.write_u64(key, &value)?;
            println!("wrote {:#018x} (visible after reopen)", key);
        }

        Commands::Get { key, raw } => {
            let key = parse_key(&key)?;
            let value = engine.read_u64(key)?;
            if raw {
                std::io::stdout().write_all(&value)?;
            } else {
                println!("key:   {:#018x}", key);
                println!("crc32: {:08x}", crc32fast::hash(&value));
                println!("head:  {}", hex_prefix(&value, 32));
            }
        }

        Commands::Scan { list } => {
            let started = Instant::now();
            let mut hasher = crc32fast::Hasher::new();
            let mut count = 0usize;
            let mut first = None;
            let mut last = None;

            engine.scan(&mut |key: &[u8], value: &[u8]| {
                hasher.update(key);
                hasher.update(value);
                if count < list {
                    println!("{}", hex_prefix(key, key.len()));
                }
                first.get_or_insert_with(|| key.to_vec());
                last = Some(key.to_vec());
                count += 1;
            })?;

            println!("entries: {}", count);
            println!("digest:  {:08x}", hasher.finalize());
            if let (Some(first), Some(last)) = (first, last) {
                println!("first:   {}", hex_prefix(&first, first.len()));
                println!("last:    {}", hex_prefix(&last, last.len()));
            }
            println!("elapsed: {:?}", started.elapsed());
        }

        Commands::Load {
            threads,
            count,
            seed,
        } => {
            let started = Instant::now();
            let failures = crossbeam::scope(|scope| {
                let handles: Vec<_> = (0..threads)
                    .map(|t| {
                        scope.spawn(move |_| {
                            let mut rng = StdRng::seed_from_u64(seed.wrapping_add(t as u64));
                            let mut failed = 0usize;
                            for _ in 0..count {
                                let key: u64 = rng.gen();
                                if let Err(e) = engine.write_u64(key, &pattern_value(key)) {
                                    tracing::warn!(key, "write failed: {}", e);
                                    failed += 1;
                                }
                            }
                            failed
                        })
                    })
                    .collect();
                handles
                    .into_iter()
                    .map(|h| h.join().unwrap_or(count))
                    .sum::<usize>()
            })
            .map_err(|_| SlotError::Recovery("load threads panicked".to_string()))?;

            let total = threads * count;
            let elapsed = started.elapsed();
            println!("writes:   {} ({} failed)", total, failures);
            println!("elapsed:  {:?}", elapsed);
            println!(
                "rate:     {:.0} writes/s",
                total as f64 / elapsed.as_secs_f64().max(f64::EPSILON)
            );
        }

        Commands::Stats => {
            let report = engine.recovery_report();
            let sizes = engine.shard_sizes();
            println!("index entries:        {}", report.index_len);
            println!("records read:         {}", report.records_read);
            println!("duplicates collapsed: {}", report.duplicates_collapsed);
            println!("records dropped:      {}", report.records_dropped);
            println!("torn bytes:           {}", report.torn_bytes);
            println!("shards loaded:        {}/{}", report.shards_loaded, sizes.len());
            println!("largest shard:        {} bytes", sizes.iter().max().copied().unwrap_or(0));
            println!("load time:            {:?}", report.load_time);
            println!("sort time:            {:?}", report.sort_time);
            println!("collapse time:        {:?}", report.collapse_time);
        }
    }

    Ok(())
}

/// Parse a decimal or 0x-prefixed hex key
fn parse_key(text: &str) -> slotkv::Result<u64> {
    let parsed = match text.strip_prefix("0x").or_else(|| text.strip_prefix("0X")) {
        Some(hex) => u64::from_str_radix(hex, 16),
        None => text.parse(),
    };
    parsed.map_err(|e| SlotError::Config(format!("invalid key {:?}: {}", text, e)))
}

/// Value whose bytes are the key repeated, so reads can be checked by eye
fn pattern_value(key: u64) -> Vec<u8> {
    key.to_be_bytes()
        .iter()
        .copied()
        .cycle()
        .take(VALUE_LEN)
        .collect()
}

fn hex_prefix(bytes: &[u8], n: usize) -> String {
    bytes.iter().take(n).map(|b| format!("{:02x}", b)).collect()
}
