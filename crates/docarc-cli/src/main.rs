//! docarc CLI: build, print, and validate docarc archives.

use std::fs;
use std::path::PathBuf;

use clap::{Parser, Subcommand};

use docarc_core::config::{BuildConfig, Compressor, DictType};
use docarc_core::value::ValueType;
use docarc_dict::{Dictionary, ShardedDictionary, StringDictionary};
use docarc_doc::doc::{DocObject, Entry, EntryValues};
use docarc_doc::from_json::from_json;
use docarc_format::codec::{CodecRegistry, HUFFMAN_FLAG_BIT, PLAIN_FLAG_BIT};
use docarc_format::printer::print_archive;
use docarc_format::writer::{write_archive, WriteOptions};

#[derive(Parser)]
#[command(name = "docarc")]
#[command(about = "Read-optimized columnar archive format and builder for JSON-shaped documents", long_about = None)]
struct Cli {
    /// Enable `tracing` output on stderr.
    #[arg(long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Parses a JSON file, pivots it, and serializes it to a docarc archive.
    Build {
        /// Path to the input JSON file.
        #[arg(short, long)]
        input: PathBuf,
        /// Path to write the archive to.
        #[arg(short, long)]
        output: PathBuf,
        /// String-table compressor: `none` or `huffman` (overrides DOCARC_COMPRESSOR).
        #[arg(long)]
        compressor: Option<String>,
        /// Dictionary implementation: `sync` or `async` (overrides DOCARC_DIC_TYPE).
        #[arg(long = "dic-type")]
        dic_type: Option<String>,
        /// Worker count for the async/sharded dictionary (overrides DOCARC_THREADS).
        #[arg(long)]
        async_threads: Option<usize>,
        /// Sort columns for binary-search access (overrides DOCARC_READ_OPTIMIZED).
        #[arg(long)]
        read_optimized: bool,
        /// Append the optional string-id -> file-offset index (overrides DOCARC_BAKE_STRING_ID_INDEX).
        #[arg(long)]
        bake_string_id_index: bool,
    },
    /// Walks an archive with the marker-driven printer and writes its debug tree as JSON.
    Print {
        /// Path to the archive file.
        #[arg(short, long)]
        archive: PathBuf,
    },
    /// Parses a JSON file through the document model and type inference only; writes nothing.
    Validate {
        /// Path to the input JSON file.
        #[arg(short, long)]
        input: PathBuf,
    },
}

fn main() {
    let cli = Cli::parse();
    if cli.verbose {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .try_init();
    }

    let result = match cli.command {
        Commands::Build { input, output, compressor, dic_type, async_threads, read_optimized, bake_string_id_index } => {
            run_build(input, output, compressor, dic_type, async_threads, read_optimized, bake_string_id_index)
        }
        Commands::Print { archive } => run_print(archive),
        Commands::Validate { input } => run_validate(input),
    };

    if let Err(e) = result {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}

fn resolve_config(
    compressor: Option<String>,
    dic_type: Option<String>,
    async_threads: Option<usize>,
    read_optimized: bool,
    bake_string_id_index: bool,
) -> Result<BuildConfig, Box<dyn std::error::Error>> {
    let mut config = BuildConfig::from_env();
    if let Some(c) = compressor {
        config.compressor = c.parse::<Compressor>()?;
    }
    if let Some(d) = dic_type {
        config.dict_type = d.parse::<DictType>()?;
    }
    if let Some(n) = async_threads {
        config.async_threads = n;
    }
    config.read_optimized |= read_optimized;
    config.bake_string_id_index |= bake_string_id_index;
    Ok(config)
}

/// Wraps the top-level record forest into one root `DocObject`: a single
/// record passes through as-is, multiple sibling records (§4.2's "Top-level
/// JSON may be an object or an array of objects") become one synthetic
/// `records` object-array so the rest of the pipeline only ever serializes
/// one root.
fn wrap_records(mut docs: Vec<DocObject>) -> DocObject {
    if docs.len() == 1 {
        return docs.pop().expect("len == 1");
    }
    DocObject {
        entries: vec![Entry { key: "records".to_string(), ty: ValueType::Object, values: EntryValues::ObjectArray(docs) }],
    }
}

fn run_build(
    input: PathBuf,
    output: PathBuf,
    compressor: Option<String>,
    dic_type: Option<String>,
    async_threads: Option<usize>,
    read_optimized: bool,
    bake_string_id_index: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let config = resolve_config(compressor, dic_type, async_threads, read_optimized, bake_string_id_index)?;

    let text = fs::read_to_string(&input)?;
    let json: serde_json::Value = serde_json::from_str(&text)?;
    let docs = from_json(&json)?;
    tracing::info!(n_records = docs.len(), path = %input.display(), "parsed JSON input");
    let root_doc = wrap_records(docs);

    let dict: Box<dyn Dictionary> = match config.dict_type {
        DictType::Sync => Box::new(StringDictionary::new()),
        DictType::Async => Box::new(ShardedDictionary::new(config.async_threads.max(1))),
    };

    docarc_columnar::transform::preregister(&root_doc, dict.as_ref(), config.async_threads)?;
    let mut root = docarc_columnar::transform::to_columndoc(&root_doc, dict.as_ref())?;
    if config.read_optimized {
        docarc_columnar::sort::sort_columndoc(&mut root, dict.as_ref());
    }
    tracing::info!(n_strings = dict.num_distinct(), "interned strings");

    let registry = CodecRegistry::with_defaults();
    let codec_flag_bit = match config.compressor {
        Compressor::None => PLAIN_FLAG_BIT,
        Compressor::Huffman => HUFFMAN_FLAG_BIT,
    };
    let mut written = write_archive(&root, dict.as_ref(), &registry, &WriteOptions { codec_flag_bit })?;

    if config.bake_string_id_index {
        docarc_index::bake_string_id_index(&mut written.bytes, written.index_offset_field_pos)?;
        tracing::info!("baked string-id -> offset index");
    }

    fs::write(&output, &written.bytes)?;
    tracing::info!(bytes = written.bytes.len(), path = %output.display(), "wrote archive");
    println!("wrote {} bytes to {}", written.bytes.len(), output.display());
    Ok(())
}

fn run_print(archive: PathBuf) -> Result<(), Box<dyn std::error::Error>> {
    let bytes = fs::read(&archive)?;
    let registry = CodecRegistry::with_defaults();
    let tree = print_archive(&bytes, &registry)?;
    println!("{}", serde_json::to_string_pretty(&tree)?);
    Ok(())
}

fn run_validate(input: PathBuf) -> Result<(), Box<dyn std::error::Error>> {
    let text = fs::read_to_string(&input)?;
    let json: serde_json::Value = serde_json::from_str(&text)?;
    let docs = from_json(&json)?;
    println!("✓ valid: {} top-level record(s)", docs.len());
    Ok(())
}
