//! chunk-lines: print the lines of a file through the chunked line reader.
//!
//! Usage: chunk-lines <FILE> [OPTIONS]

use clap::{ArgAction, Parser};
use std::io;
use std::path::PathBuf;
use std::process;

use chunk_lines::streaming::buffers::{chunk_size, output_buffer_size};
use chunk_lines::streaming::LineWriter;
use chunk_lines::{LineReader, ReaderError, ReaderOptions, Separator, SkipSpec};

#[derive(Parser, Debug)]
#[command(name = "chunk-lines")]
#[command(version)]
#[command(about = "Read a text file in fixed-size chunks and print its lines", long_about = None)]
struct Cli {
    /// Input file
    input: PathBuf,

    /// Bytes read per chunk (default: 64 KB, or 4 KB with --low-memory)
    #[arg(short = 'b', long)]
    buffer_size: Option<usize>,

    /// Use smaller read and write buffers
    #[arg(long)]
    low_memory: bool,

    /// Text encoding of the input (utf-8, utf-16le, latin1, ...)
    #[arg(short = 'e', long, default_value = "utf-8")]
    encoding: String,

    /// Line separator: crlf, lf or cr (detected when omitted)
    #[arg(short = 's', long)]
    separator: Option<Separator>,

    /// Skip lines that are empty after trimming
    #[arg(long)]
    skip_blank: bool,

    /// Line numbers to skip, e.g. "1,3,10-20"
    #[arg(long, value_name = "LIST", value_delimiter = ',')]
    skip: Vec<SkipSpec>,

    /// Remove invisible control and zero-width characters
    #[arg(long)]
    strip_invisible: bool,

    /// Prefix each line with its number and a tab
    #[arg(short = 'n', long)]
    number: bool,

    /// Read in batches of this many lines (0 reads whole blobs)
    #[arg(short, long)]
    limit: Option<usize>,

    /// Print line and byte totals to stderr
    #[arg(long)]
    stats: bool,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = ArgAction::Count)]
    verbose: u8,
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    if let Err(e) = run(cli) {
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();
}

fn run(cli: Cli) -> Result<(), ReaderError> {
    let mut options = ReaderOptions::new(&cli.input)
        .with_buffer_size(cli.buffer_size.unwrap_or(chunk_size(cli.low_memory)))
        .with_encoding(cli.encoding)
        .with_remove_invisible_unicode(cli.strip_invisible)
        .with_skip_blank(cli.skip_blank)
        .with_skip_numbers(cli.skip);
    if let Some(separator) = cli.separator {
        options = options.with_line_separator(separator);
    }

    let reader = LineReader::new(options)?;
    reader.open()?;
    log::info!("reading {} ({} bytes)", cli.input.display(), reader.size());

    let stdout = io::stdout();
    let mut writer = LineWriter::with_capacity(output_buffer_size(cli.low_memory), stdout.lock());
    let mut written: u64 = 0;
    let limit = cli.limit.filter(|&n| n > 0);

    loop {
        let batch = reader.read_lines_with_numbers(limit)?;
        for line in &batch {
            if cli.number {
                writer.write_numbered(line)?;
            } else {
                writer.write_line(&line.text)?;
            }
        }
        written += batch.len() as u64;
        if batch.is_empty() && reader.is_closed() {
            break;
        }
    }
    writer.flush()?;

    if cli.stats {
        eprintln!(
            "lines read: {}, lines written: {}, bytes read: {}, separator: {}",
            reader.lines_read(),
            written,
            reader.bytes_read(),
            reader.separator().unwrap_or_default()
        );
    }

    Ok(())
}
