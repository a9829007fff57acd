//! zlite CLI
//!
//! A light-weight lossless data compression utility: `zlite e` compresses
//! stdin to stdout, `zlite d` decompresses stdin to stdout.

use std::io::{self, BufWriter, Read, Write};
use std::time::Instant;

use clap::{Parser, Subcommand};
use zlite_codec::BlockPipeline;

#[derive(Parser)]
#[command(name = "zlite", disable_help_subcommand = true, disable_help_flag = true)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Compress stdin to stdout
    E,
    /// Decompress stdin to stdout
    D,
}

fn print_usage() {
    eprintln!("zlite:");
    eprintln!("   light-weight lossless data compression utility.");
    eprintln!("usage:");
    eprintln!("   zlite e (from-stdin) (to-stdout)");
    eprintln!("   zlite d (from-stdin) (to-stdout)");
}

/// A `Read` wrapper that tallies bytes passed through it.
struct CountingReader<R> {
    inner: R,
    count: u64,
}

impl<R: Read> Read for CountingReader<R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let n = self.inner.read(buf)?;
        self.count += n as u64;
        Ok(n)
    }
}

/// A `Write` wrapper that tallies bytes passed through it.
struct CountingWriter<W> {
    inner: W,
    count: u64,
}

impl<W: Write> Write for CountingWriter<W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let n = self.inner.write(buf)?;
        self.count += n as u64;
        Ok(n)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.inner.flush()
    }
}

fn print_result(size_src: u64, size_dst: u64, encode: bool, elapsed_secs: f64) {
    if encode {
        eprintln!("{size_src} => {size_dst}, time={elapsed_secs:.2} sec");
    } else {
        eprintln!("{size_src} <= {size_dst}, time={elapsed_secs:.2} sec");
    }
}

#[cfg(windows)]
fn set_binary_mode() -> io::Result<()> {
    use libc::{O_BINARY, _setmode};
    unsafe {
        if _setmode(0, O_BINARY) == -1 || _setmode(1, O_BINARY) == -1 {
            return Err(io::Error::last_os_error());
        }
    }
    Ok(())
}

#[cfg(not(windows))]
fn set_binary_mode() -> io::Result<()> {
    Ok(())
}

fn main() {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(_) => {
            print_usage();
            std::process::exit(255);
        }
    };

    if let Err(err) = set_binary_mode() {
        eprintln!("Error: {err}");
        std::process::exit(1);
    }

    let clock_start = Instant::now();
    let stdin = io::stdin();
    let stdout = io::stdout();

    let mut pipeline = BlockPipeline::new();
    let mut reader = CountingReader {
        inner: stdin.lock(),
        count: 0,
    };
    let mut writer = CountingWriter {
        inner: BufWriter::new(stdout.lock()),
        count: 0,
    };

    let is_encode = matches!(cli.command, Command::E);
    let result = match cli.command {
        Command::E => pipeline.encode_stream(&mut reader, &mut writer),
        Command::D => pipeline.decode_stream(&mut reader, &mut writer),
    }
    .and_then(|()| writer.flush().map_err(Into::into));

    if let Err(err) = result {
        eprintln!("Error: {err}");
        std::process::exit(1);
    }

    let (size_src, size_dst) = if is_encode {
        (reader.count, writer.count)
    } else {
        (writer.count, reader.count)
    };
    print_result(size_src, size_dst, is_encode, clock_start.elapsed().as_secs_f64());
}
