use std::{
    error::Error,
    fs::File,
    io::{BufWriter, Write},
    path::PathBuf,
};

use clap::{Parser, ValueEnum};

use lzutf8_rs::*;

#[derive(Debug, Clone, Copy, ValueEnum)]
enum Mode {
    /// Compress INPUT into OUTPUT
    #[value(alias = "c")]
    Compress,
    /// Decompress INPUT into OUTPUT
    #[value(alias = "d")]
    Decompress,
}

/// Compress or decompress a file in the LZ-UTF8 format
#[derive(Parser, Debug)]
#[command(name = "lzutf8-demo")]
#[command(version, about, long_about = None)]
struct Args {
    #[arg(value_enum)]
    mode: Mode,

    #[arg(value_name = "INPUT")]
    input: PathBuf,

    #[arg(value_name = "OUTPUT")]
    output: PathBuf,

    /// Feed the codec this many bytes at a time instead of the whole file
    #[arg(short, long, value_parser = clap::value_parser!(u32).range(1..))]
    block_size: Option<u32>,
}

fn main() -> Result<(), Box<dyn Error>> {
    let args = Args::parse();

    let inp = std::fs::read(&args.input)?;
    let block_size = args
        .block_size
        .map_or(inp.len().max(1), |block_size| block_size as usize);

    let mut outp = Vec::new();
    match args.mode {
        Mode::Compress => {
            let mut cmp = Compressor::new();
            for block in inp.chunks(block_size) {
                outp.extend(cmp.compress_block(block)?);
            }
        }
        Mode::Decompress => {
            let mut dec = Decompressor::new();
            for block in inp.chunks(block_size) {
                outp.extend(dec.decompress_block(block)?);
            }
            outp.extend(dec.finish()?);
        }
    }

    let mut outp_f = BufWriter::new(File::create(&args.output)?);
    outp_f.write_all(&outp)?;
    outp_f.flush()?;

    Ok(())
}
