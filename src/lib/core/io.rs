use anyhow::Result;
use grep_cli::stdout;
use gzp::{deflate::Gzip, Compression, ZBuilder};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;
use termcolor::ColorChoice;

/// Build a raw byte writer targeting a file or stdout ("-"), with optional
/// multi-threaded gzip compression.
pub fn get_raw_writer<P: AsRef<Path>>(
    path: &Option<P>,
    gzipped: bool,
    threads: usize,
    compression_level: u32,
) -> Result<Box<dyn Write>> {
    let raw_writer: Box<dyn Write> = match path {
        Some(path) if path.as_ref().to_str() != Some("-") => {
            Box::new(BufWriter::new(File::create(path)?))
        }
        _ => Box::new(stdout(ColorChoice::Never)),
    };

    if gzipped {
        Ok(Box::new(
            ZBuilder::<Gzip, _>::new()
                .num_threads(threads)
                .compression_level(Compression::new(compression_level))
                .from_writer(raw_writer),
        ))
    } else {
        Ok(raw_writer)
    }
}

/// Build a tab-delimited writer over [`get_raw_writer`].
pub fn get_writer<P: AsRef<Path>>(
    path: &Option<P>,
    gzipped: bool,
    write_headers: bool,
    threads: usize,
    compression_level: u32,
) -> Result<csv::Writer<Box<dyn Write>>> {
    let raw_writer = get_raw_writer(path, gzipped, threads, compression_level)?;
    Ok(csv::WriterBuilder::new()
        .delimiter(b'\t')
        .has_headers(write_headers)
        .from_writer(raw_writer))
}
