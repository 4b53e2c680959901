use std::fs;
use std::io::{self, BufWriter, Read as _};
use std::path::{Path, PathBuf};

use anyhow::{Context as _, Result};
use base94::Alphabet;
use clap::Parser;

use crate::config::{CodecConfig, Config};
use crate::wrap::LineWriter;

mod config;
mod wrap;

const WRITE_ERR: &str = "could not write to standard output";
const DATA_ERR: &str = "input is not valid base94 data";

/// Encodes or decodes base94 data and writes the result to standard output.
///
/// Settings are read from `base94.toml` in the working directory and
/// `BASE94_`-prefixed environment variables, such as `BASE94_CODEC__WRAP=76`
/// or `BASE94_LOG__ROOT__LEVEL=debug`. Command line options take precedence.
#[derive(Debug, Parser)]
#[command(version)]
struct Cli {
    /// The file to read.
    ///
    /// If missing or `-`, the data is read from standard input.
    file: Option<PathBuf>,

    /// Decode data instead of encoding it.
    ///
    /// ASCII white-space in the input is ignored.
    #[arg(short, long)]
    decode: bool,

    /// Break encoded output into lines of this many symbols.
    ///
    /// 0 writes the entire output on one line.
    #[arg(short, long, value_name = "COLS")]
    wrap: Option<usize>,

    /// Use a custom alphabet of 94 distinct printable ASCII characters.
    ///
    /// Data must be decoded with the same alphabet it was encoded with.
    #[arg(long)]
    alphabet: Option<Alphabet>,

    /// Load an additional configuration file.
    ///
    /// Unlike `base94.toml`, this file must exist.
    #[arg(short, long, value_name = "PATH")]
    config: Option<PathBuf>,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let Config { codec, log } = build_config(cli.config.as_deref())?;
    init_logging(log)?;

    let res = run(&cli, &codec);
    if let Err(why) = &res {
        log::error!("Exiting due to error: {why:?}");
    }

    log::logger().flush();
    res
}

fn build_config(extra: Option<&Path>) -> Result<Config> {
    use crate::config::setup::{Builder, Env, File, TomlText};

    let default_config = include_str!("../assets/default_config.toml");

    Builder::new()
        .add_layer(TomlText::new(default_config))
        .add_layer(File::new("base94.toml").required(false))
        .add_layer(extra.map(File::new))
        .add_layer(Env::new("BASE94_"))
        .build()
}

fn init_logging(config: log4rs::config::RawConfig) -> Result<()> {
    let deserializers = log4rs::config::Deserializers::default();
    let (appenders, errors) = config.appenders_lossy(&deserializers);
    if !errors.is_empty() {
        return Err(errors.into());
    }

    let config = log4rs::Config::builder()
        .appenders(appenders)
        .loggers(config.loggers())
        .build(config.root())?;

    log4rs::init_config(config)?;
    Ok(())
}

fn run(cli: &Cli, codec: &CodecConfig) -> Result<()> {
    let alphabet = cli
        .alphabet
        .or(codec.alphabet)
        .unwrap_or(Alphabet::STANDARD);

    let input = read_input(cli.file.as_deref())?;
    let stdout = BufWriter::new(io::stdout().lock());

    if cli.decode {
        decode(stdout, &alphabet, input)
    } else {
        let wrap = cli.wrap.unwrap_or(codec.wrap);
        encode(stdout, &alphabet, &input, wrap)
    }
}

fn read_input(path: Option<&Path>) -> Result<Vec<u8>> {
    match path {
        Some(path) if path != Path::new("-") => {
            log::debug!("Reading {path:?}.");
            fs::read(path).with_context(|| format!("could not read file {path:?}"))
        },
        _ => {
            log::debug!("Reading standard input.");
            let mut buf = Vec::new();
            io::stdin()
                .lock()
                .read_to_end(&mut buf)
                .context("could not read standard input")?;
            Ok(buf)
        },
    }
}

fn encode<W: io::Write>(writer: W, alphabet: &Alphabet, bytes: &[u8], wrap: usize) -> Result<()> {
    log::info!(
        "Encoding {} bytes into {} symbols.",
        bytes.len(),
        base94::encoded_len(bytes.len())
    );

    let mut lines = LineWriter::new(writer, wrap);
    let encoded = base94::encode(&mut lines, alphabet, bytes);

    // the io error, if any, is held by the line writer
    let mut writer = lines.finish().context(WRITE_ERR)?;
    encoded.context(WRITE_ERR)?;
    writer.flush().context(WRITE_ERR)
}

fn decode<W: io::Write>(mut writer: W, alphabet: &Alphabet, input: Vec<u8>) -> Result<()> {
    let text = String::from_utf8(input).context(DATA_ERR)?;
    let text: String = text.chars().filter(|c| !c.is_ascii_whitespace()).collect();

    log::info!("Decoding {} symbols.", text.len());
    let bytes = base94::from_str(alphabet, &text).context(DATA_ERR)?;
    log::debug!("Decoded {} bytes.", bytes.len());

    writer.write_all(&bytes).context(WRITE_ERR)?;
    writer.flush().context(WRITE_ERR)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn encode_to_string(bytes: &[u8], wrap: usize) -> String {
        let mut out = Vec::new();
        encode(&mut out, &Alphabet::STANDARD, bytes, wrap).expect("encoding to Vec works");
        String::from_utf8(out).expect("output is ascii")
    }

    #[test]
    fn encodes_with_newline() {
        assert_eq!(encode_to_string(b"Hello, World!", 0), "Oyx7ylp81\"+/q+BN0\n");
        assert_eq!(encode_to_string(b"Hello, World!", 8), "Oyx7ylp8\n1\"+/q+BN\n0\n");
        assert_eq!(encode_to_string(b"", 0), "\n");
        assert_eq!(encode_to_string(b"", 76), "\n");
    }

    #[test]
    fn decodes_wrapped_text() {
        let mut out = Vec::new();
        let text = b"Oyx7ylp8\r\n1\"+/q+BN\n0\n".to_vec();
        decode(&mut out, &Alphabet::STANDARD, text).expect("wrapped text is valid");
        assert_eq!(out, b"Hello, World!");
    }

    #[test]
    fn rejects_invalid_data() {
        let mut out = Vec::new();
        let err = decode(&mut out, &Alphabet::STANDARD, b"0".to_vec()).expect_err("lone symbol is invalid");

        assert!(format!("{err:#}").starts_with(DATA_ERR), "unexpected error: {err:#}");
        assert!(out.is_empty(), "nothing may be written");
    }

    #[test]
    fn cli_parses() {
        let cli = Cli::try_parse_from(["base94", "-d", "--wrap", "76", "input.b94"]).expect("args are valid");
        assert!(cli.decode, "decode flag was set");
        assert_eq!(cli.wrap, Some(76));
        assert_eq!(cli.file.as_deref(), Some(Path::new("input.b94")));

        Cli::try_parse_from(["base94", "--alphabet", "abc"]).expect_err("alphabet is too short");
    }
}
