//! Converts documents between JSON and BJData.

use std::fs::File;
use std::io::{self, BufReader, BufWriter, Read, Write};
use std::process::ExitCode;

use bjdata::{decode, encode_to, DecodeOptions, EncodeOptions, Value};
use tracing::{debug, error};
use tracing_subscriber::EnvFilter;

const USAGE: &str = "USAGE: bjdata (to-binary|to-text) (INFILE|-) [OUTFILE]

Converts a document between JSON (text) and BJData (binary). Input is read from INFILE
unless set to '-', in which case stdin is used. If OUTFILE is not specified, output goes
to stdout. 'fromjson' and 'tojson' are accepted for to-binary and to-text.";

const EXIT_USAGE: u8 = 1;
const EXIT_INPUT_OPEN: u8 = 2;
const EXIT_OUTPUT_OPEN: u8 = 4;
const EXIT_DECODE: u8 = 8;
const EXIT_ENCODE: u8 = 16;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mode {
    ToBinary,
    ToText,
}

impl Mode {
    fn parse(arg: &str) -> Option<Self> {
        match arg {
            "to-binary" | "fromjson" => Some(Self::ToBinary),
            "to-text" | "tojson" => Some(Self::ToText),
            _ => None,
        }
    }
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(io::stderr)
        .init();

    let args: Vec<String> = std::env::args().skip(1).collect();
    let mode = match args.as_slice() {
        [mode, _] | [mode, _, _] => Mode::parse(mode),
        _ => None,
    };
    let Some(mode) = mode else {
        eprintln!("{USAGE}");
        return ExitCode::from(EXIT_USAGE);
    };

    let input: Box<dyn Read> = if args[1] == "-" {
        Box::new(io::stdin().lock())
    } else {
        match File::open(&args[1]) {
            Ok(f) => Box::new(BufReader::new(f)),
            Err(err) => {
                error!(path = %args[1], %err, "failed to open input file for reading");
                return ExitCode::from(EXIT_INPUT_OPEN);
            }
        }
    };

    let output: Box<dyn Write> = match args.get(2) {
        None => Box::new(io::stdout().lock()),
        Some(path) => match File::create(path) {
            Ok(f) => Box::new(f),
            Err(err) => {
                error!(path = %path, %err, "failed to open output file for writing");
                return ExitCode::from(EXIT_OUTPUT_OPEN);
            }
        },
    };

    let code = match mode {
        Mode::ToBinary => to_binary(input, BufWriter::new(output)),
        Mode::ToText => to_text(input, BufWriter::new(output)),
    };
    ExitCode::from(code)
}

fn to_binary(input: Box<dyn Read>, output: impl Write) -> u8 {
    let value: Value = match serde_json::from_reader(input) {
        Ok(v) => v,
        Err(err) => {
            error!(%err, "failed to decode json");
            return EXIT_DECODE;
        }
    };
    if let Err(err) = encode_to(&value, output, &EncodeOptions::default()) {
        error!(%err, "failed to encode to bjdata");
        return EXIT_ENCODE;
    }
    0
}

fn to_text(mut input: Box<dyn Read>, mut output: impl Write) -> u8 {
    let mut bytes = Vec::new();
    if let Err(err) = input.read_to_end(&mut bytes) {
        error!(%err, "failed to read input");
        return EXIT_INPUT_OPEN;
    }
    debug!(len = bytes.len(), "read bjdata input");
    let options = DecodeOptions::default().with_intern_keys(true);
    let value = match decode(&bytes, &options) {
        Ok(v) => v,
        Err(err) => {
            error!(%err, "failed to decode bjdata");
            return EXIT_DECODE;
        }
    };
    let written = serde_json::to_writer(&mut output, &value)
        .map_err(io::Error::from)
        .and_then(|()| output.flush());
    if let Err(err) = written {
        error!(%err, "failed to encode to json");
        return EXIT_ENCODE;
    }
    0
}
