//! A CLI tool for inspecting the contents of a DICOM file
//! by printing it in a human readable format,
//! one element at a time.
use clap::Parser;
use dicom_stream_dump::{ColorMode, DumpOptions, Error};
use dicom_stream_object::{CodecPolicy, MAX_READ_LENGTH};
use snafu::{Report, Whatever};
use std::path::PathBuf;
use tracing::{error, Level};

/// Exit code for when an error emerged while reading the DICOM file.
const ERROR_READ: i32 = -2;
/// Exit code for when an error emerged while dumping the file.
const ERROR_PRINT: i32 = -3;

/// Dump the contents of DICOM files
#[derive(Debug, Parser)]
#[command(version)]
struct App {
    /// The DICOM file(s) to read
    #[clap(required = true)]
    files: Vec<PathBuf>,
    /// Print all values to the end
    /// (cut at 70 characters by default)
    #[clap(long = "no-limit")]
    no_limit: bool,
    /// Print a tree of attribute names instead of tags
    #[clap(long = "tree")]
    tree: bool,
    /// Read the files as bare data sets,
    /// without preamble and file meta group
    #[clap(long = "no-meta")]
    no_meta: bool,
    /// The transfer syntax UID of the data set
    /// (overrides the file meta group)
    #[clap(long = "ts")]
    transfer_syntax: Option<String>,
    /// Leave values longer than this number of bytes in the file
    #[clap(long = "max-read-length", default_value_t = MAX_READ_LENGTH)]
    max_read_length: u32,
    /// Load all values, regardless of their length
    #[clap(long = "load-all")]
    load_all: bool,
    /// Reject elements with an odd value length
    #[clap(long = "no-accept-odd-length")]
    no_accept_odd_length: bool,
    /// Keep odd value lengths as they are
    #[clap(long = "no-auto-correct")]
    no_auto_correct: bool,
    /// Read undefined length UN elements
    /// in the transfer syntax of the data set
    #[clap(long = "no-cp246")]
    no_cp246: bool,
    /// Guess the transfer syntax of the data set from its first element
    #[clap(long = "detect-ts")]
    detect_ts: bool,
    /// The color mode
    #[clap(long = "color", default_value = "auto")]
    color: ColorMode,
    /// Fail if any errors are encountered
    #[clap(long = "fail-first")]
    fail_first: bool,
    /// Verbose mode
    #[arg(short = 'v', long = "verbose")]
    verbose: bool,
}

fn main() {
    run().unwrap_or_else(|e| {
        eprintln!("{}", Report::from_error(e));
        std::process::exit(ERROR_READ);
    });
}

fn run() -> Result<(), Whatever> {
    let App {
        files: filenames,
        no_limit,
        tree,
        no_meta,
        transfer_syntax,
        max_read_length,
        load_all,
        no_accept_odd_length,
        no_auto_correct,
        no_cp246,
        detect_ts,
        color,
        fail_first,
        verbose,
    } = App::parse();

    tracing::subscriber::set_global_default(
        tracing_subscriber::FmtSubscriber::builder()
            .with_max_level(if verbose { Level::DEBUG } else { Level::INFO })
            .with_writer(std::io::stderr)
            .finish(),
    )
    .unwrap_or_else(|e| {
        error!("{}", Report::from_error(e));
    });

    let policy = CodecPolicy::default()
        .accept_odd_length(!no_accept_odd_length)
        .auto_correct(!no_auto_correct)
        .cp246(!no_cp246)
        .auto_detect_dataset_ts(detect_ts)
        .max_read_length(max_read_length);

    let mut options = DumpOptions::new();
    options
        .tree(tree)
        .no_limit(no_limit)
        .no_meta(no_meta)
        .load_all(load_all)
        .policy(policy)
        .color_mode(color);
    if let Some(uid) = transfer_syntax {
        options.transfer_syntax(uid);
    }
    let fail_first = filenames.len() == 1 || fail_first;
    let mut errors: i32 = 0;

    for filename in &filenames {
        println!("{}: ", filename.display());
        if let Err(e) = options.dump_file(filename) {
            if e.is_broken_pipe() {
                // handle broken pipe separately with a no-op
            } else {
                let code = match e {
                    Error::Print { .. } => ERROR_PRINT,
                    _ => ERROR_READ,
                };
                eprintln!("[ERROR] {}", Report::from_error(e));
                if fail_first {
                    std::process::exit(code);
                }
            }
            errors += 1;
        }
    }

    std::process::exit(errors);
}

#[cfg(test)]
mod tests {
    use crate::App;
    use clap::CommandFactory;

    #[test]
    fn verify_cli() {
        App::command().debug_assert();
    }
}
