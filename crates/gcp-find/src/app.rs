//! The `gcp-find` run, independent of the concrete detector backend.

use std::fs::File;
use std::io::{self, BufWriter, Write};

use gcp_find_core::{
    list_dictionaries, BatchSummary, CoordTable, DetectorParams, DictionarySpec, GcpFinder,
    MarkerDetector,
};
use log::info;

use crate::cli::Args;
use crate::error::CliError;

/// Print `id : name` for every known dictionary.
pub fn write_dictionary_list(out: &mut impl Write) -> io::Result<()> {
    for (id, name) in list_dictionaries() {
        writeln!(out, "{id} : {name}")?;
    }
    out.flush()
}

fn open_output(args: &Args) -> Result<Box<dyn Write>, CliError> {
    match &args.output {
        Some(path) => {
            let file = File::create(path).map_err(|source| CliError::Output {
                path: path.display().to_string(),
                source,
            })?;
            Ok(Box::new(BufWriter::new(file)))
        }
        None => Ok(Box::new(io::stdout().lock())),
    }
}

/// Validate the configuration, build the detector and process all images.
///
/// Configuration problems are reported before the output file is created,
/// so a typo in a flag never truncates an existing GCP list.
pub fn run<D, E, F>(args: &Args, make_detector: F) -> Result<BatchSummary, CliError>
where
    D: MarkerDetector,
    E: Into<Box<dyn std::error::Error + Send + Sync>>,
    F: FnOnce(DictionarySpec, &DetectorParams) -> Result<D, E>,
{
    if args.names.is_empty() {
        return Err(CliError::NoImages);
    }
    let dictionary = args.dictionary()?;
    let params = args.detector_params()?;
    let coords = match &args.input {
        Some(path) => {
            let table = CoordTable::load(path, &args.separator)?;
            info!("{} GCP coordinates loaded from {}", table.len(), path.display());
            table
        }
        None => CoordTable::new(),
    };
    let detector =
        make_detector(dictionary, &params).map_err(|err| CliError::Detector(err.into()))?;
    let out = open_output(args)?;

    info!(
        "dictionary {} ({}), output {}",
        dictionary.id(),
        dictionary.name(),
        args.finder_config().format
    );
    let mut finder = GcpFinder::new(detector, coords, args.finder_config(), out);
    let summary = finder.process_images(&args.names)?;
    finder.finish()?;
    info!(
        "{} images: {} with markers, {} without, {} unreadable, {} detector failures, {} lines written",
        summary.images,
        summary.processed,
        summary.no_markers,
        summary.unreadable,
        summary.detector_failed,
        summary.lines_written
    );
    Ok(summary)
}
