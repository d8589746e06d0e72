//! folio - import HTML documents for ebook editing

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{ArgAction, Parser};
use serde::Serialize;
use tracing_subscriber::EnvFilter;

use folio::{Book, HtmlImporter, ImportOptions, Importer, TxtImporter};

#[derive(Parser)]
#[command(name = "folio")]
#[command(version, about = "Import HTML documents for ebook editing", long_about = None)]
#[command(after_help = "EXAMPLES:
    folio chapter.html               Print the normalized XHTML
    folio chapter.html -o book/      Write book/Text/chapter.xhtml and its resources
    folio notes.txt --json           Summarize a text import as JSON")]
struct Cli {
    /// Input file (HTML, XHTML, or TXT)
    #[arg(value_name = "INPUT")]
    input: PathBuf,

    /// Directory to write the imported document and resources into
    #[arg(short, long, value_name = "DIR")]
    output: Option<PathBuf>,

    /// Skip the final XHTML cleaning pass
    #[arg(long)]
    no_clean: bool,

    /// Keep file names in `file.html#id` anchor links
    #[arg(long)]
    keep_anchor_files: bool,

    /// Print a JSON summary instead of the document
    #[arg(long)]
    json: bool,

    /// Only report errors
    #[arg(short, long)]
    quiet: bool,

    /// More log output (-v, -vv)
    #[arg(short, long, action = ArgAction::Count)]
    verbose: u8,
}

#[derive(Serialize)]
struct Summary<'a> {
    input: &'a Path,
    source_bytes: usize,
    resources: Vec<ResourceSummary<'a>>,
}

#[derive(Serialize)]
struct ResourceSummary<'a> {
    name: &'a str,
    media_type: &'a str,
    bytes: usize,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(&cli);

    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e}");
            ExitCode::FAILURE
        }
    }
}

fn init_tracing(cli: &Cli) {
    let default_level = if cli.quiet {
        "error"
    } else {
        match cli.verbose {
            0 => "warn",
            1 => "info",
            _ => "debug",
        }
    };

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("folio={default_level}")));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn run(cli: &Cli) -> Result<(), Box<dyn std::error::Error>> {
    let options = ImportOptions::new()
        .with_clean_output(!cli.no_clean)
        .with_strip_anchor_files(!cli.keep_anchor_files);

    let book = import(&cli.input, options)?;

    if let Some(dir) = &cli.output {
        write_book(&book, &cli.input, dir)?;
    }

    if cli.json {
        let summary = Summary {
            input: &cli.input,
            source_bytes: book.source.len(),
            resources: book
                .mainfolder
                .iter()
                .map(|(name, r)| ResourceSummary {
                    name,
                    media_type: &r.media_type,
                    bytes: r.data.len(),
                })
                .collect(),
        };
        println!("{}", serde_json::to_string_pretty(&summary)?);
    } else if cli.output.is_none() {
        println!("{}", book.source);
    }

    Ok(())
}

fn import(input: &Path, options: ImportOptions) -> folio::Result<Book> {
    let is_text = input
        .extension()
        .is_some_and(|e| e.eq_ignore_ascii_case("txt"));

    if is_text {
        TxtImporter::new(input).with_options(options).try_book()
    } else {
        HtmlImporter::new(input).with_options(options).try_book()
    }
}

fn write_book(book: &Book, input: &Path, dir: &Path) -> std::io::Result<()> {
    let stem = input
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "content".to_string());

    let text_dir = dir.join("Text");
    std::fs::create_dir_all(&text_dir)?;
    std::fs::write(text_dir.join(format!("{stem}.xhtml")), &book.source)?;
    book.mainfolder.write_to(dir)?;

    tracing::info!(dir = %dir.display(), "Wrote imported book");
    Ok(())
}
