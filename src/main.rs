use std::fs;
use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use serde_json::Value;

use meta_comb::api::request_dto::QueryRequestDto;
use meta_comb::diagnostics::LogSink;
use meta_comb::loader::parser::parse_json_file;
use meta_comb::loader::png_text::{ImageDecoder, PngMetadataDecoder};
use meta_comb::{ImageInput, QueryRequest, fingerprint_file, logger, try_comb_metadata};

#[derive(Parser, Debug)]
#[command(name = "meta-comb", version, about = "Search the workflow metadata embedded in generated images")]
struct Cli {
    /// Also write logs to this file.
    #[arg(long, global = true)]
    log_file: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Look up a field, or whole nodes, in a workflow document.
    Query(QueryArgs),
    /// Print the SHA-256 of a file, for change detection.
    Fingerprint { path: PathBuf },
}

#[derive(Args, Debug)]
struct QueryArgs {
    /// Field name to look up.
    #[arg(short, long)]
    key: Option<String>,

    /// Image file to read; missing metadata is an error.
    #[arg(long)]
    file: Option<PathBuf>,

    /// Image handed over as an already decoded image; missing metadata falls through.
    #[arg(long)]
    image: Option<PathBuf>,

    /// Raw metadata text containing the document.
    #[arg(long, conflicts_with = "raw_file")]
    raw: Option<String>,

    /// Read the raw metadata text from a file.
    #[arg(long)]
    raw_file: Option<PathBuf>,

    /// Only nodes whose `_meta.title` equals this.
    #[arg(long)]
    title: Option<String>,

    /// Only nodes whose `class_type` equals this.
    #[arg(long)]
    node_type: Option<String>,

    /// Search the `workflow` section before `prompt`.
    #[arg(long)]
    search_workflow: bool,

    /// JSON file with the prompt currently executing.
    #[arg(long)]
    prompt_file: Option<PathBuf>,

    /// JSON file with the host's extra info (its `workflow` entry is used).
    #[arg(long)]
    extra_info_file: Option<PathBuf>,

    /// JSON request file; other flags override its fields.
    #[arg(long)]
    request: Option<PathBuf>,
}

fn build_request(args: QueryArgs) -> Result<QueryRequest> {
    let mut request = match &args.request {
        Some(path) => {
            let dto: QueryRequestDto =
                parse_json_file(path).with_context(|| format!("Failed to load request '{}'", path.display()))?;
            QueryRequest::try_from(dto)?
        }
        None => QueryRequest::default(),
    };

    if let Some(key) = args.key {
        request.key = key;
    }
    if let Some(title) = args.title {
        request.node_title = title;
    }
    if let Some(node_type) = args.node_type {
        request.node_type = node_type;
    }
    if args.search_workflow {
        request.search_workflow = true;
    }
    if let Some(path) = args.file {
        request.file_path = Some(path);
    }
    if let Some(path) = args.image {
        let image = PngMetadataDecoder.decode(&path).with_context(|| format!("Failed to decode image '{}'", path.display()))?;
        request.image = Some(ImageInput::Decoded(image));
    }
    if let Some(raw) = args.raw {
        request.raw_metadata = raw;
    }
    if let Some(path) = args.raw_file {
        request.raw_metadata = fs::read_to_string(&path).with_context(|| format!("Failed to read '{}'", path.display()))?;
    }
    if let Some(path) = args.prompt_file {
        let prompt: Value = parse_json_file(&path).with_context(|| format!("Failed to load prompt '{}'", path.display()))?;
        request.prompt = Some(prompt);
    }
    if let Some(path) = args.extra_info_file {
        let extra: Value = parse_json_file(&path).with_context(|| format!("Failed to load extra info '{}'", path.display()))?;
        request.extra_pnginfo = Some(extra);
    }

    Ok(request)
}

fn run(command: Command) -> Result<ExitCode> {
    match command {
        Command::Query(args) => {
            let request = build_request(args)?;
            match try_comb_metadata(&request, &LogSink) {
                Ok(text) => {
                    println!("{}", text);
                    Ok(ExitCode::SUCCESS)
                }
                Err(e) => {
                    println!("{}", e.to_output_text());
                    Ok(ExitCode::FAILURE)
                }
            }
        }
        Command::Fingerprint { path } => {
            let digest = fingerprint_file(&path).with_context(|| format!("Failed to hash '{}'", path.display()))?;
            println!("{}", digest);
            Ok(ExitCode::SUCCESS)
        }
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    logger::init(cli.log_file.as_deref());

    match run(cli.command) {
        Ok(code) => code,
        Err(e) => {
            log::error!("{:#}", e);
            ExitCode::FAILURE
        }
    }
}
