use anyhow::{bail, Context, Result};
use clap::{Parser, ValueEnum};
use serde_json::json;
use slipscan_ocr::{DateOrder, OcrBackend, ParserConfig, RawText, ReceiptParser, ReceiptPipeline, ReceiptRecord};
use std::io::Read;
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

/// Parse receipt OCR output into merchant, date, line items and total.
#[derive(Debug, Parser)]
#[command(name = "slipscan", version)]
struct Args {
    /// Parser configuration (TOML). Defaults to the per-user config file when present.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Date orders to try, comma separated, e.g. `dmy,mdy,ymd`.
    #[arg(long, value_delimiter = ',')]
    date_order: Vec<DateOrder>,

    #[arg(short, long, value_enum, default_value_t = Format::Json)]
    format: Format,

    /// Inputs are receipt images; run OCR first (needs the `tesseract` feature).
    #[arg(long)]
    image: bool,

    /// Print every field candidate instead of the reconciled record.
    #[arg(long, conflicts_with = "image")]
    candidates: bool,

    /// OCR text files. Reads stdin when none are given.
    files: Vec<PathBuf>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Format {
    Json,
    /// The chat reply a user would see.
    Text,
}

fn default_config_path() -> Option<PathBuf> {
    directories::ProjectDirs::from("com", "slipscan", "Slipscan")
        .map(|dirs| dirs.config_dir().join("parser.toml"))
}

fn load_config(args: &Args) -> Result<ParserConfig> {
    let path = args.config.clone().or_else(|| default_config_path().filter(|p| p.exists()));
    let mut config = match path {
        Some(path) => {
            tracing::info!("Using parser config {}", path.display());
            ParserConfig::load(&path).with_context(|| format!("loading {}", path.display()))?
        }
        None => ParserConfig::default(),
    };
    if !args.date_order.is_empty() {
        config.date_orders = args.date_order.clone();
    }
    config.validate()?;
    Ok(config)
}

#[cfg(feature = "tesseract")]
fn recognizer() -> impl OcrBackend {
    slipscan_ocr::recognizer::tesseract_backend::TesseractRecognizer::new(None, "eng")
}

#[cfg(not(feature = "tesseract"))]
fn recognizer() -> impl OcrBackend {
    slipscan_ocr::UnavailableRecognizer
}

fn render(format: Format, source: &str, record: &ReceiptRecord) -> Result<String> {
    Ok(match format {
        Format::Json => serde_json::to_string_pretty(&json!({ "source": source, "record": record }))?,
        Format::Text => format!("# {source}\n{record}\n"),
    })
}

async fn read_inputs(files: &[PathBuf]) -> Result<Vec<(String, String)>> {
    if files.is_empty() {
        let mut text = String::new();
        std::io::stdin().read_to_string(&mut text).context("reading stdin")?;
        return Ok(vec![("<stdin>".to_string(), text)]);
    }
    let mut inputs = Vec::with_capacity(files.len());
    for path in files {
        let text = tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("reading {}", path.display()))?;
        inputs.push((path.display().to_string(), text));
    }
    Ok(inputs)
}

async fn run(args: Args) -> Result<()> {
    let parser = Arc::new(ReceiptParser::new(load_config(&args)?));

    if args.image {
        if !cfg!(feature = "tesseract") {
            bail!("image input needs slipscan built with the `tesseract` feature");
        }
        if args.files.is_empty() {
            bail!("--image needs at least one image file");
        }
        let pipeline = ReceiptPipeline::new(recognizer(), Arc::clone(&parser));
        for path in &args.files {
            let scan = pipeline
                .process_file(path)
                .await
                .with_context(|| format!("scanning {}", path.display()))?;
            println!("{}", render(args.format, &path.display().to_string(), &scan.record)?);
        }
        return Ok(());
    }

    for (source, text) in read_inputs(&args.files).await? {
        let raw = RawText::from_block(&text);
        if args.candidates {
            let candidates = parser.candidates(&raw);
            println!("{}", serde_json::to_string_pretty(&json!({ "source": source, "candidates": candidates }))?);
        } else {
            println!("{}", render(args.format, &source, &parser.parse(&raw))?);
        }
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(std::io::stderr)
        .init();

    run(Args::parse()).await
}
