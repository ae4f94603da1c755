use clap::Parser;
use client::api::HttpInferenceService;
use client::config::ClientConfig;
use client::pipeline::{Pipeline, PipelineError};
use client::report::ReportSynthesizer;
use client::results::ExplainabilityFetcher;
use client::upload::{CandidateFile, ObjectUrlStore};
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;

/// Submit an image for classification, show the explained result and export a PDF report.
#[derive(Parser, Debug)]
#[command(name = "client", version)]
struct Args {
    /// YAML configuration file
    #[arg(long)]
    config: Option<PathBuf>,

    /// Override the inference service base URL
    #[arg(long)]
    api_url: Option<String>,

    /// Directory the PDF report is written to
    #[arg(long)]
    out_dir: Option<PathBuf>,

    /// Skip report export
    #[arg(long)]
    no_report: bool,

    /// JPG or PNG image to analyze
    image: PathBuf,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    env_logger::init_from_env(env_logger::Env::new().default_filter_or("info"));
    let args = Args::parse();

    let mut config = match ClientConfig::load(args.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            log::error!("Failed to load configuration: {}", e);
            return ExitCode::FAILURE;
        }
    };
    if let Some(api_url) = args.api_url {
        config.api_base_url = api_url;
    }
    if let Some(out_dir) = args.out_dir {
        config.report.output_dir = out_dir;
    }

    let base_url = match config.base_url() {
        Ok(url) => url,
        Err(e) => {
            log::error!("{}", e);
            return ExitCode::FAILURE;
        }
    };
    log::info!("Using inference service at {}", base_url);

    let candidate = match CandidateFile::from_path(&args.image) {
        Ok(candidate) => candidate,
        Err(e) => {
            log::error!("Failed to read {}: {}", args.image.display(), e);
            return ExitCode::FAILURE;
        }
    };

    let fetcher = ExplainabilityFetcher::new(config.explain_timeout_secs.map(Duration::from_secs));
    let synthesizer = (!args.no_report).then(|| ReportSynthesizer::new(config.report.clone()));
    let mut pipeline = Pipeline::new(
        HttpInferenceService::new(base_url),
        ObjectUrlStore::new(),
        fetcher,
        synthesizer,
    );

    let mut stdout = std::io::stdout();
    match pipeline.run(candidate, &mut stdout).await {
        Ok(_) => ExitCode::SUCCESS,
        Err(PipelineError::Rejected(message)) | Err(PipelineError::Submission(message)) => {
            eprintln!("{}", message);
            ExitCode::FAILURE
        }
        Err(e) => {
            log::error!("{}", e);
            ExitCode::FAILURE
        }
    }
}
