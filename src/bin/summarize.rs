use std::process::ExitCode;

use clap::Parser;
use web_summarizer::{
    config::{Config, FetchMode},
    pipeline::Summarizer,
    telemetry::init_tracing,
    SummaryRequest,
};

#[derive(Parser)]
#[command(name = "summarize", about = "Summarize a document from a given URL")]
struct Cli {
    /// URL of the page or video to summarize
    #[arg(short, long)]
    url: String,

    /// Model to use instead of OLLAMA_MODEL
    #[arg(long)]
    model: Option<String>,

    /// Fetch pages with a plain HTTP request instead of a browser
    #[arg(long = "static")]
    static_fetch: bool,

    /// Print the result as JSON
    #[arg(long)]
    json: bool,
}

#[tokio::main]
async fn main() -> ExitCode {
    init_tracing("web_summarizer=warn");
    let cli = Cli::parse();
    ExitCode::from(report(run(&cli).await))
}

/// Prints a failure to stderr and returns the process exit status.
fn report(result: Result<(), Box<dyn std::error::Error>>) -> u8 {
    match result {
        Ok(()) => 0,
        Err(err) => {
            eprintln!("Error: {}", err);
            1
        }
    }
}

impl Cli {
    /// Applies the command-line overrides on top of the loaded configuration.
    fn apply(&self, config: &mut Config) {
        if let Some(model) = &self.model {
            config.ollama_model = model.clone();
        }
        if self.static_fetch {
            config.fetch_mode = FetchMode::Static;
        }
    }
}

async fn run(cli: &Cli) -> Result<(), Box<dyn std::error::Error>> {
    let mut config = Config::load()?;
    cli.apply(&mut config);

    let request = SummaryRequest::new(cli.url.as_str())?;
    let summarizer = Summarizer::from_config(&config)?;
    let result = summarizer.summarize(&request).await?;

    if cli.json {
        println!("{}", serde_json::to_string_pretty(&result)?);
    } else {
        println!("{}", result);
    }
    Ok(())
}
