use std::fs::File;
use std::io::{self, BufReader, Write};
use std::sync::Arc;
use std::time::Instant;

use clap::{CommandFactory, Parser};
use colored::Colorize;
use tracing::info;

use custody_ingest::{
    ingest, prepare, split_reader, write_plan, HttpUploader, IngestConfig, IngestError,
};

fn init_logging() {
    use tracing_subscriber::layer::SubscriberExt;
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("custody_ingest=info,custody_graph_turtle=warn"));

    let subscriber = tracing_subscriber::registry().with(filter).with(
        tracing_subscriber::fmt::layer()
            .compact()
            .with_writer(io::stderr),
    );

    let _ = tracing::dispatcher::set_global_default(tracing::Dispatch::new(subscriber));
}

fn exit_with_error(err: IngestError) -> ! {
    eprintln!("{} {err}", "error:".red().bold());
    std::process::exit(1);
}

async fn run(config: IngestConfig) -> Result<(), IngestError> {
    let Some(input) = config.input.as_deref() else {
        eprintln!("Must specify location of the input Turtle file");
        eprintln!("{}", IngestConfig::command().render_usage());
        return Ok(());
    };
    config.validate().map_err(IngestError::Config)?;

    let start = Instant::now();
    let doc = split_reader(BufReader::new(File::open(input)?))?;
    info!(
        input = %input.display(),
        blocks = doc.blocks.len(),
        "split input"
    );

    let options = config.options();
    if config.plan {
        let planned = prepare(&doc, &options)?;
        let mut stdout = io::stdout().lock();
        write_plan(&planned, &mut stdout)?;
        stdout.flush()?;
        return Ok(());
    }

    let uploader = HttpUploader::new(&config.endpoint, config.token.clone(), config.timeout())
        .map_err(|e| IngestError::Config(e.to_string()))?;
    let mut linker = options.linker(Arc::new(uploader));
    if !config.quiet {
        linker = linker.with_echo(Box::new(io::stdout()));
    }

    let report = ingest(&doc, &options, &mut linker).await?;
    let bytes: usize = report.uploaded.iter().map(|u| u.bytes).sum();
    info!(
        units = report.len(),
        bytes,
        elapsed_ms = start.elapsed().as_millis() as u64,
        "done"
    );
    Ok(())
}

#[tokio::main]
async fn main() {
    let config = IngestConfig::parse();

    if std::env::var_os("NO_COLOR").is_some() {
        colored::control::set_override(false);
    }

    init_logging();

    if let Err(err) = run(config).await {
        exit_with_error(err);
    }
}
