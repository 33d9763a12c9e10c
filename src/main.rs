use std::fs::File;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use log::{error, info, LevelFilter};

use jcallgraph::{analyze, write_result, Algorithm, FilterConfig, Format};

/// CLI arguments for jcg execution.
#[derive(Parser, Debug)]
#[command(
    name = "jcg",
    about = "Static call-graph analysis for JVM class files, JAR files, and class directories.",
    version
)]
struct Cli {
    /// Input archives (.jar, .war), loose .class files, or directories.
    #[arg(value_name = "PATH", required = true)]
    inputs: Vec<PathBuf>,
    /// Call-graph construction algorithm.
    #[arg(long, value_enum, default_value_t = AlgorithmArg::Cha)]
    algorithm: AlgorithmArg,
    /// Entry point specs (Class.method, fully.qualified.Class.method, or
    /// method); default is every public static main(String[]).
    #[arg(long = "entry", value_name = "SPEC", value_delimiter = ',')]
    entries: Vec<String>,
    /// Only report classes under these package/class name prefixes.
    #[arg(long = "include", value_name = "PREFIX", value_delimiter = ',')]
    include: Vec<String>,
    /// Drop classes under these name prefixes.
    #[arg(long = "exclude", value_name = "PREFIX", value_delimiter = ',')]
    exclude: Vec<String>,
    /// Exclude JDK classes from analysis.
    #[arg(long)]
    exclude_jdk: bool,
    /// Output format.
    #[arg(long, value_enum, default_value_t = FormatArg::Txt)]
    format: FormatArg,
    /// Output file; "-" or absent writes to stdout.
    #[arg(long, value_name = "PATH")]
    output: Option<PathBuf>,
    /// Log errors only.
    #[arg(long)]
    quiet: bool,
    /// Debug logging plus detailed class/method listings.
    #[arg(long)]
    verbose: bool,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum AlgorithmArg {
    Cha,
    Rta,
}

impl From<AlgorithmArg> for Algorithm {
    fn from(value: AlgorithmArg) -> Self {
        match value {
            AlgorithmArg::Cha => Algorithm::Cha,
            AlgorithmArg::Rta => Algorithm::Rta,
        }
    }
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum FormatArg {
    Txt,
    Csv,
    Json,
    Dot,
}

impl From<FormatArg> for Format {
    fn from(value: FormatArg) -> Self {
        match value {
            FormatArg::Txt => Format::Txt,
            FormatArg::Csv => Format::Csv,
            FormatArg::Json => Format::Json,
            FormatArg::Dot => Format::Dot,
        }
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.quiet, cli.verbose);
    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!("Error processing files: {:#}", err);
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<()> {
    let filter = FilterConfig {
        include_prefixes: cli.include.clone(),
        exclude_prefixes: cli.exclude.clone(),
        exclude_jdk: cli.exclude_jdk,
    };

    let result = analyze(&cli.inputs, &filter, cli.algorithm.into(), &cli.entries)?;

    let mut writer = output_writer(cli.output.as_deref())?;
    write_result(&mut writer, &result, cli.format.into(), cli.verbose)
        .context("failed to write output")?;
    writer.flush().context("failed to flush output")?;

    if let Some(path) = cli.output.as_deref().filter(|path| *path != Path::new("-")) {
        info!("Output written to: {}", path.display());
    }

    Ok(())
}

fn output_writer(output: Option<&Path>) -> Result<Box<dyn Write>> {
    match output {
        Some(path) if path == Path::new("-") => Ok(Box::new(io::stdout())),
        Some(path) => Ok(Box::new(
            File::create(path).with_context(|| format!("failed to open {}", path.display()))?,
        )),
        None => Ok(Box::new(io::stdout())),
    }
}

fn init_logging(quiet: bool, verbose: bool) {
    let level = if quiet {
        LevelFilter::Error
    } else if verbose {
        LevelFilter::Debug
    } else {
        LevelFilter::Info
    };
    env_logger::Builder::from_default_env()
        .filter_level(level)
        .format_timestamp(None)
        .init();
}
