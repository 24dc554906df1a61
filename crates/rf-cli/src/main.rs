use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};

use rf_parser::model::executables::ExecutableTable;
use rf_parser::{Dumper, ModelElement, ParserConfig, RobotFile, RobotParser};

#[derive(Parser)]
#[command(name = "rfmodel")]
#[command(about = "Parse, check and round-trip Robot Framework test data")]
#[command(version)]
struct Cli {
    /// Parser configuration file (TOML)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Log more (repeat for trace output)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Print a summary of the tables in a file
    Parse {
        /// Input .robot, .resource, .txt or .tsv file
        path: PathBuf,
    },

    /// Report build messages, failing when any is an error
    Check {
        /// Input file
        path: PathBuf,
    },

    /// Write the file back from its model
    Dump {
        /// Input file
        path: PathBuf,

        /// Compare the output with the input instead of printing it
        #[arg(long)]
        verify: bool,
    },

    /// Print the normalized rows of every test case, keyword and task
    Rows {
        /// Input file
        path: PathBuf,
    },
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    if let Err(e) = run(cli) {
        eprintln!("Error: {e:?}");
        std::process::exit(1);
    }
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();
}

fn run(cli: Cli) -> Result<()> {
    let config = match &cli.config {
        Some(path) => ParserConfig::load(path)
            .with_context(|| format!("Failed to load config {}", path.display()))?,
        None => ParserConfig::default(),
    };
    log::debug!("Using configuration {config:?}");
    let parser = RobotParser::with_config(config);

    match cli.command {
        Command::Parse { path } => cmd_parse(&parser, &path),
        Command::Check { path } => cmd_check(&parser, &path),
        Command::Dump { path, verify } => cmd_dump(&parser, &path, verify),
        Command::Rows { path } => cmd_rows(&parser, &path),
    }
}

fn load(parser: &RobotParser, path: &Path) -> Result<RobotFile> {
    parser
        .parse_file(path)
        .with_context(|| format!("Failed to parse {}", path.display()))
}

fn cmd_parse(parser: &RobotParser, path: &Path) -> Result<()> {
    let file = load(parser, path)?;

    println!("{} ({:?})", file.display_path(), file.format());
    println!("  lines:      {}", file.lines().len());
    println!("  settings:   {}", file.settings().settings().len());
    println!("  variables:  {}", file.variables().variables().len());
    print_holders("test cases", file.test_cases());
    print_holders("keywords", file.keywords());
    print_holders("tasks", file.tasks());
    if !file.messages().is_empty() {
        println!("  messages:   {}", file.messages().len());
    }
    Ok(())
}

fn print_holders(label: &str, table: &ExecutableTable) {
    let holders = table.holders();
    println!("  {:<11} {}", format!("{label}:"), holders.len());
    for holder in holders {
        println!("    {} ({} elements)", holder.name_text(), holder.elements().len());
    }
}

fn cmd_check(parser: &RobotParser, path: &Path) -> Result<()> {
    let file = load(parser, path)?;

    for message in file.messages() {
        eprintln!("{}: {message}", file.display_path());
    }
    if file.has_errors() {
        bail!("{} has errors", path.display());
    }

    let references = rf_parser::ResourceImporter::new(parser).resolve(&file, &base_dir(path));
    let resources: usize = references.iter().map(|r| r.flatten().len()).sum();
    eprintln!("OK: {} ({resources} resource file(s))", path.display());
    Ok(())
}

fn cmd_dump(parser: &RobotParser, path: &Path, verify: bool) -> Result<()> {
    let file = load(parser, path)?;
    let dumped = Dumper::new(parser.config()).dump(&file);

    if !verify {
        print!("{dumped}");
        return Ok(());
    }

    let original =
        std::fs::read(path).with_context(|| format!("Failed to read {}", path.display()))?;
    if dumped.as_bytes() != original.as_slice() {
        let line = first_difference(&dumped, &String::from_utf8_lossy(&original));
        bail!("{} does not round-trip, first difference at line {line}", path.display());
    }
    eprintln!("OK: {} round-trips", path.display());
    Ok(())
}

fn cmd_rows(parser: &RobotParser, path: &Path) -> Result<()> {
    let file = load(parser, path)?;

    for table in [file.test_cases(), file.keywords(), file.tasks()] {
        for holder in table.holders() {
            println!("{} {}", holder.kind(), holder.name_text());
            for element in holder.elements() {
                let line = element
                    .begin_position()
                    .map(|p| p.line.to_string())
                    .unwrap_or_else(|| "-".to_string());
                println!(
                    "  {line:>5}  {:<14} {}",
                    format!("{:?}", element.row_type()),
                    element.cell_texts().join(" | ")
                );
            }
        }
    }
    Ok(())
}

fn base_dir(path: &Path) -> PathBuf {
    path.parent().map(Path::to_path_buf).unwrap_or_default()
}

/// 1-based line where two texts first differ.
fn first_difference(left: &str, right: &str) -> usize {
    left.split_inclusive('\n')
        .zip(right.split_inclusive('\n'))
        .position(|(a, b)| a != b)
        .unwrap_or_else(|| left.lines().count().min(right.lines().count()))
        + 1
}
