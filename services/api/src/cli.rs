use crate::server;
use admission_flow::config::{AppConfig, ValidationSettings};
use admission_flow::error::AppError;
use admission_flow::workflows::admissions::{
    missing_fields_message, Category, Step, ValidationOrchestrator,
};
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use std::process::ExitCode;

/// Exit status for a document that failed validation.
const INVALID_DOCUMENT: u8 = 2;

#[derive(Parser, Debug)]
#[command(
    name = "Admissions Wizard",
    about = "Run the admissions wizard service or validate admission documents offline",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Start the HTTP service (default command)
    Serve(ServeArgs),
    /// Validate a JSON admission document against one wizard step
    Validate(ValidateArgs),
}

#[derive(Args, Debug, Default)]
pub(crate) struct ServeArgs {
    /// Override the configured host for the HTTP server
    #[arg(long)]
    pub(crate) host: Option<String>,
    /// Override the configured port for the HTTP server
    #[arg(long)]
    pub(crate) port: Option<u16>,
}

#[derive(Args, Debug)]
pub(crate) struct ValidateArgs {
    /// Path to a JSON object keyed by wire field names
    #[arg(long)]
    pub(crate) file: PathBuf,
    /// Wizard step to validate (sale or confirmation)
    #[arg(long, value_parser = parse_step)]
    pub(crate) step: Step,
    /// Institution category (SCHOOL, DEGREE or COLLEGE); defaults to COLLEGE
    #[arg(long, value_parser = parse_category)]
    pub(crate) category: Option<Category>,
}

fn parse_step(raw: &str) -> Result<Step, String> {
    Step::parse(raw).ok_or_else(|| format!("unknown step '{raw}', expected sale or confirmation"))
}

fn parse_category(raw: &str) -> Result<Category, String> {
    Category::parse(raw)
        .ok_or_else(|| format!("unknown category '{raw}', expected SCHOOL, DEGREE or COLLEGE"))
}

pub(crate) async fn run() -> Result<ExitCode, AppError> {
    let cli = Cli::parse();
    let command = cli
        .command
        .unwrap_or_else(|| Command::Serve(ServeArgs::default()));

    match command {
        Command::Serve(args) => server::run(args).await.map(|()| ExitCode::SUCCESS),
        Command::Validate(args) => run_validate(args),
    }
}

fn run_validate(args: ValidateArgs) -> Result<ExitCode, AppError> {
    let settings = AppConfig::load()
        .map(|config| config.validation)
        .unwrap_or_else(|_| ValidationSettings::default());
    let raw = std::fs::read_to_string(&args.file)?;
    let document: serde_json::Value = serde_json::from_str(&raw)?;
    let category = args.category.unwrap_or(Category::College);

    let result =
        ValidationOrchestrator::new(settings).validate_document(&document, args.step, category);
    let lines = report_lines(&result);
    for line in &lines {
        println!("{line}");
    }

    if result.is_valid() {
        Ok(ExitCode::SUCCESS)
    } else {
        Ok(ExitCode::from(INVALID_DOCUMENT))
    }
}

fn report_lines(result: &admission_flow::workflows::admissions::ValidationResult) -> Vec<String> {
    let mut lines: Vec<String> = result
        .messages()
        .into_iter()
        .map(|(field, message)| format!("{field}: {message}"))
        .collect();
    lines.push(missing_fields_message(result));
    lines
}
