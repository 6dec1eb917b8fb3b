//! Entry point for the next-i18n-autopilot command line.

use std::io::Write;
use std::path::{
    Path,
    PathBuf,
};
use std::process::ExitCode;

use anyhow::Context;
use clap::{
    Args,
    Parser,
    Subcommand,
};
use next_i18n_autopilot::config::{
    Credentials,
    SettingsOverrides,
    resolve_settings,
};
use next_i18n_autopilot::{
    Command,
    Pipeline,
};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::prelude::*;

/// Moves literal UI text of a Next.js app into next-intl dictionaries and translates them.
#[derive(Parser, Debug)]
#[command(name = "next-i18n-autopilot", version, about)]
struct Cli {
    /// Command to run
    #[command(subcommand)]
    command: CliCommand,

    /// Options shared by every command
    #[command(flatten)]
    options: GlobalOptions,
}

/// Subcommands.
#[derive(Subcommand, Debug, Clone, Copy)]
enum CliCommand {
    /// Refactor eligible files, then translate everything the target locales are missing
    Run,
    /// Refactor eligible files and translate only the keys they introduce
    Refactor,
    /// Translate what the target locales are missing relative to the reference locale
    Translate,
}

impl From<CliCommand> for Command {
    fn from(command: CliCommand) -> Self {
        match command {
            CliCommand::Run => Self::Run,
            CliCommand::Refactor => Self::Refactor,
            CliCommand::Translate => Self::Translate,
        }
    }
}

/// Options shared by every subcommand. They override `.next-i18n-autopilot.json`.
#[derive(Args, Debug)]
struct GlobalOptions {
    /// Root of the Next.js project
    #[arg(long, global = true, value_name = "PATH", default_value = ".")]
    project_root: PathBuf,

    /// Discover files and count missing keys without calling the model or writing anything
    #[arg(long, global = true)]
    dry_run: bool,

    /// Model identifier
    #[arg(long, global = true)]
    model: Option<String>,

    /// Maximum number of outstanding model requests
    #[arg(long, global = true)]
    concurrency: Option<usize>,

    /// Target locales, comma separated (e.g. `fr,de,ja`)
    #[arg(long, global = true, value_delimiter = ',')]
    locales: Option<Vec<String>>,

    /// Locale whose dictionary is authoritative
    #[arg(long, global = true)]
    reference_locale: Option<String>,

    /// Folder holding `<locale>.json` files, relative to the project root
    #[arg(long, global = true, value_name = "PATH")]
    locales_folder: Option<PathBuf>,

    /// API key for the completion endpoint
    #[arg(long, global = true, env = "OPENAI_API_KEY", hide_env_values = true)]
    api_key: Option<String>,

    /// Log at debug level (RUST_LOG takes precedence)
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Also write logs to this file
    #[arg(long, global = true, value_name = "PATH")]
    log_file: Option<PathBuf>,
}

impl GlobalOptions {
    /// コマンドライン引数を設定の上書き値に変換する
    fn overrides(&self) -> SettingsOverrides {
        SettingsOverrides {
            reference_locale: self.reference_locale.clone(),
            additional_locales: self.locales.clone(),
            locales_folder: self.locales_folder.clone(),
            model: self.model.clone(),
            concurrency: self.concurrency,
            dry_run: self.dry_run,
        }
    }
}

/// tracing を初期化する
///
/// ログは stderr に出力する（stdout はサマリー専用）。`log_file` 指定時はファイルにも書き込む。
/// 戻り値の guard はプロセス終了まで保持すること。
fn init_logging(verbose: bool, log_file: Option<&Path>) -> anyhow::Result<Option<WorkerGuard>> {
    let default_level = if verbose { "debug" } else { "info" };
    let filter = || {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level))
    };
    let stderr_layer = tracing_subscriber::fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_filter(filter());

    let Some(path) = log_file else {
        tracing_subscriber::registry().with(stderr_layer).try_init()?;
        return Ok(None);
    };

    let file_name = path.file_name().context("--log-file must name a file")?;
    let dir = path.parent().filter(|p| !p.as_os_str().is_empty()).unwrap_or_else(|| Path::new("."));
    let (writer, guard) = tracing_appender::non_blocking(tracing_appender::rolling::never(dir, file_name));
    let file_layer =
        tracing_subscriber::fmt::layer().with_writer(writer).with_ansi(false).with_filter(filter());

    tracing_subscriber::registry().with(stderr_layer).with(file_layer).try_init()?;
    Ok(Some(guard))
}

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    let Cli { command, options } = Cli::parse();
    let _guard = init_logging(options.verbose, options.log_file.as_deref())?;

    let project_root = options
        .project_root
        .canonicalize()
        .with_context(|| format!("Project root not found: {}", options.project_root.display()))?;
    let settings = resolve_settings(&project_root, options.overrides())?;
    let credentials = options.api_key.and_then(Credentials::new);

    let mut pipeline = Pipeline::connect(project_root, settings, credentials)?;
    let summary = pipeline.run(command.into()).await?;

    write!(std::io::stdout().lock(), "{summary}")?;
    Ok(if summary.has_failures() { ExitCode::FAILURE } else { ExitCode::SUCCESS })
}
