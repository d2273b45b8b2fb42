mod commands;

use clap::{Parser, Subcommand, ValueEnum};
use clap_complete::Shell;
use commands::EXIT_FAILURE;
use std::path::PathBuf;
use std::process::ExitCode;
use toolbox_core::{install_signal_handler, EntryConfig};
use toolbox_runtime::host::{is_inside_container, is_inside_toolbox_container};
use toolbox_runtime::{HostUser, PodmanEngine};
use toolbox_schema::{HostOs, ToolboxConfig};

#[derive(Debug, Parser)]
#[command(
    name = "toolbox",
    version,
    about = "Interactive command line environments in containers"
)]
struct Cli {
    /// Automatically answer yes for all questions.
    #[arg(short = 'y', long = "assumeyes", default_value_t = false, global = true)]
    assume_yes: bool,

    /// Log messages at or above this level.
    #[arg(long, value_enum, global = true)]
    log_level: Option<LogLevel>,

    /// Enable verbose (debug) logging output.
    #[arg(short, long, default_value_t = false, global = true)]
    verbose: bool,

    /// Enable trace-level logging (more detailed than --verbose).
    #[arg(long, default_value_t = false, global = true)]
    trace: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    fn as_str(self) -> &'static str {
        match self {
            Self::Error => "error",
            Self::Warn => "warn",
            Self::Info => "info",
            Self::Debug => "debug",
            Self::Trace => "trace",
        }
    }
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Enter a toolbox container for interactive use.
    Enter {
        /// Name of the toolbox container to enter.
        #[arg(value_name = "CONTAINER")]
        name: Option<String>,
        /// Enter a toolbox container with the given name.
        #[arg(short, long)]
        container: Option<String>,
        /// Enter a toolbox container for a different operating system release.
        #[arg(short, long)]
        release: Option<String>,
    },
    /// Run a command in an existing toolbox container.
    Run {
        /// Run the command inside a toolbox container with the given name.
        #[arg(short, long)]
        container: Option<String>,
        /// Run the command inside a toolbox container for a different release.
        #[arg(short, long)]
        release: Option<String>,
        /// Command and arguments to run.
        #[arg(required = true, trailing_var_arg = true, allow_hyphen_values = true)]
        command: Vec<String>,
    },
    /// List existing toolbox containers.
    List {
        /// Output the containers as JSON.
        #[arg(long, default_value_t = false)]
        json: bool,
    },
    /// Generate shell completions for bash, zsh, fish, elvish, or powershell.
    Completions {
        /// Shell to generate completions for.
        shell: Shell,
    },
    /// Generate man pages in the specified directory.
    ManPages {
        /// Output directory for man pages.
        #[arg(default_value = "man")]
        dir: PathBuf,
    },
    /// Entry point of toolbox containers.
    #[command(hide = true)]
    InitContainer {
        /// Home directory of the user.
        #[arg(long)]
        home: PathBuf,
        /// Login shell of the user.
        #[arg(long)]
        shell: String,
        /// UID of the user.
        #[arg(long)]
        uid: u32,
        /// Name of the user.
        #[arg(long)]
        user: String,
        /// Directory for the readiness stamp.
        #[arg(long)]
        runtime_dir: Option<PathBuf>,
    },
}

fn main() -> ExitCode {
    let default_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |info| {
        let msg = info.to_string();
        if msg.contains("Broken pipe")
            || msg.contains("broken pipe")
            || msg.contains("os error 32")
            || msg.contains("failed printing to stdout")
        {
            std::process::exit(0);
        }
        default_hook(info);
    }));

    let cli = Cli::parse();

    let level = if cli.trace {
        LogLevel::Trace
    } else if cli.verbose {
        LogLevel::Debug
    } else {
        cli.log_level.unwrap_or(LogLevel::Warn)
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_env("TOOLBOX_LOG")
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(level.as_str())),
        )
        .with_target(false)
        .without_time()
        .with_writer(std::io::stderr)
        .init();

    install_signal_handler();

    let needs_engine = matches!(
        cli.command,
        Commands::Enter { .. } | Commands::Run { .. } | Commands::List { .. }
    );

    if needs_engine && is_inside_container() {
        if !is_inside_toolbox_container() {
            eprintln!("error: this is not a toolbox container");
            return ExitCode::from(EXIT_FAILURE);
        }
        return match commands::forward_to_host() {
            Ok(code) => ExitCode::from(code),
            Err(msg) => {
                eprintln!("error: {msg}");
                ExitCode::from(EXIT_FAILURE)
            }
        };
    }

    let program = std::env::var("TOOLBOX_ENGINE")
        .ok()
        .filter(|p| !p.is_empty())
        .unwrap_or_else(|| "podman".to_owned());
    let engine = PodmanEngine::new(program, engine_log_level(level));

    if needs_engine && std::env::var("TOOLBOX_SKIP_PREREQS").as_deref() != Ok("1") {
        let missing = toolbox_runtime::check_engine_prereqs(engine.program());
        if !missing.is_empty() {
            eprintln!("error: {}", toolbox_runtime::format_missing(&missing));
            return ExitCode::from(EXIT_FAILURE);
        }
    }

    let result = match cli.command {
        Commands::Enter {
            name,
            container,
            release,
        } => load_settings(cli.assume_yes, level).and_then(|(config, host, defaults)| {
            commands::enter::run(
                &engine,
                &config,
                &host,
                &defaults,
                name.as_deref(),
                container.as_deref(),
                release.as_deref(),
            )
        }),
        Commands::Run {
            container,
            release,
            command,
        } => load_settings(cli.assume_yes, level).and_then(|(config, host, defaults)| {
            commands::run::run(
                &engine,
                &config,
                &host,
                &defaults,
                container.as_deref(),
                release.as_deref(),
                &command,
            )
        }),
        Commands::List { json } => commands::list::run(&engine, json),
        Commands::Completions { shell } => commands::completions::run::<Cli>(shell),
        Commands::ManPages { dir } => commands::man_pages::run::<Cli>(&dir),
        Commands::InitContainer {
            home,
            shell,
            uid,
            user,
            runtime_dir,
        } => commands::init_container::run(&commands::init_container::InitOptions {
            home,
            shell,
            uid,
            user,
            runtime_dir,
        }),
    };

    match result {
        Ok(code) => ExitCode::from(code),
        Err(msg) => {
            eprintln!("error: {msg}");
            ExitCode::from(EXIT_FAILURE)
        }
    }
}

/// The engine stays quiet unless debugging was asked for.
fn engine_log_level(level: LogLevel) -> &'static str {
    match level {
        LogLevel::Debug | LogLevel::Trace => level.as_str(),
        LogLevel::Error | LogLevel::Warn | LogLevel::Info => "error",
    }
}

fn load_settings(
    assume_yes: bool,
    level: LogLevel,
) -> Result<(EntryConfig, HostOs, toolbox_schema::GeneralSection), String> {
    let file = ToolboxConfig::load_default().map_err(|e| format!("configuration error: {e}"))?;
    let host = HostOs::detect().unwrap_or_else(|e| {
        tracing::warn!("failed to read os-release: {e}");
        HostOs::default()
    });
    let runtime_dir = HostUser::current().runtime_dir();
    let config = EntryConfig::new(assume_yes, engine_log_level(level), runtime_dir);
    Ok((config, host, file.general))
}
