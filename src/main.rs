use std::io::{self, IsTerminal};
use std::process;

use clap::{CommandFactory, Parser, Subcommand, ValueEnum};
use clap_complete::{generate, shells};
use owo_colors::OwoColorize;
use seekgpt::commands::chat::{self, ChatArgs};
use seekgpt::commands::config::{self, ConfigArgs};
use seekgpt::commands::models::{self, ModelsArgs};
use tracing_subscriber::EnvFilter;

const VERSION: &str = concat!(
    env!("CARGO_PKG_VERSION"),
    "\ncommit: ",
    env!("SEEKGPT_GIT_SHA"),
    "\nbuilt: ",
    env!("SEEKGPT_BUILD_TS"),
    "\nextras: ",
    env!("SEEKGPT_EXTRAS"),
);

const ROOT_HELP_EXAMPLES: &str = "Examples:\n  seekgpt chat --model SeekGPT-mini \"What is the capital of France?\"\n  echo \"2+2?\" | seekgpt chat --profile work\n  seekgpt models\n  seekgpt completion bash > ~/.local/share/bash-completion/completions/seekgpt";

const CHAT_HELP_EXAMPLES: &str = "Examples:\n  seekgpt chat --model SeekGPT-mini \"What is the capital of France?\"\n  seekgpt chat --model SeekGPT-mini --dry-run --system \"Be brief.\" \"Explain retries\"\n  seekgpt chat --model SeekGPT-mini --stream \"Tell me a story\"";

#[derive(Debug, Parser)]
#[command(
    name = "seekgpt",
    about = "SeekGPT chat-completions client",
    version = VERSION,
    after_help = ROOT_HELP_EXAMPLES
)]
struct Cli {
    /// Log debug details to stderr.
    #[arg(long, short, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    #[command(about = "Send a chat completion request", after_help = CHAT_HELP_EXAMPLES)]
    Chat(ChatArgs),
    #[command(about = "List available models")]
    Models(ModelsArgs),
    #[command(about = "Manage local config")]
    Config(ConfigArgs),
    #[command(about = "Generate shell completion script")]
    Completion {
        #[arg(value_enum)]
        shell: CompletionShell,
    },
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum CompletionShell {
    Bash,
    Zsh,
    Fish,
}

fn print_completion(shell: CompletionShell) {
    let mut cmd = Cli::command();
    match shell {
        CompletionShell::Bash => generate(shells::Bash, &mut cmd, "seekgpt", &mut io::stdout()),
        CompletionShell::Zsh => generate(shells::Zsh, &mut cmd, "seekgpt", &mut io::stdout()),
        CompletionShell::Fish => generate(shells::Fish, &mut cmd, "seekgpt", &mut io::stdout()),
    }
}

fn init_tracing(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("seekgpt=debug")
    } else {
        EnvFilter::try_from_env("SEEKGPT_LOG").unwrap_or_else(|_| EnvFilter::new("warn"))
    };

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_ansi(io::stderr().is_terminal())
        .with_target(false)
        .try_init();
}

fn report(err: &anyhow::Error) {
    let missing_extra = err
        .downcast_ref::<seekgpt::Error>()
        .and_then(seekgpt::Error::missing_dependency)
        .is_some();

    if missing_extra || !io::stderr().is_terminal() {
        eprintln!("{err:#}");
    } else {
        eprintln!("{} {err:#}", "error:".red().bold());
    }
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let result = match cli.command {
        Commands::Chat(args) => chat::run(args).await,
        Commands::Models(args) => models::run(args).await,
        Commands::Config(args) => config::run(args),
        Commands::Completion { shell } => {
            print_completion(shell);
            Ok(())
        }
    };

    if let Err(err) = result {
        report(&err);
        process::exit(1);
    }
}
