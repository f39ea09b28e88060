//! Command-line parsing and command routing.

use crate::commands;
use crate::logging;
use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::{generate, Shell};
use std::io;
use std::process;

/// A sound installation that turns bodies in front of a depth sensor into
/// gain curves and draws past and future spectra as 3D ribbons
#[derive(Parser)]
#[command(name = "depthwave")]
#[command(version)]
#[command(
    long_about = "A sound installation that turns bodies in front of a depth sensor into gain\ncurves and draws past and future spectra as 3D ribbons in the terminal.\n\nDEFAULT COMMAND:\n    If no command is specified, 'run' is used by default.\n\nKEYS:\n    q / Esc     quit\n    g           toggle the parameter panel (pins the camera)\n    b           toggle the bounding box\n    t           fire the test tone\n    [ / ]       lower or raise the distance threshold\n\nSIGNALS:\n    SIGUSR1     fire the test tone\n    SIGTERM     stop"
)]
#[command(
    after_help = "CONFIGURATION:\n    Config file:        ~/.config/depthwave/depthwave.toml\n    Logs:               ~/.local/state/depthwave/depthwave.log.*"
)]
struct Cli {
    /// Use a synthetic chord instead of the microphone (run default command)
    #[arg(long, global = true)]
    no_audio: bool,

    /// Override the configured frame rate (run default command)
    #[arg(long, value_name = "FPS", global = true)]
    fps: Option<u32>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the installation (default)
    #[command(visible_alias = "r")]
    Run,

    /// Open configuration file in your preferred editor
    ///
    /// Uses $EDITOR or falls back to nano/vi. The file is validated after
    /// the editor exits.
    #[command(visible_alias = "c")]
    Config,

    /// List available audio input devices
    #[command(name = "list-devices")]
    ListDevices,

    /// Show recent log entries
    ///
    /// Displays the last 50 lines of the most recent log file.
    Logs,

    /// Generate shell completion script
    ///
    /// Examples:
    ///   depthwave completions bash > depthwave.bash
    ///   depthwave completions zsh > _depthwave
    Completions {
        /// The shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

/// Parses the command line and runs the selected command.
///
/// # Exit Codes
/// - 0: Success
/// - 1: General error
/// - 2: Usage error (invalid arguments)
///
/// # Errors
/// - If logging initialization fails
/// - If writing the default configuration fails
/// - If the command fails
pub async fn run() -> Result<(), anyhow::Error> {
    let cli = Cli::parse();

    // Commands that need neither logging nor a config file
    match &cli.command {
        Some(Commands::Completions { shell }) => {
            generate(*shell, &mut Cli::command(), "depthwave", &mut io::stdout());
            return Ok(());
        }
        Some(Commands::ListDevices) => return exit_on_error(commands::handle_list_devices()),
        Some(Commands::Logs) => return exit_on_error(commands::handle_logs()),
        _ => {}
    }

    logging::init_logging()?;

    if crate::setup::run_setup()? {
        tracing::info!("First run: default configuration written");
    }

    match cli.command {
        None | Some(Commands::Run) => commands::handle_run(cli.no_audio, cli.fps).await?,
        Some(Commands::Config) => commands::handle_config()?,
        Some(Commands::Completions { .. }) | Some(Commands::ListDevices) | Some(Commands::Logs) => {
            unreachable!("These commands are handled earlier")
        }
    }

    Ok(())
}

fn exit_on_error(result: anyhow::Result<()>) -> anyhow::Result<()> {
    if let Err(e) = result {
        eprintln!("Error: {e}");
        process::exit(1);
    }
    Ok(())
}
