use clap::Parser;
use npm2stage::commands::{Config, install, status, uninstall};
use npm2stage::error::Error;
use npm2stage::progress::{FnProgress, Progress, Silent};
use npm2stage::runtime::RealRuntime;
use std::path::PathBuf;
use std::process::ExitCode;

const ADVICE_TO_UNINSTALL: &str = "
   The remains of a previous installation of npm-two-stage were found.
   This complicates the current installation, so it will be aborted.
   The best action to take now is to run `npm2stage uninstall` using the
   same npm-two-stage version as when the previous installation was run.";

/// npm2stage - installer for npm-two-stage
///
/// Patches an npm installation so that package installation can be split
/// into a download stage and an offline install stage, reverses the patch,
/// and reports whether it is applied.
///
/// NPM_PATH is the directory of the target npm installation (the one holding
/// its package.json and lib). Without it, the global npm is used.
///
/// Examples:
///   npm2stage status /usr/local/lib/node_modules/npm
///   npm2stage install /usr/local/lib/node_modules/npm
///   npm2stage uninstall --silent /usr/local/lib/node_modules/npm
#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Directory holding the npm-two-stage files to install (defaults to
    /// `src` beside the executable; also via NPM2STAGE_SRC)
    #[arg(long = "src", env = "NPM2STAGE_SRC", value_name = "DIR", global = true)]
    source_dir: Option<PathBuf>,

    /// JSON file describing the files to change and add (defaults to the
    /// built-in list for npm 6.13.4)
    #[arg(long, value_name = "FILE", global = true)]
    manifest: Option<PathBuf>,
}

#[derive(clap::Subcommand, Debug)]
enum Commands {
    /// Install npm-two-stage over the npm installation
    #[command(visible_alias = "i")]
    Install(ModifyArgs),

    /// Remove all traces of npm-two-stage from the npm installation
    #[command(visible_alias = "un")]
    Uninstall(ModifyArgs),

    /// Report the condition of npm-two-stage artifacts at the npm installation
    Status(StatusArgs),
}

#[derive(clap::Args, Debug)]
struct ModifyArgs {
    /// No console output unless error
    #[arg(short, long)]
    silent: bool,

    #[arg(value_name = "NPM_PATH")]
    npm_path: Option<PathBuf>,
}

#[derive(clap::Args, Debug)]
struct StatusArgs {
    #[arg(value_name = "NPM_PATH")]
    npm_path: Option<PathBuf>,
}

fn console(silent: bool) -> Box<dyn Progress> {
    if silent {
        Box::new(Silent)
    } else {
        Box::new(FnProgress(|message: &str| println!("   {}", message)))
    }
}

async fn run(cli: Cli) -> Result<(), Error> {
    let config = Config::new(RealRuntime, cli.source_dir, cli.manifest)?;

    match cli.command {
        Commands::Install(args) => {
            let mut progress = console(args.silent);
            if !args.silent {
                println!();
            }
            install(&config, args.npm_path.as_deref(), progress.as_mut()).await?;
            if !args.silent {
                println!("\n   Installation of npm-two-stage was successful.\n");
            }
        }
        Commands::Uninstall(args) => {
            let mut progress = console(args.silent);
            if !args.silent {
                println!();
            }
            uninstall(&config, args.npm_path.as_deref(), progress.as_mut()).await?;
            if !args.silent {
                println!("\n   Removal of npm-two-stage was successful.\n");
            }
        }
        Commands::Status(args) => {
            let mut progress = console(false);
            println!();
            status(&config, args.npm_path.as_deref(), progress.as_mut()).await?;
            println!();
        }
    }
    Ok(())
}

#[tokio::main]
async fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();
    let cli = Cli::parse();
    let advise_on_leftovers = matches!(&cli.command, Commands::Install(args) if !args.silent);

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("ERROR: {}", err);
            if advise_on_leftovers && matches!(err, Error::Leftovers { .. }) {
                eprintln!("{}", ADVICE_TO_UNINSTALL);
            }
            ExitCode::from(u8::try_from(err.exit_code()).unwrap_or(1))
        }
    }
}
