use clap::Parser;
use passvault::cli::commands::add::AddOptions;
use passvault::cli::{Cli, Commands};

fn main() {
    passvault::logging::init_tracing();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Keygen { force } => passvault::cli::commands::keygen::execute(&cli, force),
        Commands::Add {
            ref service,
            ref username,
            ref password,
            generate,
            length,
            skip_check,
        } => passvault::cli::commands::add::execute(
            &cli,
            &AddOptions {
                service: service.as_str(),
                username: username.as_deref(),
                password: password.as_deref(),
                generate,
                length,
                skip_check,
            },
        ),
        Commands::Get { ref service } => passvault::cli::commands::get::execute(&cli, service),
        Commands::List => passvault::cli::commands::list::execute(&cli),
        Commands::Generate { length } => passvault::cli::commands::generate::execute(&cli, length),
        Commands::Backup { ref dest } => {
            passvault::cli::commands::backup::execute_backup(&cli, dest.as_deref())
        }
        Commands::Restore { ref src, force } => {
            passvault::cli::commands::backup::execute_restore(&cli, src, force)
        }
        Commands::Completions { shell } => passvault::cli::commands::completions::execute(shell),
    };

    if let Err(e) = result {
        passvault::cli::output::error(&e.to_string());
        std::process::exit(1);
    }
}
