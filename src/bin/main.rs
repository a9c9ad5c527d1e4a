use std::process;

use clap::Parser;
use log::error;

use parser::Commands;

/// Parse command line arguments, set up logging and dispatch the requested
/// workflow.
fn main() {
    let cli = parser::Cli::parse();

    logger::Logger::init(cli.verbose + u8::from(!cli.quiet));

    if let Err(e) = cli.serialize() {
        error!("{e:?}");
        process::exit(1);
    }

    let result = match &cli.commands {
        Commands::Cluster { common, cluster } => comparison::run::cluster(common, cluster),
        Commands::Query { common, query }     => comparison::run::query(common, query),
    };

    if let Err(e) = result {
        error!("{e:?}");
        process::exit(1);
    }
}
