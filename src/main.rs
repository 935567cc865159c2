use clap::Parser;

use podem::cmd::{Cli, Commands};

fn main() {
    let cli = Cli::parse();
    match &cli.command {
        Commands::Show(args) => args.run(),
        Commands::Atpg(args) => args.run(),
        Commands::Collapse(args) => args.run(),
    }
}
