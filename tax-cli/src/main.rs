use anyhow::{Context, Result};
use clap::Parser;
use tax_cli::{app, cli::Cli, logging};

fn main() -> Result<()> {
    let cli = Cli::parse();
    logging::init(cli.log_level.as_deref(), cli.log_file.as_deref())?;

    let data = app::load_data(cli.data_dir.as_deref())?;
    let report = app::run(&cli.command, &data)?;

    if cli.json {
        let json = serde_json::to_string_pretty(&report).context("Failed to serialize report")?;
        println!("{json}");
    } else {
        print!("{report}");
    }

    Ok(())
}
