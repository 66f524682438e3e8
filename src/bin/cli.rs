// src/bin/cli.rs
use carnabot_poller::{cli, log};
use color_eyre::eyre::{eyre, Result};

fn main() -> Result<()> {
    color_eyre::install()?;

    let args = cli::parse_args(std::env::args().skip(1)).map_err(|e| eyre!(e))?;
    if args.help {
        eprint!("{}", cli::HELP);
        return Ok(());
    }
    log::init(args.verbose, args.log_file.as_deref());

    // Any Err here (config, fetch, header, persist, lock) exits non-zero.
    // Failed alerts are in the report and do not fail the run.
    cli::run(&args).map_err(|e| eyre!(e))?;
    Ok(())
}
