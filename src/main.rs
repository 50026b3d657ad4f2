use asa::cli::commands;
use asa::cli::{Cli, Commands};
use clap::Parser;
use miette::Result;
use tracing_subscriber::EnvFilter;

/// Log filter: `--verbose`, then `ASA_LOG`, then `RUST_LOG`, else warnings only
fn init_tracing(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("warn,asa=debug")
    } else {
        EnvFilter::try_from_env("ASA_LOG")
            .or_else(|_| EnvFilter::try_from_default_env())
            .unwrap_or_else(|_| EnvFilter::new("warn"))
    };

    // Logs go to stderr so stdout stays clean for JSON/CSV output
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(filter)
        .with_target(false)
        .init();
}

fn main() -> Result<()> {
    // Reset SIGPIPE so piping into `head` exits quietly instead of panicking
    #[cfg(unix)]
    {
        unsafe {
            libc::signal(libc::SIGPIPE, libc::SIG_DFL);
        }
    }
    miette::set_hook(Box::new(|_| {
        Box::new(
            miette::MietteHandlerOpts::new()
                .terminal_links(true)
                .unicode(true)
                .context_lines(2)
                .tab_width(4)
                .build(),
        )
    }))?;

    let cli = Cli::parse();
    let global = cli.global;
    init_tracing(global.verbose);

    match cli.command {
        Commands::Auth(cmd) => commands::auth::run(cmd, &global),
        Commands::Campaigns(cmd) => commands::campaigns::run(cmd, &global),
        Commands::AdGroups(cmd) => commands::ad_groups::run(cmd, &global),
        Commands::Keywords(cmd) => commands::keywords::run(cmd, &global),
        Commands::Reports(cmd) => commands::reports::run(cmd, &global),
        Commands::Brand(args) => commands::brand::run(args, &global),
        Commands::Optimize(cmd) => commands::optimize::run(cmd, &global),
        Commands::ImpressionShare(cmd) => commands::impression_share::run(cmd, &global),
        Commands::Completions(args) => commands::completions::run(args),
    }
}
