//! `asa completions` - Shell completion scripts
//!
//! The script covers every command group (campaigns, ad-groups, keywords,
//! reports, brand, optimize, impression-share) and their flags. Load it
//! once per shell:
//!
//! ```bash
//! source <(asa completions bash)                           # ~/.bashrc
//! source <(asa completions zsh)                            # ~/.zshrc
//! asa completions fish > ~/.config/fish/completions/asa.fish
//! asa completions powershell >> $PROFILE
//! ```

use clap::CommandFactory;
use clap_complete::{generate, Shell};
use miette::{IntoDiagnostic, Result};
use std::io::{self, Write};

use crate::cli::Cli;

const BIN_NAME: &str = "asa";

#[derive(clap::Args, Debug)]
pub struct CompletionsArgs {
    /// Target shell (bash, zsh, fish, powershell, elvish)
    #[arg(value_enum)]
    pub shell: Shell,
}

/// Completion script for `shell`
pub fn script(shell: Shell) -> Vec<u8> {
    let mut cmd = Cli::command();
    let mut buf = Vec::new();
    generate(shell, &mut cmd, BIN_NAME, &mut buf);
    buf
}

pub fn run(args: CompletionsArgs) -> Result<()> {
    io::stdout().write_all(&script(args.shell)).into_diagnostic()
}
