use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "hotkeys", about = "Resolve key combinations against a hotkey registry")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Replay a key event script against a set of bindings
    Replay {
        /// Script file (reads stdin when omitted)
        #[arg(long)]
        script: Option<PathBuf>,

        /// Binding spec: [group,group:]Key+Key[@priority]
        #[arg(long = "bind", value_name = "SPEC")]
        binds: Vec<String>,

        /// Enable only these groups (comma separated)
        #[arg(long, value_delimiter = ',')]
        groups: Option<Vec<String>>,

        /// Re-fire while a matched combination is held
        #[arg(long)]
        no_once: bool,

        /// Leave default handling of matched key-downs alone
        #[arg(long)]
        no_prevent_default: bool,

        /// Write fired callbacks to FILE as framed MessagePack records
        #[arg(long, value_name = "FILE")]
        report: Option<PathBuf>,
    },

    /// Validate binding specs and print their normalized signatures
    Check {
        /// Binding spec: [group,group:]Key+Key[@priority]
        #[arg(long = "bind", value_name = "SPEC", required = true)]
        binds: Vec<String>,
    },

    /// Print a report file written by `replay --report`
    Dump {
        /// Report file
        path: PathBuf,
    },
}
