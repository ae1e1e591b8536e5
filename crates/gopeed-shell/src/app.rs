use std::path::PathBuf;

use clap::{Arg, ArgAction, Command, value_parser};

pub fn build_cli() -> Command {
    Command::new("gopeed-shell")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Launch Gopeed, or hand links to the instance that is already running")
        .long_about("Starts the Gopeed desktop shell. When Gopeed is already running, the given arguments (typically gopeed:// deep links or magnet links) are forwarded to it and its window is restored and brought to the front instead of starting a second instance.")
        .arg(
            Arg::new("verbose")
                .short('v')
                .long("verbose")
                .help("Enable verbose logging output")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("config")
                .short('c')
                .long("config")
                .help("Config file layered over ~/.gopeed/shell.toml")
                .value_name("PATH")
                .value_parser(value_parser!(PathBuf)),
        )
        .arg(
            Arg::new("status")
                .long("status")
                .help("Print the running instance as JSON and exit")
                .action(ArgAction::SetTrue)
                .conflicts_with_all(["quit", "args"]),
        )
        .arg(
            Arg::new("quit")
                .long("quit")
                .help("Ask the running instance to exit")
                .action(ArgAction::SetTrue)
                .conflicts_with("args"),
        )
        .arg(
            Arg::new("args")
                .help("Activation arguments handed to Gopeed (use -- before arguments starting with '-')")
                .value_name("ARGS")
                .num_args(0..)
                .action(ArgAction::Append),
        )
}
