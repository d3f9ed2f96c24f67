use clap::builder::{OsStringValueParser, PossibleValuesParser, RangedU64ValueParser};
use clap::{Arg, ArgAction, Command};

pub(crate) fn clap_command(program_name: &'static str) -> Command {
    Command::new(program_name)
        .version(env!("CARGO_PKG_VERSION"))
        .about("Walk directory trees lazily, in either direction")
        .disable_help_subcommand(true)
        .arg(
            Arg::new("paths")
                .value_name("PATH")
                .help("Files or directories to browse, in order.")
                .required(true)
                .num_args(1..)
                .action(ArgAction::Append)
                .value_parser(OsStringValueParser::new()),
        )
        .arg(
            Arg::new("config")
                .long("config")
                .short('c')
                .value_name("FILE")
                .help("Read settings from a TOML file; flags take precedence.")
                .value_parser(OsStringValueParser::new()),
        )
        .arg(
            Arg::new("cache-size")
                .long("cache-size")
                .value_name("ENTRIES")
                .help("Buffered entries kept for revisited directories (0 disables caching).")
                .value_parser(RangedU64ValueParser::<usize>::new()),
        )
        .arg(
            Arg::new("mode")
                .long("mode")
                .value_name("MODE")
                .help("Flatten heterogeneous levels as-is or regroup them into runs.")
                .value_parser(PossibleValuesParser::new(["hetero", "homo"])),
        )
        .arg(
            Arg::new("ext")
                .long("ext")
                .short('e')
                .value_name("EXT")
                .help("Only show files with this extension (repeatable).")
                .action(ArgAction::Append),
        )
        .arg(
            Arg::new("follow-symlinks")
                .long("follow-symlinks")
                .short('L')
                .help("Descend into symlinked directories.")
                .action(ArgAction::SetTrue)
                .overrides_with("no-follow-symlinks"),
        )
        .arg(
            Arg::new("no-follow-symlinks")
                .long("no-follow-symlinks")
                .help("Skip symbolic links.")
                .action(ArgAction::SetTrue)
                .overrides_with("follow-symlinks"),
        )
        .arg(
            Arg::new("reverse")
                .long("reverse")
                .short('r')
                .help("Start at the end and walk backward.")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("limit")
                .long("limit")
                .short('n')
                .value_name("COUNT")
                .help("Stop after COUNT entries.")
                .value_parser(RangedU64ValueParser::<usize>::new()),
        )
        .arg(
            Arg::new("script")
                .long("script")
                .value_name("COMMANDS")
                .help("Drive the cursor with n/p/^/$ commands instead of a full walk.")
                .conflicts_with_all(["reverse", "limit"]),
        )
        .arg(
            Arg::new("verbose")
                .long("verbose")
                .short('v')
                .help("Increase diagnostic verbosity (repeatable).")
                .action(ArgAction::Count),
        )
}
