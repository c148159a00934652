//! Argument parsing
//!
//! Built with the clap builder API; [`Invocation::from_matches`] turns the
//! matches into a typed command so the dispatch code never touches clap.

use clap::builder::PossibleValuesParser;
use clap::{value_parser, Arg, ArgAction, ArgMatches, Command};
use quill_artifact::ArtifactKind;
use std::path::PathBuf;

/// Default number of characters added per replayed delta
pub const DEFAULT_CHUNK: usize = 40;

/// Options shared by every subcommand
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GlobalArgs {
    pub verbose: u8,
    pub config: Option<PathBuf>,
}

/// A parsed subcommand
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Invocation {
    Classify {
        file: Option<PathBuf>,
        filename: Option<String>,
        scores: bool,
    },
    Replay {
        file: PathBuf,
        kind: ArtifactKind,
        chunk: usize,
        json: bool,
    },
    Run {
        file: PathBuf,
        images: Option<PathBuf>,
        json: bool,
    },
    Preview {
        files: Vec<PathBuf>,
        kind: ArtifactKind,
        output: Option<PathBuf>,
    },
}

fn kind_arg() -> Arg {
    Arg::new("kind")
        .long("kind")
        .default_value("code")
        .value_parser(PossibleValuesParser::new(["text", "code", "web"]))
        .help("Artifact kind the input is streamed into")
}

/// Build the `quill` command tree
#[must_use]
pub fn build_cli() -> Command {
    Command::new("quill")
        .version(crate::VERSION)
        .about("Stream, classify, preview and run generated artifacts")
        .subcommand_required(true)
        .arg_required_else_help(true)
        .arg(
            Arg::new("verbose")
                .short('v')
                .long("verbose")
                .action(ArgAction::Count)
                .global(true)
                .help("Raise log level (-v info, -vv debug)"),
        )
        .arg(
            Arg::new("config")
                .long("config")
                .value_name("PATH")
                .value_parser(value_parser!(PathBuf))
                .global(true)
                .help("Path to quill.toml"),
        )
        .subcommand(
            Command::new("classify")
                .about("Detect the language of a file or of stdin")
                .arg(
                    Arg::new("file")
                        .value_parser(value_parser!(PathBuf))
                        .help("Input file; stdin when omitted"),
                )
                .arg(
                    Arg::new("filename")
                        .long("filename")
                        .help("Filename hint, takes precedence over content"),
                )
                .arg(
                    Arg::new("scores")
                        .long("scores")
                        .action(ArgAction::SetTrue)
                        .help("Print the signature score of every language"),
                ),
        )
        .subcommand(
            Command::new("replay")
                .about("Replay a file as a generation stream and report what the document did")
                .arg(
                    Arg::new("file")
                        .required(true)
                        .value_parser(value_parser!(PathBuf)),
                )
                .arg(kind_arg())
                .arg(
                    Arg::new("chunk")
                        .long("chunk")
                        .default_value("40")
                        .value_parser(value_parser!(usize))
                        .help("Characters added per delta"),
                )
                .arg(
                    Arg::new("json")
                        .long("json")
                        .action(ArgAction::SetTrue)
                        .help("Print the persisted payload as JSON"),
                ),
        )
        .subcommand(
            Command::new("run")
                .about("Execute a Python file in the sandboxed interpreter")
                .arg(
                    Arg::new("file")
                        .required(true)
                        .value_parser(value_parser!(PathBuf)),
                )
                .arg(
                    Arg::new("images")
                        .long("images")
                        .value_name("DIR")
                        .value_parser(value_parser!(PathBuf))
                        .help("Write image outputs as PNG files into DIR"),
                )
                .arg(
                    Arg::new("json")
                        .long("json")
                        .action(ArgAction::SetTrue)
                        .help("Print the terminal run record as JSON"),
                ),
        )
        .subcommand(
            Command::new("preview")
                .about("Render the HTML preview of an artifact")
                .arg(
                    Arg::new("files")
                        .required(true)
                        .num_args(1..)
                        .value_parser(value_parser!(PathBuf))
                        .help("Input files; for web artifacts each file fills one buffer"),
                )
                .arg(kind_arg())
                .arg(
                    Arg::new("output")
                        .short('o')
                        .long("output")
                        .value_parser(value_parser!(PathBuf))
                        .help("Write the page to a file instead of stdout"),
                ),
        )
}

fn parse_kind(matches: &ArgMatches) -> ArtifactKind {
    match matches.get_one::<String>("kind").map(String::as_str) {
        Some("text") => ArtifactKind::Text,
        Some("web") => ArtifactKind::Web,
        _ => ArtifactKind::Code,
    }
}

fn required_path(matches: &ArgMatches, id: &str) -> Result<PathBuf, clap::Error> {
    matches
        .get_one::<PathBuf>(id)
        .cloned()
        .ok_or_else(|| clap::Error::raw(clap::error::ErrorKind::MissingRequiredArgument, format!("missing <{id}>\n")))
}

impl Invocation {
    /// Extract the global options and the subcommand
    pub fn from_matches(matches: &ArgMatches) -> Result<(GlobalArgs, Self), clap::Error> {
        let globals = GlobalArgs {
            verbose: matches.get_count("verbose"),
            config: matches.get_one::<PathBuf>("config").cloned(),
        };

        let invocation = match matches.subcommand() {
            Some(("classify", sub)) => Invocation::Classify {
                file: sub.get_one::<PathBuf>("file").cloned(),
                filename: sub.get_one::<String>("filename").cloned(),
                scores: sub.get_flag("scores"),
            },
            Some(("replay", sub)) => Invocation::Replay {
                file: required_path(sub, "file")?,
                kind: parse_kind(sub),
                chunk: sub.get_one::<usize>("chunk").copied().unwrap_or(DEFAULT_CHUNK),
                json: sub.get_flag("json"),
            },
            Some(("run", sub)) => Invocation::Run {
                file: required_path(sub, "file")?,
                images: sub.get_one::<PathBuf>("images").cloned(),
                json: sub.get_flag("json"),
            },
            Some(("preview", sub)) => Invocation::Preview {
                files: sub
                    .get_many::<PathBuf>("files")
                    .map(|files| files.cloned().collect())
                    .unwrap_or_default(),
                kind: parse_kind(sub),
                output: sub.get_one::<PathBuf>("output").cloned(),
            },
            _ => {
                return Err(clap::Error::raw(
                    clap::error::ErrorKind::MissingSubcommand,
                    "a subcommand is required\n",
                ))
            }
        };
        Ok((globals, invocation))
    }

    /// Parse an argument vector
    pub fn parse_from<I, T>(args: I) -> Result<(GlobalArgs, Self), clap::Error>
    where
        I: IntoIterator<Item = T>,
        T: Into<std::ffi::OsString> + Clone,
    {
        let matches = build_cli().try_get_matches_from(args)?;
        Self::from_matches(&matches)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn command_tree_is_consistent() {
        build_cli().debug_assert();
    }

    #[test]
    fn globals_are_accepted_after_subcommand() {
        let (globals, invocation) =
            Invocation::parse_from(["quill", "classify", "main.rs", "-vv", "--config", "quill.toml"]).unwrap();
        assert_eq!(globals.verbose, 2);
        assert_eq!(globals.config, Some(PathBuf::from("quill.toml")));
        assert_eq!(
            invocation,
            Invocation::Classify {
                file: Some(PathBuf::from("main.rs")),
                filename: None,
                scores: false,
            }
        );
    }

    #[test]
    fn replay_defaults() {
        let (_, invocation) = Invocation::parse_from(["quill", "replay", "page.html"]).unwrap();
        assert_eq!(
            invocation,
            Invocation::Replay {
                file: PathBuf::from("page.html"),
                kind: ArtifactKind::Code,
                chunk: DEFAULT_CHUNK,
                json: false,
            }
        );
    }

    #[test]
    fn preview_takes_several_files() {
        let (_, invocation) =
            Invocation::parse_from(["quill", "preview", "--kind", "web", "a.html", "a.css", "-o", "out.html"]).unwrap();
        match invocation {
            Invocation::Preview { files, kind, output } => {
                assert_eq!(files.len(), 2);
                assert_eq!(kind, ArtifactKind::Web);
                assert_eq!(output, Some(PathBuf::from("out.html")));
            }
            other => panic!("unexpected invocation: {other:?}"),
        }
    }

    #[test]
    fn unknown_kind_is_rejected() {
        assert!(Invocation::parse_from(["quill", "replay", "x", "--kind", "sheet"]).is_err());
        assert!(Invocation::parse_from(["quill"]).is_err());
    }
}
