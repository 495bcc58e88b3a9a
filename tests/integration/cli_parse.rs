use clap::{CommandFactory, Parser};
use markdrive::tooling::cli::{Cli, Commands};

#[test]
fn parse_valid_command_matrix() {
    let cases: Vec<Vec<&str>> = vec![
        vec!["markdrive", "tree"],
        vec!["markdrive", "tree", "--format", "json"],
        vec!["markdrive", "folders"],
        vec!["markdrive", "ls", "Notes/Sub"],
        vec!["markdrive", "open", "Notes/a.md"],
        vec!["markdrive", "save", "Notes/a.md", "--file", "draft.md"],
        vec!["markdrive", "mkdir", "Journal", "--in", "Notes"],
        vec!["markdrive", "touch", "new.md"],
        vec!["markdrive", "mv", "Notes", "Archive", "--folder"],
        vec!["markdrive", "rm", "Notes/a.md"],
        vec!["markdrive", "history", "Notes/a.md"],
        vec!["markdrive", "version", "Notes/a.md", "3"],
        vec!["markdrive", "revert", "Notes/a.md", "3", "--comment", "undo"],
        vec!["markdrive", "search", "pears", "--regex"],
        vec!["markdrive", "attachments", "Notes/a.md"],
        vec!["markdrive", "cache", "list"],
        vec!["markdrive", "config", "show"],
        vec![
            "markdrive",
            "--config",
            "/tmp/markdrive.toml",
            "--log-output",
            "file",
            "folders",
        ],
    ];

    for args in cases {
        let parsed = Cli::try_parse_from(args.clone());
        assert!(parsed.is_ok(), "expected valid parse for args: {args:?}");
    }
}

#[test]
fn parse_rejects_bad_values() {
    assert!(Cli::try_parse_from(["markdrive", "version", "a.md", "latest"]).is_err());
    assert!(Cli::try_parse_from(["markdrive", "tree", "--format", "yaml"]).is_err());
    assert!(Cli::try_parse_from(["markdrive", "open"]).is_err());
}

#[test]
fn ls_folder_is_optional() {
    let cli = Cli::try_parse_from(["markdrive", "ls"]).unwrap();
    assert!(matches!(cli.command, Commands::Ls { folder: None, .. }));
}

#[test]
fn top_level_help_lists_every_command() {
    let mut command = Cli::command();
    let mut output = Vec::new();
    command.write_long_help(&mut output).unwrap();
    let output = String::from_utf8(output).unwrap();

    for name in [
        "tree", "folders", "ls", "open", "save", "mkdir", "touch", "mv", "rm", "history",
        "version", "revert", "search", "attachments", "cache", "config",
    ] {
        assert!(output.contains(name), "help is missing {}", name);
    }
}
