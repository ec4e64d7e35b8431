use super::*;

#[test]
fn parses_discover_with_flags() {
    let cli = Cli::try_parse_from(["collab-cli", "discover", "graza.co", "--fresh", "--verify-seeds"])
        .expect("expected valid cli args");

    assert!(matches!(
        cli.command,
        Commands::Discover {
            ref url,
            fresh: true,
            verify_seeds: true,
        } if url == "graza.co"
    ));
}

#[test]
fn discover_defaults_to_cached_sourcing() {
    let cli = Cli::try_parse_from(["collab-cli", "discover", "https://graza.co"])
        .expect("expected valid cli args");

    assert!(matches!(
        cli.command,
        Commands::Discover {
            fresh: false,
            verify_seeds: false,
            ..
        }
    ));
}

#[test]
fn parses_history_subcommands() {
    let list = Cli::try_parse_from(["collab-cli", "history", "list"]).expect("expected valid cli args");
    assert!(matches!(
        list.command,
        Commands::History {
            command: HistoryCommands::List
        }
    ));

    let remove = Cli::try_parse_from(["collab-cli", "history", "remove", "graza.co"])
        .expect("expected valid cli args");
    assert!(matches!(
        remove.command,
        Commands::History {
            command: HistoryCommands::Remove { ref domain }
        } if domain == "graza.co"
    ));

    let clear = Cli::try_parse_from(["collab-cli", "history", "clear"]).expect("expected valid cli args");
    assert!(matches!(
        clear.command,
        Commands::History {
            command: HistoryCommands::Clear
        }
    ));
}

#[test]
fn feedback_rating_accepts_aliases() {
    let cli = Cli::try_parse_from(["collab-cli", "feedback", "graza.co", "up"])
        .expect("expected valid cli args");
    assert!(matches!(
        cli.command,
        Commands::Feedback {
            rating: Rating::Positive,
            ..
        }
    ));
}

#[test]
fn feedback_rejects_unknown_rating() {
    assert!(Cli::try_parse_from(["collab-cli", "feedback", "graza.co", "meh"]).is_err());
}

#[test]
fn verify_requires_brand() {
    assert!(Cli::try_parse_from(["collab-cli", "verify", "Smoked Salmon"]).is_err());

    let cli = Cli::try_parse_from([
        "collab-cli",
        "verify",
        "Smoked Salmon",
        "--brand",
        "Fishwife",
    ])
    .expect("expected valid cli args");
    assert!(matches!(
        cli.command,
        Commands::Verify {
            ref brand,
            domain: None,
            ..
        } if brand == "Fishwife"
    ));
}

#[test]
fn missing_subcommand_is_an_error() {
    assert!(Cli::try_parse_from(["collab-cli"]).is_err());
}
