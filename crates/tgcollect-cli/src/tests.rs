use super::*;

#[test]
fn no_command_is_none() {
    let cli = Cli::try_parse_from(["tgcollect"]).expect("expected valid cli args");
    assert!(cli.command.is_none());
}

#[test]
fn parses_run_command() {
    let cli = Cli::try_parse_from(["tgcollect", "run"]).expect("expected valid cli args");
    assert!(matches!(cli.command, Some(Commands::Run)));
}

#[test]
fn parses_once_command() {
    let cli = Cli::try_parse_from(["tgcollect", "once"]).expect("expected valid cli args");
    assert!(matches!(cli.command, Some(Commands::Once)));
}

#[test]
fn parses_session_command() {
    let cli = Cli::try_parse_from(["tgcollect", "session"]).expect("expected valid cli args");
    assert!(matches!(cli.command, Some(Commands::Session)));
}

#[test]
fn parses_db_init_command() {
    let cli = Cli::try_parse_from(["tgcollect", "db", "init"]).expect("expected valid cli args");

    assert!(matches!(
        cli.command,
        Some(Commands::Db {
            command: DbCommands::Init
        })
    ));
}

#[test]
fn parses_db_ping_command() {
    let cli = Cli::try_parse_from(["tgcollect", "db", "ping"]).expect("expected valid cli args");

    assert!(matches!(
        cli.command,
        Some(Commands::Db {
            command: DbCommands::Ping
        })
    ));
}

#[test]
fn db_without_subcommand_is_rejected() {
    assert!(Cli::try_parse_from(["tgcollect", "db"]).is_err());
}

#[test]
fn unknown_command_is_rejected() {
    assert!(Cli::try_parse_from(["tgcollect", "collect"]).is_err());
}

#[test]
fn critical_level_builds_a_filter() {
    assert!(EnvFilter::try_new(LogLevel::Critical.as_filter()).is_ok());
    assert!(EnvFilter::try_new(LogLevel::Warning.as_filter()).is_ok());
}
