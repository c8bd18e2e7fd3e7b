//! Configuration layering for the `add` and `list` subcommands.

use super::*;
use camino::Utf8PathBuf;
use ortho_config::MergeComposer;
use rstest::rstest;
use serde_json::json;

#[rstest]
fn add_defaults_to_stdin_and_local_database() {
    let config = add::AddConfig::from(add::AddArgs::default());
    assert_eq!(config.batch, add::BatchSource::Stdin);
    assert_eq!(config.database, Utf8PathBuf::from("data.sqlite"));
}

#[rstest]
fn list_keeps_filter_values_raw() {
    let args = list::ListArgs {
        database: Some(Utf8PathBuf::from("guesses.sqlite")),
        id: Some(" 7 ".into()),
        min_distance: Some("12abc".into()),
        format: Some("short".into()),
    };
    let config = list::ListConfig::from(args);
    assert_eq!(config.database, Utf8PathBuf::from("guesses.sqlite"));
    assert_eq!(config.params.id.as_deref(), Some(" 7 "));
    assert_eq!(config.params.min_distance.as_deref(), Some("12abc"));
    assert_eq!(config.params.format.as_deref(), Some("short"));
}

#[rstest]
fn list_flags_parse_into_args() {
    let cli = Cli::try_parse_from([
        "panoguess",
        "list",
        "--id",
        "3",
        "--min-distance",
        "2.5",
        "--format",
        "short",
    ])
    .expect("arguments should parse");
    match cli.command {
        Command::List(args) => {
            assert_eq!(args.id.as_deref(), Some("3"));
            assert_eq!(args.min_distance.as_deref(), Some("2.5"));
            assert_eq!(args.format.as_deref(), Some("short"));
            assert_eq!(args.database, None);
        }
        other => panic!("expected list command, found {other:?}"),
    }
}

#[rstest]
fn merge_layers_maps_configuration_errors() {
    let mut composer = MergeComposer::new();
    composer.push_cli(json!({ "database": 42 }));

    let err = add::config_from_layers_for_test(composer.layers())
        .expect_err("invalid config layer should map to CliError::Configuration");
    match err {
        CliError::Configuration(_) => {}
        other => panic!("expected CliError::Configuration, found {other:?}"),
    }
}

#[rstest]
fn merge_layers_honours_precedence() {
    let mut composer = MergeComposer::new();
    composer.push_file(
        json!({
            "database": "from-file.sqlite",
            "format": "short",
        }),
        None,
    );
    composer.push_environment(json!({
        "database": "from-env.sqlite",
        "min_distance": "10",
    }));
    composer.push_cli(json!({
        "database": "from-cli.sqlite",
    }));

    let config =
        list::config_from_layers_for_test(composer.layers()).expect("merged config should build");
    assert_eq!(config.database, Utf8PathBuf::from("from-cli.sqlite"));
    assert_eq!(config.params.min_distance.as_deref(), Some("10"));
    assert_eq!(config.params.format.as_deref(), Some("short"));
    assert_eq!(config.params.id, None);
}
