//! Focused unit tests covering argument parsing for both subcommands.

use super::*;
use camino::Utf8PathBuf;
use rstest::rstest;

#[rstest]
fn parses_recommend_overrides() {
    let cli = Cli::try_parse_from([
        "agrirank",
        "recommend",
        "request.json",
        "--artefacts-dir",
        "artefacts",
        "--top-k",
        "3",
        "--fact-timeout-ms",
        "250",
        "--fact-retries",
        "0",
    ])
    .expect("arguments should parse");

    match cli.command {
        Command::Recommend(args) => {
            assert_eq!(args.request_path, Some(Utf8PathBuf::from("request.json")));
            assert_eq!(args.artefacts_dir, Some(Utf8PathBuf::from("artefacts")));
            assert_eq!(args.top_k, Some(3));
            assert_eq!(args.fact_timeout_ms, Some(250));
            assert_eq!(args.fact_retries, Some(0));
            assert_eq!(args.model, None);
        }
        Command::BuildGraph(_) => panic!("expected recommend command"),
    }
}

#[rstest]
fn parses_build_graph_paths() {
    let cli = Cli::try_parse_from([
        "agrirank",
        "build-graph",
        "--output",
        "out/facts.db",
        "--definition",
        "graph.json",
    ])
    .expect("arguments should parse");

    match cli.command {
        Command::BuildGraph(args) => {
            assert_eq!(args.output, Some(Utf8PathBuf::from("out/facts.db")));
            assert_eq!(args.definition, Some(Utf8PathBuf::from("graph.json")));
        }
        Command::Recommend(_) => panic!("expected build-graph command"),
    }
}

#[rstest]
#[case(&["agrirank", "recommend", "request.json", "--top-k", "three"])]
#[case(&["agrirank", "recommend", "request.json", "--fact-retries", "-1"])]
#[case(&["agrirank", "plant"])]
#[case(&["agrirank"])]
fn rejects_malformed_invocations(#[case] argv: &[&str]) {
    let err = Cli::try_parse_from(argv).map_err(CliError::from);
    match err {
        Err(CliError::ArgumentParsing(_)) => {}
        other => panic!("expected ArgumentParsing, found {other:?}"),
    }
}
