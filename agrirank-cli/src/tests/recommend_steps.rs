//! Behaviour-driven step definitions driving the recommend CLI scenarios.

use super::helpers::{sample_query, write_query, write_reference_artefacts, write_utf8};
use super::*;
use crate::recommend::{
    DefaultRecommendPipelineBuilder, RecommendConfig, RecommendPipeline,
    RecommendPipelineBuilder, run_recommend_with,
};
use agrirank_core::test_support::{FixedClassifier, MemoryFactStore, reference_facts};
use agrirank_core::{
    CropClassifier, HybridRecommender, RecommendError, RecommendationResult, RetryingFactStore,
};
use agrirank_data::{DEFAULT_FACTS_FILE, reference_graph, write_fact_graph};
use agrirank_model::test_support::REFERENCE_PRIORS;
use camino::Utf8PathBuf;
use rstest::fixture;
use rstest_bdd_macros::{given, scenario, then, when};
use std::cell::RefCell;
use tempfile::TempDir;

#[derive(Debug)]
struct RecommendWorld {
    _tmp: TempDir,
    artefacts_dir: Utf8PathBuf,
    request_path: Utf8PathBuf,
    include_request: RefCell<bool>,
    store_unreachable: RefCell<bool>,
    cli_args: RefCell<Vec<String>>,
    stdout: RefCell<Vec<u8>>,
    result: RefCell<Option<Result<(), CliError>>>,
}

impl RecommendWorld {
    fn new() -> Self {
        let tmp = TempDir::new().expect("tempdir");
        let artefacts_dir =
            Utf8PathBuf::from_path_buf(tmp.path().to_path_buf()).expect("utf-8 workspace");
        let request_path = artefacts_dir.join("request.json");

        Self {
            _tmp: tmp,
            artefacts_dir,
            request_path,
            include_request: RefCell::new(true),
            store_unreachable: RefCell::new(false),
            cli_args: RefCell::new(Vec::new()),
            stdout: RefCell::new(Vec::new()),
            result: RefCell::new(None),
        }
    }

    fn build_command_line(&self) -> Vec<String> {
        let mut argv = vec!["agrirank".to_owned(), "recommend".to_owned()];
        if *self.include_request.borrow() {
            argv.push(self.request_path.as_str().to_owned());
        }
        argv.extend([
            format!("--{ARG_ARTEFACTS_DIR}"),
            self.artefacts_dir.as_str().to_owned(),
        ]);
        argv.extend(self.cli_args.borrow().iter().cloned());
        argv
    }

    fn error(&self) -> std::cell::Ref<'_, CliError> {
        std::cell::Ref::map(self.result.borrow(), |result| {
            result
                .as_ref()
                .expect("result recorded")
                .as_ref()
                .expect_err("expected error")
        })
    }
}

#[fixture]
fn world() -> RecommendWorld {
    RecommendWorld::new()
}

/// Serves the reference priors against a fact store that refuses every query.
struct UnreachableStoreBuilder;

impl RecommendPipelineBuilder for UnreachableStoreBuilder {
    fn build(&self, config: &RecommendConfig) -> Result<RecommendPipeline, CliError> {
        let classifier: Box<dyn CropClassifier> =
            Box::new(FixedClassifier::new(&REFERENCE_PRIORS));
        let store = MemoryFactStore::from_graph(reference_facts());
        store.set_unavailable(true);
        Ok(RecommendPipeline {
            recommender: HybridRecommender::new(classifier),
            store: Box::new(RetryingFactStore::new(store, config.retry)),
        })
    }
}

#[given("reference artefacts exist on disk")]
fn reference_artefacts_exist(#[from(world)] world: &RecommendWorld) {
    write_reference_artefacts(&world.artefacts_dir);
}

#[given("only the fact store exists on disk")]
fn only_fact_store_exists(#[from(world)] world: &RecommendWorld) {
    let graph = reference_graph().expect("reference catalogue");
    write_fact_graph(&world.artefacts_dir.join(DEFAULT_FACTS_FILE), &graph)
        .expect("write fact graph");
}

#[given("a request for the season {season} after {crop} exists on disk")]
fn request_exists(#[from(world)] world: &RecommendWorld, season: String, crop: String) {
    write_query(
        &world.request_path,
        &sample_query(Some(&crop), Some(&season), None),
    );
}

#[given("the request contains invalid JSON")]
fn request_contains_invalid_json(#[from(world)] world: &RecommendWorld) {
    write_utf8(&world.request_path, b"{ not valid json");
}

#[given("I omit the request path")]
fn omit_request_path(#[from(world)] world: &RecommendWorld) {
    *world.include_request.borrow_mut() = false;
}

#[given("I pass --top-k {count}")]
fn pass_top_k(#[from(world)] world: &RecommendWorld, count: usize) {
    world
        .cli_args
        .borrow_mut()
        .extend([format!("--{ARG_TOP_K}"), count.to_string()]);
}

#[given("the fact store is unreachable")]
fn fact_store_unreachable(#[from(world)] world: &RecommendWorld) {
    *world.store_unreachable.borrow_mut() = true;
}

#[when("I run the recommend command")]
fn run_recommend_command(#[from(world)] world: &RecommendWorld) {
    let invocation = world.build_command_line();
    let parsed = Cli::try_parse_from(invocation).map_err(CliError::from);
    let outcome = parsed.and_then(|cli| match cli.command {
        Command::Recommend(args) => {
            let mut buffer = world.stdout.borrow_mut();
            if *world.store_unreachable.borrow() {
                run_recommend_with(args, &UnreachableStoreBuilder, &mut *buffer)
            } else {
                run_recommend_with(args, &DefaultRecommendPipelineBuilder, &mut *buffer)
            }
        }
        Command::BuildGraph(_) => panic!("expected recommend command"),
    });

    world.result.replace(Some(outcome));
}

fn printed_result(world: &RecommendWorld) -> RecommendationResult {
    let stdout = String::from_utf8(world.stdout.borrow().clone()).expect("stdout utf-8");
    serde_json::from_str(&stdout).expect("output should be a JSON recommendation result")
}

#[then("the command succeeds and prints recommendations")]
fn command_succeeds(#[from(world)] world: &RecommendWorld) {
    let borrowed = world.result.borrow();
    let result = borrowed.as_ref().expect("result recorded");
    result.as_ref().expect("expected success");
    assert!(!printed_result(world).is_empty());
}

#[then("the recommended order is {order}")]
fn recommended_order(#[from(world)] world: &RecommendWorld, order: String) {
    let result = printed_result(world);
    let ranking: Vec<_> = result.iter().map(|r| r.crop.as_str()).collect();
    let expected: Vec<_> = order.split(',').map(str::trim).collect();
    assert_eq!(ranking, expected);
}

#[then("{crop} is recommended first with score {score}")]
fn recommended_first(#[from(world)] world: &RecommendWorld, crop: String, score: f64) {
    let result = printed_result(world);
    let best = result.best().expect("non-empty result");
    assert_eq!(best.crop.as_str(), crop);
    assert!((best.score - score).abs() < 1e-9, "score {}", best.score);
}

#[then("the command fails because the request JSON is invalid")]
fn command_fails_invalid_json(#[from(world)] world: &RecommendWorld) {
    match &*world.error() {
        CliError::ParseRequest { path, .. } => assert_eq!(*path, world.request_path),
        other => panic!("expected ParseRequest, found {other:?}"),
    }
}

#[then("the command fails because the request path is missing")]
fn command_fails_missing_request_path(#[from(world)] world: &RecommendWorld) {
    match &*world.error() {
        CliError::MissingArgument { field, .. } => assert_eq!(*field, ARG_REQUEST),
        other => panic!("expected MissingArgument, found {other:?}"),
    }
}

#[then("the command fails because the model artefact is missing")]
fn command_fails_missing_model(#[from(world)] world: &RecommendWorld) {
    match &*world.error() {
        CliError::MissingSourceFile { field, .. } => assert_eq!(*field, ARG_MODEL),
        other => panic!("expected MissingSourceFile, found {other:?}"),
    }
}

#[then("the command fails with a fact store error")]
fn command_fails_fact_store(#[from(world)] world: &RecommendWorld) {
    match &*world.error() {
        CliError::Recommend {
            source: RecommendError::FactStore(_),
            ..
        } => {}
        other => panic!("expected a fact store failure, found {other:?}"),
    }
}

#[then("nothing is printed")]
fn nothing_printed(#[from(world)] world: &RecommendWorld) {
    assert!(world.stdout.borrow().is_empty());
}

macro_rules! register_recommend_scenario {
    ($fn_name:ident, $scenario_title:literal) => {
        #[scenario(path = "tests/features/recommend_command.feature", name = $scenario_title)]
        fn $fn_name(#[from(world)] world: RecommendWorld) {
            let _ = world;
        }
    };
}

register_recommend_scenario!(recommend_happy_path, "recommending crops from a JSON request");
register_recommend_scenario!(recommend_invalid_json, "rejecting invalid JSON input");
register_recommend_scenario!(recommend_missing_request, "rejecting missing request paths");
register_recommend_scenario!(recommend_missing_model, "rejecting a missing crop model");
register_recommend_scenario!(
    recommend_unreachable_store,
    "failing when the fact store is unreachable"
);
