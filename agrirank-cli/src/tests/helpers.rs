//! Test helpers for writing requests and artefacts into temporary workspaces.

use agrirank_core::{RecommendQuery, SoilReadings};
use agrirank_data::{DEFAULT_FACTS_FILE, reference_graph, write_fact_graph};
use agrirank_model::test_support::reference_parameters;
use agrirank_model::{DEFAULT_MODEL_FILE, write_model_file};
use camino::{Utf8Path, Utf8PathBuf};
use std::fs;
use tempfile::TempDir;

pub(super) fn write_utf8(path: &Utf8Path, contents: &[u8]) {
    fs::write(path.as_std_path(), contents).expect("write file");
}

pub(super) fn utf8_tempdir() -> (TempDir, Utf8PathBuf) {
    let tmp = TempDir::new().expect("tempdir");
    let root = Utf8PathBuf::from_path_buf(tmp.path().to_path_buf()).expect("utf-8 workspace");
    (tmp, root)
}

/// Write `crop_model.bin` and `facts.db` built from the reference fixtures.
pub(super) fn write_reference_artefacts(dir: &Utf8Path) {
    write_model_file(&dir.join(DEFAULT_MODEL_FILE), &reference_parameters())
        .expect("write crop model");
    let graph = reference_graph().expect("reference catalogue");
    write_fact_graph(&dir.join(DEFAULT_FACTS_FILE), &graph).expect("write fact graph");
}

pub(super) fn sample_query(
    previous_crop: Option<&str>,
    season: Option<&str>,
    top_k: Option<usize>,
) -> RecommendQuery {
    RecommendQuery {
        readings: SoilReadings {
            nitrogen: 90.0,
            phosphorus: 42.0,
            potassium: 43.0,
            temperature: 21.0,
            humidity: 82.0,
            ph: 6.5,
            rainfall: 200.0,
        },
        previous_crop: previous_crop.map(str::to_owned),
        season: season.map(str::to_owned),
        top_k,
    }
}

pub(super) fn write_query(path: &Utf8Path, query: &RecommendQuery) {
    let payload = serde_json::to_string_pretty(query).expect("serialise request");
    write_utf8(path, payload.as_bytes());
}
