//! E2E tests for the `spotsearch` binary.
//!
//! Exercises the CLI surface end-to-end:
//! 1. help/version/completions/man render without a config
//! 2. `search` runs offline against a tempdir catalog and prints JSON
//! 3. `suggest` prints ids from the catalog pool
//! 4. input errors exit nonzero with a readable message on stderr

use assert_cmd::Command;
use predicates::str::contains;
use serde_json::Value;
use std::fs;
use tempfile::TempDir;

use spot_search::model::ImagePayload;
use spot_search::providers::offline::{ByteHistogramImageEmbedder, FnvTextEmbedder};

fn base_cmd() -> Command {
    let mut cmd = Command::new(assert_cmd::cargo::cargo_bin!("spotsearch"));
    // Ambient overrides would fight the per-test config files.
    for var in [
        "SPOTSEARCH_BIND_ADDR",
        "SPOTSEARCH_CATALOG",
        "SPOTSEARCH_FEATURES_DIR",
        "SPOTSEARCH_SUGGESTION_COUNT",
        "SPOTSEARCH_OFFLINE",
        "SPOTSEARCH_GATEWAY_URL",
    ] {
        cmd.env_remove(var);
    }
    cmd
}

/// Writes catalog + feature fixtures and a TOML config pointing at them,
/// returning the config path.
fn write_offline_config(dir: &TempDir) -> std::path::PathBuf {
    let text = FnvTextEmbedder::default();
    let image = ByteHistogramImageEmbedder::default();

    let catalog = serde_json::json!({
        "spots": [
            {"id": "temple", "name": "Golden Pavilion", "location": "Kyoto"},
            {"id": "garden", "name": "Moss Garden", "location": "Kyoto"},
            {"id": "castle", "name": "Osaka Castle", "location": "Osaka"},
        ],
        "query_images": ["img_001", "img_002", "img_003", "img_004"],
    });
    fs::write(dir.path().join("catalog.json"), catalog.to_string()).expect("write catalog");

    let text_features = serde_json::json!({
        "temple": text.embed_sync("golden pavilion zen temple kyoto"),
        "garden": text.embed_sync("moss garden bamboo walk kyoto"),
        "castle": text.embed_sync("osaka castle moat keep"),
    });
    let image_features = serde_json::json!({
        "temple": image.embed_sync(&ImagePayload::new(b"temple-image-bytes".to_vec())),
        "garden": image.embed_sync(&ImagePayload::new(b"garden-image-bytes".to_vec())),
        "castle": image.embed_sync(&ImagePayload::new(b"castle-image-bytes".to_vec())),
    });
    fs::create_dir_all(dir.path().join("features")).expect("features dir");
    fs::write(
        dir.path().join("features/text.json"),
        text_features.to_string(),
    )
    .expect("write text features");
    fs::write(
        dir.path().join("features/image.json"),
        image_features.to_string(),
    )
    .expect("write image features");

    let config_path = dir.path().join("spotsearch.toml");
    let config = format!(
        "catalog_path = \"{}\"\nfeatures_dir = \"{}\"\noffline = true\n",
        dir.path().join("catalog.json").display(),
        dir.path().join("features").display(),
    );
    fs::write(&config_path, config).expect("write config");
    config_path
}

fn stdout_json(output: &std::process::Output) -> Value {
    let stdout = String::from_utf8_lossy(&output.stdout);
    serde_json::from_str(stdout.trim()).expect("valid json on stdout")
}

#[test]
fn help_lists_the_subcommands() {
    let mut cmd = base_cmd();
    cmd.arg("--help");
    cmd.assert()
        .success()
        .stdout(contains("Multimodal spot search"))
        .stdout(contains("serve"))
        .stdout(contains("search"))
        .stdout(contains("suggest"))
        .stdout(contains("completions"));
}

#[test]
fn version_prints_the_package_version() {
    let mut cmd = base_cmd();
    cmd.arg("--version");
    cmd.assert()
        .success()
        .stdout(contains(env!("CARGO_PKG_VERSION")));
}

#[test]
fn completions_emit_a_script_for_the_binary() {
    let mut cmd = base_cmd();
    cmd.args(["completions", "bash"]);
    cmd.assert().success().stdout(contains("spotsearch"));
}

#[test]
fn man_page_renders_roff() {
    let mut cmd = base_cmd();
    cmd.arg("man");
    cmd.assert().success().stdout(contains(".TH"));
}

#[test]
fn offline_text_search_prints_ranked_json() {
    let dir = TempDir::new().expect("tempdir");
    let config = write_offline_config(&dir);

    let mut cmd = base_cmd();
    cmd.args([
        "--config",
        config.to_str().expect("utf8 path"),
        "search",
        "--text",
        "Kyoto golden pavilion zen temple",
        "--range",
        "0",
    ]);
    let output = cmd.assert().success().get_output().clone();

    let json = stdout_json(&output);
    assert_eq!(json["strategy"], "text_only");
    let results = json["results"].as_array().expect("results array");
    assert_eq!(results.len(), 2, "Osaka spot filtered out");
    assert_eq!(results[0]["id"], "temple");
    assert_eq!(results[0]["name"], "Golden Pavilion");
}

#[test]
fn offline_comparison_prints_one_slice_per_weight() {
    let dir = TempDir::new().expect("tempdir");
    let config = write_offline_config(&dir);

    // Both modalities supplied so no generation is needed offline.
    let image_path = dir.path().join("query.jpg");
    fs::write(&image_path, b"temple-image-bytes").expect("write query image");

    let mut cmd = base_cmd();
    cmd.args([
        "--config",
        config.to_str().expect("utf8 path"),
        "search",
        "--text",
        "Kyoto golden pavilion zen temple",
        "--image",
        image_path.to_str().expect("utf8 path"),
        "--compare",
        "--top",
        "2",
    ]);
    let output = cmd.assert().success().get_output().clone();

    let json = stdout_json(&output);
    let slices = json.as_array().expect("slice array");
    assert_eq!(slices.len(), 3);
    for slice in slices {
        assert!(slice["spots"].as_array().expect("spots").len() <= 2);
    }
}

#[test]
fn offline_suggest_prints_ids_from_the_pool() {
    let dir = TempDir::new().expect("tempdir");
    let config = write_offline_config(&dir);

    let mut cmd = base_cmd();
    cmd.args([
        "--config",
        config.to_str().expect("utf8 path"),
        "suggest",
        "--count",
        "3",
    ]);
    let output = cmd.assert().success().get_output().clone();

    let json = stdout_json(&output);
    let ids = json["suggested_images"].as_array().expect("ids array");
    assert_eq!(ids.len(), 3);
    for id in ids {
        assert!(id.as_str().expect("string id").starts_with("img_"));
    }
}

#[test]
fn search_without_any_input_fails() {
    let dir = TempDir::new().expect("tempdir");
    let config = write_offline_config(&dir);

    let mut cmd = base_cmd();
    cmd.args(["--config", config.to_str().expect("utf8 path"), "search"]);
    cmd.assert()
        .failure()
        .stderr(contains("supply text, an image, or both"));
}

#[test]
fn search_with_an_out_of_bounds_range_fails() {
    let dir = TempDir::new().expect("tempdir");
    let config = write_offline_config(&dir);

    let mut cmd = base_cmd();
    cmd.args([
        "--config",
        config.to_str().expect("utf8 path"),
        "search",
        "--text",
        "temples",
        "--range",
        "150",
    ]);
    cmd.assert().failure().stderr(contains("150"));
}

#[test]
fn missing_catalog_is_reported_on_stderr() {
    let dir = TempDir::new().expect("tempdir");
    let config_path = dir.path().join("spotsearch.toml");
    let config = format!(
        "catalog_path = \"{}\"\nfeatures_dir = \"{}\"\noffline = true\n",
        dir.path().join("nope.json").display(),
        dir.path().join("features").display(),
    );
    fs::write(&config_path, config).expect("write config");

    let mut cmd = base_cmd();
    cmd.args([
        "--config",
        config_path.to_str().expect("utf8 path"),
        "search",
        "--text",
        "temples",
        "--range",
        "0",
    ]);
    cmd.assert()
        .failure()
        .stderr(contains("catalog unavailable"));
}
