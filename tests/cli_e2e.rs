//! End-to-end CLI tests for the picture-downloader binary.

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Binary command isolated from the developer's environment and `.env`.
fn picture_downloader(workdir: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("picture-downloader").unwrap();
    cmd.current_dir(workdir.path())
        .env_remove("RUST_LOG")
        .env_remove("CHAT_ID")
        .env_remove("AUTHORIZATION")
        .env_remove("NAMING_ENDPOINT");
    cmd
}

/// Test that --help displays usage information and exits with code 0.
#[test]
fn test_binary_help_displays_usage() {
    let workdir = TempDir::new().unwrap();
    picture_downloader(&workdir)
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("Download the pictures on a web page"))
        .stdout(predicate::str::contains("--no-ai-naming"));
}

/// Test that --version displays version and exits with code 0.
#[test]
fn test_binary_version_displays_version() {
    let workdir = TempDir::new().unwrap();
    picture_downloader(&workdir)
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("picture-downloader"));
}

/// Test that invalid flags cause non-zero exit.
#[test]
fn test_binary_invalid_flag_returns_error() {
    let workdir = TempDir::new().unwrap();
    picture_downloader(&workdir)
        .arg("--invalid-flag")
        .assert()
        .failure()
        .stderr(predicate::str::contains("error"));
}

/// Test that the required arguments are enforced.
#[test]
fn test_binary_missing_required_args_returns_error() {
    let workdir = TempDir::new().unwrap();
    picture_downloader(&workdir)
        .args(["-s", "img"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("--url"));
}

/// Test that a missing output directory exits with the generic failure code.
#[test]
fn test_binary_missing_output_dir_exits_one() {
    let workdir = TempDir::new().unwrap();
    let missing = workdir.path().join("absent");
    picture_downloader(&workdir)
        .args(["-u", "http://127.0.0.1:1/gallery", "-s", "img", "--no-ai-naming", "-o"])
        .arg(&missing)
        .assert()
        .code(1)
        .stderr(predicate::str::contains("does not exist"));
}

/// Test that naming without credentials fails before any work.
#[test]
fn test_binary_naming_without_credentials_exits_one() {
    let workdir = TempDir::new().unwrap();
    picture_downloader(&workdir)
        .args(["-u", "http://127.0.0.1:1/gallery", "-s", "img", "-o", "."])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("CHAT_ID"));
}

/// Test that an unreachable page exits with the network failure code.
#[test]
fn test_binary_unreachable_page_exits_two() {
    let workdir = TempDir::new().unwrap();
    picture_downloader(&workdir)
        .args(["-u", "http://127.0.0.1:1/gallery", "-s", "img", "-o", ".", "--no-ai-naming", "-q"])
        .assert()
        .code(2);
}

/// Test a full run against a mock gallery.
#[tokio::test(flavor = "multi_thread")]
async fn test_binary_downloads_gallery_and_lists_names() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/gallery"))
        .respond_with(ResponseTemplate::new(200).set_body_string(
            r#"<html><body><img class="p" src="/img/one.jpg"><img class="p" src="/img/two.png"></body></html>"#,
        ))
        .mount(&server)
        .await;
    for image in ["/img/one.jpg", "/img/two.png"] {
        Mock::given(method("GET"))
            .and(path(image))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(b"bytes".to_vec()))
            .mount(&server)
            .await;
    }

    let workdir = TempDir::new().unwrap();
    let url = format!("{}/gallery", server.uri());
    picture_downloader(&workdir)
        .args(["-u", &url, "-s", "img.p", "-o", ".", "--no-ai-naming", "--pace-ms", "0", "-c", "2"])
        .assert()
        .success()
        .stdout(predicate::str::diff("one.jpg\ntwo.png\n"));

    assert!(workdir.path().join("one.jpg").is_file());
    assert!(workdir.path().join("two.png").is_file());
}

/// Test that a page without matches is a warning, not a failure.
#[tokio::test(flavor = "multi_thread")]
async fn test_binary_no_images_found_exits_zero() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html><body>empty</body></html>"))
        .mount(&server)
        .await;

    let workdir = TempDir::new().unwrap();
    picture_downloader(&workdir)
        .args(["-u", &server.uri(), "-s", "img", "-o", ".", "--no-ai-naming"])
        .assert()
        .success()
        .stderr(predicate::str::contains("no images found"));
}
