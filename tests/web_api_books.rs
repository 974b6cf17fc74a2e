//! Web API Book Tests
//!
//! Integration tests for the upload, list, download and delete endpoints.

use axum::http::StatusCode;
use axum_test::multipart::{MultipartForm, Part};
use axum_test::TestServer;
use bookshelf::web::handlers::AppState;
use bookshelf::web::router::create_router;
use bookshelf::Catalog;
use serde_json::Value;
use std::sync::Arc;
use tempfile::TempDir;

const MAX_UPLOAD_SIZE: u64 = 10 * 1024 * 1024;

/// Create a test server backed by a temporary upload directory.
fn create_test_server(max_upload_size: u64) -> (TestServer, TempDir) {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let catalog =
        Catalog::new(temp_dir.path(), "metadata.json").expect("Failed to create catalog");

    let app_state = Arc::new(AppState::new(catalog, max_upload_size));
    let router = create_router(app_state, &[]);

    let server = TestServer::new(router).expect("Failed to create test server");
    (server, temp_dir)
}

/// Build a multipart form with a single `file` field.
fn file_form(name: &str, content: &[u8], mime: &str) -> MultipartForm {
    let part = Part::bytes(content.to_vec())
        .file_name(name)
        .mime_type(mime);
    MultipartForm::new().add_part("file", part)
}

/// Upload a file and return the created record.
async fn upload(server: &TestServer, name: &str, content: &[u8]) -> Value {
    let response = server
        .post("/upload")
        .multipart(file_form(name, content, "text/plain"))
        .await;
    response.assert_status(StatusCode::CREATED);
    response.json::<Value>()["data"].clone()
}

async fn list(server: &TestServer) -> Vec<Value> {
    let response = server.get("/api/books").await;
    response.assert_status_ok();
    response.json::<Value>()["data"]
        .as_array()
        .cloned()
        .unwrap_or_default()
}

fn read_metadata(dir: &TempDir) -> Value {
    let text = std::fs::read_to_string(dir.path().join("metadata.json")).unwrap();
    serde_json::from_str(&text).unwrap()
}

// ============================================================================
// Upload Tests
// ============================================================================

#[tokio::test]
async fn test_upload_then_list() {
    let (server, dir) = create_test_server(MAX_UPLOAD_SIZE);

    let record = upload(&server, "a.txt", b"hello").await;
    assert_eq!(record["name"], "a.txt");
    assert_eq!(record["content_type"], "text/plain");
    assert_eq!(record["size"], 5);

    let id = record["id"].as_str().unwrap();
    assert_eq!(record["download_url"], format!("/download/{}", id));

    let books = list(&server).await;
    assert_eq!(books.len(), 1);
    assert_eq!(books[0]["id"], id);

    assert_eq!(std::fs::read(dir.path().join("a.txt")).unwrap(), b"hello");

    let metadata = read_metadata(&dir);
    assert_eq!(metadata[id]["name"], "a.txt");
    assert_eq!(metadata[id]["type"], "text/plain");
    assert_eq!(metadata[id]["size"], "5");
}

#[tokio::test]
async fn test_upload_id_format() {
    let (server, _dir) = create_test_server(MAX_UPLOAD_SIZE);

    let record = upload(&server, "a.txt", b"hello").await;
    let id = record["id"].as_str().unwrap();

    // yyyyMMdd_HHmmss_xxxxxxxx
    let parts: Vec<&str> = id.split('_').collect();
    assert_eq!(parts.len(), 3);
    assert_eq!(parts[0].len(), 8);
    assert_eq!(parts[1].len(), 6);
    assert_eq!(parts[2].len(), 8);
    assert!(parts[0].chars().all(|c| c.is_ascii_digit()));
    assert!(parts[1].chars().all(|c| c.is_ascii_digit()));
    assert!(parts[2].chars().all(|c| c.is_ascii_hexdigit()));
}

#[tokio::test]
async fn test_upload_duplicate_same_size() {
    let (server, dir) = create_test_server(MAX_UPLOAD_SIZE);

    upload(&server, "a.txt", b"hello").await;

    let response = server
        .post("/upload")
        .multipart(file_form("a.txt", b"world", "text/plain"))
        .await;
    response.assert_status(StatusCode::CONFLICT);

    let json: Value = response.json();
    assert_eq!(json["error"]["code"], "CONFLICT");

    assert_eq!(list(&server).await.len(), 1);
    // The original content is kept
    assert_eq!(std::fs::read(dir.path().join("a.txt")).unwrap(), b"hello");
}

#[tokio::test]
async fn test_upload_duplicate_different_size() {
    let (server, dir) = create_test_server(MAX_UPLOAD_SIZE);

    upload(&server, "a.txt", b"hello").await;

    let response = server
        .post("/upload")
        .multipart(file_form("a.txt", b"a much longer body", "text/plain"))
        .await;
    response.assert_status(StatusCode::CONFLICT);

    let json: Value = response.json();
    assert!(json["error"]["message"]
        .as_str()
        .unwrap()
        .contains("different"));

    assert_eq!(list(&server).await.len(), 1);
    assert_eq!(std::fs::read(dir.path().join("a.txt")).unwrap(), b"hello");
}

#[tokio::test]
async fn test_upload_empty_file() {
    let (server, dir) = create_test_server(MAX_UPLOAD_SIZE);

    let response = server
        .post("/upload")
        .multipart(file_form("empty.txt", b"", "text/plain"))
        .await;
    response.assert_status(StatusCode::UNPROCESSABLE_ENTITY);

    assert!(list(&server).await.is_empty());
    assert!(!dir.path().join("empty.txt").exists());
}

#[tokio::test]
async fn test_upload_path_traversal_rejected() {
    let (server, dir) = create_test_server(MAX_UPLOAD_SIZE);

    for name in ["../escape.txt", "sub/dir.txt", "..\\escape.txt", ".."] {
        let response = server
            .post("/upload")
            .multipart(file_form(name, b"data", "text/plain"))
            .await;
        response.assert_status(StatusCode::BAD_REQUEST);
    }

    assert!(list(&server).await.is_empty());
    assert!(!dir.path().parent().unwrap().join("escape.txt").exists());
}

#[tokio::test]
async fn test_upload_metadata_name_rejected() {
    let (server, _dir) = create_test_server(MAX_UPLOAD_SIZE);

    let response = server
        .post("/upload")
        .multipart(file_form("metadata.json", b"{\"x\":1}", "application/json"))
        .await;
    response.assert_status(StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_upload_metadata_temp_name_rejected() {
    let (server, dir) = create_test_server(MAX_UPLOAD_SIZE);

    let response = server
        .post("/upload")
        .multipart(file_form("metadata.json.tmp", b"precious", "text/plain"))
        .await;
    response.assert_status(StatusCode::BAD_REQUEST);

    assert!(list(&server).await.is_empty());
    assert!(!dir.path().join("metadata.json.tmp").exists());

    // Later writes still work and every record has its file.
    let record = upload(&server, "a.txt", b"hello").await;
    let response = server
        .get(&format!("/download/{}", record["id"].as_str().unwrap()))
        .await;
    response.assert_status_ok();
}

#[tokio::test]
async fn test_upload_too_large() {
    let (server, _dir) = create_test_server(1024);

    let response = server
        .post("/upload")
        .multipart(file_form("big.bin", &vec![0u8; 2048], "application/octet-stream"))
        .await;
    response.assert_status(StatusCode::PAYLOAD_TOO_LARGE);

    assert!(list(&server).await.is_empty());
}

#[tokio::test]
async fn test_upload_without_file_field() {
    let (server, _dir) = create_test_server(MAX_UPLOAD_SIZE);

    let form = MultipartForm::new().add_text("comment", "no file here");
    let response = server.post("/upload").multipart(form).await;
    response.assert_status(StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_upload_multiple_files() {
    let (server, _dir) = create_test_server(MAX_UPLOAD_SIZE);

    upload(&server, "a.txt", b"one").await;
    upload(&server, "b.txt", b"two").await;
    upload(&server, "c.txt", b"three").await;

    let books = list(&server).await;
    let mut names: Vec<&str> = books.iter().map(|b| b["name"].as_str().unwrap()).collect();
    names.sort();
    assert_eq!(names, vec!["a.txt", "b.txt", "c.txt"]);
}

// ============================================================================
// Download Tests
// ============================================================================

#[tokio::test]
async fn test_download_returns_identical_bytes() {
    let (server, _dir) = create_test_server(MAX_UPLOAD_SIZE);

    let content: Vec<u8> = (0..=255u8).cycle().take(4096).collect();
    let response = server
        .post("/upload")
        .multipart(file_form("data.bin", &content, "application/octet-stream"))
        .await;
    response.assert_status(StatusCode::CREATED);
    let id = response.json::<Value>()["data"]["id"]
        .as_str()
        .unwrap()
        .to_string();

    let response = server.get(&format!("/download/{}", id)).await;
    response.assert_status_ok();
    assert_eq!(response.as_bytes().as_ref(), content.as_slice());
    assert_eq!(
        response.header("content-type").to_str().unwrap(),
        "application/octet-stream"
    );
    assert_eq!(
        response.header("content-length").to_str().unwrap(),
        "4096"
    );
}

#[tokio::test]
async fn test_download_content_disposition_utf8() {
    let (server, _dir) = create_test_server(MAX_UPLOAD_SIZE);

    let record = upload(&server, "my book ü.txt", b"hello").await;
    let id = record["id"].as_str().unwrap();

    let response = server.get(&format!("/download/{}", id)).await;
    response.assert_status_ok();

    let disposition = response
        .header("content-disposition")
        .to_str()
        .unwrap()
        .to_string();
    assert!(disposition.starts_with("attachment;"));
    assert!(disposition.contains("filename*=UTF-8''my%20book%20%C3%BC.txt"));
}

#[tokio::test]
async fn test_download_unknown_id() {
    let (server, _dir) = create_test_server(MAX_UPLOAD_SIZE);

    let response = server.get("/download/20240101_000000_deadbeef").await;
    response.assert_status(StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_download_file_missing_on_disk() {
    let (server, dir) = create_test_server(MAX_UPLOAD_SIZE);

    let record = upload(&server, "a.txt", b"hello").await;
    std::fs::remove_file(dir.path().join("a.txt")).unwrap();

    let response = server
        .get(&format!("/download/{}", record["id"].as_str().unwrap()))
        .await;
    response.assert_status(StatusCode::NOT_FOUND);
}

// ============================================================================
// Delete Tests
// ============================================================================

#[tokio::test]
async fn test_delete_removes_file_and_record() {
    let (server, dir) = create_test_server(MAX_UPLOAD_SIZE);

    let record = upload(&server, "a.txt", b"hello").await;
    let id = record["id"].as_str().unwrap();

    let response = server.get(&format!("/delete/{}", id)).await;
    response.assert_status(StatusCode::SEE_OTHER);
    assert_eq!(response.header("location").to_str().unwrap(), "/books");

    assert!(list(&server).await.is_empty());
    assert!(!dir.path().join("a.txt").exists());
    assert!(read_metadata(&dir).get(id).is_none());
}

#[tokio::test]
async fn test_delete_then_reupload() {
    let (server, _dir) = create_test_server(MAX_UPLOAD_SIZE);

    let record = upload(&server, "a.txt", b"hello").await;
    server
        .get(&format!("/delete/{}", record["id"].as_str().unwrap()))
        .await
        .assert_status(StatusCode::SEE_OTHER);

    let record = upload(&server, "a.txt", b"hello again").await;
    assert_eq!(record["size"], 11);
}

#[tokio::test]
async fn test_delete_unknown_id() {
    let (server, dir) = create_test_server(MAX_UPLOAD_SIZE);

    upload(&server, "a.txt", b"hello").await;
    let before = std::fs::read_to_string(dir.path().join("metadata.json")).unwrap();

    let response = server.get("/delete/20240101_000000_deadbeef").await;
    response.assert_status(StatusCode::NOT_FOUND);

    let after = std::fs::read_to_string(dir.path().join("metadata.json")).unwrap();
    assert_eq!(before, after);
}

#[tokio::test]
async fn test_delete_with_file_already_gone() {
    let (server, dir) = create_test_server(MAX_UPLOAD_SIZE);

    let record = upload(&server, "a.txt", b"hello").await;
    std::fs::remove_file(dir.path().join("a.txt")).unwrap();

    let response = server
        .get(&format!("/delete/{}", record["id"].as_str().unwrap()))
        .await;
    response.assert_status(StatusCode::SEE_OTHER);
    assert!(list(&server).await.is_empty());
}

// ============================================================================
// Metadata and Page Tests
// ============================================================================

#[tokio::test]
async fn test_raw_metadata() {
    let (server, _dir) = create_test_server(MAX_UPLOAD_SIZE);

    let response = server.get("/metadata").await;
    response.assert_status_ok();
    assert_eq!(response.json::<Value>(), serde_json::json!({}));

    let record = upload(&server, "a.txt", b"hello").await;
    let id = record["id"].as_str().unwrap();

    let response = server.get("/metadata").await;
    response.assert_status_ok();
    assert_eq!(
        response.header("content-type").to_str().unwrap(),
        "application/json"
    );
    let json: Value = response.json();
    assert_eq!(json[id]["name"], "a.txt");
    assert_eq!(json[id]["size"], "5");
}

#[tokio::test]
async fn test_list_reads_externally_edited_metadata() {
    let (server, dir) = create_test_server(MAX_UPLOAD_SIZE);

    std::fs::write(dir.path().join("manual.txt"), b"12345678").unwrap();
    std::fs::write(
        dir.path().join("metadata.json"),
        r#"{"20230101_120000_abcdef01": {"name": "manual.txt", "type": "text/plain", "size": 8}}"#,
    )
    .unwrap();

    let books = list(&server).await;
    assert_eq!(books.len(), 1);
    assert_eq!(books[0]["id"], "20230101_120000_abcdef01");
    assert_eq!(books[0]["size"], 8);

    let response = server.get("/download/20230101_120000_abcdef01").await;
    response.assert_status_ok();
    assert_eq!(response.as_bytes().as_ref(), b"12345678");
}

#[tokio::test]
async fn test_corrupt_metadata_is_server_error() {
    let (server, dir) = create_test_server(MAX_UPLOAD_SIZE);

    std::fs::write(dir.path().join("metadata.json"), "not json").unwrap();

    let response = server.get("/api/books").await;
    response.assert_status(StatusCode::INTERNAL_SERVER_ERROR);

    // The file is left alone
    let text = std::fs::read_to_string(dir.path().join("metadata.json")).unwrap();
    assert_eq!(text, "not json");
}

#[tokio::test]
async fn test_upload_page() {
    let (server, _dir) = create_test_server(MAX_UPLOAD_SIZE);

    let response = server.get("/").await;
    response.assert_status_ok();
    assert!(response.text().contains("<form"));
}

#[tokio::test]
async fn test_book_list_page() {
    let (server, _dir) = create_test_server(MAX_UPLOAD_SIZE);

    let response = server.get("/books").await;
    response.assert_status_ok();
    assert!(response.text().contains("No books yet."));

    let record = upload(&server, "<script>.txt", b"hello").await;
    let id = record["id"].as_str().unwrap();

    let response = server.get("/books").await;
    response.assert_status_ok();
    let html = response.text();
    assert!(html.contains("&lt;script&gt;.txt"));
    assert!(!html.contains("<script>.txt"));
    assert!(html.contains(&format!("/download/{}", id)));
    assert!(html.contains(&format!("/delete/{}", id)));
}

#[tokio::test]
async fn test_security_headers_present() {
    let (server, _dir) = create_test_server(MAX_UPLOAD_SIZE);

    let response = server.get("/api/books").await;
    response.assert_status_ok();
    assert_eq!(
        response.header("x-content-type-options").to_str().unwrap(),
        "nosniff"
    );
}
