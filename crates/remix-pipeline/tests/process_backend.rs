/// HTTP contract tests for the multipart backend flavor.
use remix_pipeline::{
    BackendFactory, BackendKind, ClientConfig, JobId, JobStatus, OutputFormat, RemixRequest,
    RemoteAsset, StylePreset, UploadedAsset,
};
use serde_json::json;
use wiremock::http::HeaderName;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn backend_for(server: &MockServer) -> std::sync::Arc<dyn remix_pipeline::RemixBackend> {
    let config = ClientConfig::new(server.uri()).with_backend(BackendKind::Process);
    BackendFactory::create(&config).unwrap()
}

#[tokio::test]
async fn upload_is_multipart_and_returns_file_id() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/upload"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"file_id": "f-9"})))
        .expect(1)
        .mount(&server)
        .await;

    let file = std::env::temp_dir().join("process_upload_test.wav");
    std::fs::write(&file, b"fake wav bytes").unwrap();
    let asset = UploadedAsset::from_path(&file).unwrap();

    let backend = backend_for(&server);
    let remote = backend.upload(&asset).await.unwrap();
    assert_eq!(remote, RemoteAsset::Id("f-9".into()));

    let requests = server.received_requests().await.unwrap();
    let upload = requests
        .iter()
        .find(|r| r.url.path() == "/upload")
        .unwrap();
    let header: HeaderName = "content-type".parse().unwrap();
    let content_type = upload.headers.get(&header).unwrap().last().as_str();
    assert!(content_type.starts_with("multipart/form-data"));

    std::fs::remove_file(&file).ok();
}

#[tokio::test]
async fn start_and_status_use_process_routes() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/process/start"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"job_id": "p-7"})))
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/process/status/p-7"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "status": "finished",
            "progress": 100,
            "output_file": "out_p7.mp3",
        })))
        .mount(&server)
        .await;

    let backend = backend_for(&server);
    let request = RemixRequest {
        original: RemoteAsset::Id("f-9".into()),
        reference: Some(RemoteAsset::Id("f-10".into())),
        style_text: Some("hypnotic".into()),
        preset: Some(StylePreset::Trance),
        target_bpm: Some(140),
        output_format: OutputFormat::Mp3,
    };

    let id = backend.submit(&request).await.unwrap();
    assert_eq!(id, JobId("p-7".into()));

    let update = backend.status(&id).await.unwrap();
    assert_eq!(update.status, Some(JobStatus::Succeeded));
    assert_eq!(update.output.as_deref(), Some("out_p7.mp3"));
}

#[tokio::test]
async fn download_resolves_output_filename_against_api() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/download/out_p7.mp3"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(b"remixed".to_vec()))
        .mount(&server)
        .await;

    let backend = backend_for(&server);
    let dest = std::env::temp_dir().join("dj_mix_trance.mp3");

    backend.download("out_p7.mp3", &dest).await.unwrap();
    assert_eq!(std::fs::read(&dest).unwrap(), b"remixed");
    std::fs::remove_file(&dest).ok();
}
