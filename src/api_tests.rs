#[cfg(test)]
mod tests {
    use crate::api::{ApiClient, DatabaseApi, IconPayload, ImagePayload, RowPayload};
    use crate::error::ImportError;
    use serde_json::json;
    use wiremock::matchers::{body_json, body_string_contains, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    // The client is blocking, so the mock server lives on its own runtime
    // and the requests are sent from the test thread.
    fn setup_mock_server() -> (tokio::runtime::Runtime, MockServer) {
        let rt = tokio::runtime::Runtime::new().unwrap();
        let server = rt.block_on(MockServer::start());
        (rt, server)
    }

    fn client(server: &MockServer) -> ApiClient {
        ApiClient::new(&server.uri(), "test-token").unwrap()
    }

    #[test]
    fn test_fetch_database_sends_bearer_token() {
        let (rt, server) = setup_mock_server();
        rt.block_on(
            Mock::given(method("GET"))
                .and(path("/v1/databases/main"))
                .and(header("Authorization", "Bearer test-token"))
                .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                    "id": "main",
                    "url": "https://db.example.com/db/main",
                    "title": "People",
                    "schema": [{"name": "a", "type": "text"}, {"name": "b", "type": "number"}]
                })))
                .expect(1)
                .mount(&server),
        );

        let database = client(&server).fetch_database("main").unwrap();
        assert_eq!(database.id, "main");
        assert_eq!(database.title, "People");
        assert!(database.has_field("b"));
        assert_eq!(database.schema[1].field_type, "number");
    }

    #[test]
    fn test_error_status_carries_body() {
        let (rt, server) = setup_mock_server();
        rt.block_on(
            Mock::given(method("GET"))
                .and(path("/v1/databases/missing"))
                .respond_with(ResponseTemplate::new(404).set_body_string("no such database"))
                .mount(&server),
        );

        let err = client(&server).fetch_database("missing").unwrap_err();
        match err {
            ImportError::Api { status, body } => {
                assert_eq!(status, 404);
                assert_eq!(body, "no such database");
            }
            other => panic!("unexpected error {:?}", other),
        }
    }

    #[test]
    fn test_add_row_wire_format() {
        let (rt, server) = setup_mock_server();
        rt.block_on(
            Mock::given(method("POST"))
                .and(path("/v1/databases/main/rows"))
                .and(body_json(json!({
                    "fields": {"a": "1", "icon url": ""},
                    "icon": {"type": "emoji", "value": "🤔"},
                    "image": {"url": "https://via.placeholder.com/100", "caption": ""}
                })))
                .respond_with(ResponseTemplate::new(201).set_body_json(json!({"id": "row1"})))
                .expect(1)
                .mount(&server),
        );

        let mut row = RowPayload {
            icon: Some(IconPayload::Emoji("🤔".into())),
            image: Some(ImagePayload {
                url: "https://via.placeholder.com/100".into(),
                caption: String::new(),
            }),
            ..Default::default()
        };
        row.fields.insert("a".into(), "1".into());
        row.fields.insert("icon url".into(), String::new());

        let added = client(&server).add_row("main", &row).unwrap();
        assert_eq!(added.id, "row1");
        assert!(added.fields.is_empty());
    }

    #[test]
    fn test_update_row_uses_patch() {
        let (rt, server) = setup_mock_server();
        rt.block_on(
            Mock::given(method("PATCH"))
                .and(path("/v1/rows/row7"))
                .and(body_json(json!({"fields": {"a": "2"}})))
                .respond_with(ResponseTemplate::new(204))
                .expect(1)
                .mount(&server),
        );

        let mut row = RowPayload::default();
        row.fields.insert("a".into(), "2".into());
        client(&server).update_row("row7", &row).unwrap();
    }

    #[test]
    fn test_upload_file_is_multipart_with_name_and_type() {
        let (rt, server) = setup_mock_server();
        let served = format!("{}/files/test_image.gif", server.uri());
        rt.block_on(
            Mock::given(method("POST"))
                .and(path("/v1/uploads"))
                .and(header("Authorization", "Bearer test-token"))
                .and(body_string_contains("filename=\"test_image.gif\""))
                .and(body_string_contains("image/gif"))
                .and(body_string_contains("GIF89a"))
                .respond_with(ResponseTemplate::new(200).set_body_json(json!({"url": served})))
                .expect(1)
                .mount(&server),
        );

        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("test_image.gif");
        std::fs::write(&file, b"GIF89a").unwrap();

        let url = client(&server).upload_file(&file).unwrap();
        assert_eq!(url, served);
    }

    #[test]
    fn test_icon_upload_type_comes_from_extension() {
        let (rt, server) = setup_mock_server();
        rt.block_on(
            Mock::given(method("POST"))
                .and(path("/v1/uploads"))
                .and(body_string_contains("image/x-icon"))
                .respond_with(
                    ResponseTemplate::new(200)
                        .set_body_json(json!({"url": "https://files.example.com/favicon.ico"})),
                )
                .expect(1)
                .mount(&server),
        );

        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("favicon.ico");
        std::fs::write(&file, [0u8, 0, 1, 0]).unwrap();

        let url = client(&server).upload_file(&file).unwrap();
        assert!(url.ends_with("favicon.ico"));
    }

    #[test]
    fn test_upload_missing_file_is_io_error() {
        let (_rt, server) = setup_mock_server();
        let dir = tempfile::tempdir().unwrap();

        let err = client(&server)
            .upload_file(&dir.path().join("gone.png"))
            .unwrap_err();
        assert!(matches!(err, ImportError::Io { .. }));
    }
}
