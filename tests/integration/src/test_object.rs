//! Object CRUD integration tests.

#[cfg(test)]
mod tests {
    use std::io::Write;

    use s3compat_client::{ClientError, GetTarget, PutInput, PutOptions};
    use s3compat_core::SignatureVersion;

    use crate::{cleanup_bucket, create_test_bucket, s3_client, test_key};

    #[test]
    #[ignore = "requires running server"]
    fn test_should_round_trip_bytes_and_etag() {
        let client = s3_client(SignatureVersion::V4);
        let bucket = create_test_bucket(&client, "roundtrip");
        let key = test_key("greeting");
        let body = b"hello, s3compat!";

        let put = client
            .put_object(PutInput::from_bytes(&body[..]), &bucket, &key, &PutOptions::default())
            .expect("put_object");
        let etag = put.etag.expect("etag on upload");
        assert!(!etag.starts_with('"'), "etag should be unquoted: {etag}");

        let got = client
            .get_object(&bucket, &key, GetTarget::Memory)
            .expect("get_object");
        assert_eq!(got.body.as_ref(), body);
        assert_eq!(got.info.hash.as_deref(), Some(etag.as_str()));
        assert_eq!(got.info.size, Some(body.len() as u64));

        cleanup_bucket(&client, &bucket, &[&key]);
    }

    #[test]
    #[ignore = "requires running server"]
    fn test_should_round_trip_file_with_metadata() {
        let client = s3_client(SignatureVersion::V4);
        let bucket = create_test_bucket(&client, "file");
        let key = test_key("docs/report.txt");

        let mut source = tempfile::NamedTempFile::new().expect("temp file");
        source.write_all(b"line one\nline two\n").expect("write source");

        let options = PutOptions::builder()
            .meta([("author".to_owned(), "ci".to_owned())].into())
            .content_type("text/plain")
            .build();
        client
            .put_object_file(source.path(), &bucket, &key, &options)
            .expect("put_object_file");

        let info = client
            .get_object_info(&bucket, &key)
            .expect("head")
            .expect("object should exist");
        assert_eq!(info.size, Some(18));
        assert_eq!(info.content_type.as_deref(), Some("text/plain"));
        assert_eq!(info.meta.get("x-amz-meta-author").map(String::as_str), Some("ci"));

        let dir = tempfile::tempdir().expect("temp dir");
        let dest = dir.path().join("download.txt");
        client
            .get_object(&bucket, &key, GetTarget::Path(dest.clone()))
            .expect("get_object to file");
        assert_eq!(std::fs::read(&dest).expect("read download"), b"line one\nline two\n");

        cleanup_bucket(&client, &bucket, &[&key]);
    }

    #[test]
    #[ignore = "requires running server"]
    fn test_should_return_none_for_missing_object() {
        let client = s3_client(SignatureVersion::V4);
        let bucket = create_test_bucket(&client, "missing");

        let info = client
            .get_object_info(&bucket, "does/not/exist")
            .expect("head of missing key");
        assert!(info.is_none());
        assert!(!client.object_exists(&bucket, "does/not/exist").expect("exists"));

        let err = client
            .get_object(&bucket, "does/not/exist", GetTarget::Memory)
            .expect_err("get of missing key");
        assert!(err.is_not_found(), "unexpected error: {err}");

        cleanup_bucket(&client, &bucket, &[]);
    }

    #[test]
    #[ignore = "requires running server"]
    fn test_should_delete_repeatedly_without_transport_errors() {
        let client = s3_client(SignatureVersion::V4);
        let bucket = create_test_bucket(&client, "delete");
        let key = test_key("gone");

        client
            .put_object_string("bye", &bucket, &key, &PutOptions::default())
            .expect("put");
        client.delete_object(&bucket, &key).expect("first delete");

        match client.delete_object(&bucket, &key) {
            Ok(()) => {}
            Err(err) => assert!(err.is_not_found(), "unexpected error: {err}"),
        }
        assert!(!client.object_exists(&bucket, &key).expect("exists"));

        cleanup_bucket(&client, &bucket, &[]);
    }

    #[test]
    #[ignore = "requires running server"]
    fn test_should_report_protocol_error_for_malformed_bucket() {
        let client = s3_client(SignatureVersion::V4);

        let err = client
            .get_object("Not_A_Valid_Bucket!", "key", GetTarget::Memory)
            .expect_err("malformed bucket must fail");
        assert!(
            matches!(err, ClientError::Protocol { .. }),
            "expected a protocol error, got {err:?}"
        );
    }
}
