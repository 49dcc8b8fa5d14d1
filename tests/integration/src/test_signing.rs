//! Signature version and clock integration tests.

#[cfg(test)]
mod tests {
    use s3compat_client::{GetTarget, PutOptions};
    use s3compat_core::SignatureVersion;

    use crate::{cleanup_bucket, create_test_bucket, s3_client, test_key};

    #[test]
    #[ignore = "requires running server"]
    fn test_should_accept_v2_signed_requests() {
        let client = s3_client(SignatureVersion::V2);
        let bucket = create_test_bucket(&client, "sigv2");
        let key = test_key("v2 signed+key");

        client
            .put_object_string("signed with v2", &bucket, &key, &PutOptions::default())
            .expect("put with v2");
        let got = client
            .get_object(&bucket, &key, GetTarget::Memory)
            .expect("get with v2");
        assert_eq!(got.body.as_ref(), b"signed with v2");

        cleanup_bucket(&client, &bucket, &[&key]);
    }

    #[test]
    #[ignore = "requires running server"]
    fn test_should_sync_clock_with_server() {
        let mut client = s3_client(SignatureVersion::V4);
        let offset = client.sync_clock().expect("sync clock");
        assert!(offset.abs() < 3600, "clock offset {offset}s looks wrong");
        assert_eq!(client.config().time_offset, offset);
    }
}
