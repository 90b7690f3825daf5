/// Skip a test if AWS credentials or the test region are not configured.
#[macro_export]
macro_rules! skip_without_aws {
    () => {
        if std::env::var("AWS_ACCESS_KEY_ID").is_err() && std::env::var("AWS_PROFILE").is_err() {
            eprintln!("SKIPPED: neither AWS_ACCESS_KEY_ID nor AWS_PROFILE set");
            return;
        }
        if std::env::var("RIGGER_TEST_REGION").is_err() {
            eprintln!("SKIPPED: RIGGER_TEST_REGION not set");
            return;
        }
    };
}

/// Skip a test if a live test bucket is not configured.
#[macro_export]
macro_rules! skip_without_bucket {
    () => {
        if std::env::var("RIGGER_TEST_BUCKET").is_err() {
            eprintln!("SKIPPED: RIGGER_TEST_BUCKET not set (a versioned bucket named rigger-test-dev-documents-*)");
            return;
        }
    };
}
