//! Tests for `rigger config`.

use crate::support::*;

#[test]
fn test_config_shows_prefix_and_names() {
    let t = Test::new();

    let output = t.config(&[]);
    assert_success(&output);
    assert_stdout_contains(&output, "aws-chatbot-dev");
    assert_stdout_contains(&output, "aws-chatbot-dev-opensearch-credentials");
    assert_stdout_contains(&output, "/aws-chatbot/dev/s3/lambda_code_bucket");
    assert_stdout_contains(&output, "us-east-1");
}

#[test]
fn test_config_json_schema() {
    let t = Test::new();

    let json = t.config_json(&[]);
    assert_eq!(json["project"], "aws-chatbot");
    assert_eq!(json["environment"], "dev");
    assert_eq!(json["secret"], "aws-chatbot-dev-opensearch-credentials");
    assert_eq!(json["stack"], "aws-chatbot-dev-app");

    let parameters: Vec<&str> = json["parameters"]
        .as_array()
        .unwrap()
        .iter()
        .map(|p| p.as_str().unwrap())
        .collect();
    assert_eq!(parameters.len(), 12);
    assert!(parameters.iter().all(|p| p.starts_with("/aws-chatbot/dev/")));
    assert!(!parameters.iter().any(|p| p.contains("password")));
}

#[test]
fn test_config_project_flag() {
    let t = Test::new();

    let json = t.config_json(&["-p", "demo"]);
    assert_eq!(json["prefix"], "demo-dev");
    assert_eq!(json["secret"], "demo-dev-opensearch-credentials");
}

#[test]
fn test_config_project_from_file() {
    let t = Test::new();
    t.write_config("[project]\nname = \"from-file\"\n");

    let json = t.config_json(&[]);
    assert_eq!(json["prefix"], "from-file-dev");

    // The flag still wins.
    let json = t.config_json(&["-p", "from-flag"]);
    assert_eq!(json["prefix"], "from-flag-dev");
}

#[test]
fn test_config_region_per_environment() {
    let t = Test::all_envs();

    assert_eq!(t.config_json(&["-e", "dev"])["region"], "us-east-1");
    assert_eq!(t.config_json(&["-e", "staging"])["region"], "us-west-2");
    assert_eq!(t.config_json(&["-e", "prod"])["region"], "eu-west-1");
}

#[test]
fn test_config_region_falls_back_to_settings() {
    let t = Test::new();
    t.write_vars("dev", "opensearch_instance_count = 1\n");
    t.write_config("[aws]\nregion = \"ap-southeast-2\"\n");

    assert_eq!(t.config_json(&[])["region"], "ap-southeast-2");
}

#[test]
fn test_config_region_default() {
    let t = Test::new();
    t.write_vars("dev", "");

    assert_eq!(t.config_json(&[])["region"], "us-east-1");
}

#[test]
fn test_config_variables_listed() {
    let t = Test::new();

    let json = t.config_json(&[]);
    assert_eq!(json["variables"]["opensearch_instance_type"], "t3.small.search");
    assert_eq!(json["variables"]["enable_bedrock_logging"], "false");
}

#[test]
fn test_config_from_other_directory() {
    let t = Test::new();
    let elsewhere = tempfile::TempDir::new().unwrap();

    #[allow(deprecated)]
    let output = assert_cmd::Command::cargo_bin("rigger")
        .unwrap()
        .current_dir(elsewhere.path())
        .env_remove("ENVIRONMENT")
        .env_remove("PROJECT_NAME")
        .args(["-C", t.dir.path().to_str().unwrap(), "config", "--json"])
        .output()
        .unwrap();
    assert_success(&output);
    let json: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(json["prefix"], "aws-chatbot-dev");
}

#[test]
fn test_config_bucket_pattern() {
    let t = Test::new();

    let json = t.config_json(&[]);
    let pattern = json["bucket_pattern"].as_str().unwrap();
    let re = regex::Regex::new(pattern).unwrap();
    assert!(re.is_match("aws-chatbot-dev-documents-7f3a"));
    assert!(re.is_match("aws-chatbot-dev-lambda-code-7f3a"));
    assert!(!re.is_match("aws-chatbot-prod-documents-7f3a"));
    assert!(!re.is_match("aws-chatbot-dev-logs-7f3a"));
}
