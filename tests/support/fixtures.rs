//! Test fixtures and constants.

use rigger::core::stage::InfraOutputs;

pub const DEV_TFVARS: &str = r#"# dev environment
aws_region = "us-east-1"
opensearch_instance_type = "t3.small.search"
opensearch_instance_count = 1
enable_bedrock_logging = false
availability_zones = ["us-east-1a", "us-east-1b"]
"#;

pub const STAGING_TFVARS: &str = r#"aws_region = "us-west-2"
opensearch_instance_count = 2
"#;

pub const PROD_TFVARS: &str = r#"aws_region = "eu-west-1"
opensearch_instance_count = 3 // multi-AZ
"#;

/// Password used by [`TERRAFORM_OUTPUTS`]. Must never leave the secret.
pub const OPENSEARCH_PASSWORD: &str = "Tr0ub4dor&3-not-real";

/// `terraform output -json` for a fully applied dev environment.
pub const TERRAFORM_OUTPUTS: &str = r#"{
  "vpc_id": {"sensitive": false, "type": "string", "value": "vpc-0a1b2c3d"},
  "private_subnet_ids": {"sensitive": false, "type": ["list", "string"], "value": ["subnet-0aaa", "subnet-0bbb"]},
  "security_group_id": {"sensitive": false, "type": "string", "value": "sg-0123"},
  "opensearch_endpoint": {"sensitive": false, "type": "string", "value": "vpc-aws-chatbot-dev-abc.us-east-1.es.amazonaws.com"},
  "opensearch_username": {"sensitive": false, "type": "string", "value": "admin"},
  "opensearch_password": {"sensitive": true, "type": "string", "value": "Tr0ub4dor&3-not-real"},
  "documents_bucket": {"sensitive": false, "type": "string", "value": "aws-chatbot-dev-documents-7f3a"},
  "lambda_code_bucket": {"sensitive": false, "type": "string", "value": "aws-chatbot-dev-lambda-code-7f3a"}
}"#;

pub const DOCUMENTS_BUCKET: &str = "aws-chatbot-dev-documents-7f3a";
pub const LAMBDA_CODE_BUCKET: &str = "aws-chatbot-dev-lambda-code-7f3a";

pub fn outputs() -> InfraOutputs {
    InfraOutputs::from_json(TERRAFORM_OUTPUTS).expect("fixture outputs parse")
}
