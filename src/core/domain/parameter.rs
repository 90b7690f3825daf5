//! Published parameter schema.

use std::fmt;

/// A key in the published parameter tree under `/{project}/{environment}/`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ParameterKey {
    VpcId,
    VpcSubnetIds,
    VpcSubnetId1,
    VpcSubnetId2,
    VpcSecurityGroupId,
    OpenSearchEndpoint,
    OpenSearchUsername,
    DocumentsBucket,
    LambdaCodeBucket,
    AppEnvironment,
    AppProjectName,
    AppAwsRegion,
}

impl ParameterKey {
    /// The full schema, in publish order.
    pub const ALL: [ParameterKey; 12] = [
        ParameterKey::VpcId,
        ParameterKey::VpcSubnetIds,
        ParameterKey::VpcSubnetId1,
        ParameterKey::VpcSubnetId2,
        ParameterKey::VpcSecurityGroupId,
        ParameterKey::OpenSearchEndpoint,
        ParameterKey::OpenSearchUsername,
        ParameterKey::DocumentsBucket,
        ParameterKey::LambdaCodeBucket,
        ParameterKey::AppEnvironment,
        ParameterKey::AppProjectName,
        ParameterKey::AppAwsRegion,
    ];

    /// Keys the application stack reads at deploy time or runtime.
    pub const REQUIRED_BY_APP: [ParameterKey; 5] = [
        ParameterKey::LambdaCodeBucket,
        ParameterKey::DocumentsBucket,
        ParameterKey::OpenSearchEndpoint,
        ParameterKey::VpcSubnetIds,
        ParameterKey::VpcSecurityGroupId,
    ];

    pub fn category(&self) -> &'static str {
        match self {
            Self::VpcId
            | Self::VpcSubnetIds
            | Self::VpcSubnetId1
            | Self::VpcSubnetId2
            | Self::VpcSecurityGroupId => "vpc",
            Self::OpenSearchEndpoint | Self::OpenSearchUsername => "opensearch",
            Self::DocumentsBucket | Self::LambdaCodeBucket => "s3",
            Self::AppEnvironment | Self::AppProjectName | Self::AppAwsRegion => "app",
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::VpcId => "id",
            Self::VpcSubnetIds => "subnet_ids",
            Self::VpcSubnetId1 => "subnet_id_1",
            Self::VpcSubnetId2 => "subnet_id_2",
            Self::VpcSecurityGroupId => "security_group_id",
            Self::OpenSearchEndpoint => "endpoint",
            Self::OpenSearchUsername => "username",
            Self::DocumentsBucket => "documents_bucket",
            Self::LambdaCodeBucket => "lambda_code_bucket",
            Self::AppEnvironment => "environment",
            Self::AppProjectName => "project_name",
            Self::AppAwsRegion => "aws_region",
        }
    }

    /// `{category}/{name}`
    pub fn relative_path(&self) -> String {
        format!("{}/{}", self.category(), self.name())
    }
}

impl fmt::Display for ParameterKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.category(), self.name())
    }
}
