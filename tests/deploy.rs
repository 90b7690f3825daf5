//! Deploy plans against in-memory AWS.

mod support;
use support::*;

use rigger::core::cleanup::FixedAnswer;
use rigger::core::domain::ParameterKey;
use rigger::core::sequencer::{self, Outcome, Sequencer, Step};
use rigger::error::{Error, PublishError, StageError};

#[test]
fn test_full_deploy_runs_in_order() {
    let t = Test::new();
    let resolved = t.resolve("aws-chatbot", "dev");
    let cloud = Cloud::new();
    let journal = Journal::default();
    let infra = FakeInfra::new(&journal);
    let app = FakeApp::new(&journal);
    let confirm = FixedAnswer(false);

    let report = Sequencer::new(cloud.stages(&infra, &app, &confirm), &resolved)
        .run(sequencer::DEPLOY)
        .unwrap();

    assert_eq!(
        journal.entries(),
        ["infra.apply", "infra.outputs", "app.build", "app.deploy"]
    );
    assert_eq!(report.outcome(Step::InfraApply), Some(Outcome::Done));
    assert_eq!(report.outcome(Step::AppDeploy), Some(Outcome::Done));
}

#[test]
fn test_deploy_publishes_full_schema() {
    let t = Test::new();
    let resolved = t.resolve("aws-chatbot", "dev");
    let cloud = Cloud::new();
    let journal = Journal::default();
    let infra = FakeInfra::new(&journal);
    let app = FakeApp::new(&journal);
    let confirm = FixedAnswer(false);

    let report = Sequencer::new(cloud.stages(&infra, &app, &confirm), &resolved)
        .run(sequencer::DEPLOY_INFRA)
        .unwrap();

    let params = cloud.params.snapshot();
    assert_eq!(params.len(), ParameterKey::ALL.len());
    assert_eq!(params["/aws-chatbot/dev/vpc/id"], "vpc-0a1b2c3d");
    assert_eq!(params["/aws-chatbot/dev/vpc/subnet_ids"], "subnet-0aaa,subnet-0bbb");
    assert_eq!(params["/aws-chatbot/dev/vpc/subnet_id_1"], "subnet-0aaa");
    assert_eq!(params["/aws-chatbot/dev/vpc/subnet_id_2"], "subnet-0bbb");
    assert_eq!(params["/aws-chatbot/dev/s3/documents_bucket"], DOCUMENTS_BUCKET);
    assert_eq!(params["/aws-chatbot/dev/s3/lambda_code_bucket"], LAMBDA_CODE_BUCKET);
    assert_eq!(params["/aws-chatbot/dev/app/environment"], "dev");
    assert_eq!(params["/aws-chatbot/dev/app/project_name"], "aws-chatbot");
    assert_eq!(params["/aws-chatbot/dev/app/aws_region"], "us-east-1");

    let publish = report.publish.unwrap();
    assert_eq!(publish.written.len(), ParameterKey::ALL.len());
    assert_eq!(publish.secret, "aws-chatbot-dev-opensearch-credentials");
}

#[test]
fn test_password_only_in_secret() {
    let t = Test::new();
    let resolved = t.resolve("aws-chatbot", "dev");
    let cloud = Cloud::new();
    let journal = Journal::default();
    let infra = FakeInfra::new(&journal);
    let app = FakeApp::new(&journal);
    let confirm = FixedAnswer(false);

    Sequencer::new(cloud.stages(&infra, &app, &confirm), &resolved)
        .run(sequencer::DEPLOY)
        .unwrap();

    for (path, value) in cloud.params.snapshot() {
        assert!(!path.contains("password"), "password path published: {}", path);
        assert!(!value.contains(OPENSEARCH_PASSWORD), "password leaked into {}", path);
    }

    let secret = cloud
        .secrets
        .get("aws-chatbot-dev-opensearch-credentials")
        .expect("secret stored");
    let secret: serde_json::Value = serde_json::from_str(&secret).unwrap();
    assert_eq!(secret["username"], "admin");
    assert_eq!(secret["password"], OPENSEARCH_PASSWORD);
}

#[test]
fn test_redeploy_is_idempotent() {
    let t = Test::new();
    let resolved = t.resolve("aws-chatbot", "dev");
    let cloud = Cloud::new();
    let journal = Journal::default();
    let infra = FakeInfra::new(&journal);
    let app = FakeApp::new(&journal);
    let confirm = FixedAnswer(false);
    let seq = Sequencer::new(cloud.stages(&infra, &app, &confirm), &resolved);

    seq.run(sequencer::DEPLOY).unwrap();
    let first = cloud.params.snapshot();
    let second_report = seq.run(sequencer::DEPLOY).unwrap();

    assert_eq!(cloud.params.snapshot(), first);
    assert_eq!(second_report.outcome(Step::InfraApply), Some(Outcome::Unchanged));
}

#[test]
fn test_app_deploy_requires_published_parameters() {
    let t = Test::new();
    let resolved = t.resolve("aws-chatbot", "dev");
    let cloud = Cloud::new();
    let journal = Journal::default();
    let infra = FakeInfra::new(&journal);
    let app = FakeApp::new(&journal);
    let confirm = FixedAnswer(false);

    let err = Sequencer::new(cloud.stages(&infra, &app, &confirm), &resolved)
        .run(sequencer::DEPLOY_APP)
        .unwrap_err();

    assert_eq!(err.step(), Some(Step::AppDeploy));
    assert!(matches!(
        err.root(),
        Error::Stage(StageError::MissingPublishedParameter { .. })
    ));
    assert!(err.to_string().contains("app-deploy failed for dev"));
    assert!(!journal.contains("app.deploy"));
}

#[test]
fn test_app_deploy_after_infra_deploy() {
    let t = Test::new();
    let resolved = t.resolve("aws-chatbot", "dev");
    let cloud = Cloud::new();
    let journal = Journal::default();
    let infra = FakeInfra::new(&journal);
    let app = FakeApp::new(&journal);
    let confirm = FixedAnswer(false);
    let seq = Sequencer::new(cloud.stages(&infra, &app, &confirm), &resolved);

    seq.run(sequencer::DEPLOY_INFRA).unwrap();
    seq.run(sequencer::DEPLOY_APP).unwrap();

    assert!(journal.contains("app.deploy"));
}

#[test]
fn test_blank_parameter_counts_as_missing() {
    let t = Test::new();
    let resolved = t.resolve("aws-chatbot", "dev");
    let cloud = Cloud::new();
    for key in ParameterKey::ALL {
        cloud.params.insert(&resolved.prefix.parameter_path(key), "x");
    }
    cloud
        .params
        .insert(&resolved.prefix.parameter_path(ParameterKey::LambdaCodeBucket), "  ");
    let journal = Journal::default();
    let infra = FakeInfra::new(&journal);
    let app = FakeApp::new(&journal);
    let confirm = FixedAnswer(false);

    let err = Sequencer::new(cloud.stages(&infra, &app, &confirm), &resolved)
        .run(sequencer::DEPLOY_APP)
        .unwrap_err();

    match err.root() {
        Error::Stage(StageError::MissingPublishedParameter { path }) => {
            assert_eq!(path, "/aws-chatbot/dev/s3/lambda_code_bucket")
        }
        other => panic!("unexpected error: {}", other),
    }
}

#[test]
fn test_publish_without_infrastructure_fails() {
    let t = Test::new();
    let resolved = t.resolve("aws-chatbot", "dev");
    let cloud = Cloud::new();
    let journal = Journal::default();
    let infra = FakeInfra::new(&journal);
    let app = FakeApp::new(&journal);
    let confirm = FixedAnswer(false);

    let err = Sequencer::new(cloud.stages(&infra, &app, &confirm), &resolved)
        .run(&[Step::Publish])
        .unwrap_err();

    assert_eq!(err.step(), Some(Step::Publish));
    assert!(matches!(
        err.root(),
        Error::Stage(StageError::StateUnavailable { .. })
    ));
    assert!(cloud.params.writes().is_empty());
}

#[test]
fn test_partial_publish_stops_before_app() {
    let t = Test::new();
    let resolved = t.resolve("aws-chatbot", "dev");
    let cloud = Cloud::new();
    let vpc_path = resolved.prefix.parameter_path(ParameterKey::VpcId);
    cloud.params.fail_on(&vpc_path);
    let journal = Journal::default();
    let infra = FakeInfra::new(&journal);
    let app = FakeApp::new(&journal);
    let confirm = FixedAnswer(false);

    let err = Sequencer::new(cloud.stages(&infra, &app, &confirm), &resolved)
        .run(sequencer::DEPLOY)
        .unwrap_err();

    assert_eq!(err.step(), Some(Step::Publish));
    match err.root() {
        Error::Publish(PublishError::Failed { written, failed }) => {
            assert_eq!(failed.len(), 1);
            assert_eq!(failed[0].0, vpc_path);
            // Every other parameter plus the secret.
            assert_eq!(written.len(), ParameterKey::ALL.len());
        }
        other => panic!("unexpected error: {}", other),
    }
    assert!(!journal.contains("app.build"));
}

#[test]
fn test_environments_are_isolated() {
    let t = Test::all_envs();
    let dev = t.resolve("aws-chatbot", "dev");
    let staging = t.resolve("aws-chatbot", "staging");
    let cloud = Cloud::new();
    let journal = Journal::default();
    let confirm = FixedAnswer(false);

    let infra = FakeInfra::new(&journal);
    let app = FakeApp::new(&journal);
    Sequencer::new(cloud.stages(&infra, &app, &confirm), &dev)
        .run(sequencer::DEPLOY_INFRA)
        .unwrap();
    let infra = FakeInfra::new(&journal);
    Sequencer::new(cloud.stages(&infra, &app, &confirm), &staging)
        .run(sequencer::DEPLOY_INFRA)
        .unwrap();

    let params = cloud.params.snapshot();
    assert_eq!(params["/aws-chatbot/dev/app/aws_region"], "us-east-1");
    assert_eq!(params["/aws-chatbot/staging/app/aws_region"], "us-west-2");
    assert_eq!(params["/aws-chatbot/staging/app/environment"], "staging");
    assert!(cloud.secrets.get("aws-chatbot-dev-opensearch-credentials").is_some());
    assert!(cloud.secrets.get("aws-chatbot-staging-opensearch-credentials").is_some());
}
