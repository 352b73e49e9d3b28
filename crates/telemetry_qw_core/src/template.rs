//! Rendering of a [`StackSynthesis`] into a CloudFormation template and an
//! asset manifest.
//!
//! Objects are `serde_json::Map`s, which keep keys sorted, so the same
//! synthesis always renders to the same bytes.

use std::collections::BTreeMap;
use std::path::PathBuf;

use serde::Serialize;
use serde_json::{json, Map, Value};

use crate::asset::AssetPackaging;
use crate::intrinsics::Expr;
use crate::resources::{ComputeUnit, PolicyStatement, StorageResource};
use crate::stack::StackSynthesis;

pub const TEMPLATE_FORMAT_VERSION: &str = "2010-09-09";
pub const ASSET_MANIFEST_VERSION: &str = "1";
const POLICY_VERSION: &str = "2012-10-17";
const LAMBDA_BASIC_EXECUTION_POLICY: &str =
    ":iam::aws:policy/service-role/AWSLambdaBasicExecutionRole";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AssetManifest {
    pub version: String,
    pub files: BTreeMap<String, AssetManifestEntry>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AssetManifestEntry {
    pub source: AssetSource,
    pub destination: AssetDestination,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AssetSource {
    pub path: PathBuf,
    pub packaging: AssetPackaging,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AssetDestination {
    pub bucket_name: String,
    pub object_key: String,
}

impl StackSynthesis {
    pub fn to_template(&self) -> Value {
        let mut resources = Map::new();

        let bucket = &self.service.bucket;
        resources.insert(bucket.logical_id.clone(), self.bucket_resource(bucket));
        let bucket_policy = bucket.bucket_policy_statements();
        if !bucket_policy.is_empty() {
            resources.insert(
                bucket.policy_logical_id(),
                json!({
                    "Type": "AWS::S3::BucketPolicy",
                    "Properties": {
                        "Bucket": bucket.bucket_ref(),
                        "PolicyDocument": policy_document(&bucket_policy),
                    }
                }),
            );
        }

        for unit in self.service.compute_units() {
            resources.insert(unit.role_logical_id(), self.role_resource());
            resources.insert(unit.policy_logical_id(), policy_resource(unit));
            resources.insert(unit.logical_id.clone(), self.function_resource(unit));
        }

        let mut outputs = Map::new();
        for output in &self.outputs {
            let mut rendered = Map::new();
            rendered.insert("Value".to_string(), output.value.to_json());
            if let Some(export_name) = &output.export_name {
                rendered.insert("Export".to_string(), json!({ "Name": export_name }));
            }
            outputs.insert(output.logical_id.clone(), Value::Object(rendered));
        }

        json!({
            "AWSTemplateFormatVersion": TEMPLATE_FORMAT_VERSION,
            "Description": format!(
                "Quickwit indexer and searcher for index '{}' ({})",
                self.index_config.index_id, self.stack_id
            ),
            "Resources": resources,
            "Outputs": outputs,
        })
    }

    pub fn to_template_string(&self) -> String {
        serde_json::to_string_pretty(&self.to_template())
            .expect("serialization of template value should not fail")
    }

    pub fn asset_manifest(&self) -> AssetManifest {
        let files = self
            .assets
            .iter()
            .map(|asset| {
                (
                    asset.fingerprint.clone(),
                    AssetManifestEntry {
                        source: AssetSource {
                            path: asset.source.clone(),
                            packaging: asset.packaging,
                        },
                        destination: AssetDestination {
                            bucket_name: asset.location.bucket.display_template(),
                            object_key: asset.location.key.clone(),
                        },
                    },
                )
            })
            .collect();

        AssetManifest {
            version: ASSET_MANIFEST_VERSION.to_string(),
            files,
        }
    }

    fn tags(&self) -> Value {
        Value::Array(
            self.tags
                .iter()
                .map(|(key, value)| json!({ "Key": key, "Value": value }))
                .collect(),
        )
    }

    fn bucket_resource(&self, bucket: &StorageResource) -> Value {
        let policy = bucket.removal_policy.as_cfn();
        json!({
            "Type": "AWS::S3::Bucket",
            "Properties": {
                "BucketName": bucket.bucket_name,
                "Tags": self.tags(),
            },
            "UpdateReplacePolicy": policy,
            "DeletionPolicy": policy,
        })
    }

    fn role_resource(&self) -> Value {
        let managed_policy = Expr::concat([
            Expr::literal("arn:"),
            Expr::reference("AWS::Partition"),
            Expr::literal(LAMBDA_BASIC_EXECUTION_POLICY),
        ]);
        json!({
            "Type": "AWS::IAM::Role",
            "Properties": {
                "AssumeRolePolicyDocument": {
                    "Statement": [{
                        "Action": "sts:AssumeRole",
                        "Effect": "Allow",
                        "Principal": { "Service": "lambda.amazonaws.com" },
                    }],
                    "Version": POLICY_VERSION,
                },
                "ManagedPolicyArns": [managed_policy],
                "Tags": self.tags(),
            }
        })
    }

    fn function_resource(&self, unit: &ComputeUnit) -> Value {
        let variables: Map<String, Value> = unit
            .environment
            .iter()
            .map(|(key, value)| (key.clone(), value.to_json()))
            .collect();

        json!({
            "Type": "AWS::Lambda::Function",
            "Properties": {
                "Code": {
                    "S3Bucket": unit.code.bucket,
                    "S3Key": unit.code.key,
                },
                "Environment": { "Variables": variables },
                "EphemeralStorage": { "Size": unit.ephemeral_storage_mib },
                "FunctionName": unit.function_name,
                "Handler": unit.handler,
                "MemorySize": unit.memory_size,
                "ReservedConcurrentExecutions": unit.reserved_concurrent_executions(),
                "Role": Expr::get_att(unit.role_logical_id(), "Arn"),
                "Runtime": unit.runtime.as_str(),
                "Tags": self.tags(),
                "Timeout": unit.timeout.as_secs(),
            },
            "DependsOn": [unit.policy_logical_id(), unit.role_logical_id()],
        })
    }
}

fn policy_document(statements: &[PolicyStatement]) -> Value {
    json!({
        "Statement": statements.iter().map(PolicyStatement::to_json).collect::<Vec<_>>(),
        "Version": POLICY_VERSION,
    })
}

fn policy_resource(unit: &ComputeUnit) -> Value {
    json!({
        "Type": "AWS::IAM::Policy",
        "Properties": {
            "PolicyDocument": policy_document(&unit.statements),
            "PolicyName": unit.policy_logical_id(),
            "Roles": [Expr::reference(unit.role_logical_id())],
        }
    })
}
