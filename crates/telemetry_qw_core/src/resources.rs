//! Typed descriptors for the resources the stack declares.

use std::collections::BTreeMap;
use std::time::Duration;

use serde_json::{json, Value};

use crate::asset::AssetLocation;
use crate::intrinsics::Expr;

/// Every function in this stack runs at most one invocation at a time.
pub const RESERVED_CONCURRENCY: u32 = 1;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RemovalPolicy {
    Destroy,
    Retain,
}

impl RemovalPolicy {
    pub fn as_cfn(self) -> &'static str {
        match self {
            Self::Destroy => "Delete",
            Self::Retain => "Retain",
        }
    }
}

/// The S3 bucket that holds both index data and the metastore.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorageResource {
    pub logical_id: String,
    pub bucket_name: String,
    pub removal_policy: RemovalPolicy,
    pub enforce_ssl: bool,
}

impl StorageResource {
    pub fn bucket_ref(&self) -> Expr {
        Expr::reference(&self.logical_id)
    }

    pub fn arn(&self) -> Expr {
        Expr::get_att(&self.logical_id, "Arn")
    }

    pub fn objects_arn(&self) -> Expr {
        Expr::concat([self.arn(), Expr::literal("/*")])
    }

    pub fn policy_logical_id(&self) -> String {
        format!("{}Policy", self.logical_id)
    }

    /// Statement granting read and write on the bucket and all its objects.
    pub fn grant_read_write(&self) -> PolicyStatement {
        PolicyStatement::allow(
            [
                "s3:GetObject*",
                "s3:GetBucket*",
                "s3:List*",
                "s3:DeleteObject*",
                "s3:PutObject",
                "s3:PutObjectLegalHold",
                "s3:PutObjectRetention",
                "s3:PutObjectTagging",
                "s3:PutObjectVersionTagging",
                "s3:Abort*",
            ],
            [self.arn(), self.objects_arn()],
        )
    }

    /// Bucket policy statements; denies plain HTTP when SSL is enforced.
    pub fn bucket_policy_statements(&self) -> Vec<PolicyStatement> {
        if !self.enforce_ssl {
            return Vec::new();
        }
        vec![PolicyStatement {
            effect: Effect::Deny,
            actions: vec!["s3:*".to_string()],
            resources: vec![self.arn(), self.objects_arn()],
            principal: Some(json!({ "AWS": "*" })),
            condition: Some(json!({ "Bool": { "aws:SecureTransport": "false" } })),
        }]
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Effect {
    Allow,
    Deny,
}

impl Effect {
    fn as_str(self) -> &'static str {
        match self {
            Self::Allow => "Allow",
            Self::Deny => "Deny",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PolicyStatement {
    pub effect: Effect,
    pub actions: Vec<String>,
    pub resources: Vec<Expr>,
    pub principal: Option<Value>,
    pub condition: Option<Value>,
}

impl PolicyStatement {
    pub fn allow<'a>(
        actions: impl IntoIterator<Item = &'a str>,
        resources: impl IntoIterator<Item = Expr>,
    ) -> Self {
        Self {
            effect: Effect::Allow,
            actions: actions.into_iter().map(str::to_string).collect(),
            resources: resources.into_iter().collect(),
            principal: None,
            condition: None,
        }
    }

    pub fn to_json(&self) -> Value {
        let mut statement = serde_json::Map::new();
        statement.insert(
            "Action".to_string(),
            one_or_many(&self.actions, |action| Value::String(action.clone())),
        );
        statement.insert(
            "Effect".to_string(),
            Value::String(self.effect.as_str().to_string()),
        );
        statement.insert(
            "Resource".to_string(),
            one_or_many(&self.resources, Expr::to_json),
        );
        if let Some(principal) = &self.principal {
            statement.insert("Principal".to_string(), principal.clone());
        }
        if let Some(condition) = &self.condition {
            statement.insert("Condition".to_string(), condition.clone());
        }
        Value::Object(statement)
    }
}

fn one_or_many<T>(items: &[T], render: impl Fn(&T) -> Value) -> Value {
    match items {
        [single] => render(single),
        _ => Value::Array(items.iter().map(render).collect()),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Runtime {
    ProvidedAl2,
}

impl Runtime {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::ProvidedAl2 => "provided.al2",
        }
    }
}

/// One Lambda function plus the execution role statements it needs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ComputeUnit {
    pub logical_id: String,
    pub function_name: String,
    pub code: AssetLocation,
    pub runtime: Runtime,
    pub handler: String,
    pub environment: BTreeMap<String, Expr>,
    pub timeout: Duration,
    pub memory_size: u32,
    pub ephemeral_storage_mib: u32,
    pub statements: Vec<PolicyStatement>,
}

impl ComputeUnit {
    /// Always [`RESERVED_CONCURRENCY`]; not configurable.
    pub fn reserved_concurrent_executions(&self) -> u32 {
        RESERVED_CONCURRENCY
    }

    pub fn role_logical_id(&self) -> String {
        format!("{}ServiceRole", self.logical_id)
    }

    pub fn policy_logical_id(&self) -> String {
        format!("{}ServiceRoleDefaultPolicy", self.logical_id)
    }

    pub fn add_to_role_policy(&mut self, statement: PolicyStatement) {
        self.statements.push(statement);
    }
}

/// A named stack output, optionally exported for other stacks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StackOutput {
    pub logical_id: String,
    pub value: Expr,
    pub export_name: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bucket() -> StorageResource {
        StorageResource {
            logical_id: "Store".to_string(),
            bucket_name: "store".to_string(),
            removal_policy: RemovalPolicy::Destroy,
            enforce_ssl: true,
        }
    }

    #[test]
    fn single_action_renders_as_string() {
        let statement =
            PolicyStatement::allow(["s3:GetObject"], [Expr::literal("arn:aws:s3:::b/*")]);
        assert_eq!(
            statement.to_json(),
            json!({
                "Action": "s3:GetObject",
                "Effect": "Allow",
                "Resource": "arn:aws:s3:::b/*"
            })
        );
    }

    #[test]
    fn read_write_grant_covers_bucket_and_objects() {
        let statement = bucket().grant_read_write();
        assert_eq!(statement.resources.len(), 2);
        assert!(statement.actions.iter().any(|action| action == "s3:PutObject"));
        assert!(statement.actions.iter().any(|action| action == "s3:GetObject*"));
        assert_eq!(
            statement.resources[1].to_json(),
            json!({ "Fn::Join": ["", [{ "Fn::GetAtt": ["Store", "Arn"] }, "/*"]] })
        );
    }

    #[test]
    fn ssl_enforcement_denies_insecure_transport() {
        let statements = bucket().bucket_policy_statements();
        assert_eq!(statements.len(), 1);
        assert_eq!(statements[0].effect, Effect::Deny);

        let relaxed = StorageResource {
            enforce_ssl: false,
            ..bucket()
        };
        assert!(relaxed.bucket_policy_statements().is_empty());
    }
}
