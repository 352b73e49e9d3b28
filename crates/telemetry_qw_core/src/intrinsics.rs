//! CloudFormation values: plain literals and the handful of intrinsic
//! functions the stack needs (`Ref`, `Fn::GetAtt`, `Fn::Join`, `Fn::Sub`).

use serde::{Serialize, Serializer};
use serde_json::{json, Value};

/// A value that CloudFormation resolves at deploy time, or a plain literal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Expr {
    Literal(String),
    Ref(String),
    GetAtt(String, String),
    Join(String, Vec<Expr>),
    Sub(String),
}

impl Expr {
    pub fn literal(value: impl Into<String>) -> Self {
        Self::Literal(value.into())
    }

    pub fn reference(logical_id: impl Into<String>) -> Self {
        Self::Ref(logical_id.into())
    }

    pub fn get_att(logical_id: impl Into<String>, attribute: impl Into<String>) -> Self {
        Self::GetAtt(logical_id.into(), attribute.into())
    }

    pub fn sub(template: impl Into<String>) -> Self {
        Self::Sub(template.into())
    }

    /// Joins `parts` with `separator`, folding adjacent literals together.
    ///
    /// A join made only of literals collapses into a single literal, so the
    /// rendered template never carries a `Fn::Join` it does not need.
    pub fn join(separator: &str, parts: impl IntoIterator<Item = Expr>) -> Self {
        let mut folded: Vec<Expr> = Vec::new();
        for part in parts {
            if let (Some(Expr::Literal(previous)), Expr::Literal(next)) = (folded.last_mut(), &part)
            {
                previous.push_str(separator);
                previous.push_str(next);
                continue;
            }
            folded.push(part);
        }

        match folded.len() {
            0 => Self::Literal(String::new()),
            1 if matches!(folded[0], Expr::Literal(_)) => folded.remove(0),
            _ => Self::Join(separator.to_string(), folded),
        }
    }

    /// Concatenation shorthand for `join("", parts)`.
    pub fn concat(parts: impl IntoIterator<Item = Expr>) -> Self {
        Self::join("", parts)
    }

    pub fn as_literal(&self) -> Option<&str> {
        match self {
            Self::Literal(value) => Some(value),
            _ => None,
        }
    }

    pub fn to_json(&self) -> Value {
        match self {
            Self::Literal(value) => Value::String(value.clone()),
            Self::Ref(logical_id) => json!({ "Ref": logical_id }),
            Self::GetAtt(logical_id, attribute) => {
                json!({ "Fn::GetAtt": [logical_id, attribute] })
            }
            Self::Join(separator, parts) => {
                let parts: Vec<Value> = parts.iter().map(Expr::to_json).collect();
                json!({ "Fn::Join": [separator, parts] })
            }
            Self::Sub(template) => json!({ "Fn::Sub": template }),
        }
    }

    /// Human readable form used in manifests and logs, e.g.
    /// `cdk-hnb659fds-assets-${AWS::AccountId}-eu-west-1`.
    pub fn display_template(&self) -> String {
        match self {
            Self::Literal(value) => value.clone(),
            Self::Ref(logical_id) => format!("${{{logical_id}}}"),
            Self::GetAtt(logical_id, attribute) => format!("${{{logical_id}.{attribute}}}"),
            Self::Join(separator, parts) => parts
                .iter()
                .map(Expr::display_template)
                .collect::<Vec<_>>()
                .join(separator.as_str()),
            Self::Sub(template) => template.clone(),
        }
    }
}

impl From<&str> for Expr {
    fn from(value: &str) -> Self {
        Self::literal(value)
    }
}

impl From<String> for Expr {
    fn from(value: String) -> Self {
        Self::Literal(value)
    }
}

impl Serialize for Expr {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.to_json().serialize(serializer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn join_of_literals_collapses() {
        let expr = Expr::concat([Expr::literal("s3://"), "bucket".into(), "/key".into()]);
        assert_eq!(expr, Expr::literal("s3://bucket/key"));
    }

    #[test]
    fn join_keeps_intrinsics_and_folds_neighbours() {
        let expr = Expr::concat([
            Expr::literal("arn:aws:s3:::"),
            Expr::sub("assets-${AWS::AccountId}"),
            Expr::literal("/"),
            Expr::literal("abc.yaml"),
        ]);

        assert_eq!(
            expr.to_json(),
            json!({
                "Fn::Join": ["", [
                    "arn:aws:s3:::",
                    { "Fn::Sub": "assets-${AWS::AccountId}" },
                    "/abc.yaml"
                ]]
            })
        );
    }

    #[test]
    fn renders_ref_and_get_att() {
        assert_eq!(Expr::reference("Bucket").to_json(), json!({ "Ref": "Bucket" }));
        assert_eq!(
            Expr::get_att("Bucket", "Arn").to_json(),
            json!({ "Fn::GetAtt": ["Bucket", "Arn"] })
        );
    }

    #[test]
    fn display_template_keeps_placeholders() {
        let expr = Expr::concat([Expr::sub("cdk-${AWS::AccountId}"), Expr::literal("/k")]);
        assert_eq!(expr.display_template(), "cdk-${AWS::AccountId}/k");
    }
}
