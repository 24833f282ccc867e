//! Typed id newtypes, generated with the same `typed_id!` shape `layer0`
//! uses for `AgentId`/`SessionId`/`WorkflowId` — a thin `String` wrapper so
//! callers cannot accidentally pass a `TaskId` where a `ConnectorId` is
//! expected.

macro_rules! typed_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, serde::Serialize, serde::Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub String);

        impl $name {
            pub fn new(value: impl Into<String>) -> Self {
                Self(value.into())
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<&str> for $name {
            fn from(value: &str) -> Self {
                Self(value.to_string())
            }
        }

        impl From<String> for $name {
            fn from(value: String) -> Self {
                Self(value)
            }
        }
    };
}

typed_id!(
    /// Identifies one `Task` submitted to an `Orchestrator`.
    TaskId
);

typed_id!(
    /// Identifies one configured connector instance (e.g. "gong", "netsuite").
    ConnectorId
);

typed_id!(
    /// Logical name of a secret (e.g. `"OPENAI_API_KEY"`), never the value.
    SecretName
);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn displays_as_inner_string() {
        let id = TaskId::new("task-1");
        assert_eq!(id.to_string(), "task-1");
        assert_eq!(id.as_str(), "task-1");
    }

    #[test]
    fn distinct_types_do_not_unify() {
        let t = TaskId::new("x");
        let c = ConnectorId::new("x");
        assert_eq!(t.as_str(), c.as_str());
    }
}
