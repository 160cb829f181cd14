//! Component kinds and their fixed method tables.
//!
//! Components are external collaborators (database, cache, coordination,
//! message queue, search). The compiler only needs their call surface:
//! each kind exposes a fixed set of methods with declared error and
//! return behavior, consumed by call classification and the emitter.

use serde::{Deserialize, Serialize};

/// The kind of a component instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ComponentKind {
    Db,
    Redis,
    Zk,
    Kafka,
    Es,
}

/// One callable method of a component kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ComponentMethod {
    pub name: &'static str,
    pub has_error: bool,
    pub has_return: bool,
    /// Result value-type name when `has_return` is true.
    pub result: Option<&'static str>,
}

const fn method(
    name: &'static str,
    has_error: bool,
    result: Option<&'static str>,
) -> ComponentMethod {
    ComponentMethod {
        name,
        has_error,
        has_return: result.is_some(),
        result,
    }
}

const DB_METHODS: &[ComponentMethod] = &[
    method("query", true, Some("[]map")),
    method("queryOne", true, Some("map")),
    method("count", true, Some("int64")),
    method("insert", true, Some("int64")),
    method("update", true, Some("int64")),
    method("delete", true, Some("int64")),
    method("exec", true, None),
];

const REDIS_METHODS: &[ComponentMethod] = &[
    method("get", true, Some("string")),
    method("set", true, None),
    method("del", true, Some("int64")),
    method("expire", true, None),
    method("exists", true, Some("bool")),
];

const ZK_METHODS: &[ComponentMethod] = &[
    method("get", true, Some("string")),
    method("set", true, None),
    method("exists", true, Some("bool")),
    method("delete", true, None),
    method("children", true, Some("[]string")),
];

const KAFKA_METHODS: &[ComponentMethod] = &[
    method("push", true, None),
    method("pull", true, Some("[]map")),
    method("commit", true, None),
];

const ES_METHODS: &[ComponentMethod] = &[
    method("search", true, Some("[]map")),
    method("index", true, None),
    method("get", true, Some("map")),
    method("delete", true, None),
];

impl ComponentKind {
    /// The script-visible name prefix. An instance is addressed either by
    /// the bare prefix (`db`) or prefix-underscore-name (`db_user`).
    pub fn prefix(self) -> &'static str {
        match self {
            ComponentKind::Db => "db",
            ComponentKind::Redis => "redis",
            ComponentKind::Zk => "zk",
            ComponentKind::Kafka => "kafka",
            ComponentKind::Es => "es",
        }
    }

    /// The fixed method table of this kind.
    pub fn methods(self) -> &'static [ComponentMethod] {
        match self {
            ComponentKind::Db => DB_METHODS,
            ComponentKind::Redis => REDIS_METHODS,
            ComponentKind::Zk => ZK_METHODS,
            ComponentKind::Kafka => KAFKA_METHODS,
            ComponentKind::Es => ES_METHODS,
        }
    }

    /// Look up a method by its script-visible name.
    pub fn method(self, name: &str) -> Option<&'static ComponentMethod> {
        self.methods().iter().find(|m| m.name == name)
    }

    /// Match a script head identifier (`db`, `db_user`, ...) to a kind.
    pub fn from_head(head: &str) -> Option<ComponentKind> {
        const ALL: &[ComponentKind] = &[
            ComponentKind::Db,
            ComponentKind::Redis,
            ComponentKind::Zk,
            ComponentKind::Kafka,
            ComponentKind::Es,
        ];
        ALL.iter()
            .copied()
            .find(|kind| {
                let prefix = kind.prefix();
                head == prefix
                    || (head.starts_with(prefix) && head[prefix.len()..].starts_with('_'))
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_head_matches_bare_and_suffixed() {
        assert_eq!(ComponentKind::from_head("db"), Some(ComponentKind::Db));
        assert_eq!(ComponentKind::from_head("db_user"), Some(ComponentKind::Db));
        assert_eq!(
            ComponentKind::from_head("redis_cache"),
            Some(ComponentKind::Redis)
        );
        assert_eq!(ComponentKind::from_head("dbx"), None);
        assert_eq!(ComponentKind::from_head("database"), None);
        assert_eq!(ComponentKind::from_head("user"), None);
    }

    #[test]
    fn db_query_has_error_and_return() {
        let m = ComponentKind::Db.method("query").unwrap();
        assert!(m.has_error);
        assert!(m.has_return);
        assert_eq!(m.result, Some("[]map"));
    }

    #[test]
    fn exec_has_no_return() {
        let m = ComponentKind::Db.method("exec").unwrap();
        assert!(m.has_error);
        assert!(!m.has_return);
    }

    #[test]
    fn unknown_method_is_none() {
        assert!(ComponentKind::Redis.method("query").is_none());
    }
}
