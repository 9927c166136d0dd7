//! Reserved word sets consulted by identifier quoting.
//!
//! Words are stored lowercase; lookups lowercase the candidate first.

use std::collections::HashSet;

use once_cell::sync::Lazy;

const ANSI_WORDS: &[&str] = &[
    "all", "analyse", "analyze", "and", "any", "array", "as", "asc", "asymmetric",
    "authorization", "between", "binary", "both", "case", "cast", "check", "collate", "column",
    "constraint", "create", "cross", "current_date", "current_role", "current_time",
    "current_timestamp", "current_user", "default", "deferrable", "desc", "distinct", "do",
    "else", "end", "except", "false", "fetch", "for", "foreign", "freeze", "from", "full",
    "grant", "group", "having", "ilike", "in", "initially", "inner", "intersect", "into", "is",
    "isnull", "join", "leading", "left", "like", "limit", "localtime", "localtimestamp",
    "natural", "new", "not", "notnull", "null", "off", "offset", "old", "on", "only", "or",
    "order", "outer", "overlaps", "placing", "primary", "references", "right", "select",
    "session_user", "set", "similar", "some", "symmetric", "table", "then", "to", "trailing",
    "true", "union", "unique", "user", "using", "verbose", "when", "where",
];

const MYSQL_EXTRA: &[&str] = &[
    "accessible", "add", "alter", "before", "bigint", "by", "call", "cascade", "change", "char",
    "condition", "database", "databases", "dec", "decimal", "declare", "delete", "describe",
    "div", "double", "drop", "each", "enclosed", "escaped", "exists", "explain", "float",
    "force", "if", "ignore", "index", "infile", "insert", "int", "integer", "interval", "key",
    "keys", "kill", "lines", "load", "lock", "long", "loop", "match", "mod", "modifies",
    "numeric", "option", "optionally", "out", "outfile", "partition", "procedure", "purge",
    "range", "read", "reads", "real", "release", "rename", "repeat", "replace", "require",
    "restrict", "return", "revoke", "rlike", "schema", "schemas", "separator", "show",
    "signal", "smallint", "spatial", "sql", "ssl", "starting", "straight_join", "terminated",
    "trigger", "undo", "unlock", "unsigned", "update", "usage", "use", "values", "varchar",
    "varying", "while", "with", "write", "xor", "zerofill",
];

const SQLITE_WORDS: &[&str] = &[
    "add", "after", "all", "alter", "analyze", "and", "as", "asc", "attach", "autoincrement",
    "before", "begin", "between", "by", "cascade", "case", "cast", "check", "collate", "column",
    "commit", "conflict", "constraint", "create", "cross", "current_date", "current_time",
    "current_timestamp", "database", "default", "deferrable", "deferred", "delete", "desc",
    "detach", "distinct", "drop", "each", "else", "end", "escape", "except", "exclusive",
    "exists", "explain", "false", "fail", "for", "foreign", "from", "full", "glob", "group",
    "having", "if", "ignore", "immediate", "in", "index", "indexed", "initially", "inner",
    "insert", "instead", "intersect", "into", "is", "isnull", "join", "key", "left", "like",
    "limit", "match", "natural", "not", "notnull", "null", "of", "offset", "on", "or", "order",
    "outer", "plan", "pragma", "primary", "query", "raise", "references", "reindex", "rename",
    "replace", "restrict", "right", "rollback", "row", "select", "set", "table", "temp",
    "temporary", "then", "to", "transaction", "trigger", "true", "union", "unique", "update",
    "using", "vacuum", "values", "view", "virtual", "when", "where",
];

const TSQL_WORDS: &[&str] = &[
    "add", "all", "alter", "and", "any", "as", "asc", "authorization", "backup", "begin",
    "between", "break", "browse", "bulk", "by", "cascade", "case", "check", "checkpoint",
    "close", "clustered", "coalesce", "collate", "column", "commit", "compute", "constraint",
    "contains", "containstable", "continue", "convert", "create", "cross", "current",
    "current_date", "current_time", "current_timestamp", "current_user", "cursor", "database",
    "dbcc", "deallocate", "declare", "default", "delete", "deny", "desc", "disk", "distinct",
    "distributed", "double", "drop", "dump", "else", "end", "errlvl", "escape", "except",
    "exec", "execute", "exists", "exit", "external", "fetch", "file", "fillfactor", "for",
    "foreign", "freetext", "from", "full", "function", "goto", "grant", "group", "having",
    "holdlock", "identity", "if", "in", "index", "inner", "insert", "intersect", "into", "is",
    "join", "key", "kill", "left", "like", "lineno", "load", "merge", "national", "nocheck",
    "nonclustered", "not", "null", "nullif", "of", "off", "offsets", "on", "open", "option",
    "or", "order", "outer", "over", "percent", "pivot", "plan", "precision", "primary", "print",
    "proc", "procedure", "public", "raiserror", "read", "readtext", "reconfigure", "references",
    "replication", "restore", "restrict", "return", "revert", "revoke", "right", "rollback",
    "rowcount", "rowguidcol", "rule", "save", "schema", "select", "session_user", "set",
    "setuser", "shutdown", "some", "statistics", "system_user", "table", "tablesample",
    "textsize", "then", "to", "top", "tran", "transaction", "trigger", "truncate", "union",
    "unique", "unpivot", "update", "updatetext", "use", "user", "values", "varying", "view",
    "waitfor", "when", "where", "while", "with", "writetext",
];

pub static ANSI: Lazy<HashSet<&'static str>> = Lazy::new(|| ANSI_WORDS.iter().copied().collect());

pub static MYSQL: Lazy<HashSet<&'static str>> = Lazy::new(|| {
    ANSI_WORDS
        .iter()
        .chain(MYSQL_EXTRA.iter())
        .copied()
        .collect()
});

pub static SQLITE: Lazy<HashSet<&'static str>> =
    Lazy::new(|| SQLITE_WORDS.iter().copied().collect());

pub static TSQL: Lazy<HashSet<&'static str>> = Lazy::new(|| TSQL_WORDS.iter().copied().collect());
