//! Search predicate compiler: free text + join mode → parameterized, catalog-scoped `LIKE` clause.

use rusqlite::types::Value;

use crate::{JoinMode, NO_CATALOG};

/// Escape character used in every `LIKE ... ESCAPE` clause.
const LIKE_ESCAPE: char = '\\';

/// A compiled name search. Tokens are only ever bound as parameters.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SearchPredicate {
    catalog_id: i64,
    /// Escaped `%token%` patterns, one per token.
    patterns: Vec<String>,
    mode: JoinMode,
}

/// Escape `LIKE` metacharacters (`%`, `_`, and the escape char itself) so they match literally.
pub fn escape_like(token: &str) -> String {
    let mut out = String::with_capacity(token.len() + 2);
    for c in token.chars() {
        if c == '%' || c == '_' || c == LIKE_ESCAPE {
            out.push(LIKE_ESCAPE);
        }
        out.push(c);
    }
    out
}

/// Compile `query` for catalog `scope`. Tokens split on whitespace; `All` joins with AND, `Any` with OR.
pub fn compile_search(scope: i64, query: &str, mode: JoinMode) -> SearchPredicate {
    let patterns = query
        .split_whitespace()
        .map(|token| format!("%{}%", escape_like(token)))
        .collect();
    SearchPredicate {
        catalog_id: scope,
        patterns,
        mode,
    }
}

impl SearchPredicate {
    /// No catalog selected, or no tokens: the search returns nothing.
    pub fn matches_nothing(&self) -> bool {
        self.catalog_id == NO_CATALOG || self.patterns.is_empty()
    }

    pub fn patterns(&self) -> &[String] {
        &self.patterns
    }

    /// `WHERE` body: `catalog_id = ?1 AND (name LIKE ?2 ESCAPE '\' <op> ...)`.
    pub fn where_clause(&self) -> String {
        let joiner = match self.mode {
            JoinMode::All => " AND ",
            JoinMode::Any => " OR ",
        };
        let terms: Vec<String> = (0..self.patterns.len())
            .map(|i| format!("name LIKE ?{} ESCAPE '{}'", i + 2, LIKE_ESCAPE))
            .collect();
        format!("catalog_id = ?1 AND ({})", terms.join(joiner))
    }

    /// Bound values in placeholder order: catalog id, then each pattern.
    pub fn params(&self) -> Vec<Value> {
        std::iter::once(Value::Integer(self.catalog_id))
            .chain(self.patterns.iter().cloned().map(Value::Text))
            .collect()
    }
}
