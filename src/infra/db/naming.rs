//! Constraint naming convention.
//!
//! Every migration names its constraints through these helpers so generated
//! names stay deterministic and diff-stable across entities.

/// Index: `{table}_{column}_idx`
pub fn index(table: &str, column: &str) -> String {
    format!("{}_{}_idx", table, column)
}

/// Unique constraint: `{table}_{column}_key`
pub fn unique(table: &str, column: &str) -> String {
    format!("{}_{}_key", table, column)
}

/// Check constraint: `{table}_{constraint}_check`
pub fn check(table: &str, constraint: &str) -> String {
    format!("{}_{}_check", table, constraint)
}

/// Foreign key: `{table}_{column}_fkey`
pub fn foreign_key(table: &str, column: &str) -> String {
    format!("{}_{}_fkey", table, column)
}

/// Primary key: `{table}_pkey`
pub fn primary_key(table: &str) -> String {
    format!("{}_pkey", table)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_templates() {
        assert_eq!(index("user", "created_at"), "user_created_at_idx");
        assert_eq!(unique("user", "email"), "user_email_key");
        assert_eq!(check("user", "email_not_empty"), "user_email_not_empty_check");
        assert_eq!(foreign_key("post", "author_id"), "post_author_id_fkey");
        assert_eq!(primary_key("user"), "user_pkey");
    }
}
