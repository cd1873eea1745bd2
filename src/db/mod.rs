pub mod account_queries;
pub mod asset_queries;
pub mod history_queries;
pub mod investment_queries;
pub mod job_run_queries;
pub mod transaction_queries;
pub mod user_queries;

pub const DEFAULT_ORDER: &str = "created_at DESC";

/// Builds an `ORDER BY` body from a `sort` query value such as
/// `ticker,-created_at`. Only `allowed` columns are accepted. Sorting by
/// `ticker` puts tickers that start with a digit last.
pub fn order_clause(sort: Option<&str>, allowed: &[&str]) -> Result<String, String> {
    let Some(sort) = sort.map(str::trim).filter(|s| !s.is_empty()) else {
        return Ok(DEFAULT_ORDER.to_string());
    };

    let mut parts = Vec::new();
    for field in sort.split(',').map(str::trim).filter(|f| !f.is_empty()) {
        let (column, direction) = match field.strip_prefix('-') {
            Some(column) => (column, "DESC"),
            None => (field, "ASC"),
        };
        if !allowed.contains(&column) {
            return Err(format!("Cannot sort by {}", column));
        }
        if column == "ticker" {
            parts.push(format!("(ticker ~ '^[0-9]') ASC, ticker {}", direction));
        } else {
            parts.push(format!("{} {}", column, direction));
        }
    }

    if parts.is_empty() {
        Ok(DEFAULT_ORDER.to_string())
    } else {
        Ok(parts.join(", "))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALLOWED: &[&str] = &["ticker", "name", "created_at"];

    #[test]
    fn defaults_to_newest_first() {
        assert_eq!(order_clause(None, ALLOWED).unwrap(), "created_at DESC");
        assert_eq!(order_clause(Some(" "), ALLOWED).unwrap(), "created_at DESC");
    }

    #[test]
    fn ticker_sort_puts_digit_tickers_last() {
        assert_eq!(
            order_clause(Some("ticker"), ALLOWED).unwrap(),
            "(ticker ~ '^[0-9]') ASC, ticker ASC"
        );
        assert_eq!(
            order_clause(Some("name,-created_at"), ALLOWED).unwrap(),
            "name ASC, created_at DESC"
        );
    }

    #[test]
    fn rejects_unknown_columns() {
        assert!(order_clause(Some("price; DROP TABLE assets"), ALLOWED).is_err());
        assert!(order_clause(Some("-password_hash"), ALLOWED).is_err());
    }
}
