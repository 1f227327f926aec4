//! The four fixed questions asked of the `borrowers` table.

use crate::domain::QueryResult;
use crate::error::AppError;
use crate::store::BorrowerStore;

/// One named analysis query and the report heading it is filed under.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AnalysisQuery {
    pub key: char,
    pub heading: &'static str,
    pub sql: &'static str,
}

pub const AVERAGE_LOAN_PAST_DUE: AnalysisQuery = AnalysisQuery {
    key: 'a',
    heading: "Average loan amount for borrowers who are more than 5 days past due",
    sql: "SELECT AVG(loan_amount) AS average_loan_amount \
          FROM borrowers \
          WHERE days_past_due > 5;",
};

pub const TOP_OUTSTANDING_BALANCES: AnalysisQuery = AnalysisQuery {
    key: 'b',
    heading: "Top 10 borrowers with the highest outstanding balance",
    sql: "SELECT name, outstanding_balance \
          FROM borrowers \
          ORDER BY outstanding_balance DESC \
          LIMIT 10;",
};

pub const GOOD_REPAYMENT_BORROWERS: AnalysisQuery = AnalysisQuery {
    key: 'c',
    heading: "List of all borrowers with good repayment history",
    sql: "SELECT name, loan_amount, emi, loan_term, interest_rate, outstanding_balance \
          FROM borrowers \
          WHERE good_repayment_history = 1;",
};

pub const LOAN_TYPE_BREAKDOWN: AnalysisQuery = AnalysisQuery {
    key: 'd',
    heading: "Brief analysis with respect to loan type",
    sql: "SELECT loan_type, COUNT(*) AS count, AVG(loan_amount) AS average_loan_amount \
          FROM borrowers \
          GROUP BY loan_type;",
};

/// All queries, in report order.
pub const QUERIES: [AnalysisQuery; 4] = [
    AVERAGE_LOAN_PAST_DUE,
    TOP_OUTSTANDING_BALANCES,
    GOOD_REPAYMENT_BORROWERS,
    LOAN_TYPE_BREAKDOWN,
];

/// A query together with the rows it returned.
#[derive(Debug, Clone, PartialEq)]
pub struct QueryOutcome {
    pub query: AnalysisQuery,
    pub result: QueryResult,
}

impl AnalysisQuery {
    pub fn execute(&self, store: &BorrowerStore) -> Result<QueryOutcome, AppError> {
        let result = store.query(self.sql).map_err(|e| {
            AppError::store(format!("Query {} failed: {}", self.key, e.message()))
        })?;
        Ok(QueryOutcome { query: *self, result })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn queries_are_in_report_order() {
        let keys: Vec<char> = QUERIES.iter().map(|q| q.key).collect();
        assert_eq!(keys, vec!['a', 'b', 'c', 'd']);
    }

    #[test]
    fn queries_fail_cleanly_without_a_table() {
        let store = BorrowerStore::in_memory().unwrap();
        let err = AVERAGE_LOAN_PAST_DUE.execute(&store).unwrap_err();
        assert_eq!(err.exit_code(), AppError::STORE);
        assert!(err.message().starts_with("Query a failed"));
    }
}
