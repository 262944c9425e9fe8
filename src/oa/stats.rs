//! Balance analysis of generated cases.

use super::OrthogonalCases;

/// How evenly each column uses its parameter's candidate values.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BalanceReport {
    /// For each column, how often each candidate value appears.
    pub value_counts: Vec<Vec<usize>>,
    /// For each column, whether counts differ by at most one.
    pub column_balance: Vec<bool>,
}

impl BalanceReport {
    /// Whether every column is balanced.
    #[must_use]
    pub fn is_balanced(&self) -> bool {
        self.column_balance.iter().all(|&balanced| balanced)
    }

    /// Difference between the most and least used value of a column.
    ///
    /// # Panics
    ///
    /// Panics if `col` is out of bounds.
    #[must_use]
    pub fn spread(&self, col: usize) -> usize {
        let counts = &self.value_counts[col];
        let max = counts.iter().copied().max().unwrap_or(0);
        let min = counts.iter().copied().min().unwrap_or(0);
        max - min
    }
}

impl OrthogonalCases {
    /// Count how often each candidate value appears per column.
    ///
    /// A column is balanced when no value is used more than once more than
    /// any other. Columns with as many values as the design has levels are
    /// exactly balanced; shorter columns are balanced up to the round-robin
    /// remainder.
    #[must_use]
    pub fn balance_report(&self) -> BalanceReport {
        let value_counts: Vec<Vec<usize>> = self
            .indices
            .columns()
            .into_iter()
            .zip(&self.candidates)
            .map(|(column, &candidates)| {
                let mut counts = vec![0; candidates];
                for &index in column {
                    counts[index] += 1;
                }
                counts
            })
            .collect();

        let mut report = BalanceReport {
            column_balance: Vec::with_capacity(value_counts.len()),
            value_counts,
        };
        report.column_balance = (0..report.value_counts.len())
            .map(|col| report.spread(col) <= 1)
            .collect();
        report
    }
}
