pub mod repo;
pub mod repo_types;

pub use repo_types::{
    Balance, CategoryTotal, MonthlySpending, NewTransaction, Transaction, TransactionKind,
    CATEGORIES, DEFAULT_CATEGORY,
};
