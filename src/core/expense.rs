//! Expense business logic - money spent out of the school fund.

use crate::{
    core::{
        contribution, donation,
        funds::{self, EntrySource},
        money,
    },
    entities::{Expense, expense},
    errors::{Error, Result},
};
use rust_decimal::Decimal;
use sea_orm::{QueryOrder, Set, TransactionTrait, prelude::*};

/// Input for [`log_expense`].
#[derive(Debug, Clone)]
pub struct NewExpense {
    /// Amount spent
    pub amount: Decimal,
    /// Category, e.g. "supplies"
    pub expense_type: String,
    /// Contribution that funded the expense
    pub contribution_id: Option<i64>,
    /// Donation consumed by the expense
    pub donation_id: Option<i64>,
    /// What the money was spent on
    pub description: String,
    /// School year the expense belongs to
    pub school_year_id: Option<i64>,
}

/// Logs an expense and debits the fund in one transaction.
///
/// # Errors
/// - Amount is not positive
/// - Empty expense type
/// - Linked contribution or donation does not exist
pub async fn log_expense(db: &DatabaseConnection, input: NewExpense) -> Result<expense::Model> {
    let amount = money::require_positive(input.amount)?;
    let expense_type = input.expense_type.trim().to_lowercase();
    if expense_type.is_empty() {
        return Err(Error::Config {
            message: "Expense type cannot be empty".to_string(),
        });
    }

    let txn = db.begin().await?;

    if let Some(id) = input.contribution_id {
        if contribution::get_contribution_by_id(&txn, id).await?.is_none() {
            return Err(Error::ContributionNotFound { id });
        }
    }
    if let Some(id) = input.donation_id {
        if donation::get_donation_by_id(&txn, id).await?.is_none() {
            return Err(Error::DonationNotFound { id });
        }
    }

    let description = input.description.trim().to_string();
    let inserted = expense::ActiveModel {
        amount: Set(amount),
        expense_type: Set(expense_type.clone()),
        contribution_id: Set(input.contribution_id),
        donation_id: Set(input.donation_id),
        description: Set(description.clone()),
        school_year_id: Set(input.school_year_id),
        spent_at: Set(chrono::Utc::now()),
        ..Default::default()
    }
    .insert(&txn)
    .await?;

    let history_description = if description.is_empty() {
        format!("Expense: {expense_type}")
    } else {
        format!("Expense: {description}")
    };
    funds::append_entry(&txn, EntrySource::Expense, amount, history_description).await?;

    txn.commit().await?;

    tracing::info!(
        "Logged {} expense {} of {}",
        inserted.expense_type,
        inserted.id,
        amount
    );
    Ok(inserted)
}

/// Retrieves an expense by id.
pub async fn get_expense_by_id(
    db: &DatabaseConnection,
    expense_id: i64,
) -> Result<Option<expense::Model>> {
    Expense::find_by_id(expense_id)
        .one(db)
        .await
        .map_err(Into::into)
}

/// Retrieves all expenses, oldest first.
pub async fn get_all_expenses(db: &DatabaseConnection) -> Result<Vec<expense::Model>> {
    Expense::find()
        .order_by_asc(expense::Column::SpentAt)
        .order_by_asc(expense::Column::Id)
        .all(db)
        .await
        .map_err(Into::into)
}

/// Expenses funded by one contribution.
pub async fn get_expenses_for_contribution(
    db: &DatabaseConnection,
    contribution_id: i64,
) -> Result<Vec<expense::Model>> {
    Expense::find()
        .filter(expense::Column::ContributionId.eq(contribution_id))
        .order_by_asc(expense::Column::Id)
        .all(db)
        .await
        .map_err(Into::into)
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use crate::{
        core::{
            donation::{DonationType, NewDonation, log_donation},
            funds::{current_fund_balance, get_history_rows},
        },
        test_utils::*,
    };
    use rust_decimal_macros::dec;
    use sea_orm::{DatabaseBackend, MockDatabase};

    fn supplies(amount: Decimal) -> NewExpense {
        NewExpense {
            amount,
            expense_type: "Supplies".to_string(),
            contribution_id: None,
            donation_id: None,
            description: "Bond paper".to_string(),
            school_year_id: None,
        }
    }

    async fn fund_with_cash(db: &DatabaseConnection, amount: Decimal) -> Result<()> {
        log_donation(
            db,
            NewDonation {
                donor_name: "Alumni Association".to_string(),
                donation_type: DonationType::Cash,
                amount,
                item_description: None,
                quantity: 0,
                school_year_id: None,
            },
        )
        .await?;
        Ok(())
    }

    #[tokio::test]
    async fn test_log_expense_validation() -> Result<()> {
        let db = MockDatabase::new(DatabaseBackend::Sqlite).into_connection();

        let result = log_expense(&db, supplies(Decimal::ZERO)).await;
        assert!(matches!(result, Err(Error::InvalidAmount { amount: _ })));

        let mut blank = supplies(dec!(10));
        blank.expense_type = "  ".to_string();
        let result = log_expense(&db, blank).await;
        assert!(matches!(result, Err(Error::Config { message: _ })));
        Ok(())
    }

    #[tokio::test]
    async fn test_log_expense_debits_fund() -> Result<()> {
        let db = setup_test_db().await?;
        fund_with_cash(&db, dec!(1000)).await?;

        let expense = log_expense(&db, supplies(dec!(250.50))).await?;
        assert_eq!(expense.expense_type, "supplies");
        assert_eq!(current_fund_balance(&db).await?, dec!(749.50));

        let history = get_history_rows(&db).await?;
        assert_eq!(history.len(), 2);
        let last = history.last().unwrap();
        assert_eq!(last.balance_before, Some(dec!(1000)));
        assert_eq!(last.balance_after, Some(dec!(749.50)));
        assert!(last.payment_id.is_none() && last.donation_id.is_none());
        assert_eq!(last.description, "Expense: Bond paper");
        Ok(())
    }

    #[tokio::test]
    async fn test_log_expense_rejects_unknown_links() -> Result<()> {
        let db = setup_test_db().await?;

        let mut bad_contribution = supplies(dec!(10));
        bad_contribution.contribution_id = Some(5);
        let result = log_expense(&db, bad_contribution).await;
        assert!(matches!(result, Err(Error::ContributionNotFound { id: 5 })));

        let mut bad_donation = supplies(dec!(10));
        bad_donation.donation_id = Some(6);
        let result = log_expense(&db, bad_donation).await;
        assert!(matches!(result, Err(Error::DonationNotFound { id: 6 })));

        assert!(get_all_expenses(&db).await?.is_empty());
        assert!(get_history_rows(&db).await?.is_empty());
        Ok(())
    }

    #[tokio::test]
    async fn test_expenses_for_contribution() -> Result<()> {
        let fx = setup_siblings().await?;
        let mut funded = supplies(dec!(100));
        funded.contribution_id = Some(fx.pta.id);
        let linked = log_expense(&fx.db, funded).await?;
        log_expense(&fx.db, supplies(dec!(40))).await?;

        let for_pta = get_expenses_for_contribution(&fx.db, fx.pta.id).await?;
        assert_eq!(for_pta.len(), 1);
        assert_eq!(for_pta[0].id, linked.id);
        assert_eq!(get_all_expenses(&fx.db).await?.len(), 2);
        assert_eq!(
            get_expense_by_id(&fx.db, linked.id).await?.unwrap().amount,
            dec!(100)
        );
        // An empty fund goes negative rather than rejecting the expense
        assert_eq!(current_fund_balance(&fx.db).await?, dec!(-140));
        Ok(())
    }
}
