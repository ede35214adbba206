//! Donation business logic - logging cash and in-kind gifts and tracking how
//! in-kind items are used.
//!
//! Cash donations add to the school fund. In-kind donations are recorded at
//! their assessed value for reporting but leave the fund balance unchanged.

use crate::{
    core::{
        funds::{self, EntrySource},
        money,
    },
    entities::{Donation, donation},
    errors::{Error, Result},
};
use rust_decimal::Decimal;
use sea_orm::{QueryOrder, Set, TransactionTrait, prelude::*};
use serde::Serialize;

/// Kind of donation, stored as a string column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum DonationType {
    /// Money
    Cash,
    /// Goods, valued by assessment
    InKind,
}

impl DonationType {
    /// Stored column value
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Cash => "cash",
            Self::InKind => "in-kind",
        }
    }

    /// Parses a stored or submitted value. Accepts `in_kind` as well as `in-kind`.
    pub fn parse(value: &str) -> Result<Self> {
        match value.trim().to_lowercase().as_str() {
            "cash" => Ok(Self::Cash),
            "in-kind" | "in_kind" | "inkind" => Ok(Self::InKind),
            other => Err(Error::InvalidDonation {
                message: format!("unknown donation type {other:?}"),
            }),
        }
    }

    /// Type of a stored donation; unreadable values are logged and treated as cash.
    #[must_use]
    pub fn of(donation: &donation::Model) -> Self {
        Self::parse(&donation.donation_type).unwrap_or_else(|e| {
            tracing::warn!("Donation {} treated as cash: {}", donation.id, e);
            Self::Cash
        })
    }

    /// Whether the donation moves the cash fund
    #[must_use]
    pub const fn is_cash(self) -> bool {
        matches!(self, Self::Cash)
    }
}

/// How much of an in-kind donation has been used.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum UsageStatus {
    /// Nothing used yet
    Unused,
    /// Some usable items remain
    PartiallyUsed,
    /// Every usable item has been used
    FullyUsed,
}

impl UsageStatus {
    /// Stored column value
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Unused => "unused",
            Self::PartiallyUsed => "partially-used",
            Self::FullyUsed => "fully-used",
        }
    }

    /// Derives the status from the used and usable counts.
    #[must_use]
    pub const fn derive(used: i32, usable: i32) -> Self {
        if used <= 0 {
            Self::Unused
        } else if used < usable {
            Self::PartiallyUsed
        } else {
            Self::FullyUsed
        }
    }
}

/// Input for [`log_donation`].
#[derive(Debug, Clone)]
pub struct NewDonation {
    /// Donor name as given
    pub donor_name: String,
    /// Cash or in-kind
    pub donation_type: DonationType,
    /// Cash value, or assessed value for in-kind
    pub amount: Decimal,
    /// What was donated (in-kind)
    pub item_description: Option<String>,
    /// Number of items (in-kind)
    pub quantity: i32,
    /// School year the donation belongs to
    pub school_year_id: Option<i64>,
}

/// Counts submitted by the usage-update form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DonationUsage {
    /// Items consumed so far
    pub used: i32,
    /// Items received damaged
    pub damaged: i32,
    /// Items unusable for another reason
    pub unusable: i32,
    /// Items available for use
    pub usable: i32,
}

impl DonationUsage {
    /// Checks the counts against the donated quantity.
    pub fn validate(&self, donated: i32) -> Result<()> {
        if [self.used, self.damaged, self.unusable, self.usable]
            .iter()
            .any(|n| *n < 0)
        {
            return Err(Error::InvalidDonation {
                message: "quantities cannot be negative".to_string(),
            });
        }
        let accounted = i64::from(self.usable) + i64::from(self.damaged) + i64::from(self.unusable);
        if accounted > i64::from(donated) {
            return Err(Error::InvalidDonation {
                message: format!(
                    "usable + damaged + unusable ({accounted}) exceeds donated quantity ({donated})"
                ),
            });
        }
        if self.used > self.usable {
            return Err(Error::InvalidDonation {
                message: format!(
                    "used quantity ({}) exceeds usable quantity ({})",
                    self.used, self.usable
                ),
            });
        }
        Ok(())
    }
}

/// Logs a donation and appends it to the fund history in one transaction.
///
/// # Errors
/// - Empty donor name
/// - Cash donation with a non-positive amount
/// - In-kind donation with a non-positive quantity or negative assessed value
pub async fn log_donation(db: &DatabaseConnection, input: NewDonation) -> Result<donation::Model> {
    let donor_name = input.donor_name.trim().to_string();
    if donor_name.is_empty() {
        return Err(Error::InvalidDonation {
            message: "donor name cannot be empty".to_string(),
        });
    }

    let amount = match input.donation_type {
        DonationType::Cash => money::require_positive(input.amount)?,
        DonationType::InKind => {
            if input.quantity <= 0 {
                return Err(Error::InvalidDonation {
                    message: "in-kind donations need a quantity of at least one".to_string(),
                });
            }
            money::require_non_negative(input.amount)?
        }
    };
    let quantity = match input.donation_type {
        DonationType::Cash => 0,
        DonationType::InKind => input.quantity,
    };

    let txn = db.begin().await?;

    let model = donation::ActiveModel {
        donor_name: Set(donor_name.clone()),
        donation_type: Set(input.donation_type.as_str().to_string()),
        donation_amount: Set(amount),
        item_description: Set(input.item_description),
        donation_quantity: Set(quantity),
        used_quantity: Set(0),
        damaged_quantity: Set(0),
        unusable_quantity: Set(0),
        usable_quantity: Set(quantity),
        usage_status: Set(UsageStatus::Unused.as_str().to_string()),
        school_year_id: Set(input.school_year_id),
        received_at: Set(chrono::Utc::now()),
        ..Default::default()
    };
    let inserted = model.insert(&txn).await?;

    funds::append_entry(
        &txn,
        EntrySource::Donation(inserted.id, input.donation_type),
        amount,
        format!("{} donation from {donor_name}", input.donation_type.as_str()),
    )
    .await?;

    txn.commit().await?;

    tracing::info!(
        "Logged {} donation {} from {} worth {}",
        input.donation_type.as_str(),
        inserted.id,
        inserted.donor_name,
        amount
    );
    Ok(inserted)
}

/// Records how an in-kind donation's items have been used.
///
/// # Errors
/// - The donation does not exist or is a cash donation
/// - The counts fail [`DonationUsage::validate`]
pub async fn update_donation_usage(
    db: &DatabaseConnection,
    donation_id: i64,
    usage: DonationUsage,
) -> Result<donation::Model> {
    let existing = Donation::find_by_id(donation_id)
        .one(db)
        .await?
        .ok_or(Error::DonationNotFound { id: donation_id })?;

    if DonationType::of(&existing).is_cash() {
        return Err(Error::InvalidDonation {
            message: "usage can only be tracked for in-kind donations".to_string(),
        });
    }
    usage.validate(existing.donation_quantity)?;

    let status = UsageStatus::derive(usage.used, usage.usable);
    let mut active: donation::ActiveModel = existing.into();
    active.used_quantity = Set(usage.used);
    active.damaged_quantity = Set(usage.damaged);
    active.unusable_quantity = Set(usage.unusable);
    active.usable_quantity = Set(usage.usable);
    active.usage_status = Set(status.as_str().to_string());
    let updated = active.update(db).await?;

    tracing::info!(
        "Donation {} usage updated: {}/{} used ({})",
        donation_id,
        usage.used,
        usage.usable,
        status.as_str()
    );
    Ok(updated)
}

/// Retrieves a donation by id.
pub async fn get_donation_by_id<C>(db: &C, donation_id: i64) -> Result<Option<donation::Model>>
where
    C: ConnectionTrait,
{
    Donation::find_by_id(donation_id)
        .one(db)
        .await
        .map_err(Into::into)
}

/// Retrieves all donations, oldest first.
pub async fn get_all_donations(db: &DatabaseConnection) -> Result<Vec<donation::Model>> {
    Donation::find()
        .order_by_asc(donation::Column::ReceivedAt)
        .order_by_asc(donation::Column::Id)
        .all(db)
        .await
        .map_err(Into::into)
}
