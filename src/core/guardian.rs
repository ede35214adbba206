//! Guardian business logic.

use crate::{
    entities::{Guardian, guardian},
    errors::{Error, Result},
};
use sea_orm::{QueryOrder, Set, prelude::*};

/// Registers a guardian. Blank email and contact number are stored as `None`.
pub async fn create_guardian(
    db: &DatabaseConnection,
    name: &str,
    email: Option<String>,
    contact_number: Option<String>,
) -> Result<guardian::Model> {
    let name = name.trim();
    if name.is_empty() {
        return Err(Error::Config {
            message: "Guardian name cannot be empty".to_string(),
        });
    }

    let blank_to_none = |value: Option<String>| {
        value
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
    };

    let guardian = guardian::ActiveModel {
        name: Set(name.to_string()),
        email: Set(blank_to_none(email)),
        contact_number: Set(blank_to_none(contact_number)),
        created_at: Set(chrono::Utc::now()),
        ..Default::default()
    }
    .insert(db)
    .await?;

    tracing::info!("Registered guardian {} ({})", guardian.id, guardian.name);
    Ok(guardian)
}

/// Retrieves a guardian by id.
pub async fn get_guardian_by_id<C>(db: &C, guardian_id: i64) -> Result<Option<guardian::Model>>
where
    C: ConnectionTrait,
{
    Guardian::find_by_id(guardian_id)
        .one(db)
        .await
        .map_err(Into::into)
}

/// Finds a guardian by email (used by the guardian portal login lookup).
pub async fn get_guardian_by_email(
    db: &DatabaseConnection,
    email: &str,
) -> Result<Option<guardian::Model>> {
    Guardian::find()
        .filter(guardian::Column::Email.eq(email.trim()))
        .one(db)
        .await
        .map_err(Into::into)
}

/// Retrieves all guardians ordered by name.
pub async fn get_all_guardians(db: &DatabaseConnection) -> Result<Vec<guardian::Model>> {
    Guardian::find()
        .order_by_asc(guardian::Column::Name)
        .all(db)
        .await
        .map_err(Into::into)
}
