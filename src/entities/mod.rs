//! Entity module - Contains all SeaORM entity definitions for the database.
//! These entities represent the database tables and their relationships.
//! Each entity has a Model struct for data and an Entity struct for operations.

pub mod contribution;
pub mod donation;
pub mod expense;
pub mod funds_history;
pub mod grade_level;
pub mod guardian;
pub mod payment;
pub mod school_year;
pub mod school_year_contribution;
pub mod section;
pub mod student;
pub mod system_state;

// Re-export specific types to avoid conflicts
pub use contribution::{Entity as Contribution, Model as ContributionModel};
pub use donation::{Entity as Donation, Model as DonationModel};
pub use expense::{Entity as Expense, Model as ExpenseModel};
pub use funds_history::{Entity as FundsHistory, Model as FundsHistoryModel};
pub use grade_level::{Entity as GradeLevel, Model as GradeLevelModel};
pub use guardian::{Entity as Guardian, Model as GuardianModel};
pub use payment::{Entity as Payment, Model as PaymentModel};
pub use school_year::{Entity as SchoolYear, Model as SchoolYearModel};
pub use school_year_contribution::{
    Entity as SchoolYearContribution, Model as SchoolYearContributionModel,
};
pub use section::{Entity as Section, Model as SectionModel};
pub use student::{Entity as Student, Model as StudentModel};
pub use system_state::{Entity as SystemState, Model as SystemStateModel};
