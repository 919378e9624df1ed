//! Domain models with validation at construction
//!
//! All user input is validated when creating these types.
//! Invalid input returns ValidationError, not panic.

pub mod validation;
pub mod building;
pub mod issue;
pub mod category;

pub use validation::ValidationError;
pub use building::{Building, BuildingDoc};
pub use issue::{ImageUpload, Issue, IssueImage, IssuePatch, IssueValue, NewIssue};
pub use category::{CategoryFilter, CategoryFilterRequest};
