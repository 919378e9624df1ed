//! Category filter for issue listing

use serde::Deserialize;

use super::ValidationError;

/// Body of `POST /app/indoorIssue/filtered`
#[derive(Debug, Deserialize)]
pub struct CategoryFilterRequest {
    pub category: Vec<String>,
}

/// Non-empty ordered list of category labels.
///
/// An empty list would produce an IN-clause without placeholders, so it is
/// rejected here.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CategoryFilter(Vec<String>);

impl CategoryFilter {
    pub fn new(categories: Vec<String>) -> Result<Self, ValidationError> {
        if categories.is_empty() {
            return Err(ValidationError::Empty { field: "category" });
        }
        Ok(Self(categories))
    }

    pub fn as_slice(&self) -> &[String] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn contains(&self, category: &str) -> bool {
        self.0.iter().any(|c| c == category)
    }
}

impl TryFrom<CategoryFilterRequest> for CategoryFilter {
    type Error = ValidationError;

    fn try_from(req: CategoryFilterRequest) -> Result<Self, Self::Error> {
        Self::new(req.category)
    }
}
