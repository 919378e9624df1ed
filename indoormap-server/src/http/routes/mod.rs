//! Route handlers organized by resource

pub mod health;
pub mod buildings;
pub mod issues;
