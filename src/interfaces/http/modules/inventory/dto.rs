//! Inventory DTOs

use chrono::NaiveDate;
use serde::Deserialize;
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

/// Set the day's stock of chicken units.
#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SetInventoryRequest {
    #[validate(length(min = 1, message = "is required"))]
    #[schema(example = "market")]
    pub location_id: String,
    /// Defaults to today
    pub date: Option<NaiveDate>,
    #[validate(range(max = 100000, message = "must be at most 100000"))]
    #[schema(example = 40)]
    pub total_units: u32,
}

#[derive(Debug, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct InventoryQuery {
    pub location_id: String,
    /// Defaults to today
    pub date: Option<NaiveDate>,
}
