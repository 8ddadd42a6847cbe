//! The API endpoint URIs.

/// The route for generating and saving a user's synthetic transaction data.
pub const GENERATE_DATA: &str = "/api/generate-data";
/// The route for comparing cards against a user's saved spending.
pub const CARD_REPORT: &str = "/api/card-report";
/// The route for checking that the server is up.
pub const HEALTH: &str = "/api/health";
