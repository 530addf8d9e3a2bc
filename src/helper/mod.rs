pub mod admin_helpers;
pub mod form_helpers;
pub mod image_helpers;
pub mod listing_helpers;
pub mod pagination_helpers;
pub mod public_helpers;
pub mod sanitization_helpers;
pub mod section_helpers;
pub mod ticker_helpers;
pub mod writer_helpers;
