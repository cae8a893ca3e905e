// Aggregate analyzers: segmentation, trend insights, and marketing collateral.
pub mod collateral;
pub mod handlers;
pub mod insights;
pub mod prompts;
pub mod sampling;
pub mod segments;
pub mod store;
