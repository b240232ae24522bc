//! Share grant entity.

pub mod model;
pub mod permission;

pub use model::{CreateShareGrant, ShareGrant, SharedItemType};
pub use permission::SharePermission;
