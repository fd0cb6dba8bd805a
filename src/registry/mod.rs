//! Remote version documents: vendor endpoints and GitHub releases.

pub mod github;
pub mod vulkan;
