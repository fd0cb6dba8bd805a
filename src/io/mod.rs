//! Network and filesystem plumbing: probing, downloads, archives, DMGs.

pub mod dmg;
pub mod download;
pub mod extract;
pub mod http;
