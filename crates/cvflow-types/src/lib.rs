//! Foundation types for cvflow.
//!
//! This crate provides the resource identifiers and document-path helpers
//! used throughout the cvflow system. Every other cvflow crate depends on
//! `cvflow-types`.
//!
//! # Key Types
//!
//! - [`WorkspaceId`]: staging area for pending configuration changes
//! - [`StudioId`]: named configuration-generation unit on the platform
//! - [`ChangeControlId`]: approval-gated unit of work spawned on submit
//! - [`RequestId`]: correlates an asynchronous request with its response
//! - [`segment`]: classification of document-path segments (index vs. key)

pub mod ids;
pub mod segment;

pub use ids::{
    ActionId, ChangeControlId, DeviceId, RequestId, StudioId, UpdateId, WorkspaceId, MAINLINE_ID,
};
