//! Public types exposed by the `phpbb-acl-core` crate.

pub mod acl;

pub use acl::{AclOptionIndex, AclOptionRow, UserAcl};
