//! Service operation handlers, grouped by call shape.
//!
//! Each submodule adds an `impl DocStoreService` block:
//!
//! - [`collection`] -- open/close/count/list for collections
//! - [`resource`] -- open/create/remove/close for resources
//! - [`transfer`] -- streaming download and upload

mod collection;
mod resource;
mod transfer;
