pub mod acc;
pub mod activity;
pub mod error;
pub mod ifc_export;
pub mod job;
pub mod manifest;
pub mod type_params;
pub mod workitem;
