pub mod automation;
pub mod ifc_export;
pub mod progress;
pub mod type_parameters;
pub mod views;
pub mod workitem_poller;
