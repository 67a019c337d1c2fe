pub mod use_cases;

pub use use_cases::ifc_export::IfcExportUseCase;
pub use use_cases::progress::{ProgressSink, TracingProgress};
pub use use_cases::type_parameters::TypeParametersUseCase;
pub use use_cases::views::ModelViewsUseCase;
