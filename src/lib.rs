pub mod clip;
pub mod config;
pub mod filter;
pub mod flight;
pub mod resample;
pub mod split;
pub mod table;

pub use clip::{ClipShape, TimeWindow};
pub use config::{ConfigError, PipelineConfig};
pub use filter::{FilterError, OutlierFilter};
pub use flight::{Clipped, Flight, FlightError, Identity};
pub use resample::ResampleError;
pub use split::TimeUnit;
pub use table::{Sample, SampleTable, TableError, Value};
