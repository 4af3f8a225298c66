pub mod error;
pub mod filter;
pub mod record;
pub mod timestamp;
pub mod traits;

pub use error::{DriverError, Result, StoreError};
pub use filter::{Condition, Direction, Filters, OrderBy, Select};
pub use record::{Record, RecordId};
pub use timestamp::{Clock, SystemClock, Timestamper};
pub use traits::DatabaseDriver;
