//! # tellus-calendar
//!
//! Model-time conventions shared by the rescaling pipeline and the
//! simulation driver.
//!
//! ## Architecture
//!
//! ```mermaid
//! graph LR
//!     A["NaiveDateTime"] -->|"state_stamp()"| B["YYYYMMDD_SSSSS"]
//!     B -->|"parse_state_stamp()"| A
//!     C["steps_per_day"] -->|"step_length()"| D["TimeDelta"]
//!     E["history labels"] -->|"align_history_times()"| F["state times"]
//!     G["(start, end)"] -->|"year_span()"| H["years with history"]
//! ```
//!
//! ## Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | `stamp` | Date + seconds-of-day file stamps |
//! | `step` | Model step length and history-time alignment |
//! | `span` | Calendar years covered by a run |
//! | `error` | Error types |

mod error;
mod span;
mod stamp;
mod step;

pub use error::CalendarError;
pub use span::year_span;
pub use stamp::{parse_state_stamp, seconds_of_day, state_stamp};
pub use step::{align_history_times, step_length};
