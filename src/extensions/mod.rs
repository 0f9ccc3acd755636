//! Optional behavior hooked onto a view scope.
//!
//! Keep extensions decoupled from the controllers: they only see events,
//! a read-only context and the timer contract.

mod carousel;
mod count_up;
mod listener;
mod timer;

pub use carousel::{AutoPlayCarousel, DEFAULT_AUTO_PLAY_INTERVAL_SECS};
pub use count_up::{CountUp, CountUpConfig};
pub use listener::{ViewContext, ViewEvent, ViewListener};
pub use timer::ViewTimer;
