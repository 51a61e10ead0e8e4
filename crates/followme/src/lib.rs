mod app;

pub use app::history::{TickHistory, TickOutcome, TickRecord};
pub use app::init::{get_followme_dir, FollowMeConfig};
pub use app::scheduler::{PollScheduler, SchedulerConfig};
pub use app::start_followme;
