pub mod position;
pub mod reflow;
pub mod scorer;
pub mod session;
pub mod stats;
pub mod width;

pub use position::{Position, to_position};
pub use reflow::{reflow, total_display_length};
pub use scorer::{CharMark, LineScorer};
pub use session::{Phase, PracticeSession, RewardPolicy, SessionEffect};
pub use width::{WidthPolicy, estimate_columns};
