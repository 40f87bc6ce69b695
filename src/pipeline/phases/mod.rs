mod common;
pub mod features;
pub mod flows;
pub mod interactions;
pub mod screens;

pub use features::FeaturesPhase;
pub use flows::FlowsPhase;
pub use interactions::InteractionsPhase;
pub use screens::ScreensPhase;
