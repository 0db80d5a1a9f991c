pub mod ligdicash;
pub mod moov;
pub mod orange;

pub use ligdicash::{LigdicashConfig, LigdicashProvider};
pub use moov::{MoovConfig, MoovProvider};
pub use orange::{OrangeConfig, OrangeProvider};
