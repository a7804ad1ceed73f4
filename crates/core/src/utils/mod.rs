pub mod money;
pub mod serde_helpers;
pub mod time_utils;

pub use money::*;
pub use serde_helpers::double_option;
pub use time_utils::*;
