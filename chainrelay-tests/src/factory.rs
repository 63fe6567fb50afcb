mod configs;
mod contracts;
mod logs;
mod providers;
mod publishers;

pub use configs::*;
pub use contracts::*;
pub use logs::*;
pub use providers::*;
pub use publishers::*;
