mod ask;
pub(crate) mod health;

pub use ask::ask;
pub use health::health_check;
