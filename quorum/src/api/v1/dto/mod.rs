mod ask;

pub use ask::AskRequest;
