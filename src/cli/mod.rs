pub mod ask;
pub mod export;
pub mod import;

pub use ask::ask;
pub use export::export;
pub use import::import;
