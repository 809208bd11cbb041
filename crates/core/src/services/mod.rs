pub mod local;

pub use local::LocalApi;
