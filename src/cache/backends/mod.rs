//! Cache backend implementations.

pub mod null;
pub mod scoped;
pub mod singleton;

pub use null::NullCache;
pub use scoped::ScopedCache;
pub use singleton::SingletonCache;
