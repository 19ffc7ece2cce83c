mod backoff;
#[cfg(feature = "pool")]
mod pool;
#[cfg(any(feature = "async-tokio", feature = "async-smol"))]
mod runtime;
mod runtime_provider;

#[cfg_attr(docsrs, doc(cfg(feature = "futures")))]
pub use backoff::*;
#[cfg_attr(docsrs, doc(cfg(feature = "pool")))]
#[cfg(feature = "pool")]
pub use pool::*;
#[cfg_attr(docsrs, doc(cfg(any(feature = "async-tokio", feature = "async-smol"))))]
#[cfg(any(feature = "async-tokio", feature = "async-smol"))]
pub use runtime::*;
#[cfg_attr(docsrs, doc(cfg(feature = "futures")))]
pub use runtime_provider::*;
