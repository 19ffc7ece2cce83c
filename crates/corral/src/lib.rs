#![doc = include_str!("../README.md")]
#![cfg_attr(docsrs, feature(doc_cfg))]

mod backoff;
mod error;
#[cfg(feature = "futures")]
mod futures;
mod mutex;

pub use crate::backoff::*;
pub use crate::error::*;
#[cfg(feature = "futures")]
pub use crate::futures::*;
pub use crate::mutex::*;
