//! Method bodies.
//!
//! - [`RawMethodBody`]: header, code bytes and exception handling sections as stored
//! - [`CilMethodBody`]: decoded instructions with label verification and max stack computation
//! - [`CilExceptionHandler`]: one try region and its handler

mod body;
mod exceptions;
mod raw;
mod stack;
mod types;

pub use body::{CilMethodBody, HandlerBoundary, InvalidLabel};
pub use exceptions::{CilExceptionHandler, ExceptionHandlerFlags, FAT_CLAUSE_SIZE, SMALL_CLAUSE_SIZE};
pub use raw::RawMethodBody;
pub use types::{
    MethodBodyFlags, SectionFlags, FAT_HEADER_DWORDS, FAT_HEADER_SIZE, TINY_MAX_CODE_SIZE,
    TINY_MAX_STACK,
};
