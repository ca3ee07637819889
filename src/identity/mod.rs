//! # Registration identities.
//!
//! A registration is keyed by two opaque values:
//! - [`Recipient`] who is listening (reference identity, name, unique id or arbitrary value);
//! - [`Context`] an optional topic used for exact-match filtering.
//!
//! Both are built on an internal type-erased [`Token`](token::Token) that
//! compares by value and never equals a token of a different concrete type.

mod context;
mod recipient;
mod token;

pub use context::Context;
pub use recipient::Recipient;
