//! Identity resolver adapters.

mod static_tokens;

pub use static_tokens::StaticTokenResolver;
