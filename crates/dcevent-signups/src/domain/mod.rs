//! Domain types of the signup context.

pub mod contest;
pub mod signup;
