//! Native tensor data structures
//!
//! This module contains the transport-agnostic tensor representation:
//! - ElementType: Runtime tag for every supported element type
//! - Element: Trait binding Rust scalar types to their tag
//! - TensorArray: Owned n-dimensional array of any supported element type

pub mod array;
pub mod element;

pub use array::TensorArray;
pub use element::{Element, ElementType};
