//! Hashing: the external hash primitive and position derivation.
//!
//! # Module Structure
//!
//! ```text
//! hash/
//! ├── hasher.rs  - BloomHasher trait, XxHasher (default), StdHasher (SipHash)
//! ├── derive.rs  - IndexDeriver: key → k positions
//! └── mod.rs     - This file (public API)
//! ```
//!
//! The hash algorithm itself is a collaborator, not part of the filter
//! engine; anything implementing [`BloomHasher`] can be plugged in.
//!
//! # Examples
//!
//! ```
//! use hyperbloom::hash::IndexDeriver;
//!
//! let deriver = IndexDeriver::new(1 << 20, 4)?;
//! let positions = deriver.derive(b"b99afb65c9f97b2e0feea844eea55f69");
//! assert_eq!(positions.len(), 4);
//! assert!(positions.iter().all(|&p| p < 1 << 20));
//! # Ok::<(), hyperbloom::HyperBloomError>(())
//! ```

pub mod derive;
pub mod hasher;

pub use derive::{IndexDeriver, Positions, MAX_HASHES};
pub use hasher::{BloomHasher, StdHasher, XxHasher};
