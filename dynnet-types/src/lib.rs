//! # dynnet-types
//!
//! Core time, value, and key types for the dynnet temporal attribute store.
//!
//! This crate provides the plain types exchanged between a loader, the
//! temporal index, and a rendering driver:
//!
//! - **Time**: `Time`, a totally ordered real value where `-inf`/`+inf` are
//!   representable and NaN is not
//! - **Values**: `AttrValue` and `ValueType`, the typed payload of an interval
//! - **Keys**: `EntityId`, `EntityKind`, `AttributeKey`
//! - **Stats**: `StoreStats`
//!
//! All types are serializable with Serde.
//!
//! ## Examples
//!
//! ```rust
//! use dynnet_types::key::{AttributeKey, EntityId};
//! use dynnet_types::time::Time;
//! use dynnet_types::value::AttrValue;
//!
//! let key = AttributeKey::new("weight", EntityId(7));
//! assert_eq!(key.column(), "weight");
//!
//! let t = Time::new(2.5).unwrap();
//! assert!(Time::NEG_INFINITY < t && t < Time::INFINITY);
//!
//! let v = AttrValue::from(3);
//! assert_eq!(v.as_f64(), Some(3.0));
//! ```

pub mod key;
pub mod stats;
pub mod time;
pub mod value;
