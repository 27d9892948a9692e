//! # FWB - Compile-Time Write Barrier Policy
//!
//! FWB decides, for every pointer-shaped field or array element of a traced
//! heap, whether a store to it must notify the garbage collector, and makes
//! it impossible to store into such a location through the public API
//! without that notification.
//!
//! ## Overview
//!
//! - **Allocator tags**: each allocator declares whether it hands out
//!   collector-visible memory ([`policy::AllocatorIdentity`])
//! - **Element shapes**: each element type is classified as pointer-shaped
//!   or opaque ([`policy::ElementShape`])
//! - **Policy combination**: the two are combined at the type level into one
//!   of two policies, with no runtime cost
//! - **Wrapper selection**: the policy picks [`TrackedPtr`] (every store
//!   notifies) or plain storage ([`PlainPtr`], [`PlainField`], the bare type)
//! - **Bulk interlock**: raw memory primitives reject tracked storage at
//!   compile time ([`memory::RawBulk`])
//!
//! ## Quick Start
//!
//! ```rust
//! use fwb::policy::{FieldPtr, LeafAllocator, ManagedAllocator};
//!
//! struct Node {
//!     next: FieldPtr<Node, ManagedAllocator>,
//!     label: FieldPtr<u8, LeafAllocator>,
//! }
//!
//! fn main() -> fwb::Result<()> {
//!     fwb::init()?;
//!
//!     let mut tail = Node { next: Default::default(), label: Default::default() };
//!     let mut head = Node { next: Default::default(), label: Default::default() };
//!
//!     // Notifies the collector: `next` lives in managed memory
//!     head.next.set(&mut tail);
//!     // Ordinary store: `label` lives in leaf memory
//!     head.label.set(std::ptr::null_mut());
//!
//!     assert!(!head.next.is_null());
//!     Ok(())
//! }
//! ```
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────┐
//! │                     Mutator stores                       │
//! │   field.set(p)      TrackedPtr::copy_array    copy_slice │
//! └──────┬───────────────────────┬───────────────────┬───────┘
//!        │                       │                   │
//!        ▼                       ▼                   ▼
//! ┌──────────────┐     ┌───────────────────┐   ┌────────────┐
//! │ policy       │────►│ ptr               │   │ memory     │
//! │ shape + tag  │     │ TrackedPtr        │   │ RawBulk    │
//! │ And, select  │     │ PlainPtr/Field    │   │ interlock  │
//! └──────────────┘     └─────────┬─────────┘   └─────┬──────┘
//!                                │                   │
//!                                ▼                   ▼
//!                      ┌────────────────────────────────────┐
//!                      │ barrier::notify::<M>               │
//!                      │ NoBarrier | CardTableBarrier       │
//!                      └─────────────────┬──────────────────┘
//!                                        ▼
//!                             card tables, stats, logging
//! ```
//!
//! ## Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`policy`] | Element shapes, allocator tags, policy combination, wrapper selection |
//! | [`ptr`] | Tracked and plain wrappers |
//! | [`memory`] | Raw bulk primitives and policy-driven copies |
//! | [`barrier`] | Notification managers, card tables, statistics |
//! | [`config`] | Barrier recording configuration |
//! | [`logging`] | Barrier event logging |
//! | [`error`] | Error types |
//!
//! ## Features
//!
//! - `concurrent-barrier` (default): emit notifications. Without it every
//!   notification compiles to nothing; types and policies are unchanged.
//!
//! ## Compile-Time Guarantees
//!
//! - A [`TrackedPtr`] has no mutable address-of, no `DerefMut` and no
//!   `Clone`, so every store goes through a notifying setter or an
//!   `unsafe` unbarriered one
//! - Raw bulk primitives do not accept tracked storage
//! - Unclassified element types are rejected instead of guessed
//!
//! `std::mem::swap` and `std::mem::replace` on two tracked fields are not
//! caught; use [`TrackedPtr::replace`] instead.

pub mod config;
pub mod error;

// Policy resolution
pub mod policy;
pub mod ptr;

// Notification and bulk operations
pub mod barrier;
pub mod memory;

// Diagnostics
pub mod logging;

pub use config::BarrierConfig;
pub use error::{FwbError, Result};
pub use policy::{requires_barrier, NoWriteBarrierPolicy, WriteBarrierPolicy};
pub use ptr::{BarrierPtr, PlainField, PlainPtr, TrackedPtr};

/// FWB version string from Cargo.toml
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Initialize FWB from the environment
///
/// Reads [`BarrierConfig::from_env`] and applies it with
/// [`init_with_config`].
///
/// # Examples
///
/// ```rust
/// let config = fwb::init().expect("default configuration is valid");
/// assert!(config.card_size() >= 16);
/// ```
pub fn init() -> Result<BarrierConfig> {
    init_with_config(BarrierConfig::from_env())
}

/// Initialize FWB with a custom configuration
///
/// Validates `config`, configures the barrier logger, turns statistics on
/// or off and makes `config` the [`config::active_config`]. Card tables
/// built with [`CardTable::with_active_config`](barrier::CardTable::with_active_config)
/// use its card size; tables built with an explicit shift are unaffected.
/// Returns the applied configuration.
///
/// # Errors
///
/// Returns [`FwbError::Configuration`] if validation fails; nothing is
/// applied in that case.
///
/// # Examples
///
/// ```rust
/// use fwb::BarrierConfig;
///
/// let config = BarrierConfig {
///     card_shift: 10,
///     verbose: true,
///     ..Default::default()
/// };
/// let applied = fwb::init_with_config(config).unwrap();
/// assert_eq!(applied.card_size(), 1024);
/// ```
pub fn init_with_config(config: BarrierConfig) -> Result<BarrierConfig> {
    if let Err(e) = config.validate() {
        logging::log_event(logging::BarrierEvent::ConfigRejected {
            reason: e.to_string(),
        });
        return Err(e.into());
    }

    logging::configure_logger(config.logger_config());
    barrier::set_stats_enabled(config.stats_enabled);
    config::set_active_config(config.clone());

    log::debug!(
        "FWB {} initialized: {} byte cards, stats {}",
        VERSION,
        config.card_size(),
        if config.stats_enabled { "on" } else { "off" }
    );

    Ok(config)
}
