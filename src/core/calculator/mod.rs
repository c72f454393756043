//! Pure attendance engine: no I/O beyond the read-only schedule lookups
//! the shift resolver performs through [`crate::core::ports`].

pub mod aggregate;
pub mod attendance;
pub mod interval;
pub mod shift;
pub mod workday;
