//! Safety module root.
//!
//! Actuator interlocks: conflicting manual requests and feedback discordance.

pub mod interlock;
