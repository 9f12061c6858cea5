//! Signal chain: from raw lid angle to ramped audio parameters.
//!
//! The jitter filter and velocity estimator are shared; the creak and
//! futuristic mappers are interchangeable strategies plugged into the
//! same [`engine::Engine`].

pub mod bands;
pub mod creak;
pub mod engine;
pub mod futuristic;
pub mod jitter;
pub mod ramp;
pub mod velocity;
