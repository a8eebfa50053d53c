// Purpose: the single voice, its control messages, and the control-thread
// controller that drives it

pub mod controller;
pub mod message;
pub mod voice;
