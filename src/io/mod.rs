// Purpose - external interfaces: note input, audio device output

pub mod midi;
pub mod output;
