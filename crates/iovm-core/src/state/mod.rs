mod exec_state;
mod registers;

pub use exec_state::ExecutionState;
pub use registers::{Channel, ChannelRegisters, RegisterFile, ADDRESS_MASK, CHANNEL_COUNT};
