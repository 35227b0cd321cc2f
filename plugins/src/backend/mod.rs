mod command;
mod echo;

pub use command::CommandBackend;
pub use echo::EchoBackend;
