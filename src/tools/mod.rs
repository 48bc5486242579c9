pub mod angle;
pub mod input_port;
