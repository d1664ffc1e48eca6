pub mod board;
pub mod event;
pub mod resolve;
pub mod turn;
pub mod world;
