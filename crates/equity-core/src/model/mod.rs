pub mod card;
pub mod encoding;
pub mod rank;
pub mod slots;
pub mod suit;
