pub mod diagnosis;
pub mod hexagram;
pub mod interaction;
pub mod profile;
pub mod pure_state;
pub mod reference;
pub mod scenario;
pub mod selector;
pub mod transition;
pub mod trigram;
