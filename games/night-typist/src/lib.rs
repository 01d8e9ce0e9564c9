use wasm_bindgen::prelude::*;
use dread_engine::*;

mod game;
mod stories;
use game::NightTypist;

dread_web::export_game!(NightTypist, "night-typist");
