#![cfg(target_arch = "wasm32")]

use egdle_core::Storage;
use egdle_web::{EgdleGame, LocalStorageBackend};
use wasm_bindgen_test::*;

wasm_bindgen_test_configure!(run_in_browser);

#[wasm_bindgen_test]
fn local_storage_keeps_items() {
    let mut storage = LocalStorageBackend::new();
    assert!(storage.set_item("egdle2-test", "42").is_ok());
    assert_eq!(storage.get_item("egdle2-test").ok().flatten().as_deref(), Some("42"));
}

#[wasm_bindgen_test]
fn state_is_serialized_for_the_page() {
    let Ok(game) = EgdleGame::new("binary", None) else {
        panic!("binary should open");
    };
    let Ok(state) = game.state() else {
        panic!("state should serialize");
    };

    let state: serde_json::Value = serde_json::from_str(&state).unwrap();
    assert_eq!(state["id"], "binary");
    assert_eq!(state["cells"].as_array().unwrap().len(), 36);
    assert_eq!(state["details"]["kind"], "binary");
}

#[wasm_bindgen_test]
fn runs_start_from_the_page() {
    let Ok(game) = EgdleGame::new("aimlab", None) else {
        panic!("aimlab should open");
    };
    assert_eq!(game.start().ok().as_deref(), Some("changed"));
    assert!(game.share_text("u").is_ok_and(|text| text.ends_with("\nu")));
}

#[wasm_bindgen_test]
fn unknown_games_are_rejected() {
    assert!(EgdleGame::new("chess", None).is_err());
}

#[wasm_bindgen_test]
fn unknown_settings_are_rejected() {
    let Ok(game) = EgdleGame::new("puzzle", None) else {
        panic!("puzzle should open");
    };
    assert!(game.set_option("volume", "1").is_err());
    assert!(game.set_option("gridSizes", "0").is_ok());
}
