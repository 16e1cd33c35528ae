//! UCI command handling through the engine front end.

use squall::uci::Engine;

#[test]
fn test_command_sequence_runs_clean() {
    let mut engine = Engine::new();
    assert!(engine.handle_line("uci"));
    assert!(engine.handle_line("isready"));
    assert!(engine.handle_line("ucinewgame"));
    assert!(engine.handle_line("setoption name Hash value 8"));
    assert!(engine.handle_line("position startpos moves e2e4 e7e5"));
    assert!(engine.handle_line("d"));
    assert!(engine.handle_line("eval"));
    assert!(engine.handle_line("moves"));
    assert!(!engine.handle_line("quit"));
}

#[test]
fn test_unknown_command_is_harmless() {
    let mut engine = Engine::new();
    assert!(engine.handle_line("xyzzy"));
    assert!(engine.handle_line(""));
    assert!(engine.handle_line("   "));
}

#[test]
fn test_case_insensitive_commands() {
    let mut engine = Engine::new();
    assert!(engine.handle_line("ISREADY"));
    assert!(engine.handle_line("Position startpos"));
    assert!(!engine.handle_line("QUIT"));
}

#[test]
fn test_invalid_fen_leaves_state_unchanged() {
    let mut engine = Engine::new();
    engine.handle_line("position startpos moves e2e4");
    engine.handle_line("position fen not a real fen at all");
    // The previous position still stands; a legal continuation works
    engine.handle_line("position startpos moves e2e4 e7e5");
}

#[test]
fn test_perft_command() {
    let mut engine = Engine::new();
    engine.handle_line("position startpos");
    assert!(engine.handle_line("perft 2"));
    assert!(engine.handle_line("perft"));
}

#[test]
fn test_go_and_stop() {
    let mut engine = Engine::new();
    engine.handle_line("setoption name Hash value 4");
    engine.handle_line("position startpos");
    assert!(engine.handle_line("go depth 2"));
    assert!(engine.handle_line("stop"));
    // A second search after stop works
    assert!(engine.handle_line("go movetime 50"));
    assert!(engine.handle_line("stop"));
}
