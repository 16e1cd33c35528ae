//! UCI protocol front end.
//!
//! Line-oriented command loop: the engine state lives on the main thread,
//! searches run on a spawned thread holding the `Search` lock, and `stop`
//! reaches them through the shared atomic flag.

pub mod options;

use std::io::BufRead;
use std::path::Path;
use std::sync::atomic::AtomicBool;
use std::sync::{Arc, Mutex};
use std::thread::JoinHandle;
use std::time::Instant;

use crate::board::eval::format_evaluation;
use crate::board::{perft_divide, Position, UndoInfo};
use crate::book::OpeningBook;
use crate::search::{Search, SearchLimits};

use options::{EngineOptions, OptionChange};

pub const ENGINE_NAME: &str = "Squall";
pub const ENGINE_AUTHOR: &str = "the Squall developers";

pub struct Engine {
    search: Arc<Mutex<Search>>,
    stop: Arc<AtomicBool>,
    position: Position,
    /// Hashes of the positions before each applied move, for repetitions.
    history: Vec<u64>,
    options: EngineOptions,
    search_thread: Option<JoinHandle<()>>,
}

impl Engine {
    #[must_use]
    pub fn new() -> Self {
        let search = Search::new(crate::tt::DEFAULT_TT_MB);
        let stop = search.stop_handle();
        Engine {
            search: Arc::new(Mutex::new(search)),
            stop,
            position: Position::startpos(),
            history: Vec::new(),
            options: EngineOptions::default(),
            search_thread: None,
        }
    }

    /// Run the command loop until `quit` or EOF.
    pub fn run(&mut self) {
        let stdin = std::io::stdin();
        for line in stdin.lock().lines() {
            let Ok(line) = line else { break };
            if !self.handle_line(&line) {
                break;
            }
        }
        self.stop_search();
    }

    /// Dispatch one input line; returns false on `quit`.
    pub fn handle_line(&mut self, line: &str) -> bool {
        let tokens: Vec<&str> = line.split_whitespace().collect();
        let Some(&command) = tokens.first() else {
            return true;
        };
        match command.to_ascii_lowercase().as_str() {
            "uci" => self.cmd_uci(),
            "isready" => println!("readyok"),
            "ucinewgame" => self.cmd_new_game(),
            "setoption" => self.cmd_setoption(&tokens[1..]),
            "position" => self.cmd_position(&tokens[1..]),
            "go" => self.cmd_go(&tokens[1..]),
            "stop" => self.stop_search(),
            "quit" => return false,
            "d" => println!("{}", self.position),
            "eval" => println!("{}", format_evaluation(&self.position)),
            "perft" => self.cmd_perft(&tokens[1..]),
            "moves" => self.cmd_moves(),
            "help" => print_help(),
            other => {
                println!("Unknown command: {other}");
                println!("Type \"help\" for available commands");
            }
        }
        true
    }

    fn cmd_uci(&self) {
        println!("id name {ENGINE_NAME}");
        println!("id author {ENGINE_AUTHOR}");
        for declaration in EngineOptions::uci_declarations() {
            println!("{declaration}");
        }
        println!("uciok");
    }

    fn cmd_new_game(&mut self) {
        self.stop_search();
        if let Ok(mut search) = self.search.lock() {
            search.new_game();
        }
        self.position = Position::startpos();
        self.history.clear();
    }

    fn cmd_setoption(&mut self, args: &[&str]) {
        // setoption name <tokens...> [value <tokens...>]
        let mut iter = args.iter().peekable();
        if iter.next_if(|&&t| t.eq_ignore_ascii_case("name")).is_none() {
            println!("setoption requires 'name'");
            return;
        }
        let mut name_parts = Vec::new();
        while let Some(&token) = iter.peek() {
            if token.eq_ignore_ascii_case("value") {
                break;
            }
            name_parts.push(*iter.next().unwrap());
        }
        let value = if iter.next().is_some() {
            let rest: Vec<&str> = iter.copied().collect();
            Some(rest.join(" "))
        } else {
            None
        };
        let name = name_parts.join(" ");

        match self.options.apply(&name, value.as_deref()) {
            Ok(change) => self.apply_option_change(change),
            Err(err) => println!("{err}"),
        }
    }

    fn apply_option_change(&mut self, change: OptionChange) {
        self.stop_search();
        let Ok(mut search) = self.search.lock() else {
            return;
        };
        match change {
            OptionChange::MultiPv => search.settings.multipv = self.options.multipv,
            OptionChange::SkillLevel => search.settings.skill_level = self.options.skill_level,
            OptionChange::Threads => search.settings.threads = self.options.threads,
            OptionChange::Hash => search.resize_tt(self.options.hash_mb),
            OptionChange::UseNnue => {
                if self.options.use_nnue {
                    println!("info string no NNUE network available, using classical evaluation");
                    self.options.use_nnue = false;
                }
            }
            OptionChange::BookFile => {
                search.book = None;
                if let Some(path) = &self.options.book_file {
                    if !path.is_empty() && path != "<empty>" {
                        let mut book = OpeningBook::new();
                        if book.append_from_file(Path::new(path)) {
                            search.book = Some(book);
                        } else {
                            println!("info string could not open book file {path}");
                        }
                    }
                }
            }
        }
    }

    fn cmd_position(&mut self, args: &[&str]) {
        let mut iter = args.iter().peekable();
        let mut position = match iter.peek().copied() {
            Some(&"startpos") => {
                iter.next();
                Position::startpos()
            }
            Some(&"fen") => {
                iter.next();
                let mut fen_parts = Vec::new();
                while let Some(&token) = iter.peek() {
                    if token.eq_ignore_ascii_case("moves") {
                        break;
                    }
                    fen_parts.push(*iter.next().unwrap());
                }
                match Position::from_fen(&fen_parts.join(" ")) {
                    Ok(pos) => pos,
                    Err(err) => {
                        println!("Invalid FEN: {err}");
                        return;
                    }
                }
            }
            _ => {
                println!("position requires 'startpos' or 'fen <FEN>'");
                return;
            }
        };

        let mut history = Vec::new();
        if iter
            .next_if(|&&t| t.eq_ignore_ascii_case("moves"))
            .is_some()
        {
            let mut undo = UndoInfo::new();
            for &token in iter {
                match position.parse_uci_move(token) {
                    Ok(mv) => {
                        history.push(position.hash());
                        position.make_move_auto(mv, &mut undo);
                    }
                    Err(err) => {
                        // Prior legal moves stand
                        println!("{err}");
                        break;
                    }
                }
            }
        }
        self.position = position;
        self.history = history;
    }

    fn cmd_go(&mut self, args: &[&str]) {
        self.stop_search();

        let mut limits = SearchLimits::default();
        let mut i = 0;
        while i < args.len() {
            let value = args.get(i + 1).and_then(|t| t.parse::<u64>().ok());
            match args[i].to_ascii_lowercase().as_str() {
                "infinite" | "ponder" => limits.infinite = true,
                "wtime" => {
                    limits.white_time_ms = value;
                    i += 1;
                }
                "btime" => {
                    limits.black_time_ms = value;
                    i += 1;
                }
                "winc" => {
                    limits.white_inc_ms = value;
                    i += 1;
                }
                "binc" => {
                    limits.black_inc_ms = value;
                    i += 1;
                }
                "movestogo" => {
                    limits.moves_to_go = value.map(|v| v as u32);
                    i += 1;
                }
                "movetime" => {
                    limits.movetime_ms = value;
                    i += 1;
                }
                "depth" => {
                    limits.depth = value.map(|v| v as i32);
                    i += 1;
                }
                "nodes" => {
                    limits.nodes = value;
                    i += 1;
                }
                "searchmoves" => {
                    for &move_token in &args[i + 1..] {
                        match self.position.parse_uci_move(move_token) {
                            Ok(mv) => limits.searchmoves.push(mv),
                            Err(err) => {
                                println!("{err}");
                                break;
                            }
                        }
                    }
                    i = args.len();
                }
                _ => {}
            }
            i += 1;
        }

        let search = Arc::clone(&self.search);
        let position = self.position.clone();
        let history = self.history.clone();
        let handle = std::thread::Builder::new()
            .name("search-main".to_string())
            .spawn(move || {
                let Ok(mut search) = search.lock() else {
                    return;
                };
                search.set_position_history(history);
                let result = search.search_best_move(&position, limits);
                match result.best {
                    Some(best) => match result.ponder {
                        Some(ponder) => println!("bestmove {best} ponder {ponder}"),
                        None => println!("bestmove {best}"),
                    },
                    None => println!("bestmove 0000"),
                }
            })
            .expect("failed to spawn search thread");
        self.search_thread = Some(handle);
    }

    fn stop_search(&mut self) {
        self.stop.store(true, std::sync::atomic::Ordering::SeqCst);
        if let Some(handle) = self.search_thread.take() {
            let _ = handle.join();
        }
    }

    fn cmd_perft(&mut self, args: &[&str]) {
        let Some(depth) = args.first().and_then(|t| t.parse::<u32>().ok()) else {
            println!("perft requires a depth");
            return;
        };
        let mut position = self.position.clone();
        let start = Instant::now();
        let total = perft_divide(&mut position, depth, |mv, nodes| {
            println!("{mv}: {nodes}");
        });
        let elapsed = start.elapsed();
        println!("====================================");
        println!("Total Time: {}ms", elapsed.as_millis());
        println!("Total Nodes: {total}");
        let nps = (total as f64 / elapsed.as_secs_f64().max(1e-9)) as u64;
        println!("Nodes per Second: {nps}");
    }

    fn cmd_moves(&self) {
        let moves = self.position.legal_moves();
        println!("{} legal moves:", moves.len());
        for &mv in moves.iter() {
            println!("  {} ({})", mv, self.position.to_san(mv));
        }
    }
}

impl Default for Engine {
    fn default() -> Self {
        Engine::new()
    }
}

fn print_help() {
    println!("Available commands:");
    println!("* uci");
    println!("\tPrint engine info and options.");
    println!("* isready");
    println!("\tCheck if the engine is ready.");
    println!("* ucinewgame");
    println!("\tReset for a new game (clears the transposition table).");
    println!("* setoption name <name> [value <value>]");
    println!("\tSet an engine option. Example: setoption name MultiPV value 3");
    println!("* position [fen <fenstring> | startpos] [moves <moves>...]");
    println!("\tSet the current position, optionally applying moves.");
    println!("* go [wtime N] [btime N] [winc N] [binc N] [movestogo N]");
    println!("     [movetime N] [depth N] [nodes N] [infinite | ponder]");
    println!("     [searchmoves <moves>...]");
    println!("\tStart searching the current position.");
    println!("* stop");
    println!("\tStop searching as soon as possible.");
    println!("* d");
    println!("\tPrint the current position.");
    println!("* eval");
    println!("\tPrint the static evaluation breakdown.");
    println!("* perft <depth>");
    println!("\tCount leaf nodes of the move tree to the given depth.");
    println!("* moves");
    println!("\tList the legal moves in the current position.");
    println!("* quit");
    println!("\tExit the program.");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_position_startpos_with_moves() {
        let mut engine = Engine::new();
        engine.handle_line("position startpos moves e2e4 e7e5");
        assert_eq!(engine.position.fullmove_number(), 2);
        assert_eq!(engine.history.len(), 2);
    }

    #[test]
    fn test_position_fen() {
        let mut engine = Engine::new();
        engine.handle_line(
            "position fen r3k2r/p1ppqpb1/bn2pnp1/3PN3/1p2P3/2N2Q1p/PPPBBPPP/R3K2R w KQkq - 0 1",
        );
        assert_eq!(engine.position.occupied_all().popcount(), 32);
    }

    #[test]
    fn test_illegal_move_stops_application() {
        let mut engine = Engine::new();
        engine.handle_line("position startpos moves e2e4 e7e6 e4e9 d2d4");
        // e2e4 and e7e6 applied, the rest dropped
        assert_eq!(engine.history.len(), 2);
    }

    #[test]
    fn test_quit_returns_false() {
        let mut engine = Engine::new();
        assert!(engine.handle_line("isready"));
        assert!(!engine.handle_line("quit"));
    }

    #[test]
    fn test_setoption_threads() {
        let mut engine = Engine::new();
        engine.handle_line("setoption name Threads value 4");
        assert_eq!(engine.options.threads, 4);
        assert_eq!(engine.search.lock().unwrap().settings.threads, 4);
    }

    #[test]
    fn test_go_depth_and_stop() {
        let mut engine = Engine::new();
        engine
            .search
            .lock()
            .unwrap()
            .settings
            .log_info = false;
        engine.handle_line("position startpos");
        engine.handle_line("go depth 3");
        engine.stop_search();
    }
}
