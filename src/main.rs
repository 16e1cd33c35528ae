use squall::uci::Engine;

fn main() {
    squall::board::attack_tables::init();
    Engine::new().run();
}
