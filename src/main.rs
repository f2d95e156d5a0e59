fn main() {
    vireo::uci::run_uci_loop();
}
