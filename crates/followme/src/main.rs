fn main() {
    followme::start_followme();
}
