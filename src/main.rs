fn main() {
    breathe_lib::run()
}
