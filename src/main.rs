fn main() {
    std::process::exit(clinirisk::run());
}
