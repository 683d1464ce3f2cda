fn main() -> std::process::ExitCode {
    boardbi_lib::run()
}
