fn main() -> std::process::ExitCode {
    modelbox_cli::run()
}
