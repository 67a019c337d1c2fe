fn main() -> std::process::ExitCode {
    apsflow_lib::run()
}
