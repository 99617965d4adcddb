/// CPU count, used as the default number of watchdog execution contexts
pub fn get() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1)
}
