use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("state lock poisoned")]
    StateLock,
    #[error("timer slot lock poisoned")]
    TimerLock,
}
