/// Stable numeric error codes surfaced to collaborators (UI, CLI exit codes, JSONL events).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u16)]
pub enum ErrorCode {
    Success = 0,
    GeneralError = 1,
    ParseError = 2,
    ValidationError = 3,
    TaskNotFound = 10,
    DependencyError = 11,
    CircularDependency = 12,
    InvalidTransition = 13,
    ResultSealed = 14,
    BackendError = 20,
    InvalidResponse = 21,
    Timeout = 30,
    Cancelled = 31,
    Stalled = 32,
    IoError = 40,
}

impl ErrorCode {
    pub fn as_u16(self) -> u16 {
        self as u16
    }
}
