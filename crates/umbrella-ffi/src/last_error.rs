use std::cell::Cell;

use umbrella_core::ErrorCode;

thread_local! {
    static LAST_ERROR: Cell<ErrorCode> = const { Cell::new(ErrorCode::Ok) };
}

/// Record the outcome of the current boundary call on this thread.
pub fn set(code: ErrorCode) {
    LAST_ERROR.with(|slot| slot.set(code));
}

pub fn get() -> ErrorCode {
    LAST_ERROR.with(Cell::get)
}
